//! Fixed-dimension vector math shared by clustering and lyric scoring.
//!
//! All embeddings in one deployment share a dimension. Comparing vectors of
//! different lengths is a programming error and surfaces as
//! [`TasteError::DimensionMismatch`].

use crate::error::{Result, TasteError};

/// Semantic embedding of a song's (translated) lyrics.
pub type Embedding = Vec<f64>;

/// Fails unless `a` and `b` have the same length.
pub fn ensure_same_dimension(a: &[f64], b: &[f64]) -> Result<()> {
    if a.len() != b.len() {
        return Err(TasteError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(())
}

/// Element-wise arithmetic mean of a non-empty set of vectors.
///
/// # Errors
///
/// * [`TasteError::EmptyInput`] when `vectors` is empty
/// * [`TasteError::DimensionMismatch`] when the vectors differ in length
///
/// # Examples
///
/// ```
/// use bairry::vector::mean;
///
/// let centroid = mean(&[vec![1.0, 0.0], vec![0.0, 1.0]])?;
/// assert_eq!(centroid, vec![0.5, 0.5]);
/// # Ok::<(), bairry::error::TasteError>(())
/// ```
pub fn mean<V: AsRef<[f64]>>(vectors: &[V]) -> Result<Embedding> {
    let first = vectors
        .first()
        .ok_or(TasteError::EmptyInput { operation: "mean" })?
        .as_ref();

    let mut acc = vec![0.0; first.len()];
    for vector in vectors {
        let vector = vector.as_ref();
        ensure_same_dimension(first, vector)?;
        acc.iter_mut().zip(vector).for_each(|(sum, x)| *sum += x);
    }

    #[allow(clippy::cast_precision_loss)]
    let count = vectors.len() as f64;
    acc.iter_mut().for_each(|sum| *sum /= count);
    Ok(acc)
}

/// Cosine similarity of `a` and `b`, clamped to `[-1, 1]`.
///
/// ```text
/// cos(a, b) = dot(a, b) / (|a| * |b|)
/// ```
///
/// # Arguments
///
/// * `a` - First vector, typically a song's lyric embedding
/// * `b` - Second vector of the same dimension, typically a centroid
///
/// # Returns
///
/// The similarity, with floating-point overshoot clamped away. A zero
/// vector carries no signal, so similarity against it is `0.0` rather than
/// NaN.
///
/// # Errors
///
/// [`TasteError::DimensionMismatch`] when the lengths differ.
///
/// # Examples
///
/// ```
/// use bairry::vector::cosine_similarity;
///
/// assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0])? - 1.0).abs() < 1e-12);
/// assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 3.0])?, 0.0);
/// assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0])?, 0.0);
/// # Ok::<(), bairry::error::TasteError>(())
/// ```
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> Result<f64> {
    ensure_same_dimension(a, b)?;
    Ok(cosine_unchecked(a, b))
}

/// Cosine distance, `1 - cosine_similarity`, in `[0, 2]`.
pub fn cosine_distance(a: &[f64], b: &[f64]) -> Result<f64> {
    cosine_similarity(a, b).map(|similarity| 1.0 - similarity)
}

/// Cosine similarity for callers that already checked dimensions.
pub(crate) fn cosine_unchecked(a: &[f64], b: &[f64]) -> f64 {
    let (dot, norm_a, norm_b) = a
        .iter()
        .zip(b)
        .fold((0.0, 0.0, 0.0), |(dot, na, nb), (x, y)| {
            (dot + x * y, na + x * x, nb + y * y)
        });

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)
}
