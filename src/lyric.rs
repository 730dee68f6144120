//! Lyric affinity: how close a song's embedding sits to the nearest of a
//! listener's taste clusters.

use crate::cluster::SemanticCluster;
use crate::error::Result;
use crate::vector;
use serde::{Deserialize, Serialize};

/// The best-matching cluster for a song.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LyricMatch {
    /// Cosine similarity to the matched centroid, clamped to `[0, 1]`.
    pub score: f64,
    /// Raw cosine similarity, in `[-1, 1]`.
    pub similarity: f64,
    pub cluster_index: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LyricAffinityScorer;

impl LyricAffinityScorer {
    /// Compare `song_embedding` with every centroid and keep the closest.
    ///
    /// # Arguments
    ///
    /// * `song_embedding` - The song's lyric embedding, `None` when it has no lyrics
    /// * `clusters` - The listener's taste clusters, in index order
    ///
    /// # Returns
    ///
    /// `Ok(None)` when there is no embedding or no cluster: the score is not
    /// computable, which is different from a score of zero. Otherwise the
    /// best match. Equal similarities resolve to the lowest cluster index.
    ///
    /// # Examples
    ///
    /// ```
    /// use bairry::cluster::SemanticCluster;
    /// use bairry::lyric::LyricAffinityScorer;
    ///
    /// let clusters = vec![
    ///     SemanticCluster { index: 0, centroid: vec![1.0, 0.0], member_count: 3 },
    ///     SemanticCluster { index: 1, centroid: vec![0.0, 1.0], member_count: 2 },
    /// ];
    ///
    /// let best = LyricAffinityScorer::score(Some(&[0.1, 0.9][..]), &clusters)?.unwrap();
    /// assert_eq!(best.cluster_index, 1);
    /// assert!(LyricAffinityScorer::score(None, &clusters)?.is_none());
    /// # Ok::<(), bairry::error::TasteError>(())
    /// ```
    ///
    /// # Errors
    ///
    /// [`crate::error::TasteError::DimensionMismatch`] when the embedding and a
    /// centroid differ in length.
    pub fn score(
        song_embedding: Option<&[f64]>,
        clusters: &[SemanticCluster],
    ) -> Result<Option<LyricMatch>> {
        let Some(embedding) = song_embedding else {
            return Ok(None);
        };

        let mut best: Option<LyricMatch> = None;
        for cluster in clusters {
            let similarity = vector::cosine_similarity(embedding, &cluster.centroid)?;
            if best.map_or(true, |current| similarity > current.similarity) {
                best = Some(LyricMatch {
                    score: similarity.max(0.0),
                    similarity,
                    cluster_index: cluster.index,
                });
            }
        }

        Ok(best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TasteError;

    fn cluster(index: usize, centroid: Vec<f64>) -> SemanticCluster {
        SemanticCluster {
            index,
            centroid,
            member_count: 1,
        }
    }

    /// Unit vector in the plane at the given cosine to `[1, 0]`.
    fn at_cosine(cosine: f64) -> Vec<f64> {
        vec![cosine, (1.0 - cosine * cosine).sqrt()]
    }

    #[test]
    fn test_picks_the_most_similar_cluster() {
        let clusters = vec![
            cluster(0, at_cosine(0.72)),
            cluster(1, at_cosine(0.55)),
            cluster(2, at_cosine(0.89)),
        ];

        let best = LyricAffinityScorer::score(Some(&[1.0, 0.0][..]), &clusters)
            .unwrap()
            .expect("clusters exist, so a match must exist");
        assert_eq!(best.cluster_index, 2);
        assert!((best.score - 0.89).abs() < 1e-12);
    }

    #[test]
    fn test_ties_resolve_to_lowest_index() {
        let clusters = vec![
            cluster(0, vec![0.0, 1.0]),
            cluster(1, vec![1.0, 0.0]),
            cluster(2, vec![2.0, 0.0]),
        ];
        let best = LyricAffinityScorer::score(Some(&[1.0, 0.0][..]), &clusters).unwrap().unwrap();
        assert_eq!(best.cluster_index, 1);
    }

    #[test]
    fn test_absent_embedding_is_absent_score() {
        let clusters = vec![cluster(0, vec![1.0, 0.0])];
        assert_eq!(LyricAffinityScorer::score(None, &clusters).unwrap(), None);
    }

    #[test]
    fn test_no_clusters_is_absent_score() {
        assert_eq!(LyricAffinityScorer::score(Some(&[1.0, 0.0][..]), &[]).unwrap(), None);
    }

    #[test]
    fn test_negative_similarity_reports_zero_score() {
        let clusters = vec![cluster(0, vec![-1.0, 0.0])];
        let best = LyricAffinityScorer::score(Some(&[1.0, 0.0][..]), &clusters).unwrap().unwrap();
        assert_eq!(best.score, 0.0);
        assert!((best.similarity + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_dimension_mismatch_propagates() {
        let clusters = vec![cluster(0, vec![1.0, 0.0, 0.0])];
        assert_eq!(
            LyricAffinityScorer::score(Some(&[1.0, 0.0][..]), &clusters),
            Err(TasteError::DimensionMismatch { expected: 2, actual: 3 })
        );
    }
}
