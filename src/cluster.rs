//! Per-listener taste clustering.
//!
//! A listener's lyric embeddings are partitioned into at most
//! [`ClusterConfig::max_clusters`] semantic groups with seeded k-means over
//! cosine distance. The partition is always recomputed from the complete
//! embedding set and replaces whatever clusters the listener had before.

use crate::config::ClusterConfig;
use crate::error::{Result, TasteError};
use crate::vector::{self, cosine_unchecked, Embedding};
use log::{debug, trace};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// One semantic group of a listener's songs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticCluster {
    pub index: usize,
    /// Mean of the member embeddings.
    pub centroid: Embedding,
    pub member_count: usize,
}

/// Clusters plus the assignment that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub clusters: Vec<SemanticCluster>,
    /// `assignments[i]` is the output cluster index of `embeddings[i]`.
    pub assignments: Vec<usize>,
    pub iterations: usize,
    pub converged: bool,
}

/// Target cluster count for a library of `song_count` embedded songs,
/// using the default [`ClusterConfig`].
///
/// ```
/// use bairry::cluster::target_k;
///
/// assert_eq!(target_k(49), 1);
/// assert_eq!(target_k(120), 2);
/// assert_eq!(target_k(10_000), 5);
/// ```
#[must_use]
pub fn target_k(song_count: usize) -> usize {
    TasteClusterer::default().target_k(song_count)
}

/// Seeded, deterministic k-means over cosine distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct TasteClusterer {
    config: ClusterConfig,
}

impl TasteClusterer {
    #[must_use]
    pub fn new(config: ClusterConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// `max(1, min(max_clusters, song_count / songs_per_cluster))`.
    #[must_use]
    pub fn target_k(&self, song_count: usize) -> usize {
        (song_count / self.config.songs_per_cluster.max(1))
            .min(self.config.max_clusters)
            .max(1)
    }

    /// Partition `embeddings` into at most `k` clusters.
    pub fn cluster(
        &self,
        embeddings: &[Embedding],
        k: usize,
        seed: u64,
    ) -> Result<Vec<SemanticCluster>> {
        self.partition(embeddings, k, seed).map(|partition| partition.clusters)
    }

    /// Partition `embeddings` into at most `k` clusters, keeping the assignment.
    ///
    /// # Errors
    ///
    /// * [`TasteError::EmptyInput`] when `k == 0`
    /// * [`TasteError::DimensionMismatch`] when the embeddings differ in length
    pub fn partition(&self, embeddings: &[Embedding], k: usize, seed: u64) -> Result<Partition> {
        if k == 0 {
            return Err(TasteError::EmptyInput { operation: "cluster" });
        }
        if let Some(first) = embeddings.first() {
            for embedding in embeddings {
                vector::ensure_same_dimension(first, embedding)?;
            }
        }

        let partition = match embeddings.len() {
            0 => Partition {
                clusters: Vec::new(),
                assignments: Vec::new(),
                iterations: 0,
                converged: true,
            },
            n if n <= k => singleton_partition(embeddings),
            n if k == 1 => Partition {
                clusters: vec![SemanticCluster {
                    index: 0,
                    centroid: vector::mean(embeddings)?,
                    member_count: n,
                }],
                assignments: vec![0; n],
                iterations: 0,
                converged: true,
            },
            _ => self.relocate(embeddings, k, seed)?,
        };

        debug!(
            "Clustered {} embeddings into {} clusters (k = {k}, {} iterations, converged: {})",
            embeddings.len(),
            partition.clusters.len(),
            partition.iterations,
            partition.converged
        );
        Ok(partition)
    }

    /// Iterative relocation. Requires `embeddings.len() > k > 1`.
    fn relocate(&self, embeddings: &[Embedding], k: usize, seed: u64) -> Result<Partition> {
        let mut centroids = initial_centroids(embeddings, k, seed);
        let mut assignments = assign(embeddings, &centroids);
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.config.max_iterations {
            iterations += 1;

            if reseed_empty_clusters(embeddings, &mut centroids, &assignments) {
                assignments = assign(embeddings, &centroids);
            }
            recompute_centroids(embeddings, &mut centroids, &assignments)?;

            let next = assign(embeddings, &centroids);
            if next == assignments {
                converged = true;
                break;
            }
            trace!("Iteration {iterations}: assignments changed");
            assignments = next;
        }

        build_partition(embeddings, k, &assignments, iterations, converged)
    }
}

/// One cluster per embedding, centroid equal to the embedding.
fn singleton_partition(embeddings: &[Embedding]) -> Partition {
    Partition {
        clusters: embeddings
            .iter()
            .enumerate()
            .map(|(index, embedding)| SemanticCluster {
                index,
                centroid: embedding.clone(),
                member_count: 1,
            })
            .collect(),
        assignments: (0..embeddings.len()).collect(),
        iterations: 0,
        converged: true,
    }
}

/// Seeded sample of `k` starting centroids, skipping duplicates while
/// enough distinct embeddings remain.
fn initial_centroids(embeddings: &[Embedding], k: usize, seed: u64) -> Vec<Embedding> {
    let mut order: Vec<usize> = (0..embeddings.len()).collect();
    order.shuffle(&mut StdRng::seed_from_u64(seed));

    let mut chosen: Vec<usize> = Vec::with_capacity(k);
    for &candidate in &order {
        if chosen.len() == k {
            break;
        }
        if !chosen.iter().any(|&c| embeddings[c] == embeddings[candidate]) {
            chosen.push(candidate);
        }
    }
    // Not enough distinct points: fill with whatever is left, in sampled order.
    for &candidate in &order {
        if chosen.len() == k {
            break;
        }
        if !chosen.contains(&candidate) {
            chosen.push(candidate);
        }
    }

    chosen.into_iter().map(|i| embeddings[i].clone()).collect()
}

/// Nearest centroid per embedding by cosine distance; lowest index wins ties.
fn assign(embeddings: &[Embedding], centroids: &[Embedding]) -> Vec<usize> {
    embeddings
        .iter()
        .map(|embedding| {
            let mut best = 0;
            let mut best_distance = f64::INFINITY;
            for (index, centroid) in centroids.iter().enumerate() {
                let distance = 1.0 - cosine_unchecked(embedding, centroid);
                if distance < best_distance {
                    best = index;
                    best_distance = distance;
                }
            }
            best
        })
        .collect()
}

fn member_counts(k: usize, assignments: &[usize]) -> Vec<usize> {
    let mut counts = vec![0; k];
    assignments.iter().for_each(|&cluster| counts[cluster] += 1);
    counts
}

/// Move each empty cluster's centroid onto the embedding farthest from its
/// own centroid. Returns whether anything was reseeded.
fn reseed_empty_clusters(
    embeddings: &[Embedding],
    centroids: &mut [Embedding],
    assignments: &[usize],
) -> bool {
    let counts = member_counts(centroids.len(), assignments);
    let empty: Vec<usize> = (0..centroids.len()).filter(|&c| counts[c] == 0).collect();
    if empty.is_empty() {
        return false;
    }

    let mut by_distance: Vec<(usize, f64)> = embeddings
        .iter()
        .zip(assignments)
        .enumerate()
        .map(|(i, (embedding, &cluster))| {
            (i, 1.0 - cosine_unchecked(embedding, &centroids[cluster]))
        })
        .collect();
    // Farthest first; equal distances keep the lower embedding index first.
    by_distance.sort_by(|(ia, da), (ib, db)| db.total_cmp(da).then(ia.cmp(ib)));

    for (&cluster, &(point, distance)) in empty.iter().zip(&by_distance) {
        debug!("Reseeding empty cluster {cluster} with embedding {point} (distance {distance:.4})");
        centroids[cluster] = embeddings[point].clone();
    }
    true
}

/// Replace every non-empty cluster's centroid with the mean of its members.
fn recompute_centroids(
    embeddings: &[Embedding],
    centroids: &mut [Embedding],
    assignments: &[usize],
) -> Result<()> {
    for (cluster, centroid) in centroids.iter_mut().enumerate() {
        let members: Vec<&[f64]> = members_of(embeddings, assignments, cluster).collect();
        if !members.is_empty() {
            *centroid = vector::mean(&members)?;
        }
    }
    Ok(())
}

fn members_of<'a>(
    embeddings: &'a [Embedding],
    assignments: &'a [usize],
    cluster: usize,
) -> impl Iterator<Item = &'a [f64]> + 'a {
    embeddings
        .iter()
        .zip(assignments)
        .filter(move |&(_, &assigned)| assigned == cluster)
        .map(|(embedding, _)| embedding.as_slice())
}

/// Final clusters from the final assignment: empty clusters are dropped and
/// the rest renumbered in order, each centroid the exact mean of its members.
fn build_partition(
    embeddings: &[Embedding],
    k: usize,
    assignments: &[usize],
    iterations: usize,
    converged: bool,
) -> Result<Partition> {
    let mut renumbered = vec![None; k];
    let mut clusters = Vec::with_capacity(k);

    for cluster in 0..k {
        let members: Vec<&[f64]> = members_of(embeddings, assignments, cluster).collect();
        if members.is_empty() {
            continue;
        }
        renumbered[cluster] = Some(clusters.len());
        clusters.push(SemanticCluster {
            index: clusters.len(),
            centroid: vector::mean(&members)?,
            member_count: members.len(),
        });
    }

    let assignments = assignments
        .iter()
        .map(|&cluster| renumbered[cluster].unwrap_or_default())
        .collect();

    Ok(Partition {
        clusters,
        assignments,
        iterations,
        converged,
    })
}
