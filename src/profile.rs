//! Per-listener taste profile.
//!
//! A [`TasteProfile`] owns the listener's genre counts, every lyric embedding
//! added so far, and the clusters computed from those embeddings. It changes
//! only through [`TasteProfile::add_song`], and each call either applies in
//! full or not at all.

use crate::cluster::{SemanticCluster, TasteClusterer};
use crate::error::{Result, TasteError};
use crate::genre::{GenreAffinityScorer, GenreFrequencyTable, GenreSet};
use crate::lyric::{LyricAffinityScorer, LyricMatch};
use crate::vector::{self, Embedding};
use log::debug;
use serde::{Deserialize, Serialize};

/// A song as delivered by the artist/lyrics/embedding collaborators.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSong {
    /// Empty when the artist could not be resolved.
    #[serde(default)]
    pub genres: GenreSet,
    /// Absent when no lyrics were available.
    #[serde(default)]
    pub embedding: Option<Embedding>,
}

impl ResolvedSong {
    #[must_use]
    pub fn new(genres: GenreSet, embedding: Option<Embedding>) -> Self {
        Self { genres, embedding }
    }
}

/// A profile's view of one song, before the pipeline weighs it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileScore {
    pub genre_score: f64,
    pub lyric: Option<LyricMatch>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TasteProfile {
    #[serde(default)]
    genres: GenreFrequencyTable,
    #[serde(default)]
    embeddings: Vec<Embedding>,
    #[serde(default)]
    clusters: Vec<SemanticCluster>,
}

impl TasteProfile {
    /// An empty profile for a newly created listener.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a profile from stored history, clustering the embeddings.
    pub fn from_history(
        genres: GenreFrequencyTable,
        embeddings: Vec<Embedding>,
        clusterer: &TasteClusterer,
    ) -> Result<Self> {
        let mut profile = Self {
            genres,
            embeddings,
            clusters: Vec::new(),
        };
        profile.recluster(clusterer)?;
        Ok(profile)
    }

    #[must_use]
    pub fn genres(&self) -> &GenreFrequencyTable {
        &self.genres
    }

    #[must_use]
    pub fn embeddings(&self) -> &[Embedding] {
        &self.embeddings
    }

    #[must_use]
    pub fn clusters(&self) -> &[SemanticCluster] {
        &self.clusters
    }

    /// Dimension of the stored embeddings, once there is one.
    #[must_use]
    pub fn dimension(&self) -> Option<usize> {
        self.embeddings.first().map(Vec::len)
    }

    /// Add a song with the default clustering parameters.
    pub fn add_song(&mut self, genres: &GenreSet, embedding: Option<Embedding>) -> Result<()> {
        self.add_song_with(genres, embedding, &TasteClusterer::default())
    }

    /// Count the song's genres and, if it has an embedding, store it and
    /// recluster everything.
    ///
    /// The embedding dimension is checked before anything changes, so a
    /// rejected song leaves the profile exactly as it was. A song without an
    /// embedding contributes genre signal only and leaves clusters untouched.
    ///
    /// The cluster count comes from [`TasteClusterer::target_k`] applied to the
    /// number of songs *with an embedding*, not to every song ever added. A
    /// listener with 300 songs of which 60 have lyrics is clustered as a
    /// 60-song library (one cluster with the default configuration).
    ///
    /// # Errors
    ///
    /// [`TasteError::DimensionMismatch`] when `embedding` does not match the
    /// dimension of the embeddings already stored.
    pub fn add_song_with(
        &mut self,
        genres: &GenreSet,
        embedding: Option<Embedding>,
        clusterer: &TasteClusterer,
    ) -> Result<()> {
        let Some(embedding) = embedding else {
            self.genres.record(genres);
            debug!("Recorded {} genres for a song without lyrics", genres.len());
            return Ok(());
        };

        if let Some(first) = self.embeddings.first() {
            vector::ensure_same_dimension(first, &embedding)?;
        }

        let mut embeddings = self.embeddings.clone();
        embeddings.push(embedding);
        let k = clusterer.target_k(embeddings.len());
        let clusters = clusterer.cluster(&embeddings, k, clusterer.config().seed)?;

        self.genres.record(genres);
        self.embeddings = embeddings;
        self.clusters = clusters;
        debug!(
            "Reclustered {} embeddings into {} clusters",
            self.embeddings.len(),
            self.clusters.len()
        );
        Ok(())
    }

    /// Replace the clusters with a fresh partition of all stored embeddings.
    pub fn recluster(&mut self, clusterer: &TasteClusterer) -> Result<()> {
        let k = clusterer.target_k(self.embeddings.len());
        self.clusters = clusterer.cluster(&self.embeddings, k, clusterer.config().seed)?;
        Ok(())
    }

    /// Check that the clusters describe the stored embeddings.
    ///
    /// Profiles built through [`Self::add_song`] always pass. Profiles read
    /// back from storage are checked before they are trusted:
    ///
    /// * every embedding and every centroid shares one dimension
    /// * cluster indices run `0, 1, 2, ...` in order
    /// * every cluster has members and the member counts add up to the
    ///   number of embeddings
    ///
    /// # Errors
    ///
    /// [`TasteError::DimensionMismatch`] for a vector of the wrong length,
    /// [`TasteError::InconsistentProfile`] for everything else.
    pub fn validate(&self) -> Result<()> {
        if let Some(first) = self.embeddings.first() {
            for embedding in &self.embeddings {
                vector::ensure_same_dimension(first, embedding)?;
            }
            for cluster in &self.clusters {
                vector::ensure_same_dimension(first, &cluster.centroid)?;
            }
        } else if !self.clusters.is_empty() {
            return Err(TasteError::InconsistentProfile(format!(
                "{} clusters but no embeddings",
                self.clusters.len()
            )));
        }

        if let Some((position, cluster)) = self
            .clusters
            .iter()
            .enumerate()
            .find(|(position, cluster)| cluster.index != *position || cluster.member_count == 0)
        {
            return Err(TasteError::InconsistentProfile(format!(
                "cluster at position {position} has index {} and {} members",
                cluster.index, cluster.member_count
            )));
        }

        let members: usize = self.clusters.iter().map(|c| c.member_count).sum();
        if !self.embeddings.is_empty() && members != self.embeddings.len() {
            return Err(TasteError::InconsistentProfile(format!(
                "clusters hold {members} members but {} embeddings are stored",
                self.embeddings.len()
            )));
        }
        Ok(())
    }

    /// Score a song against the current state without changing it.
    pub fn score_song(&self, resolved: &ResolvedSong) -> Result<ProfileScore> {
        if let (Some(embedding), Some(dimension)) = (&resolved.embedding, self.dimension()) {
            if embedding.len() != dimension {
                return Err(TasteError::DimensionMismatch {
                    expected: dimension,
                    actual: embedding.len(),
                });
            }
        }

        Ok(ProfileScore {
            genre_score: GenreAffinityScorer::score(&resolved.genres, &self.genres),
            lyric: LyricAffinityScorer::score(resolved.embedding.as_deref(), &self.clusters)?,
        })
    }
}
