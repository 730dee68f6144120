//! Scoring pipeline: rank every listener against one resolved song.
//!
//! ```text
//! combined = genre_weight * genre_score + lyric_weight * (lyric_score or 0)
//! ```
//!
//! The pipeline does no I/O and keeps no state beyond its weights, so the same
//! inputs always produce the same ranking.

use crate::error::{Result, TasteError};
use crate::profile::{ResolvedSong, TasteProfile};
use log::{debug, trace};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

/// Stable listener identifier supplied by the surrounding system.
pub type ListenerId = String;

/// Weights of the two signals in the combined score. They sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub genre: f64,
    pub lyric: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self { genre: 0.6, lyric: 0.4 }
    }
}

impl ScoringWeights {
    /// Weights must be finite, non-negative and sum to 1, which keeps the
    /// combined score in `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        let finite = self.genre.is_finite() && self.lyric.is_finite();
        if !finite || self.genre < 0.0 || self.lyric < 0.0 {
            return Err(TasteError::InvalidConfig(format!(
                "scoring weights must be finite and non-negative, got genre = {}, lyric = {}",
                self.genre, self.lyric
            )));
        }
        if ((self.genre + self.lyric) - 1.0).abs() > 1e-9 {
            return Err(TasteError::InvalidConfig(format!(
                "scoring weights must sum to 1, got {}",
                self.genre + self.lyric
            )));
        }
        Ok(())
    }

    /// Weighted sum; an absent lyric score counts as zero.
    #[must_use]
    pub fn combine(&self, genre_score: f64, lyric_score: Option<f64>) -> f64 {
        self.genre * genre_score + self.lyric * lyric_score.unwrap_or(0.0)
    }
}

/// One listener's score for one song. Recomputed on every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub listener_id: ListenerId,
    pub genre_score: f64,
    /// `None` when the song had no lyrics or the listener has no clusters.
    pub lyric_score: Option<f64>,
    pub matched_cluster_index: Option<usize>,
    pub combined_score: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringPipeline {
    weights: ScoringWeights,
}

impl ScoringPipeline {
    /// Build a pipeline around `weights`.
    ///
    /// # Errors
    ///
    /// [`TasteError::InvalidConfig`] when the weights fail
    /// [`ScoringWeights::validate`], since they could push `combined_score`
    /// out of `[0, 1]` or make it NaN.
    pub fn new(weights: ScoringWeights) -> Result<Self> {
        weights.validate()?;
        Ok(Self { weights })
    }

    #[must_use]
    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Score one listener.
    pub fn score_listener(
        &self,
        listener_id: &str,
        resolved: &ResolvedSong,
        profile: &TasteProfile,
    ) -> Result<ScoreResult> {
        let score = profile.score_song(resolved)?;
        let lyric_score = score.lyric.map(|m| m.score);
        let result = ScoreResult {
            listener_id: listener_id.to_string(),
            genre_score: score.genre_score,
            lyric_score,
            matched_cluster_index: score.lyric.map(|m| m.cluster_index),
            combined_score: self.weights.combine(score.genre_score, lyric_score),
        };
        trace!("Scored listener {listener_id}: {result:?}");
        Ok(result)
    }

    /// Score every listener and rank them.
    ///
    /// Returns one result per listener, highest `combined_score` first, ties
    /// by ascending listener id.
    ///
    /// # Examples
    ///
    /// ```
    /// use bairry::pipeline::ScoringPipeline;
    /// use bairry::profile::{ResolvedSong, TasteProfile};
    /// use std::collections::BTreeMap;
    ///
    /// let rock: bairry::genre::GenreSet = ["Rock".to_string()].into_iter().collect();
    /// let mut fan = TasteProfile::new();
    /// fan.add_song(&rock, None)?;
    ///
    /// let mut profiles = BTreeMap::new();
    /// profiles.insert("fan".to_string(), fan);
    /// profiles.insert("newcomer".to_string(), TasteProfile::new());
    ///
    /// let ranked = ScoringPipeline::default()
    ///     .score_song_for_all(&ResolvedSong::new(rock, None), &profiles)?;
    /// assert_eq!(ranked[0].listener_id, "fan");
    /// assert!((ranked[0].combined_score - 0.6).abs() < 1e-12);
    /// # Ok::<(), bairry::error::TasteError>(())
    /// ```
    pub fn score_song_for_all(
        &self,
        resolved: &ResolvedSong,
        profiles: &BTreeMap<ListenerId, TasteProfile>,
    ) -> Result<Vec<ScoreResult>> {
        let results = profiles
            .iter()
            .map(|(listener_id, profile)| self.score_listener(listener_id, resolved, profile))
            .collect::<Result<Vec<_>>>()?;
        Ok(rank(results))
    }

    /// Same output as [`Self::score_song_for_all`], listeners scored in parallel.
    pub fn par_score_song_for_all(
        &self,
        resolved: &ResolvedSong,
        profiles: &BTreeMap<ListenerId, TasteProfile>,
    ) -> Result<Vec<ScoreResult>> {
        let results = profiles
            .par_iter()
            .map(|(listener_id, profile)| self.score_listener(listener_id, resolved, profile))
            .collect::<Result<Vec<_>>>()?;
        Ok(rank(results))
    }

    /// Like [`Self::score_song_for_all`], but checks `cancel` before each
    /// listener. A listener that has started is always finished.
    ///
    /// # Errors
    ///
    /// [`TasteError::Cancelled`] once `cancel` is observed set.
    pub fn score_song_for_all_cancellable(
        &self,
        resolved: &ResolvedSong,
        profiles: &BTreeMap<ListenerId, TasteProfile>,
        cancel: &AtomicBool,
    ) -> Result<Vec<ScoreResult>> {
        let mut results = Vec::with_capacity(profiles.len());
        for (listener_id, profile) in profiles {
            if cancel.load(AtomicOrdering::Relaxed) {
                debug!("Scoring cancelled after {} of {} listeners", results.len(), profiles.len());
                return Err(TasteError::Cancelled {
                    scored: results.len(),
                    total: profiles.len(),
                });
            }
            results.push(self.score_listener(listener_id, resolved, profile)?);
        }
        Ok(rank(results))
    }
}

/// Descending combined score, then ascending listener id.
pub(crate) fn rank(mut results: Vec<ScoreResult>) -> Vec<ScoreResult> {
    results.sort_by(|a, b| {
        b.combined_score
            .total_cmp(&a.combined_score)
            .then_with(|| a.listener_id.cmp(&b.listener_id))
    });
    results
}
