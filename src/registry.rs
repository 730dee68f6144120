//! Thread-safe home for all listener profiles.
//!
//! Each listener's profile sits behind its own `Mutex`, so mutations of one
//! listener are serialized while different listeners proceed in parallel.
//! The outer `RwLock` only guards membership. Scoring reads each profile
//! while holding that listener's lock, so a reader never sees a genre table
//! from one `add_song` next to clusters from another.

use crate::cluster::TasteClusterer;
use crate::error::{Result, TasteError};
use crate::genre::GenreSet;
use crate::pipeline::{rank, ListenerId, ScoreResult, ScoringPipeline};
use crate::profile::{ResolvedSong, TasteProfile};
use crate::vector::Embedding;
use log::{debug, info};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

type SharedProfile = Arc<Mutex<TasteProfile>>;

#[derive(Debug, Default)]
pub struct ListenerRegistry {
    profiles: RwLock<BTreeMap<ListenerId, SharedProfile>>,
    clusterer: TasteClusterer,
}

impl ListenerRegistry {
    #[must_use]
    pub fn new(clusterer: TasteClusterer) -> Self {
        Self {
            profiles: RwLock::new(BTreeMap::new()),
            clusterer,
        }
    }

    /// Take ownership of already loaded profiles.
    #[must_use]
    pub fn from_profiles(
        profiles: BTreeMap<ListenerId, TasteProfile>,
        clusterer: TasteClusterer,
    ) -> Self {
        let profiles = profiles
            .into_iter()
            .map(|(id, profile)| (id, Arc::new(Mutex::new(profile))))
            .collect();
        Self {
            profiles: RwLock::new(profiles),
            clusterer,
        }
    }

    /// Register a new listener with an empty profile.
    pub fn create_listener(&self, listener_id: &str) -> Result<()> {
        let mut profiles = self.profiles.write().unwrap_or_else(PoisonError::into_inner);
        if profiles.contains_key(listener_id) {
            return Err(TasteError::DuplicateListener(listener_id.to_string()));
        }
        profiles.insert(listener_id.to_string(), Arc::new(Mutex::new(TasteProfile::new())));
        info!("Created listener {listener_id}");
        Ok(())
    }

    #[must_use]
    pub fn contains(&self, listener_id: &str) -> bool {
        self.profiles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(listener_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.profiles.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn profile(&self, listener_id: &str) -> Result<SharedProfile> {
        self.profiles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(listener_id)
            .cloned()
            .ok_or_else(|| TasteError::UnknownListener(listener_id.to_string()))
    }

    /// Add a song to one listener, holding only that listener's lock.
    pub fn add_song(
        &self,
        listener_id: &str,
        genres: &GenreSet,
        embedding: Option<Embedding>,
    ) -> Result<()> {
        let shared = self.profile(listener_id)?;
        let mut profile = shared.lock().unwrap_or_else(PoisonError::into_inner);
        profile.add_song_with(genres, embedding, &self.clusterer)?;
        debug!("Added song to listener {listener_id}");
        Ok(())
    }

    /// A consistent copy of one listener's profile.
    pub fn profile_snapshot(&self, listener_id: &str) -> Result<TasteProfile> {
        let shared = self.profile(listener_id)?;
        let profile = shared.lock().unwrap_or_else(PoisonError::into_inner).clone();
        Ok(profile)
    }

    /// Every registered listener with a handle to its profile, taken under
    /// the membership lock and released before any profile is locked.
    fn shared_profiles(&self) -> Vec<(ListenerId, SharedProfile)> {
        self.profiles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(id, profile)| (id.clone(), Arc::clone(profile)))
            .collect()
    }

    /// A copy of every profile, each taken under its own lock.
    ///
    /// This copies full embedding histories; use it for persistence, not for
    /// scoring.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<ListenerId, TasteProfile> {
        self.shared_profiles()
            .into_iter()
            .map(|(id, profile)| {
                let profile = profile.lock().unwrap_or_else(PoisonError::into_inner).clone();
                (id, profile)
            })
            .collect()
    }

    /// Rank every registered listener against `resolved`.
    ///
    /// Each listener is scored while its own lock is held, so it is seen
    /// consistently without copying its profile.
    pub fn score_song_for_all(
        &self,
        pipeline: &ScoringPipeline,
        resolved: &ResolvedSong,
    ) -> Result<Vec<ScoreResult>> {
        let results = self
            .shared_profiles()
            .iter()
            .map(|(id, shared)| score_locked(pipeline, id, resolved, shared))
            .collect::<Result<Vec<_>>>()?;
        Ok(rank(results))
    }

    /// Same output as [`Self::score_song_for_all`], listeners scored in parallel.
    pub fn par_score_song_for_all(
        &self,
        pipeline: &ScoringPipeline,
        resolved: &ResolvedSong,
    ) -> Result<Vec<ScoreResult>> {
        let results = self
            .shared_profiles()
            .par_iter()
            .map(|(id, shared)| score_locked(pipeline, id, resolved, shared))
            .collect::<Result<Vec<_>>>()?;
        Ok(rank(results))
    }
}

fn score_locked(
    pipeline: &ScoringPipeline,
    listener_id: &str,
    resolved: &ResolvedSong,
    shared: &SharedProfile,
) -> Result<ScoreResult> {
    let profile = shared.lock().unwrap_or_else(PoisonError::into_inner);
    pipeline.score_listener(listener_id, resolved, &profile)
}
