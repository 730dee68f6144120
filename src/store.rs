//! JSON snapshot of every listener profile, used by the CLI to carry state
//! between invocations.
//!
//! This is a flat file, not a database: the whole map is read and written at
//! once. Writes go to a temporary file in the same directory which then
//! replaces the snapshot, so a crash never leaves a half-written file behind.

use crate::pipeline::ListenerId;
use crate::profile::TasteProfile;
use anyhow::{Context, Result};
use log::{debug, info};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub type ProfileMap = BTreeMap<ListenerId, TasteProfile>;

#[derive(Debug, Clone)]
pub struct ProfileStore {
    path: PathBuf,
}

impl ProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all profiles. A missing snapshot is an empty map.
    ///
    /// Every profile is checked with [`TasteProfile::validate`], so clusters
    /// that do not match their stored embeddings are rejected here instead
    /// of surfacing later as wrong scores.
    pub fn load(&self) -> Result<ProfileMap> {
        if !self.path.exists() {
            debug!("No profile snapshot at {}, starting empty", self.path.display());
            return Ok(ProfileMap::new());
        }

        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read profile snapshot {}", self.path.display()))?;
        let profiles: ProfileMap = serde_json::from_str(&raw)
            .with_context(|| format!("Profile snapshot {} is corrupt", self.path.display()))?;
        for (listener_id, profile) in &profiles {
            profile.validate().with_context(|| {
                format!(
                    "Profile snapshot {} is corrupt: listener {listener_id}",
                    self.path.display()
                )
            })?;
        }

        debug!("Loaded {} profiles from {}", profiles.len(), self.path.display());
        Ok(profiles)
    }

    /// Replace the snapshot with `profiles`.
    pub fn save(&self, profiles: &ProfileMap) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;

        let mut file = NamedTempFile::new_in(&dir)
            .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
        serde_json::to_writer_pretty(&mut file, profiles).context("Failed to serialize profiles")?;
        file.flush().context("Failed to flush profile snapshot")?;
        file.persist(&self.path).with_context(|| {
            format!("Failed to replace profile snapshot {}", self.path.display())
        })?;

        info!("Saved {} profiles to {}", profiles.len(), self.path.display());
        Ok(())
    }
}
