//! # Integration Tests for Bairry
//!
//! These tests exercise the library through its public API and the `bairry`
//! binary the way a user would: profiles built song by song, snapshots written
//! to disk and read back, and listeners ranked for new releases.

use anyhow::Result;
use bairry::cluster::TasteClusterer;
use bairry::config::{ClusterConfig, Config};
use bairry::genre::{GenreFrequencyTable, GenreSet};
use bairry::pipeline::{ScoringPipeline, ScoringWeights};
use bairry::profile::{ResolvedSong, TasteProfile};
use bairry::registry::ListenerRegistry;
use bairry::store::ProfileStore;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn genres(names: &[&str]) -> GenreSet {
    names.iter().map(|name| (*name).to_string()).collect()
}

/// Unit vector at `similarity` cosine from `[1, 0]`.
fn at_similarity(similarity: f64) -> Vec<f64> {
    vec![similarity, (1.0 - similarity * similarity).sqrt()]
}

/// Listener with 50 songs all pointing along `[1, 0]`, the first ten tagged Rock.
fn fifty_song_rock_fan() -> Result<TasteProfile> {
    let mut profile = TasteProfile::new();
    for i in 0..50 {
        let tags = if i < 10 { genres(&["Rock"]) } else { GenreSet::new() };
        profile.add_song(&tags, Some(vec![1.0 + f64::from(i), 0.0]))?;
    }
    Ok(profile)
}

#[cfg(test)]
mod scoring_integration_tests {
    use super::*;

    #[test]
    fn test_end_to_end_single_cluster_listener() -> Result<()> {
        let profile = fifty_song_rock_fan()?;
        assert_eq!(profile.clusters().len(), 1);
        assert_eq!(profile.genres().count("Rock"), 10);
        assert_eq!(profile.genres().total(), 10);

        let mut profiles = BTreeMap::new();
        profiles.insert("fan".to_string(), profile);

        let song = ResolvedSong::new(genres(&["Rock"]), Some(at_similarity(0.40)));
        let ranked = ScoringPipeline::default().score_song_for_all(&song, &profiles)?;

        assert_eq!(ranked.len(), 1);
        let result = &ranked[0];
        assert!((result.genre_score - 1.0).abs() < 1e-12);
        assert!((result.lyric_score.unwrap() - 0.40).abs() < 1e-9);
        assert_eq!(result.matched_cluster_index, Some(0));
        assert!((result.combined_score - 0.76).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn test_ranking_mixes_genre_and_lyric_signal() -> Result<()> {
        let mut profiles = BTreeMap::new();
        profiles.insert("rock_fan".to_string(), fifty_song_rock_fan()?);

        let mut jazz_fan = TasteProfile::new();
        jazz_fan.add_song(&genres(&["Jazz"]), Some(vec![0.0, 1.0]))?;
        profiles.insert("jazz_fan".to_string(), jazz_fan);

        profiles.insert("newcomer".to_string(), TasteProfile::new());

        // Rock song whose lyrics sit right on the jazz fan's only cluster
        let song = ResolvedSong::new(genres(&["Rock"]), Some(vec![0.0, 1.0]));
        let ranked = ScoringPipeline::default().score_song_for_all(&song, &profiles)?;

        let order: Vec<&str> = ranked.iter().map(|r| r.listener_id.as_str()).collect();
        assert_eq!(order, vec!["rock_fan", "jazz_fan", "newcomer"]);

        // rock_fan: full genre match, orthogonal lyrics
        assert!((ranked[0].combined_score - 0.6).abs() < 1e-9);
        // jazz_fan: no genre overlap, perfect lyrics
        assert!((ranked[1].combined_score - 0.4).abs() < 1e-9);
        // newcomer: nothing to compare against
        assert_eq!(ranked[2].combined_score, 0.0);
        assert_eq!(ranked[2].lyric_score, None);
        Ok(())
    }

    #[test]
    fn test_custom_weights_change_the_winner() -> Result<()> {
        let mut profiles = BTreeMap::new();
        profiles.insert("rock_fan".to_string(), fifty_song_rock_fan()?);
        let mut jazz_fan = TasteProfile::new();
        jazz_fan.add_song(&genres(&["Jazz"]), Some(vec![0.0, 1.0]))?;
        profiles.insert("jazz_fan".to_string(), jazz_fan);

        let song = ResolvedSong::new(genres(&["Rock"]), Some(vec![0.0, 1.0]));
        let pipeline = ScoringPipeline::new(ScoringWeights { genre: 0.3, lyric: 0.7 })?;
        let ranked = pipeline.score_song_for_all(&song, &profiles)?;

        assert_eq!(ranked[0].listener_id, "jazz_fan");
        assert!((ranked[0].combined_score - 0.7).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn test_parallel_scoring_matches_sequential_for_many_listeners() -> Result<()> {
        let mut profiles = BTreeMap::new();
        for i in 0..40 {
            let mut profile = TasteProfile::new();
            for j in 0..(i % 7) {
                let tag = if j % 2 == 0 { "Rock" } else { "Pop" };
                let angle = f64::from(i * 7 + j) * 0.1;
                profile.add_song(&genres(&[tag]), Some(vec![angle.cos(), angle.sin()]))?;
            }
            profiles.insert(format!("listener-{i:02}"), profile);
        }

        let song = ResolvedSong::new(genres(&["Rock", "Soul"]), Some(at_similarity(0.5)));
        let pipeline = ScoringPipeline::default();
        assert_eq!(
            pipeline.score_song_for_all(&song, &profiles)?,
            pipeline.par_score_song_for_all(&song, &profiles)?
        );
        Ok(())
    }
}

#[cfg(test)]
mod profile_integration_tests {
    use super::*;

    #[test]
    fn test_cluster_count_grows_with_library() -> Result<()> {
        let mut profile = TasteProfile::new();
        for i in 0..120 {
            let angle = f64::from(i) * 0.05;
            profile.add_song(&GenreSet::new(), Some(vec![angle.cos(), angle.sin(), 0.1]))?;
            let expected = TasteClusterer::default().target_k(profile.embeddings().len());
            assert!(profile.clusters().len() <= expected);
        }
        assert!((1..=2).contains(&profile.clusters().len()));

        let members: usize = profile.clusters().iter().map(|c| c.member_count).sum();
        assert_eq!(members, 120);
        Ok(())
    }

    #[test]
    fn test_rebuilt_history_matches_incremental_profile() -> Result<()> {
        let incremental = fifty_song_rock_fan()?;

        let table: GenreFrequencyTable = [("Rock".to_string(), 10)].into_iter().collect();
        let rebuilt = TasteProfile::from_history(
            table,
            incremental.embeddings().to_vec(),
            &TasteClusterer::default(),
        )?;

        assert_eq!(rebuilt, incremental);
        Ok(())
    }

    #[test]
    fn test_registry_survives_a_snapshot_round_trip() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let store = ProfileStore::new(temp_dir.path().join("profiles.json"));

        let registry = ListenerRegistry::default();
        registry.create_listener("ana")?;
        registry.create_listener("ben")?;
        registry.add_song("ana", &genres(&["Jazz", "Soul"]), Some(vec![0.2, 0.9]))?;
        registry.add_song("ben", &genres(&["Metal"]), None)?;
        store.save(&registry.snapshot())?;

        let restored = ListenerRegistry::from_profiles(store.load()?, TasteClusterer::default());
        assert_eq!(restored.snapshot(), registry.snapshot());

        let song = ResolvedSong::new(genres(&["Soul"]), Some(vec![0.2, 0.9]));
        let ranked = restored.score_song_for_all(&ScoringPipeline::default(), &song)?;
        assert_eq!(ranked[0].listener_id, "ana");
        Ok(())
    }
}

#[cfg(test)]
mod configuration_tests {
    use super::*;

    #[test]
    fn test_config_file_drives_clustering() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("config.json");
        fs::write(&path, r#"{"cluster": {"songs_per_cluster": 2, "max_clusters": 3}}"#)?;

        let config = Config::load(&path)?;
        assert_eq!(
            config.cluster,
            ClusterConfig {
                songs_per_cluster: 2,
                max_clusters: 3,
                ..ClusterConfig::default()
            }
        );

        let clusterer = TasteClusterer::new(config.cluster);
        let mut profile = TasteProfile::new();
        for point in [[1.0, 0.0], [0.9, 0.1], [0.0, 1.0], [0.1, 0.9], [-1.0, 0.0], [-0.9, -0.1]] {
            profile.add_song_with(&GenreSet::new(), Some(point.to_vec()), &clusterer)?;
        }
        assert_eq!(profile.clusters().len(), 3);
        Ok(())
    }

    #[test]
    fn test_weights_that_do_not_sum_to_one_are_rejected() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("config.json");
        fs::write(&path, r#"{"scoring": {"genre": 0.9, "lyric": 0.4}}"#)?;

        assert!(Config::load(&path).is_err());
        Ok(())
    }
}

/// Run the built binary against an isolated profile snapshot and config.
fn bairry(dir: &Path, args: &[&str]) -> Result<Output> {
    let output = Command::new(env!("CARGO_BIN_EXE_bairry"))
        .args(args)
        .arg("--profiles")
        .arg(dir.join("profiles.json"))
        .arg("--config")
        .arg(dir.join("missing-config.json"))
        .output()?;
    Ok(output)
}

fn write_song(dir: &Path, name: &str, json: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, json)?;
    Ok(path)
}

#[cfg(test)]
mod cli_tests {
    use super::*;

    #[test]
    fn test_cli_help_displays_correctly() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let output = bairry(temp_dir.path(), &["--help"])?;

        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("create-listener"));
        assert!(stdout.contains("score"));
        Ok(())
    }

    #[test]
    fn test_target_k_command() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let output = bairry(temp_dir.path(), &["target-k", "120"])?;

        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "2");
        Ok(())
    }

    #[test]
    fn test_listener_workflow_through_the_binary() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let dir = temp_dir.path();
        let jazz_song = r#"{"genres": ["jazz"], "embedding": [1.0, 0.0]}"#;
        let heard = write_song(dir, "heard.json", jazz_song)?;
        let new_release = write_song(dir, "new.json", jazz_song)?;

        assert!(bairry(dir, &["create-listener", "ana"])?.status.success());
        assert!(bairry(dir, &["create-listener", "ben"])?.status.success());
        assert!(!bairry(dir, &["create-listener", "ana"])?.status.success());

        let heard = heard.to_string_lossy().to_string();
        assert!(bairry(dir, &["add-song", "ana", "--song", &heard])?.status.success());
        assert!(!bairry(dir, &["add-song", "ghost", "--song", &heard])?.status.success());

        let new_release = new_release.to_string_lossy().to_string();
        let output = bairry(dir, &["score", "--song", &new_release, "--json"])?;
        assert!(output.status.success());

        let ranked: Vec<serde_json::Value> = serde_json::from_slice(&output.stdout)?;
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0]["listener_id"], "ana");
        assert_eq!(ranked[1]["listener_id"], "ben");
        assert!(ranked[1]["lyric_score"].is_null());
        Ok(())
    }

    #[test]
    fn test_completion_generation() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let output = bairry(temp_dir.path(), &["completion", "bash"])?;

        assert!(output.status.success());
        assert!(String::from_utf8_lossy(&output.stdout).contains("bairry"));
        Ok(())
    }
}
