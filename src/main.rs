//! # Bairry - Listener Ranking by Musical Taste
//!
//! Command-line front end over the `bairry` library. Listener profiles live
//! in a JSON snapshot that every command loads, and mutating commands write
//! back.
//!
//! ## Usage
//!
//! ```bash
//! # Register listeners
//! bairry create-listener ana
//!
//! # Teach a profile
//! bairry add-song ana --song heard.json
//!
//! # Rank everyone for a new song
//! bairry score --song new_release.json --parallel
//!
//! # Inspect a profile
//! bairry clusters ana
//! ```

use anyhow::{Context, Result};
use bairry::cli::{self, Args, Command};
use bairry::cluster::TasteClusterer;
use bairry::completion;
use bairry::config::{self, Config};
use bairry::pipeline::{ScoreResult, ScoringPipeline};
use bairry::profile::ResolvedSong;
use bairry::registry::ListenerRegistry;
use bairry::store::ProfileStore;
use clap::{CommandFactory, Parser};
use log::{debug, info};
use std::fs;
use std::path::Path;

/// Main entry point for the Bairry application.
///
/// Initializes logging, parses command-line arguments, and routes commands
/// to the library.
///
/// # Logging
///
/// Initializes environment logger which can be controlled via `RUST_LOG`:
/// - `RUST_LOG=debug bairry score --song s.json` - Enable debug logging
/// - `RUST_LOG=bairry::cluster=trace bairry add-song ana --song s.json` - Module-specific
///   logging
fn main() -> Result<()> {
    env_logger::init();

    let args = cli::Args::parse();

    match args.command {
        Command::CreateListener { ref listener } => {
            let (store, registry) = open_profiles(&args)?;
            registry.create_listener(listener)?;
            store.save(&registry.snapshot())?;
            println!("Created listener {listener}");
        }
        Command::AddSong { ref listener, ref song } => {
            let resolved = read_song(song)?;
            let (store, registry) = open_profiles(&args)?;
            registry
                .add_song(listener, &resolved.genres, resolved.embedding)
                .with_context(|| {
                    format!("Failed to add {} to listener {listener}", song.display())
                })?;
            store.save(&registry.snapshot())?;

            let profile = registry.profile_snapshot(listener)?;
            info!(
                "Listener {listener} now has {} embedded songs in {} clusters",
                profile.embeddings().len(),
                profile.clusters().len()
            );
            println!("Added {} to {listener}", song.display());
        }
        Command::Score { ref song, parallel, json } => {
            let resolved = read_song(song)?;
            let config = load_config(&args)?;
            let (_, registry) = open_profiles(&args)?;
            let pipeline = ScoringPipeline::new(config.scoring)?;
            let ranked = if parallel {
                registry.par_score_song_for_all(&pipeline, &resolved)?
            } else {
                registry.score_song_for_all(&pipeline, &resolved)?
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&ranked)?);
            } else {
                print_ranking(&ranked);
            }
        }
        Command::Clusters { ref listener, top_genres } => {
            let (_, registry) = open_profiles(&args)?;
            let profile = registry.profile_snapshot(listener)?;

            println!("Listener {listener}: {} songs with lyrics", profile.embeddings().len());
            println!();
            println!("Top genres:");
            for (genre, count) in profile.genres().top(top_genres) {
                println!("  {genre:<24} {count}");
            }
            println!();
            println!("Clusters:");
            if profile.clusters().is_empty() {
                println!("  (none)");
            }
            for cluster in profile.clusters() {
                println!(
                    "  #{:<3} {:>5} songs  dimension {}",
                    cluster.index,
                    cluster.member_count,
                    cluster.centroid.len()
                );
            }
        }
        Command::TargetK { count } => {
            let config = load_config(&args)?;
            println!("{}", TasteClusterer::new(config.cluster).target_k(count));
        }
        Command::Completion { shell } => {
            let mut cmd = Args::command();
            let shell = completion::shell_to_completion_shell(shell);
            completion::generate_completions(shell, &mut cmd);
        }
    }

    Ok(())
}

fn load_config(args: &Args) -> Result<Config> {
    match &args.config {
        Some(path) => Config::load(path),
        None => Config::load(&config::get_config_path()?),
    }
}

/// Load the profile snapshot into a registry clustered with the configured parameters.
fn open_profiles(args: &Args) -> Result<(ProfileStore, ListenerRegistry)> {
    let config = load_config(args)?;
    let store = match &args.profiles {
        Some(path) => ProfileStore::new(path),
        None => ProfileStore::new(config::get_profiles_path()?),
    };
    debug!("Using profile snapshot {}", store.path().display());

    let clusterer = TasteClusterer::new(config.cluster);
    let registry = ListenerRegistry::from_profiles(store.load()?, clusterer);
    Ok((store, registry))
}

fn read_song(path: &Path) -> Result<ResolvedSong> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read song file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Song file {} is not a valid resolved song", path.display()))
}

fn print_ranking(ranked: &[ScoreResult]) {
    if ranked.is_empty() {
        println!("No listeners registered");
        return;
    }

    println!(
        "{:<4} {:<24} {:>8} {:>8} {:>8} {:>7}",
        "#", "listener", "combined", "genre", "lyric", "cluster"
    );
    for (position, result) in ranked.iter().enumerate() {
        let lyric = result
            .lyric_score
            .map_or_else(|| "-".to_string(), |score| format!("{score:.3}"));
        let cluster = result
            .matched_cluster_index
            .map_or_else(|| "-".to_string(), |index| index.to_string());
        println!(
            "{:<4} {:<24} {:>8.3} {:>8.3} {:>8} {:>7}",
            position + 1,
            result.listener_id,
            result.combined_score,
            result.genre_score,
            lyric,
            cluster
        );
    }
}
