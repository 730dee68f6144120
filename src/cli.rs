//! # Command-Line Interface Module
//!
//! This module defines the command-line interface for Bairry using Clap derive macros.
//! Listener state is read from and written back to a JSON profile snapshot, so each
//! invocation is one step of the taste model's lifecycle.
//!
//! ## Commands
//!
//! - `create-listener`: Register a listener with an empty taste profile
//! - `add-song`: Feed one resolved song into a listener's profile
//! - `score`: Rank every listener against a resolved song
//! - `clusters`: Show a listener's taste clusters and top genres
//! - `target-k`: Print the cluster count used for a library size
//!
//! ## Examples
//!
//! ```bash
//! bairry create-listener ana
//! bairry add-song ana --song song.json
//! bairry score --song new_release.json
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shell types supported for completion generation
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

/// Main application arguments structure.
#[derive(Parser, Debug)]
#[command(name = "bairry")]
#[command(about = "Bairry: rank listeners against a song by genre and lyrical taste")]
#[command(version)]
pub struct Args {
    /// Profile snapshot file
    ///
    /// Defaults to `profiles.json` in the platform data directory.
    #[arg(long, global = true, env = "BAIRRY_PROFILES")]
    pub profiles: Option<PathBuf>,

    /// Configuration file (JSON)
    ///
    /// Defaults to `config.json` in the platform config directory. A missing
    /// file means default parameters.
    #[arg(long, global = true, env = "BAIRRY_CONFIG")]
    pub config: Option<PathBuf>,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Enumeration of all available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Register a listener with an empty taste profile
    CreateListener {
        /// Stable listener identifier
        listener: String,
    },

    /// Add one resolved song to a listener's profile
    ///
    /// The song file is JSON of the form
    /// `{"genres": ["jazz", "soul"], "embedding": [0.1, 0.2, ...]}`.
    /// Either field may be omitted. Adding a song with an embedding
    /// reclusters the listener's whole library.
    AddSong {
        /// Listener to update
        listener: String,

        /// Resolved song JSON file
        #[arg(long)]
        song: PathBuf,
    },

    /// Rank every listener against a resolved song
    Score {
        /// Resolved song JSON file
        #[arg(long)]
        song: PathBuf,

        /// Score listeners in parallel
        #[arg(long)]
        parallel: bool,

        /// Print results as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show a listener's taste clusters and most frequent genres
    Clusters {
        /// Listener to inspect
        listener: String,

        /// How many genres to list
        #[arg(long, default_value = "10")]
        top_genres: usize,
    },

    /// Print the target cluster count for a number of embedded songs
    TargetK {
        /// Number of songs with lyric embeddings
        count: usize,
    },

    /// Generate shell completions
    ///
    /// Usage: bairry completion bash > ~/.local/share/bash-completion/completions/bairry
    Completion {
        /// Shell to generate completions for
        shell: Shell,
    },
}
