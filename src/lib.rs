//! # Bairry - Listener Ranking by Musical Taste
//!
//! Bairry answers one question: given a new song, which listeners are most
//! likely to enjoy it? Every listener carries a taste profile built from the
//! songs they have heard, and each song is compared against that profile
//! along two axes.
//!
//! ## Architecture
//!
//! ### Core Modules
//!
//! - [`vector`] - Embedding arithmetic (mean, cosine similarity/distance)
//! - [`cluster`] - Seeded k-means grouping of a listener's lyric embeddings
//! - [`genre`] - Genre frequency tables and weighted Jaccard scoring
//! - [`lyric`] - Best-cluster cosine scoring of a song's lyrics
//! - [`profile`] - Per-listener taste state and its single mutation
//! - [`pipeline`] - Weighted combination and ranking across listeners
//!
//! ### Supporting Modules
//!
//! - [`registry`] - Thread-safe store of listener profiles
//! - [`resolve`] - Seams to the artist, lyrics and embedding collaborators
//! - [`store`] - JSON profile snapshots for the command-line tool
//! - [`config`] - Clustering/scoring parameters and data directories
//! - [`error`] - Error type shared by the core modules
//! - [`cli`] - Command-line interface definitions with clap integration
//! - [`completion`] - Shell completion generation
//!
//! ## Quick Start Example
//!
//! ```
//! use bairry::genre::GenreSet;
//! use bairry::pipeline::ScoringPipeline;
//! use bairry::profile::{ResolvedSong, TasteProfile};
//! use std::collections::BTreeMap;
//!
//! let rock: GenreSet = ["Rock".to_string()].into_iter().collect();
//!
//! let mut profile = TasteProfile::new();
//! profile.add_song(&rock, Some(vec![0.8, 0.6]))?;
//!
//! let mut profiles = BTreeMap::new();
//! profiles.insert("ana".to_string(), profile);
//!
//! let song = ResolvedSong::new(rock, Some(vec![0.8, 0.6]));
//! let ranked = ScoringPipeline::default().score_song_for_all(&song, &profiles)?;
//! assert!((ranked[0].combined_score - 1.0).abs() < 1e-9);
//! # Ok::<(), bairry::error::TasteError>(())
//! ```
//!
//! ## Scoring Details
//!
//! ### Genre Affinity
//! - Weighted Jaccard between the song's genres and the listener's genre counts
//! - Each listener genre weighs as often as it was heard
//! - Song genres the listener never heard add one to the denominator
//!
//! ### Lyric Affinity
//! - Embeddings are grouped into at most five clusters, one per fifty songs
//! - The song is compared to every centroid and the best match wins
//! - No lyrics or no clusters means no lyric score at all
//!
//! ### Combined Score
//! ```text
//! combined = 0.6 * genre + 0.4 * lyric   (missing lyric counts as 0)
//! ```
//!
//! Both weights and every clustering parameter can be changed through
//! [`config::Config`].

pub mod cli;
pub mod cluster;
pub mod completion;
pub mod config;
pub mod error;
pub mod genre;
pub mod lyric;
pub mod pipeline;
pub mod profile;
pub mod registry;
pub mod resolve;
pub mod store;
pub mod vector;
