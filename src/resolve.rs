//! Seams to the external collaborators that turn a raw track into a
//! [`ResolvedSong`].
//!
//! Artist resolution, lyric retrieval/translation and embedding all live
//! outside this crate, usually behind rate-limited HTTP APIs. They are
//! modeled as traits so the surrounding system can plug in real clients and
//! tests can plug in fakes. Whatever they fail to deliver degrades the song
//! (no genres, no embedding) instead of failing it.

use crate::genre::{normalize_genre_tags, GenreSet};
use crate::profile::ResolvedSong;
use crate::vector::Embedding;
use anyhow::Result;
use log::{debug, warn};

/// A canonical artist as found by the artist resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedArtist {
    pub artist_id: String,
    pub canonical_name: String,
    /// Raw genre tags, normalized by [`SongResolver`].
    pub tags: Vec<String>,
    /// Free-form `;`-separated genre field, used when no tag is usable.
    pub genre_field: Option<String>,
}

/// Resolves a (possibly multi-artist) artist string to a canonical artist.
pub trait ArtistResolver {
    /// `Ok(None)` when no candidate is confident enough.
    fn resolve_artist(&self, artist: &str) -> Result<Option<ResolvedArtist>>;
}

/// Fetches lyrics for a song, already translated to the embedding language.
pub trait LyricsSource {
    /// `Ok(None)` when no lyrics exist for the song.
    fn translated_lyrics(&self, title: &str, artist: &str) -> Result<Option<String>>;
}

/// Turns text into a fixed-dimension embedding.
pub trait Embedder {
    fn embed(&self, text: &str) -> Result<Embedding>;
}

/// Composes the three collaborators into a song resolver.
#[derive(Debug, Clone)]
pub struct SongResolver<A, L, E> {
    artists: A,
    lyrics: L,
    embedder: E,
}

impl<A: ArtistResolver, L: LyricsSource, E: Embedder> SongResolver<A, L, E> {
    pub fn new(artists: A, lyrics: L, embedder: E) -> Self {
        Self {
            artists,
            lyrics,
            embedder,
        }
    }

    /// Resolve a track to genres plus an optional lyric embedding.
    ///
    /// Never fails: an unresolved artist yields an empty genre set, missing
    /// lyrics or a failed embedding yield no embedding. Collaborator errors
    /// are logged and treated as missing data.
    pub fn resolve(&self, title: &str, artist: &str) -> ResolvedSong {
        let genres = self.genres_for(artist);
        let embedding = self.embedding_for(title, artist);
        debug!(
            "Resolved `{title}' by `{artist}': {} genres, embedding {}",
            genres.len(),
            if embedding.is_some() { "present" } else { "absent" }
        );
        ResolvedSong::new(genres, embedding)
    }

    fn genres_for(&self, artist: &str) -> GenreSet {
        match self.artists.resolve_artist(artist) {
            Ok(Some(resolved)) => {
                normalize_genre_tags(&resolved.tags, resolved.genre_field.as_deref())
            }
            Ok(None) => {
                warn!("Artist `{artist}' could not be resolved; scoring without genres");
                GenreSet::new()
            }
            Err(e) => {
                warn!("Artist resolution failed for `{artist}': {e:#}");
                GenreSet::new()
            }
        }
    }

    fn embedding_for(&self, title: &str, artist: &str) -> Option<Embedding> {
        let lyrics = match self.lyrics.translated_lyrics(title, artist) {
            Ok(Some(lyrics)) if !lyrics.trim().is_empty() => lyrics,
            Ok(_) => {
                warn!("No lyrics for `{title}' by `{artist}'; scoring without lyrics");
                return None;
            }
            Err(e) => {
                warn!("Lyrics lookup failed for `{title}' by `{artist}': {e:#}");
                return None;
            }
        };

        self.embedder
            .embed(&lyrics)
            .map_err(|e| warn!("Embedding failed for `{title}' by `{artist}': {e:#}"))
            .ok()
    }
}
