//! Genre affinity: frequency-weighted Jaccard similarity between a song's
//! genres and a listener's accumulated genre counts.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Genres attached to one song. Ordered, so iteration is deterministic.
pub type GenreSet = BTreeSet<String>;

/// How often each genre has appeared in a listener's library.
///
/// Counts only ever grow. A genre that is absent has count 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenreFrequencyTable {
    counts: BTreeMap<String, u64>,
}

impl GenreFrequencyTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one occurrence of every genre in `genres`.
    pub fn record(&mut self, genres: &GenreSet) {
        for genre in genres {
            *self.counts.entry(genre.clone()).or_insert(0) += 1;
        }
    }

    #[must_use]
    pub fn count(&self, genre: &str) -> u64 {
        self.counts.get(genre).copied().unwrap_or(0)
    }

    /// Sum of all counts.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> + '_ {
        self.counts.iter().map(|(genre, &count)| (genre.as_str(), count))
    }

    /// The `limit` most frequent genres, ties in alphabetical order.
    #[must_use]
    pub fn top(&self, limit: usize) -> Vec<(&str, u64)> {
        let mut ranked: Vec<(&str, u64)> = self.iter().collect();
        ranked.sort_by(|(ga, ca), (gb, cb)| cb.cmp(ca).then(ga.cmp(gb)));
        ranked.truncate(limit);
        ranked
    }
}

impl FromIterator<(String, u64)> for GenreFrequencyTable {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (genre, count) in iter {
            *table.counts.entry(genre).or_insert(0) += count;
        }
        table
    }
}

/// Frequency-weighted Jaccard scorer.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenreAffinityScorer;

impl GenreAffinityScorer {
    /// Score `song_genres` against `table`, in `[0, 1]`.
    ///
    /// # Mathematical Foundation
    ///
    /// ```text
    /// intersection = sum(count(g) for g in song if count(g) > 0)
    /// union        = total(table) + |{g in song : count(g) == 0}|
    /// score        = intersection / union        (0 when union == 0)
    /// ```
    ///
    /// The intersection weight is the listener's count for each song genre
    /// they have heard. The union weight is the listener's total count plus
    /// one for each song genre they have never heard. Both are integer sums,
    /// so the only floating-point step is the final division. An empty union
    /// scores `0.0`.
    ///
    /// # Examples
    ///
    /// ```
    /// use bairry::genre::{GenreAffinityScorer, GenreFrequencyTable, GenreSet};
    ///
    /// let table: GenreFrequencyTable = [("Jazz", 5), ("Pop", 2), ("Funk", 3)]
    ///     .into_iter()
    ///     .map(|(genre, count)| (genre.to_string(), count))
    ///     .collect();
    /// let song: GenreSet = ["Jazz", "Soul"].into_iter().map(String::from).collect();
    ///
    /// // Jazz hits 5; the union is 10 heard plus 1 for the unheard Soul.
    /// assert_eq!(GenreAffinityScorer::score(&song, &table), 5.0 / 11.0);
    /// ```
    #[must_use]
    pub fn score(song_genres: &GenreSet, table: &GenreFrequencyTable) -> f64 {
        let (intersection, unseen) = song_genres
            .iter()
            .fold((0u64, 0u64), |(hit, new), genre| match table.count(genre) {
                0 => (hit, new + 1),
                count => (hit + count, new),
            });
        let union = table.total() + unseen;

        match union {
            0 => 0.0,
            #[allow(clippy::cast_precision_loss)]
            union => intersection as f64 / union as f64,
        }
    }
}

/// Turn raw artist tags into a clean genre set.
///
/// Tags are trimmed and lowercased; anything of two characters or fewer is
/// jargon, not a genre. When no tag survives, `fallback_field` is read as a
/// `;`-separated genre list instead.
///
/// ```
/// use bairry::genre::normalize_genre_tags;
///
/// let genres = normalize_genre_tags(&[" Jazz ", "uk", "jazz", "Hard Bop"], None);
/// assert_eq!(genres.into_iter().collect::<Vec<_>>(), vec!["hard bop", "jazz"]);
/// ```
#[must_use]
pub fn normalize_genre_tags<S: AsRef<str>>(tags: &[S], fallback_field: Option<&str>) -> GenreSet {
    let genres: GenreSet = tags
        .iter()
        .map(|tag| tag.as_ref().trim().to_lowercase())
        .filter(|tag| tag.chars().count() > 2)
        .collect();

    if !genres.is_empty() {
        return genres;
    }

    fallback_field
        .map(|field| {
            field
                .split(';')
                .map(|genre| genre.trim().to_lowercase())
                .filter(|genre| !genre.is_empty())
                .collect()
        })
        .unwrap_or_default()
}
