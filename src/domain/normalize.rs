//! Canonical forms of artist names and titles used to improve hit rates
//! against external lookup indexes. Never used for storage.

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::track::SongKey;

static FEATURING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(featuring|feat|ft)\b.*").expect("featuring pattern is valid")
});

const APOSTROPHES: &[char] = &['\u{2019}', '\u{2018}', '\u{02BC}', '`'];
const STRIPPED: &[char] = &['!', '?', ',', '.', '(', ')'];

/// Removes "feat", "ft" or "featuring" and everything after it.
pub fn strip_featuring(text: &str) -> String {
    FEATURING.replace(text, "").trim().to_string()
}

/// Main normalized form.
///
/// Rules, in order: featuring suffix removed, `&` becomes "and",
/// apostrophe variants become `'`, `! ? , . ( )` are dropped,
/// whitespace collapsed and trimmed.
pub fn normalize(text: &str) -> String {
    let without_feat = strip_featuring(text);
    let with_and = without_feat.replace('&', " and ");

    let cleaned: String = with_and
        .chars()
        .filter(|c| !STRIPPED.contains(c))
        .map(|c| if APOSTROPHES.contains(&c) { '\'' } else { c })
        .collect();

    collapse_whitespace(&cleaned)
}

/// [`normalize`] with apostrophes removed entirely.
pub fn normalize_without_apostrophes(text: &str) -> String {
    collapse_whitespace(&normalize(text).replace('\'', ""))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Ordered list of lookup candidates without duplicates.
///
/// Consumers try candidates front to back and stop at the first match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidates<T>(Vec<T>);

impl<T: PartialEq> Candidates<T> {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Appends `candidate` unless an equal one is already queued.
    pub fn push(&mut self, candidate: T) {
        if !self.0.contains(&candidate) {
            self.0.push(candidate);
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }
}

impl<T: PartialEq> Default for Candidates<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> IntoIterator for Candidates<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Candidates<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Raw pair first, then the pair with both parts normalized.
pub fn lyrics_candidates(key: &SongKey) -> Candidates<SongKey> {
    let mut candidates = Candidates::new();
    candidates.push(key.clone());

    let normalized = SongKey::new(normalize(&key.artist), normalize(&key.title));
    if !normalized.artist.is_empty() && !normalized.title.is_empty() {
        candidates.push(normalized);
    }
    candidates
}

/// Up to four title variants for the audio-metadata search:
/// raw, normalized, normalized without apostrophes,
/// normalized with a trailing apostrophe dropped ("Darlin'" -> "Darlin").
pub fn audio_title_candidates(title: &str) -> Candidates<String> {
    let mut candidates = Candidates::new();
    candidates.push(title.to_string());

    let normalized = normalize(title);
    let variants = [
        normalized.clone(),
        normalize_without_apostrophes(title),
        normalized
            .strip_suffix('\'')
            .map(|t| t.trim_end().to_string())
            .unwrap_or_default(),
    ];

    for variant in variants {
        if !variant.is_empty() {
            candidates.push(variant);
        }
    }
    candidates
}
