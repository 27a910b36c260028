use crate::config::SearchConfig;
use crate::tokenizer::{fold, is_stopword};
use std::collections::{HashMap, HashSet};

/// Corpus vocabulary (folded, unstemmed, stopwords removed) with occurrence counts.
#[derive(Debug, Clone, Default)]
pub struct SpellDictionary {
    words: HashMap<String, u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub word: String,
    pub distance: usize,
    pub frequency: u32,
}

impl SpellDictionary {
    pub fn record(&mut self, word: String) {
        *self.words.entry(word).or_insert(0) += 1;
    }

    pub fn len(&self) -> usize { self.words.len() }

    pub fn is_empty(&self) -> bool { self.words.is_empty() }

    pub fn frequency(&self, word: &str) -> u32 { self.words.get(word).copied().unwrap_or(0) }

    /// Up to `k` dictionary words within `max_distance` edits of `word`, closest
    /// first, then most frequent, then alphabetical.
    pub fn nearest(&self, word: &str, k: usize, max_distance: usize) -> Vec<Candidate> {
        let len = word.chars().count();
        let mut found: Vec<Candidate> = self
            .words
            .iter()
            .filter(|(term, _)| term.chars().count().abs_diff(len) <= max_distance)
            .filter_map(|(term, &frequency)| {
                let distance = strsim::osa_distance(word, term);
                (distance <= max_distance).then(|| Candidate { word: term.clone(), distance, frequency })
            })
            .collect();
        found.sort_by(|a, b| {
            a.distance
                .cmp(&b.distance)
                .then(b.frequency.cmp(&a.frequency))
                .then_with(|| a.word.cmp(&b.word))
        });
        found.truncate(k);
        found
    }

    /// Suggestions for every whitespace-separated word of a raw query, flattened
    /// and deduplicated in discovery order. A word with no close dictionary entry,
    /// or a stopword, is passed through as typed.
    pub fn suggest(&self, query: &str, config: &SearchConfig) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut push = |s: String| {
            if seen.insert(s.clone()) {
                out.push(s);
            }
        };
        for raw in query.split_whitespace() {
            let folded = fold(raw);
            let key = folded.trim_matches(|c: char| !c.is_alphanumeric());
            if key.is_empty() || is_stopword(key) {
                push(raw.to_string());
                continue;
            }
            let threshold = distance_threshold(key, config.max_edit_distance);
            let candidates = self.nearest(key, config.suggestions_per_word, threshold);
            if candidates.is_empty() {
                push(raw.to_string());
            } else {
                candidates.into_iter().for_each(|c| push(c.word));
            }
        }
        out
    }
}

/// Short words tolerate a single edit at most.
fn distance_threshold(word: &str, max: usize) -> usize {
    if word.chars().count() <= 4 { max.min(1) } else { max }
}
