//! Title suggestions for a partially typed query.

use crate::index::Generation;
use crate::search::{intersect, rank, BASELINE_SCORE};
use crate::tokenizer::{is_stopword, stem, words};
use crate::DocId;
use std::collections::{BTreeMap, HashSet};

/// Docs containing some term that starts with `word` (or with its stem, so a
/// fully typed "reloaded" still reaches "reload"), each with the summed TF-IDF
/// weight of the expanded terms it contains.
fn prefix_matches(gen: &Generation, word: &str) -> BTreeMap<DocId, f32> {
    let stemmed = stem(word);
    let mut expanded: Vec<&String> = gen.terms_with_prefix(word).iter().collect();
    if stemmed != word {
        expanded.extend(gen.terms_with_prefix(&stemmed).iter().filter(|t| !t.starts_with(word)));
    }
    let mut hits: BTreeMap<DocId, f32> = BTreeMap::new();
    for term in expanded {
        let idf = gen.idf(term);
        for p in gen.postings(term) {
            *hits.entry(p.doc_id).or_insert(0.0) += (1.0 + (p.term_freq as f32).ln()) * idf;
        }
    }
    hits
}

/// Up to `max` distinct titles, best match first, each starting with `prefix`
/// (case-insensitively). Every non-stopword word of the prefix must be the
/// start of some term in the document's combined text.
pub fn autocomplete(gen: &Generation, prefix: &str, max: usize, window: usize) -> Vec<String> {
    if prefix.trim().is_empty() || max == 0 {
        return Vec::new();
    }
    let prefix_words: Vec<String> = words(prefix).into_iter().filter(|w| !is_stopword(w)).collect();

    let scored: Vec<(DocId, f32)> = if prefix_words.is_empty() {
        (0..gen.num_docs() as DocId).map(|d| (d, BASELINE_SCORE)).collect()
    } else {
        let mut acc: Option<BTreeMap<DocId, f32>> = None;
        for word in &prefix_words {
            let hits = prefix_matches(gen, word);
            acc = Some(match acc {
                None => hits,
                Some(prev) => {
                    let a: Vec<DocId> = prev.keys().copied().collect();
                    let b: Vec<DocId> = hits.keys().copied().collect();
                    intersect(&a, &b).into_iter().map(|d| (d, prev[&d] + hits[&d])).collect()
                }
            });
        }
        acc.unwrap_or_default().into_iter().collect()
    };

    let wanted = prefix.to_lowercase();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut out = Vec::new();
    for (doc_id, _) in rank(scored).into_iter().take(window) {
        let Some(rec) = gen.doc(doc_id) else { continue };
        if rec.title.to_lowercase().starts_with(&wanted) && seen.insert(rec.title.as_str()) {
            out.push(rec.title.clone());
            if out.len() >= max {
                break;
            }
        }
    }
    out
}
