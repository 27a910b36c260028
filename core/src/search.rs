//! Clause evaluation, TF-IDF ranking and pagination over one generation.

use crate::config::SearchConfig;
use crate::index::Generation;
use crate::query::{build_query, Clause, Query, SearchRequest};
use crate::record::Record;
use crate::DocId;
use serde::Serialize;
use std::cmp::Ordering;

/// Score given to every match when no free-text term took part.
pub const BASELINE_SCORE: f32 = 1.0;

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub score: f32,
    pub record: Record,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchResults {
    /// Number of matches, capped at the configured result window.
    pub total_matches: usize,
    pub documents: Vec<SearchHit>,
    /// Spelling alternatives; only filled when nothing matched.
    pub suggestions: Vec<String>,
}

/// Intersection of two ascending id lists by linear merge.
pub fn intersect(a: &[DocId], b: &[DocId]) -> Vec<DocId> {
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}

fn intersect_all(mut lists: Vec<Vec<DocId>>) -> Vec<DocId> {
    if lists.is_empty() {
        return Vec::new();
    }
    // shortest first keeps every intermediate result small
    lists.sort_by_key(Vec::len);
    let mut iter = lists.into_iter();
    let mut acc = iter.next().unwrap_or_default();
    for next in iter {
        if acc.is_empty() {
            break;
        }
        acc = intersect(&acc, &next);
    }
    acc
}

/// Ascending ids of the documents satisfying one clause.
pub fn evaluate_clause(gen: &Generation, clause: &Clause) -> Vec<DocId> {
    if clause.is_unsatisfiable() {
        return Vec::new();
    }
    match clause {
        Clause::Terms(terms) => intersect_all(
            terms
                .iter()
                .map(|t| gen.postings(t).iter().map(|p| p.doc_id).collect())
                .collect(),
        ),
        Clause::Runtime { min, max } => gen.runtime_index().lookup(*min, *max),
        Clause::Revenue { min, max } => gen.revenue_index().lookup(*min, *max),
        Clause::VoteAverage { min, max } => gen.vote_average_index().lookup(Some(*min), Some(*max)),
        Clause::ReleaseDate { start, end } => gen.release_date_index().lookup(*start, *end),
    }
}

/// Ascending ids of every document matching the whole query.
pub fn evaluate(gen: &Generation, query: &Query) -> Vec<DocId> {
    match query {
        Query::MatchAll => (0..gen.num_docs() as DocId).collect(),
        Query::And(clauses) => intersect_all(clauses.iter().map(|c| evaluate_clause(gen, c)).collect()),
    }
}

/// Sum over `terms` of `(1 + ln tf) * idf`. Rarer terms and repeated
/// occurrences both raise the score.
pub fn score(gen: &Generation, terms: &[String], doc_id: DocId) -> f32 {
    if terms.is_empty() {
        return BASELINE_SCORE;
    }
    terms
        .iter()
        .map(|t| {
            let tf = gen.term_freq(t, doc_id);
            if tf == 0 {
                0.0
            } else {
                (1.0 + (tf as f32).ln()) * gen.idf(t)
            }
        })
        .sum()
}

/// Descending score, ascending doc id on ties.
pub fn rank(mut scored: Vec<(DocId, f32)>) -> Vec<(DocId, f32)> {
    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    scored
}

/// Rows `[page * page_size, page * page_size + page_size)` of `ranked`; empty past the end.
pub fn paginate<T: Clone>(ranked: &[T], page: usize, page_size: usize) -> Vec<T> {
    let start = match page.checked_mul(page_size) {
        Some(s) if s < ranked.len() => s,
        _ => return Vec::new(),
    };
    let end = start.saturating_add(page_size).min(ranked.len());
    ranked[start..end].to_vec()
}

/// Matching documents scored and ordered, truncated to `window`.
pub fn ranked_matches(gen: &Generation, query: &Query, window: usize) -> Vec<(DocId, f32)> {
    let matches = evaluate(gen, query);
    let terms = query.text_terms();
    let mut ranked = rank(matches.into_iter().map(|d| (d, score(gen, terms, d))).collect());
    ranked.truncate(window);
    ranked
}

/// Run a search request against one generation. The page is exactly
/// `[page * page_size, page * page_size + page_size)` of the ranked window, so a
/// zero page size yields no documents but still reports the total.
pub fn search(gen: &Generation, req: &SearchRequest, config: &SearchConfig) -> SearchResults {
    let query = build_query(req);
    let ranked = ranked_matches(gen, &query, config.result_window);
    let clauses = match &query {
        Query::And(c) => c.len(),
        Query::MatchAll => 0,
    };
    tracing::debug!(
        generation = gen.number(),
        clauses,
        matches = ranked.len(),
        page = req.page,
        page_size = req.page_size,
        "search executed"
    );

    let documents = paginate(&ranked, req.page, req.page_size)
        .into_iter()
        .filter_map(|(doc_id, score)| gen.doc(doc_id).map(|r| SearchHit { doc_id, score, record: r.clone() }))
        .collect();

    let suggestions = match req.search_text() {
        Some(text) if ranked.is_empty() => gen.spelling().suggest(text, config),
        _ => Vec::new(),
    };

    SearchResults { total_matches: ranked.len(), documents, suggestions }
}
