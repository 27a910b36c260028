use crate::error::IngestError;
use crate::record::Record;
use crate::spelling::SpellDictionary;
use crate::tokenizer::{analyze, normalize_words};
use crate::DocId;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use time::Date;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub term_freq: u32,
}

/// Sorted `(value, doc)` pairs for one optional field. Documents without the
/// field are simply not in here, so no range lookup can ever return them.
#[derive(Debug, Clone)]
pub struct RangeIndex<T> {
    entries: Vec<(T, DocId)>,
}

impl<T> Default for RangeIndex<T> {
    fn default() -> Self { Self { entries: Vec::new() } }
}

impl<T: Copy + PartialOrd> RangeIndex<T> {
    fn from_unsorted(mut entries: Vec<(T, DocId)>) -> Self {
        entries.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal).then(a.1.cmp(&b.1)));
        Self { entries }
    }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Ascending doc ids whose value lies in `[min, max]`; `None` means unbounded.
    pub fn lookup(&self, min: Option<T>, max: Option<T>) -> Vec<DocId> {
        let start = match min {
            Some(lo) => self.entries.partition_point(|(v, _)| *v < lo),
            None => 0,
        };
        let end = match max {
            Some(hi) => self.entries.partition_point(|(v, _)| *v <= hi),
            None => self.entries.len(),
        };
        if start >= end {
            return Vec::new();
        }
        let mut ids: Vec<DocId> = self.entries[start..end].iter().map(|(_, d)| *d).collect();
        ids.sort_unstable();
        ids
    }
}

/// One immutable, fully built snapshot of the index.
#[derive(Debug, Default)]
pub struct Generation {
    number: u64,
    built_at: String,
    postings: HashMap<String, Vec<Posting>>,
    /// Every distinct term, sorted, for prefix scans.
    terms: Vec<String>,
    runtime: RangeIndex<i32>,
    revenue: RangeIndex<i64>,
    vote_average: RangeIndex<f64>,
    release_date: RangeIndex<Date>,
    docs: Vec<Record>,
    by_external_id: HashMap<String, DocId>,
    spelling: SpellDictionary,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationStats {
    pub generation: u64,
    pub built_at: String,
    pub num_docs: usize,
    pub num_terms: usize,
    pub num_spelling_words: usize,
}

impl Generation {
    pub fn empty(number: u64) -> Self {
        Self { number, built_at: now_rfc3339(), ..Default::default() }
    }

    /// Build a generation from scratch. Invalid records (blank or duplicate id)
    /// are skipped; if nothing survives the build is refused.
    pub fn build(number: u64, records: Vec<Record>) -> Result<Self, IngestError> {
        let total = records.len();
        if u32::try_from(total).is_err() {
            return Err(IngestError::TooManyRecords { count: total });
        }

        let mut docs: Vec<Record> = Vec::with_capacity(total);
        let mut by_external_id: HashMap<String, DocId> = HashMap::with_capacity(total);
        let mut skipped = 0usize;
        for mut rec in records {
            if rec.id.trim().is_empty() {
                tracing::warn!(title = %rec.title, "skipping record with blank id");
                skipped += 1;
                continue;
            }
            if by_external_id.contains_key(&rec.id) {
                tracing::warn!(id = %rec.id, "skipping record with duplicate id");
                skipped += 1;
                continue;
            }
            if matches!(rec.vote_average, Some(v) if !v.is_finite()) {
                tracing::warn!(id = %rec.id, "non-finite vote average treated as absent");
                rec.vote_average = None;
            }
            by_external_id.insert(rec.id.clone(), docs.len() as DocId);
            docs.push(rec);
        }
        if docs.is_empty() {
            return Err(IngestError::NoValidRecords { skipped });
        }

        let mut postings: HashMap<String, Vec<Posting>> = HashMap::new();
        let mut runtime = Vec::new();
        let mut revenue = Vec::new();
        let mut vote_average = Vec::new();
        let mut release_date = Vec::new();
        let mut spelling = SpellDictionary::default();

        for (idx, rec) in docs.iter().enumerate() {
            let doc_id = idx as DocId;
            let text = rec.combined_text();

            let mut tf_counts: HashMap<String, u32> = HashMap::new();
            for term in analyze(&text) {
                *tf_counts.entry(term).or_insert(0) += 1;
            }
            // doc ids are visited in ascending order, so every list stays sorted
            for (term, term_freq) in tf_counts {
                postings.entry(term).or_default().push(Posting { doc_id, term_freq });
            }

            for word in normalize_words(&text) {
                spelling.record(word);
            }

            if let Some(v) = rec.runtime { runtime.push((v, doc_id)); }
            if let Some(v) = rec.revenue { revenue.push((v, doc_id)); }
            if let Some(v) = rec.vote_average { vote_average.push((v, doc_id)); }
            if let Some(v) = rec.release_date { release_date.push((v, doc_id)); }
        }

        let mut terms: Vec<String> = postings.keys().cloned().collect();
        terms.sort_unstable();

        let generation = Self {
            number,
            built_at: now_rfc3339(),
            postings,
            terms,
            runtime: RangeIndex::from_unsorted(runtime),
            revenue: RangeIndex::from_unsorted(revenue),
            vote_average: RangeIndex::from_unsorted(vote_average),
            release_date: RangeIndex::from_unsorted(release_date),
            docs,
            by_external_id,
            spelling,
        };
        tracing::info!(
            generation = number,
            num_docs = generation.num_docs(),
            num_terms = generation.terms.len(),
            skipped,
            "built generation"
        );
        Ok(generation)
    }

    pub fn number(&self) -> u64 { self.number }

    pub fn num_docs(&self) -> usize { self.docs.len() }

    pub fn is_empty(&self) -> bool { self.docs.is_empty() }

    pub fn stats(&self) -> GenerationStats {
        GenerationStats {
            generation: self.number,
            built_at: self.built_at.clone(),
            num_docs: self.docs.len(),
            num_terms: self.terms.len(),
            num_spelling_words: self.spelling.len(),
        }
    }

    pub fn doc(&self, doc_id: DocId) -> Option<&Record> { self.docs.get(doc_id as usize) }

    pub fn docs(&self) -> &[Record] { &self.docs }

    pub fn lookup(&self, external_id: &str) -> Option<&Record> {
        self.by_external_id.get(external_id).and_then(|&d| self.doc(d))
    }

    pub fn postings(&self, term: &str) -> &[Posting] {
        self.postings.get(term).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn doc_freq(&self, term: &str) -> usize { self.postings(term).len() }

    /// Occurrences of `term` in `doc_id`, 0 if absent.
    pub fn term_freq(&self, term: &str, doc_id: DocId) -> u32 {
        let plist = self.postings(term);
        match plist.binary_search_by_key(&doc_id, |p| p.doc_id) {
            Ok(i) => plist[i].term_freq,
            Err(_) => 0,
        }
    }

    /// Sorted terms beginning with `prefix`.
    pub fn terms_with_prefix(&self, prefix: &str) -> &[String] {
        let start = self.terms.partition_point(|t| t.as_str() < prefix);
        let len = self.terms[start..].partition_point(|t| t.starts_with(prefix));
        &self.terms[start..start + len]
    }

    pub fn terms(&self) -> &[String] { &self.terms }

    pub fn runtime_index(&self) -> &RangeIndex<i32> { &self.runtime }

    pub fn revenue_index(&self) -> &RangeIndex<i64> { &self.revenue }

    pub fn vote_average_index(&self) -> &RangeIndex<f64> { &self.vote_average }

    pub fn release_date_index(&self) -> &RangeIndex<Date> { &self.release_date }

    pub fn spelling(&self) -> &SpellDictionary { &self.spelling }

    /// Smoothed inverse document frequency, always positive for an indexed term.
    pub fn idf(&self, term: &str) -> f32 {
        let n = self.num_docs().max(1) as f32;
        let df = self.doc_freq(term).max(1) as f32;
        (1.0 + n / df).ln()
    }
}

fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default()
}
