use crate::tokenizer::analyze;
use time::Date;

/// Upper end of the vote-average scale.
pub const VOTE_AVERAGE_CEILING: f64 = 10.0;

/// A search as a caller phrases it. Every bound is independently optional.
/// `page_size` is taken literally; [`SearchRequest::text`] starts at 10.
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub text: Option<String>,
    pub page: usize,
    pub page_size: usize,
    pub runtime_min: Option<i32>,
    pub runtime_max: Option<i32>,
    pub revenue_min: Option<i64>,
    pub revenue_max: Option<i64>,
    pub vote_average_min: Option<f64>,
    pub release_date_start: Option<Date>,
    pub release_date_end: Option<Date>,
}

impl SearchRequest {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: Some(text.into()), page_size: 10, ..Default::default() }
    }

    pub fn page(mut self, page: usize, page_size: usize) -> Self {
        self.page = page;
        self.page_size = page_size;
        self
    }

    pub fn runtime(mut self, min: Option<i32>, max: Option<i32>) -> Self {
        self.runtime_min = min;
        self.runtime_max = max;
        self
    }

    pub fn revenue(mut self, min: Option<i64>, max: Option<i64>) -> Self {
        self.revenue_min = min;
        self.revenue_max = max;
        self
    }

    pub fn vote_average_min(mut self, min: f64) -> Self {
        self.vote_average_min = Some(min);
        self
    }

    pub fn release_date(mut self, start: Option<Date>, end: Option<Date>) -> Self {
        self.release_date_start = start;
        self.release_date_end = end;
        self
    }

    /// The free text, if it has anything besides whitespace.
    pub fn search_text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// Every term must occur in the document's combined text.
    Terms(Vec<String>),
    Runtime { min: Option<i32>, max: Option<i32> },
    Revenue { min: Option<i64>, max: Option<i64> },
    VoteAverage { min: f64, max: f64 },
    ReleaseDate { start: Option<Date>, end: Option<Date> },
}

impl Clause {
    /// Bounds that no value can satisfy. Such a clause matches nothing.
    pub fn is_unsatisfiable(&self) -> bool {
        match self {
            Clause::Terms(terms) => terms.is_empty(),
            Clause::Runtime { min: Some(lo), max: Some(hi) } => lo > hi,
            Clause::Revenue { min: Some(lo), max: Some(hi) } => lo > hi,
            Clause::VoteAverage { min, max } => !(min <= max),
            Clause::ReleaseDate { start: Some(lo), end: Some(hi) } => lo > hi,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    MatchAll,
    /// Conjunction of clauses; never empty.
    And(Vec<Clause>),
}

impl Query {
    pub fn text_terms(&self) -> &[String] {
        match self {
            Query::And(clauses) => clauses
                .iter()
                .find_map(|c| match c {
                    Clause::Terms(t) => Some(t.as_slice()),
                    _ => None,
                })
                .unwrap_or(&[]),
            Query::MatchAll => &[],
        }
    }
}

/// Turn a request into an AND of clauses. Text that analyzes to nothing adds no
/// clause; a request with neither text terms nor bounds matches every document.
pub fn build_query(req: &SearchRequest) -> Query {
    let mut clauses = Vec::new();

    if let Some(text) = req.search_text() {
        let mut terms: Vec<String> = Vec::new();
        for t in analyze(text) {
            if !terms.contains(&t) {
                terms.push(t);
            }
        }
        if !terms.is_empty() {
            clauses.push(Clause::Terms(terms));
        }
    }
    if req.runtime_min.is_some() || req.runtime_max.is_some() {
        clauses.push(Clause::Runtime { min: req.runtime_min, max: req.runtime_max });
    }
    if req.revenue_min.is_some() || req.revenue_max.is_some() {
        clauses.push(Clause::Revenue { min: req.revenue_min, max: req.revenue_max });
    }
    if let Some(min) = req.vote_average_min {
        clauses.push(Clause::VoteAverage { min, max: VOTE_AVERAGE_CEILING });
    }
    if req.release_date_start.is_some() || req.release_date_end.is_some() {
        clauses.push(Clause::ReleaseDate { start: req.release_date_start, end: req.release_date_end });
    }

    if clauses.is_empty() {
        Query::MatchAll
    } else {
        Query::And(clauses)
    }
}
