use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref RE: Regex = Regex::new(r"[\p{L}\p{N}]+(?:'[\p{L}\p{N}]+)*").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","an","and","are","as","at","be","but","by","for","if","in","into","is","it",
            "no","not","of","on","or","such","that","the","their","then","there","these",
            "they","this","to","was","will","with",
        ];
        words.iter().copied().collect()
    };
}

pub fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// Compatibility decomposition with combining marks dropped, then lowercased.
/// "Café’s" becomes "cafe's".
pub fn fold(text: &str) -> String {
    text.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| if c == '\u{2019}' { '\'' } else { c })
        .collect::<String>()
        .to_lowercase()
}

/// Folded word tokens in input order, stopwords included.
pub fn words(text: &str) -> Vec<String> {
    let folded = fold(text);
    RE.find_iter(&folded).map(|m| m.as_str().to_string()).collect()
}

/// Folded word tokens with stopwords removed, before stemming.
pub fn normalize_words(text: &str) -> Vec<String> {
    words(text).into_iter().filter(|w| !is_stopword(w)).collect()
}

pub fn stem(word: &str) -> String { STEMMER.stem(word).into_owned() }

/// Text to index/query terms: tokenize, lowercase, drop stopwords, stem.
///
/// The same function runs over combined record text at build time and over the
/// free-text part of a query, so both sides share one term space.
pub fn analyze(text: &str) -> Vec<String> {
    normalize_words(text).iter().map(|w| stem(w)).collect()
}
