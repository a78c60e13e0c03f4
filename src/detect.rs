//! Detection passes run against each committed transcript segment: keyword
//! matching against the session's loaded packs and hint matching against
//! scraped reference documents. Results are batched per segment so the
//! client sees one event per detector, not one per match.

use std::collections::HashSet;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::store::{KeywordEntry, ReferenceDocument};

const MIN_HINT_LINE_CHARS: usize = 20;
const MAX_HINT_LINE_CHARS: usize = 200;
const MIN_HINT_WORD_MATCHES: usize = 2;

/// One detected keyword, as delivered to the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeywordHit {
    pub name: String,
    pub description: String,
}

/// One reference-document hint, as delivered to the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HintHit {
    pub resource_id: String,
    pub resource_title: String,
    pub hint: String,
    pub source_url: String,
}

struct CompiledKeyword {
    name: String,
    name_lower: String,
    description: String,
    name_pattern: Option<Regex>,
    synonym_patterns: Vec<Regex>,
}

/// Whole-word keyword detector over the session's keyword entries.
///
/// Patterns are compiled once when the session loads its packs; scanning a
/// segment is regex matching only.
pub struct KeywordMatcher {
    keywords: Vec<CompiledKeyword>,
}

impl KeywordMatcher {
    pub fn new(entries: &[KeywordEntry]) -> Self {
        let keywords = entries
            .iter()
            .map(|entry| CompiledKeyword {
                name: entry.name.clone(),
                name_lower: entry.name.to_lowercase(),
                description: entry.description.clone(),
                name_pattern: word_pattern(&entry.name),
                synonym_patterns: entry
                    .synonyms
                    .iter()
                    .filter_map(|s| word_pattern(s))
                    .collect(),
            })
            .collect();

        Self { keywords }
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// Scans one committed segment. A keyword matches on its canonical name
    /// or any synonym; the first synonym hit settles that entry. Each
    /// keyword name appears at most once per batch.
    pub fn scan(&self, segment: &str) -> Vec<KeywordHit> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut hits = Vec::new();

        for keyword in &self.keywords {
            if seen.contains(keyword.name_lower.as_str()) {
                continue;
            }

            let matched = keyword
                .name_pattern
                .as_ref()
                .is_some_and(|p| p.is_match(segment))
                || keyword.synonym_patterns.iter().any(|p| p.is_match(segment));

            if matched {
                seen.insert(&keyword.name_lower);
                hits.push(KeywordHit {
                    name: keyword.name.clone(),
                    description: keyword.description.clone(),
                });
            }
        }

        hits
    }
}

/// Hint detector over the session's reference documents.
pub struct HintMatcher {
    documents: Vec<ReferenceDocument>,
}

impl HintMatcher {
    pub fn new(documents: Vec<ReferenceDocument>) -> Self {
        Self { documents }
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Scans one committed segment against every document, emitting at most
    /// one hint per document. A line qualifies when at least two distinct
    /// segment words (longer than two characters) occur in it and the line
    /// is between 20 and 200 characters long; the first qualifying line of
    /// a document wins.
    pub fn scan(&self, segment: &str) -> Vec<HintHit> {
        let words: HashSet<String> = segment
            .split_whitespace()
            .map(|w| w.to_lowercase())
            .filter(|w| w.chars().count() > 2)
            .collect();
        if words.len() < MIN_HINT_WORD_MATCHES {
            return Vec::new();
        }

        let mut hits = Vec::new();
        for doc in &self.documents {
            if let Some(line) = first_qualifying_line(&doc.content, &words) {
                hits.push(HintHit {
                    resource_id: doc.id.clone(),
                    resource_title: doc.title.clone(),
                    hint: line.to_string(),
                    source_url: doc.display_url.clone(),
                });
            }
        }

        hits
    }
}

fn first_qualifying_line<'a>(content: &'a str, words: &HashSet<String>) -> Option<&'a str> {
    content.lines().map(str::trim).find(|line| {
        let chars = line.chars().count();
        if !(MIN_HINT_LINE_CHARS..=MAX_HINT_LINE_CHARS).contains(&chars) {
            return false;
        }
        let line_lower = line.to_lowercase();
        let matches = words.iter().filter(|w| line_lower.contains(w.as_str())).count();
        matches >= MIN_HINT_WORD_MATCHES
    })
}

fn word_pattern(phrase: &str) -> Option<Regex> {
    let trimmed = phrase.trim();
    if trimmed.is_empty() {
        return None;
    }
    match Regex::new(&format!(r"(?i)\b{}\b", regex::escape(trimmed))) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!("Failed to compile keyword pattern for {:?}: {}", phrase, e);
            None
        }
    }
}
