use std::collections::HashMap;

use regex::Regex;
use tracing::warn;

use crate::store::KeywordPack;

/// Per-session substitution tables built from the session's keyword packs.
///
/// Maps phonetic spellings and synonyms to their canonical keyword names so
/// committed transcript text can be corrected before it reaches the client.
/// Matching is whole-word, case-insensitive, and longest-variant-first so a
/// multi-word synonym is never shadowed by one of its constituent words.
pub struct VocabularyIndex {
    phonetic: HashMap<String, String>,
    synonyms: HashMap<String, String>,
    pattern: Option<Regex>,
}

impl VocabularyIndex {
    pub fn build(packs: &[KeywordPack]) -> Self {
        let mut phonetic = HashMap::new();
        let mut synonyms = HashMap::new();

        for pack in packs {
            for entry in &pack.keywords {
                // A variant spelled exactly like its canonical name would be an
                // identity rewrite; case-only differences still substitute.
                if let Some(spelling) = &entry.phonetic_pronunciation {
                    if !spelling.is_empty() && spelling != &entry.name {
                        phonetic.insert(spelling.to_lowercase(), entry.name.clone());
                    }
                }
                for synonym in &entry.synonyms {
                    if !synonym.is_empty() && synonym != &entry.name {
                        synonyms.insert(synonym.to_lowercase(), entry.name.clone());
                    }
                }
            }
        }

        let pattern = compile_pattern(phonetic.keys().chain(synonyms.keys()));

        Self {
            phonetic,
            synonyms,
            pattern,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pattern.is_none()
    }

    /// Replaces every phonetic/synonym occurrence with its canonical term.
    ///
    /// Already-canonical text passes through unchanged, so applying the index
    /// a second time is a no-op.
    pub fn apply(&self, text: &str) -> String {
        let Some(pattern) = &self.pattern else {
            return text.to_string();
        };

        pattern
            .replace_all(text, |caps: &regex::Captures| {
                let key = caps[0].to_lowercase();
                self.phonetic
                    .get(&key)
                    .or_else(|| self.synonyms.get(&key))
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

/// Builds one case-insensitive whole-word alternation over every variant,
/// longest variant first so overlapping entries resolve to the longer match.
fn compile_pattern<'a>(variants: impl Iterator<Item = &'a String>) -> Option<Regex> {
    let mut variants: Vec<&str> = variants.map(String::as_str).collect();
    if variants.is_empty() {
        return None;
    }
    variants.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let alternation = variants
        .iter()
        .map(|v| regex::escape(v))
        .collect::<Vec<_>>()
        .join("|");

    match Regex::new(&format!(r"(?i)\b(?:{alternation})\b")) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!("Failed to compile vocabulary pattern: {}", e);
            None
        }
    }
}
