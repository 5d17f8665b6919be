//! Formatting configuration.
//!
//! # Responsibility
//! - Hold the auto-format/auto-capitalize toggles and the word lists the
//!   formatting rules consult.
//! - Provide defaults so a host can deserialize a partial config.
//!
//! # Invariants
//! - Word lists are compared case-insensitively; `normalized()` stores them
//!   trimmed and lower-cased with blanks removed.
//! - A config is a plain value owned by a `FieldFormatter`; there is no
//!   process-wide formatting state.

use serde::{Deserialize, Serialize};

const DEFAULT_ARTICLES: &[&str] = &["the"];
const DEFAULT_NAME_SUFFIXES: &[&str] = &["jr.", "jr", "sr.", "sr", "ii", "iii", "iv"];
const DEFAULT_SURNAME_PREFIXES: &[&str] = &["de", "di", "du", "da", "le", "la", "van", "von"];
const DEFAULT_NO_CAPITALIZE: &[&str] = &["a", "an", "and", "in", "of", "the", "to"];

/// Settings consumed by `FieldFormatter`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    /// Apply title/name/date rules to values with a matching format mode.
    pub auto_format: bool,
    /// Title-case values when no structural rule applies.
    pub auto_capitalize: bool,
    /// Leading words moved to the end of titles ("The Shining" -> "Shining, The").
    pub articles: Vec<String>,
    /// Trailing words kept with the surname ("Jr.", "III").
    pub name_suffixes: Vec<String>,
    /// Words that belong to the surname when they precede it ("van", "de").
    pub surname_prefixes: Vec<String>,
    /// Words left lower-case by `capitalize`.
    pub no_capitalize: Vec<String>,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            auto_format: true,
            auto_capitalize: true,
            articles: to_owned_list(DEFAULT_ARTICLES),
            name_suffixes: to_owned_list(DEFAULT_NAME_SUFFIXES),
            surname_prefixes: to_owned_list(DEFAULT_SURNAME_PREFIXES),
            no_capitalize: to_owned_list(DEFAULT_NO_CAPITALIZE),
        }
    }
}

impl FormatConfig {
    /// Config with both toggles off: every value is returned as entered.
    pub fn verbatim() -> Self {
        Self {
            auto_format: false,
            auto_capitalize: false,
            ..Self::default()
        }
    }

    /// Returns a copy with every word list trimmed, lower-cased and deduplicated.
    ///
    /// Order is preserved; the first occurrence of a word wins.
    pub fn normalized(&self) -> Self {
        Self {
            auto_format: self.auto_format,
            auto_capitalize: self.auto_capitalize,
            articles: normalize_words(&self.articles),
            name_suffixes: normalize_words(&self.name_suffixes),
            surname_prefixes: normalize_words(&self.surname_prefixes),
            no_capitalize: normalize_words(&self.no_capitalize),
        }
    }
}

fn to_owned_list(words: &[&str]) -> Vec<String> {
    words.iter().map(|word| (*word).to_string()).collect()
}

fn normalize_words(words: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(words.len());
    for word in words {
        let word = word.trim().to_lowercase();
        if !word.is_empty() && !normalized.contains(&word) {
            normalized.push(word);
        }
    }
    normalized
}
