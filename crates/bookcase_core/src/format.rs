//! Value formatting rules.
//!
//! # Responsibility
//! - Turn raw field values into display strings per `FormatMode`.
//! - Normalize user input before it is stored on a unit.
//!
//! # Invariants
//! - Every function here is total: no panics, no errors, no side effects.
//! - Formatted output never contains a comma that is not followed by exactly
//!   one space, and never contains runs of whitespace.
//! - `format_title` and `format_name` are idempotent under the default config.

use crate::config::FormatConfig;
use crate::model::attribute::{AttributeDef, AttributeKind, FormatMode};
use once_cell::sync::Lazy;
use regex::Regex;

/// Separator between entries of a multi-valued field.
pub const VALUE_DELIMITER: &str = "; ";
/// Separator between table columns.
pub const COLUMN_DELIMITER: &str = "::";
/// Separator between table rows.
pub const ROW_DELIMITER: char = '\u{2028}';

static COMMA_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*,\s*").expect("valid comma regex"));
static SEMICOLON_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*;\s*").expect("valid semicolon regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Formatting rules bound to one `FormatConfig`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldFormatter {
    config: FormatConfig,
}

impl FieldFormatter {
    /// Creates a formatter; word lists are normalized on the way in.
    pub fn new(config: FormatConfig) -> Self {
        Self {
            config: config.normalized(),
        }
    }

    pub fn config(&self) -> &FormatConfig {
        &self.config
    }

    /// Formats `value` as a title, moving a leading article to the end.
    ///
    /// "the  shining ,part one" -> "shining, part one, the"
    pub fn format_title(&self, value: &str) -> String {
        let text = tidy_commas(value);
        if self.ends_with_article(&text) {
            return text;
        }
        for article in &self.config.articles {
            if let Some((leading, rest)) = split_leading_word(&text, article) {
                return format!("{rest}, {leading}");
            }
        }
        text
    }

    /// Formats personal names as "Surname, Given".
    ///
    /// With `allow_multiple`, `value` is treated as a `;`-separated list and
    /// every entry is formatted on its own.
    pub fn format_name(&self, value: &str, allow_multiple: bool) -> String {
        let entries: Vec<&str> = if allow_multiple {
            value
                .split(';')
                .map(str::trim)
                .filter(|entry| !entry.is_empty())
                .collect()
        } else {
            vec![value]
        };

        let formatted: Vec<String> = entries
            .into_iter()
            .map(|entry| self.format_single_name(entry))
            .filter(|entry| !entry.is_empty())
            .collect();
        formatted.join(VALUE_DELIMITER)
    }

    /// Reserved for date formatting; returns the input unchanged.
    pub fn format_date(&self, value: &str) -> String {
        value.to_string()
    }

    /// Applies the structural rule for `mode`, ignoring the config toggles.
    pub fn format(&self, value: &str, mode: FormatMode) -> String {
        match mode {
            FormatMode::Title => self.format_title(value),
            FormatMode::PersonName => self.format_name(value, true),
            FormatMode::Date => self.format_date(value),
            FormatMode::None | FormatMode::Plain => value.to_string(),
        }
    }

    /// Title-cases words, leaving configured small words and surname
    /// prefixes in lower case. The first word is always capitalized.
    pub fn capitalize(&self, value: &str) -> String {
        let mut out = String::with_capacity(value.len());
        let mut first_word = true;
        for piece in value.split_inclusive(is_word_break) {
            let (word, tail) = match piece.char_indices().last() {
                Some((idx, c)) if is_word_break(c) => (&piece[..idx], &piece[idx..]),
                _ => (piece, ""),
            };
            if !word.is_empty() {
                if first_word || !self.stays_lower_case(word) {
                    out.push_str(&upper_first(word));
                } else {
                    out.push_str(word);
                }
                first_word = false;
            }
            out.push_str(tail);
        }
        out
    }

    /// Formats one value honoring the `auto_format`/`auto_capitalize` toggles.
    pub fn apply(&self, value: &str, mode: FormatMode) -> String {
        if value.is_empty() || mode == FormatMode::None {
            return value.to_string();
        }
        let auto_format = self.config.auto_format;
        let auto_capitalize = self.config.auto_capitalize;

        match mode {
            FormatMode::Title if auto_format => self.format_title(value),
            FormatMode::PersonName if auto_format => self.format_name(value, false),
            FormatMode::Date if auto_format => self.format_date(value),
            _ if auto_capitalize => self.capitalize(value),
            _ => value.to_string(),
        }
    }

    /// Formats a complete raw field value for `attribute`.
    ///
    /// Tables format the first column of each row; multi-valued fields
    /// format each entry separately.
    pub fn format_value(&self, attribute: &AttributeDef, raw: &str) -> String {
        if raw.is_empty() {
            return String::new();
        }
        let mode = attribute.format_mode;
        if attribute.kind.is_table() {
            return raw
                .split(ROW_DELIMITER)
                .map(|row| {
                    let mut columns: Vec<String> =
                        row.split(COLUMN_DELIMITER).map(str::to_string).collect();
                    if let Some(first) = columns.first_mut() {
                        *first = join_values(
                            split_values(first).into_iter().map(|v| self.apply(v, mode)),
                        );
                    }
                    columns.join(COLUMN_DELIMITER)
                })
                .collect::<Vec<_>>()
                .join(&ROW_DELIMITER.to_string());
        }
        if attribute.allows_multiple() {
            return join_values(
                split_values(raw)
                    .into_iter()
                    .map(|value| self.apply(value, mode)),
            );
        }
        self.apply(raw, mode)
    }

    /// Sort key for titles: a leading article is dropped.
    pub fn sort_key_title(&self, title: &str) -> String {
        let trimmed = title.trim();
        for article in &self.config.articles {
            if let Some((_, rest)) = split_leading_word(trimmed, article) {
                return rest.to_string();
            }
        }
        trimmed.to_string()
    }

    fn format_single_name(&self, entry: &str) -> String {
        if entry.contains(',') {
            return tidy_commas(entry);
        }

        let mut words: Vec<&str> = entry.split_whitespace().collect();
        if words.len() < 2 {
            return words.join(" ");
        }

        let suffix = match words.last() {
            Some(last) if words.len() > 2 && self.is_name_suffix(last) => words.pop(),
            _ => None,
        };
        let mut surname: Vec<&str> = words.pop().into_iter().collect();
        while words.len() > 1 {
            match words.last() {
                Some(word) if self.is_surname_prefix(word) => {
                    surname.insert(0, word);
                    words.pop();
                }
                _ => break,
            }
        }

        let surname = surname.join(" ");
        match suffix {
            Some(suffix) => format!("{surname}, {suffix}, {}", words.join(" ")),
            None => format!("{surname}, {}", words.join(" ")),
        }
    }

    fn ends_with_article(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.config
            .articles
            .iter()
            .any(|article| lower.ends_with(&format!(", {article}")))
    }

    fn is_name_suffix(&self, word: &str) -> bool {
        contains_ci(&self.config.name_suffixes, word)
    }

    fn is_surname_prefix(&self, word: &str) -> bool {
        contains_ci(&self.config.surname_prefixes, word)
    }

    fn stays_lower_case(&self, word: &str) -> bool {
        contains_ci(&self.config.no_capitalize, word) || self.is_surname_prefix(word)
    }
}

/// Normalizes input before storage: `;` and `,` get exactly one trailing
/// space, whitespace runs collapse and the value is trimmed.
pub fn normalize_value(value: &str) -> String {
    let text = SEMICOLON_RE.replace_all(value, VALUE_DELIMITER);
    let text = COMMA_RE.replace_all(&text, ", ");
    let text = WHITESPACE_RE.replace_all(&text, " ");
    text.trim_matches(|c: char| c == ';' || c.is_whitespace())
        .to_string()
}

/// Normalization tuned to the attribute kind.
///
/// Paragraphs keep their line breaks and are only trimmed; tables are
/// normalized cell by cell so row and column delimiters survive.
pub fn normalize_for(attribute: &AttributeDef, value: &str) -> String {
    match attribute.kind {
        AttributeKind::Paragraph => value.trim().to_string(),
        kind if kind.is_table() => value
            .split(ROW_DELIMITER)
            .map(|row| {
                row.split(COLUMN_DELIMITER)
                    .map(normalize_value)
                    .collect::<Vec<_>>()
                    .join(COLUMN_DELIMITER)
            })
            .filter(|row| !row.split(COLUMN_DELIMITER).all(str::is_empty))
            .collect::<Vec<_>>()
            .join(&ROW_DELIMITER.to_string()),
        _ => normalize_value(value),
    }
}

/// Splits a stored multi-value string into its entries.
pub fn split_values(value: &str) -> Vec<&str> {
    value
        .split(VALUE_DELIMITER)
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .collect()
}

/// Joins entries with the multi-value delimiter.
pub fn join_values<I, S>(values: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut joined = String::new();
    for value in values {
        if !joined.is_empty() {
            joined.push_str(VALUE_DELIMITER);
        }
        joined.push_str(value.as_ref());
    }
    joined
}

fn tidy_commas(value: &str) -> String {
    let text = COMMA_RE.replace_all(value, ", ");
    let text = WHITESPACE_RE.replace_all(&text, " ");
    text.trim_matches(|c: char| c == ',' || c.is_whitespace())
        .to_string()
}

/// Splits `text` into a leading `word` (matched case-insensitively, original
/// case kept) and the remainder, if `word` is followed by whitespace.
fn split_leading_word<'a>(text: &'a str, word: &str) -> Option<(&'a str, &'a str)> {
    let mut chars = text.char_indices();
    let mut end = 0;
    for expected in word.chars() {
        let (idx, actual) = chars.next()?;
        if !actual.to_lowercase().eq(expected.to_lowercase()) {
            return None;
        }
        end = idx + actual.len_utf8();
    }
    let rest = &text[end..];
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let rest = rest.trim_start();
    if rest.is_empty() {
        return None;
    }
    Some((&text[..end], rest))
}

fn is_word_break(c: char) -> bool {
    c.is_whitespace() || matches!(c, '-' | ',' | '.' | ';')
}

fn upper_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn contains_ci(list: &[String], word: &str) -> bool {
    let lower = word.to_lowercase();
    list.iter().any(|entry| *entry == lower)
}

#[cfg(test)]
mod tests {
    use super::{join_values, normalize_value, split_values, FieldFormatter};
    use crate::config::FormatConfig;
    use crate::model::attribute::{AttributeDef, AttributeFlags, AttributeKind, FormatMode};

    fn formatter() -> FieldFormatter {
        FieldFormatter::default()
    }

    #[test]
    fn title_moves_leading_article_and_keeps_case() {
        let f = formatter();
        assert_eq!(f.format_title("The Shining"), "Shining, The");
        assert_eq!(f.format_title("the  hobbit"), "hobbit, the");
        assert_eq!(f.format_title("Theory of Everything"), "Theory of Everything");
        assert_eq!(f.format_title("The"), "The");
    }

    #[test]
    fn title_normalizes_comma_spacing() {
        let f = formatter();
        assert_eq!(f.format_title("  War ,Peace,and   more "), "War, Peace, and more");
        assert_eq!(f.format_title("Trailing,"), "Trailing");
    }

    #[test]
    fn title_formatting_is_idempotent() {
        let f = formatter();
        for sample in [
            "The Shining",
            "The The Band",
            "the hobbit, part one",
            "  lots   of ,, commas ,",
            "Dune",
            "",
            "The",
        ] {
            let once = f.format_title(sample);
            assert_eq!(f.format_title(&once), once, "sample `{sample}`");
        }
    }

    #[test]
    fn title_uses_first_matching_article_only() {
        let config = FormatConfig {
            articles: vec!["a".to_string(), "an".to_string(), "the".to_string()],
            ..FormatConfig::default()
        };
        let f = FieldFormatter::new(config);
        assert_eq!(f.format_title("A Tale of Two Cities"), "Tale of Two Cities, A");
        assert_eq!(f.format_title("An Unexpected Party"), "Unexpected Party, An");
    }

    #[test]
    fn name_moves_last_word_to_front() {
        let f = formatter();
        assert_eq!(f.format_name("Frank Herbert", false), "Herbert, Frank");
        assert_eq!(f.format_name("Cher", false), "Cher");
        assert_eq!(
            f.format_name("Ursula K. Le Guin", false),
            "Le Guin, Ursula K."
        );
        assert_eq!(
            f.format_name("Ludwig van Beethoven", false),
            "van Beethoven, Ludwig"
        );
    }

    #[test]
    fn name_with_comma_is_only_normalized() {
        let f = formatter();
        assert_eq!(f.format_name("Herbert ,Frank", false), "Herbert, Frank");
        assert_eq!(f.format_name("Herbert,  Frank ", false), "Herbert, Frank");
    }

    #[test]
    fn name_keeps_suffix_with_surname() {
        let f = formatter();
        assert_eq!(
            f.format_name("Martin Luther King Jr.", false),
            "King, Jr., Martin Luther"
        );
        assert_eq!(
            f.format_name("King, Jr., Martin Luther", false),
            "King, Jr., Martin Luther"
        );
    }

    #[test]
    fn name_splits_multiple_entries() {
        let f = formatter();
        assert_eq!(
            f.format_name("Frank Herbert ;Brian Herbert;", true),
            "Herbert, Frank; Herbert, Brian"
        );
    }

    #[test]
    fn single_name_output_has_clean_commas_and_spaces() {
        let f = formatter();
        for sample in [
            ",",
            " , , ",
            "a,,b",
            "Smith ,  John",
            "  John    Smith ",
            "x ,",
            "Jean-Luc   Picard",
        ] {
            let out = f.format_name(sample, false);
            assert!(!out.contains("  "), "double space in `{out}`");
            for (idx, _) in out.match_indices(',') {
                let rest = &out[idx + 1..];
                assert!(
                    rest.starts_with(' ') && !rest.starts_with("  "),
                    "bad comma spacing in `{out}`"
                );
            }
        }
    }

    #[test]
    fn date_is_identity() {
        assert_eq!(formatter().format_date(" 2001-09-23 "), " 2001-09-23 ");
    }

    #[test]
    fn capitalize_skips_small_words_but_not_first() {
        let f = formatter();
        assert_eq!(f.capitalize("the lord of the rings"), "The Lord of the Rings");
        assert_eq!(f.capitalize("sci-fi,fantasy"), "Sci-Fi,Fantasy");
    }

    #[test]
    fn apply_respects_toggles() {
        let f = FieldFormatter::new(FormatConfig::verbatim());
        assert_eq!(f.apply("the shining", FormatMode::Title), "the shining");

        let capitalize_only = FieldFormatter::new(FormatConfig {
            auto_format: false,
            ..FormatConfig::default()
        });
        assert_eq!(
            capitalize_only.apply("the shining", FormatMode::Title),
            "The Shining"
        );
        assert_eq!(
            capitalize_only.apply("the shining", FormatMode::None),
            "the shining"
        );

        let f = formatter();
        assert_eq!(f.apply("the shining", FormatMode::Title), "shining, the");
        assert_eq!(f.apply("science fiction", FormatMode::Plain), "Science Fiction");
    }

    #[test]
    fn format_value_handles_multiple_and_tables() {
        let f = formatter();
        let authors = AttributeDef::new("author", "Author", AttributeKind::FreeText)
            .unwrap()
            .with_flags(AttributeFlags::ALLOW_MULTIPLE)
            .with_format(FormatMode::PersonName);
        assert_eq!(
            f.format_value(&authors, "Frank Herbert; Brian Herbert"),
            "Herbert, Frank; Herbert, Brian"
        );

        let cast = AttributeDef::new("cast", "Cast", AttributeKind::Table2)
            .unwrap()
            .with_format(FormatMode::PersonName);
        let raw = "Kyle MacLachlan::Paul\u{2028}Sean Young::Chani";
        assert_eq!(
            f.format_value(&cast, raw),
            "MacLachlan, Kyle::Paul\u{2028}Young, Sean::Chani"
        );
    }

    #[test]
    fn normalize_value_spaces_delimiters() {
        assert_eq!(
            normalize_value("  Frank Herbert;Brian   Herbert ; "),
            "Frank Herbert; Brian Herbert"
        );
        assert_eq!(normalize_value("a,b"), "a, b");
    }

    #[test]
    fn split_inverts_join() {
        let values = vec!["Herbert, Frank".to_string(), "Anderson".to_string()];
        let joined = join_values(&values);
        assert_eq!(split_values(&joined), values);
    }

    #[test]
    fn sort_key_drops_article() {
        assert_eq!(formatter().sort_key_title("The Shining"), "Shining");
        assert_eq!(formatter().sort_key_title("Dune"), "Dune");
    }
}
