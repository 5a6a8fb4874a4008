//! Admission heuristics
//!
//! Decides whether a piece of text is worth a translation call. Pure: the
//! verdict depends only on the text, the mode and the `FilterConfig`.
//!
//! Rules run in order and the first match wins:
//! 1. blank text
//! 2. text longer than `max_input_chars`
//! 3. numeric-like text (scores, numbers, times, dates, digit soup)
//! 4. automatic mode only: romanized stop-word heavy text, then short
//!    ASCII-only text
//!
//! Forced mode (an explicit user command) skips step 4.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static SCORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d{1,4}\s*/\s*\d{1,4}\s*$").unwrap());
static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[+\-]?\d+(?:[.,]\d+)?\s*%?\s*$").unwrap());
static CLOCK_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d{1,2}:\d{2}(?::\d{2})?\s*$").unwrap());
// The same separator twice; no backreferences in `regex`, so one branch each.
static DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^\s*(?:\d{1,4}/\d{1,2}/\d{1,4}",
        r"|\d{1,4}-\d{1,2}-\d{1,4}",
        r"|\d{1,4}\.\d{1,2}\.\d{1,4})\s*$"
    ))
    .unwrap()
});
static DIGIT_SOUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[\d\-+()\[\]\s]{5,}\s*$").unwrap());
static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").unwrap());
static LETTER_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[a-z]+").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Common romanized Hindi function words
pub const DEFAULT_ROMANIZED_STOPWORDS: &[&str] = &[
    "kuch", "bhi", "apne", "apna", "apni", "hisab", "mat", "karo", "kr", "karen", "hai", "hota",
    "hoti", "hote", "ye", "yaar", "bhai", "nahi", "nahin", "kyu", "kyun", "kya", "mera", "meri",
    "mere", "tera", "teri", "tere", "hum", "ham", "tha", "thi", "the", "vo", "woh", "se", "ko",
    "mein", "me",
];

/// Why a text was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Blank,
    /// Carries the character count
    TooLong(usize),
    NumericLike,
    RomanizedStopwords,
    LowSignal,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Blank => write!(f, "blank"),
            SkipReason::TooLong(len) => write!(f, "too_long:{}", len),
            SkipReason::NumericLike => write!(f, "numeric_like"),
            SkipReason::RomanizedStopwords => write!(f, "romanized_stopwords"),
            SkipReason::LowSignal => write!(f, "low_signal"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Eligible,
    Ineligible(SkipReason),
}

impl Verdict {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Verdict::Eligible)
    }
}

/// Tunables for the admission heuristics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterConfig {
    pub max_input_chars: usize,
    pub ignore_numeric_like: bool,
    pub auto_min_words: usize,
    pub skip_romanized: bool,
    /// Lower-cased stop words; matched against whole letter runs
    pub romanized_stopwords: Vec<String>,
    pub romanized_min_matches: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            max_input_chars: 1800,
            ignore_numeric_like: true,
            auto_min_words: 2,
            skip_romanized: true,
            romanized_stopwords: DEFAULT_ROMANIZED_STOPWORDS
                .iter()
                .map(|w| w.to_string())
                .collect(),
            romanized_min_matches: 2,
        }
    }
}

/// Classify `text`; `force` marks an explicit user request
pub fn classify(text: &str, force: bool, config: &FilterConfig) -> Verdict {
    if text.trim().is_empty() {
        return Verdict::Ineligible(SkipReason::Blank);
    }
    let len = text.chars().count();
    if len > config.max_input_chars {
        return Verdict::Ineligible(SkipReason::TooLong(len));
    }
    if config.ignore_numeric_like && looks_numeric_like(text) {
        return Verdict::Ineligible(SkipReason::NumericLike);
    }
    if !force {
        if config.skip_romanized && is_romanized_stopword_heavy(text, config) {
            return Verdict::Ineligible(SkipReason::RomanizedStopwords);
        }
        if word_count(text) < config.auto_min_words && !has_non_ascii_letter(text) {
            return Verdict::Ineligible(SkipReason::LowSignal);
        }
    }
    Verdict::Eligible
}

/// Scores, numbers, clock times, dates and other letter-free text
pub fn looks_numeric_like(text: &str) -> bool {
    let trimmed = text.trim();
    // Unicode Alphabetic property: letters plus letter numbers (Nl) and combining marks
    if !trimmed.chars().any(char::is_alphabetic) {
        return true;
    }
    [&SCORE, &NUMBER, &CLOCK_TIME, &DATE, &DIGIT_SOUP]
        .iter()
        .any(|re| re.is_match(trimmed))
}

/// Pure-ASCII text with enough romanized stop words to be mistaken for English
pub fn is_romanized_stopword_heavy(text: &str, config: &FilterConfig) -> bool {
    let lowered = text.to_lowercase();
    if lowered.trim().is_empty() || !lowered.is_ascii() {
        return false;
    }
    let tokens: std::collections::HashSet<&str> =
        LETTER_RUN.find_iter(&lowered).map(|m| m.as_str()).collect();
    let hits = config
        .romanized_stopwords
        .iter()
        .filter(|word| tokens.contains(word.as_str()))
        .count();
    hits >= config.romanized_min_matches
}

/// Number of Unicode word runs
pub fn word_count(text: &str) -> usize {
    WORD.find_iter(text).count()
}

/// Any non-ASCII character with the Unicode Alphabetic property
///
/// Broader than the letter categories: Roman numerals such as `Ⅻ` and
/// combining marks such as `\u{0301}` also count.
pub fn has_non_ascii_letter(text: &str) -> bool {
    text.chars().any(|c| !c.is_ascii() && c.is_alphabetic())
}

/// Collapse whitespace, trim and lower-case; used to detect no-op translations
pub fn normalize(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_lowercase()
}
