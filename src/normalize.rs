//! Shared normalization rules for grouping and cleaning scraped lyrics.
//!
//! CRITICAL: grouping keys and cleaned lyrics are compared across runs.
//! Any change to a pattern or to rule order changes the output dataset.

use any_ascii::any_ascii;
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

// ============================================================================
// EXCLUSION MARKERS
// ============================================================================

/// Live-session subset that never belongs in the canonical dataset (matched lowercase).
pub const JORDAN_LAKE_MARKER: &str = "jordan lake";

/// The provider's flag for instrumental tracks with no lyric content.
pub const INSTRUMENTAL_MARKER: &str = "ContributorsThis song is an instrumental";

/// Why a raw record was dropped before grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclusion {
    JordanLakeSession,
    Instrumental,
}

/// Check exclusion rules in order: title first, then lyrics.
pub fn exclusion_reason(title: &str, lyrics: &str) -> Option<Exclusion> {
    if title.to_lowercase().contains(JORDAN_LAKE_MARKER) {
        Some(Exclusion::JordanLakeSession)
    } else if lyrics.contains(INSTRUMENTAL_MARKER) {
        Some(Exclusion::Instrumental)
    } else {
        None
    }
}

// ============================================================================
// REGEX PATTERNS
// ============================================================================

/// Title suffix patterns (applied in order). Each one truncates the title at
/// its first match.
pub static TITLE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        // "Song (Demo)", "Song (Demo) [1991]"
        Regex::new(r"(?i)\s*\(Demo\).*").unwrap(),
        // "Song (Live at the Bowery Ballroom 2019)"
        Regex::new(r"(?i)\s*\(Live.*?\).*").unwrap(),
        // "Song - Live", "Song - Live in Chapel Hill"
        Regex::new(r"(?i)\s*- Live.*").unwrap(),
        Regex::new(r"(?i)\s*\(Remastered\).*").unwrap(),
        Regex::new(r"(?i)\s*\(Acoustic\).*").unwrap(),
    ]
});

/// Lyrics cleanup rules as (pattern, replacement), applied in order.
pub static LYRICS_RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        // Section tags: "[Verse 1]", "[Chorus: Someone]"
        (Regex::new(r"(?s)\[.*?\]").unwrap(), ""),
        // Line numbering artifacts at line start: "1. ", "12"
        (Regex::new(r"(?m)^\d+\.?\s*").unwrap(), ""),
        // Provider header up to and including the first "Lyrics"
        (Regex::new(r"(?s)^.*?Lyrics").unwrap(), ""),
        // Trailing embed widget text (also before one final newline)
        (Regex::new(r"Embed(\n?)\z").unwrap(), "$1"),
        // Recommendation footer and everything after it
        (Regex::new(r"(?s)You might also like.*").unwrap(), ""),
    ]
});

/// Runs of newlines collapse to one.
pub static MULTI_NEWLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n+").unwrap());

/// Regex to collapse multiple whitespace into single space
pub static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());

/// Maximum lyric lines kept per canonical record.
pub const MAX_LYRIC_LINES: usize = 5;

// ============================================================================
// NORMALIZATION FUNCTIONS
// ============================================================================

/// Normalize a title into its grouping key.
/// Strips demo, live, remaster and acoustic qualifiers. Case is preserved.
pub fn normalize_title(title: &str) -> String {
    let mut result = title.to_string();
    for pattern in TITLE_PATTERNS.iter() {
        result = pattern.replace_all(&result, "").to_string();
    }
    result.trim().to_string()
}

/// Reduce a scraped lyrics page to at most `MAX_LYRIC_LINES` lines.
/// Returns an empty Vec when nothing survives cleaning.
pub fn clean_lyrics(lyrics: &str) -> Vec<String> {
    let mut result = lyrics.to_string();
    for (pattern, replacement) in LYRICS_RULES.iter() {
        result = pattern.replace_all(&result, *replacement).to_string();
    }

    let collapsed = MULTI_NEWLINE.replace_all(result.trim(), "\n");
    if collapsed.is_empty() {
        return Vec::new();
    }

    collapsed
        .split('\n')
        .take(MAX_LYRIC_LINES)
        .map(str::to_string)
        .collect()
}

// ============================================================================
// GUESS COMPARISON
// ============================================================================

/// Check if a character is a Unicode combining mark (diacritical mark).
pub fn is_combining_mark(c: char) -> bool {
    matches!(c as u32, 0x0300..=0x036F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0xFE20..=0xFE2F)
}

/// Fold Unicode text to lowercase ASCII via NFKD decomposition and transliteration.
/// e.g., "Beyoncé" → "beyonce"
pub fn fold_to_ascii(s: &str) -> String {
    let stripped: String = s.nfkd().filter(|c| !is_combining_mark(*c)).collect();
    any_ascii(&stripped).to_lowercase()
}

/// Convert curly quotes and backticks to straight quotes.
pub fn normalize_punctuation(s: &str) -> String {
    s.replace(['\u{2018}', '\u{2019}'], "'")
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace(['\u{00B4}', '\u{0060}'], "'")
}

/// Key used to compare a player's guess with a song title.
pub fn guess_key(s: &str) -> String {
    let folded = fold_to_ascii(&normalize_punctuation(s));
    MULTI_SPACE.replace_all(folded.trim(), " ").to_string()
}

// ============================================================================
// TESTS
// ============================================================================
