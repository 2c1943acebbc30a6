//! Text normalization used for fuzzy matching.
//!
//! Lowercases, folds accented letters to their base form (NFD, then drop
//! diacritic marks), folds typographic quotes, dashes and ellipses, and
//! collapses every run of whitespace or punctuation into one space.

use unicode_normalization::{
    UnicodeNormalization,
    char::{canonical_combining_class, is_combining_mark},
};

use super::position_map::{Interpolation, PositionMap, PositionSpan};

/// Normalized text and the map from normalized offsets to source offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedText {
    pub text: String,
    pub map: PositionMap,
}

/// Normalize `text` without keeping the position map.
pub fn normalize(text: &str) -> String {
    normalize_with_map(text).text
}

/// Normalize `text`, recording one span per source character.
///
/// A separator run collapses to a single space attributed to the first
/// character of the run; the remaining characters map to zero-width spans.
pub fn normalize_with_map(source: &str) -> NormalizedText {
    let mut text = String::with_capacity(source.len());
    let mut map = PositionMap::new(Interpolation::Atomic);
    let mut folded = String::new();

    for (index, ch) in source.char_indices() {
        let original_end = index + ch.len_utf8();
        let derived_start = text.len();

        folded.clear();
        fold_char(ch, &mut folded);

        if folded.is_empty() {
            // Pure combining marks vanish without breaking a word.
        } else if folded.chars().all(is_word_char) {
            text.push_str(&folded);
        } else if !text.is_empty() && !text.ends_with(' ') {
            text.push(' ');
        }

        map.push(PositionSpan {
            original_start: index,
            original_end,
            derived_start,
            derived_end: text.len(),
        });
    }

    if text.ends_with(' ') {
        text.pop();
        map.clamp_derived(text.len());
    }

    NormalizedText { text, map }
}

/// Word characters survive normalization; everything else is a separator.
pub(crate) fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

fn fold_char(ch: char, out: &mut String) {
    match ch {
        '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{00AB}' | '\u{00BB}' | '\u{2039}'
        | '\u{203A}' => out.push('"'),
        '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' => out.push('\''),
        '\u{2013}' | '\u{2014}' => out.push('-'),
        '\u{2026}' => out.push_str("..."),
        _ => {
            for lower in ch.to_lowercase() {
                out.extend(lower.nfd().filter(|c| !is_diacritic(*c)));
            }
        }
    }
}

/// Marks that decorate a base letter. Vowel signs of Indic and similar
/// scripts are letters in their own right and are kept.
fn is_diacritic(ch: char) -> bool {
    is_combining_mark(ch) && (canonical_combining_class(ch) != 0 || !ch.is_alphanumeric())
}
