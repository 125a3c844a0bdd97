//! Target-script detection.

/// Check if a character is a CJK Unified Ideograph (basic block).
///
/// Only the basic block counts: punctuation and kana are shared with other
/// languages and would make mixed English text look translated.
pub fn is_target_script_char(c: char) -> bool {
    ('\u{4E00}'..='\u{9FFF}').contains(&c)
}

/// Fraction of non-whitespace characters that are in the target script.
///
/// Returns 0.0 for text with no visible characters.
pub fn target_script_ratio(text: &str) -> f32 {
    let mut total = 0usize;
    let mut target = 0usize;
    for c in text.chars().filter(|c| !c.is_whitespace()) {
        total += 1;
        if is_target_script_char(c) {
            target += 1;
        }
    }
    if total == 0 {
        0.0
    } else {
        target as f32 / total as f32
    }
}

/// Whether the text contains at least one target-script character.
pub fn contains_target_script(text: &str) -> bool {
    text.chars().any(is_target_script_char)
}
