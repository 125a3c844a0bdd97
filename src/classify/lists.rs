//! List marker recognition.

use std::sync::OnceLock;

use regex::Regex;

use crate::model::{ListMarker, NumberPunctuation, NumberStyle};

/// Glyphs accepted as bullets.
const BULLETS: &[char] = &[
    '•', '-', '–', '—', '·', '*', '○', '▪', '◦', '▸', '▹', '►', '■', '●', '□', '◆', '◇', '▶',
    '▷', '➤', '➜',
];

fn numbered_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(\()?(\d{1,3})([.)])\s+(\S.*)$").expect("valid number pattern"))
}

fn lettered_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(\()?([a-zA-Z])([.)])\s+(\S.*)$").expect("valid letter pattern"))
}

/// Recognize a list marker at the start of a line.
///
/// Returns the marker and the line text with the marker removed. A marker
/// must be followed by whitespace and some body text, so "-5 degrees" or a
/// bare "1." is not a list item.
pub(crate) fn detect_marker(text: &str) -> Option<(ListMarker, String)> {
    let trimmed = text.trim_start();

    if let Some(glyph) = trimmed.chars().next().filter(|c| BULLETS.contains(c)) {
        let rest = &trimmed[glyph.len_utf8()..];
        if rest.starts_with(char::is_whitespace) && !rest.trim().is_empty() {
            return Some((ListMarker::Bullet { glyph }, rest.trim().to_string()));
        }
        return None;
    }

    if let Some(caps) = numbered_regex().captures(trimmed) {
        let value: u32 = caps[2].parse().ok()?;
        return Some((
            ListMarker::Numbered {
                value,
                style: NumberStyle::Decimal,
                punctuation: punctuation(&caps)?,
            },
            caps[4].trim_end().to_string(),
        ));
    }

    if let Some(caps) = lettered_regex().captures(trimmed) {
        let letter = caps[2].chars().next()?;
        let style = if letter.is_ascii_lowercase() {
            NumberStyle::LowerAlpha
        } else {
            NumberStyle::UpperAlpha
        };
        let value = u32::from(letter.to_ascii_lowercase()) - u32::from('a') + 1;
        return Some((
            ListMarker::Numbered {
                value,
                style,
                punctuation: punctuation(&caps)?,
            },
            caps[4].trim_end().to_string(),
        ));
    }

    None
}

/// Punctuation of a numbered marker match. An opening parenthesis needs a
/// closing one: "(3." is not a marker.
fn punctuation(caps: &regex::Captures<'_>) -> Option<NumberPunctuation> {
    match (caps.get(1).is_some(), &caps[3]) {
        (true, ")") => Some(NumberPunctuation::Enclosed),
        (true, _) => None,
        (false, ")") => Some(NumberPunctuation::Parenthesis),
        (false, _) => Some(NumberPunctuation::Period),
    }
}

/// Check if text is a bullet marker on its own (•, -, etc.).
pub(crate) fn is_bullet_marker(text: &str) -> bool {
    let mut chars = text.trim().chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if BULLETS.contains(&c))
}

/// Check if text is a number-style marker on its own (1., 2), a., etc.).
pub(crate) fn is_number_marker(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return false;
    }

    // Remove internal whitespace for pattern matching (handles "1 .")
    let cleaned: String = trimmed.chars().filter(|c| !c.is_whitespace()).collect();

    if let Some(pos) = cleaned.find(|c: char| !c.is_ascii_digit()) {
        let prefix = &cleaned[..pos];
        let suffix = &cleaned[pos..];
        if !prefix.is_empty() && (suffix == "." || suffix == ")") {
            return true;
        }
    }

    if cleaned.parse::<u32>().is_ok() {
        return true;
    }

    let chars: Vec<char> = cleaned.chars().collect();
    chars.len() == 2 && chars[0].is_alphabetic() && (chars[1] == '.' || chars[1] == ')')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bullet_marker() {
        let (marker, rest) = detect_marker("• First item").unwrap();
        assert_eq!(marker, ListMarker::Bullet { glyph: '•' });
        assert_eq!(rest, "First item");

        let (_, rest) = detect_marker("-  dashed").unwrap();
        assert_eq!(rest, "dashed");
    }

    #[test]
    fn test_numbered_marker() {
        let (marker, rest) = detect_marker("12. Twelfth point").unwrap();
        assert_eq!(
            marker,
            ListMarker::Numbered {
                value: 12,
                style: NumberStyle::Decimal,
                punctuation: NumberPunctuation::Period,
            }
        );
        assert_eq!(rest, "Twelfth point");

        let (marker, _) = detect_marker("(3) third").unwrap();
        assert!(matches!(
            marker,
            ListMarker::Numbered {
                value: 3,
                punctuation: NumberPunctuation::Enclosed,
                ..
            }
        ));
        assert!(detect_marker("(3. third").is_none());
    }

    #[test]
    fn test_lettered_marker() {
        let (marker, rest) = detect_marker("b) second option").unwrap();
        assert_eq!(
            marker,
            ListMarker::Numbered {
                value: 2,
                style: NumberStyle::LowerAlpha,
                punctuation: NumberPunctuation::Parenthesis,
            }
        );
        assert_eq!(rest, "second option");

        let (marker, _) = detect_marker("C. Third").unwrap();
        assert!(matches!(
            marker,
            ListMarker::Numbered {
                value: 3,
                style: NumberStyle::UpperAlpha,
                punctuation: NumberPunctuation::Period,
            }
        ));
    }

    #[test]
    fn test_not_markers() {
        assert!(detect_marker("-5 degrees below zero").is_none());
        assert!(detect_marker("1.").is_none());
        assert!(detect_marker("2024 was a year").is_none());
        assert!(detect_marker("3.14 is pi").is_none());
        assert!(detect_marker("Plain sentence.").is_none());
    }

    #[test]
    fn test_is_list_marker() {
        assert!(is_bullet_marker("•"));
        assert!(is_bullet_marker("-"));
        assert!(is_bullet_marker("●"));
        assert!(!is_bullet_marker("- x"));
        assert!(is_number_marker("1."));
        assert!(is_number_marker("12."));
        assert!(is_number_marker("1)"));
        assert!(is_number_marker("a."));
        assert!(is_number_marker("B)"));
        assert!(is_number_marker("1 ."));
        assert!(!is_number_marker("Hello"));
        assert!(!is_number_marker("Name"));
        assert!(!is_number_marker(""));
    }
}
