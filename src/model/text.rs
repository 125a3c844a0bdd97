//! Text assembly helpers shared by the classifier and the translation gate.

use super::TextSpan;

/// Check if character is from a script that doesn't use word spaces.
/// Chinese and Japanese don't use spaces between words, but Korean does.
pub fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;

    // CJK Unified Ideographs
    (0x4E00..=0x9FFF).contains(&code)
    // Extension A
    || (0x3400..=0x4DBF).contains(&code)
    // Extensions B-F
    || (0x20000..=0x2A6DF).contains(&code)
    || (0x2A700..=0x2B73F).contains(&code)
    || (0x2B740..=0x2B81F).contains(&code)
    || (0x2B820..=0x2CEAF).contains(&code)
    || (0x2CEB0..=0x2EBEF).contains(&code)
    // Hiragana, Katakana
    || (0x3040..=0x309F).contains(&code)
    || (0x30A0..=0x30FF).contains(&code)
    // CJK Symbols and Punctuation
    || (0x3000..=0x303F).contains(&code)
    // Fullwidth forms (，：；？！)
    || (0xFF00..=0xFFEF).contains(&code)
}

/// Join the spans of one line, left to right, inserting spaces at visible gaps.
///
/// A gap wider than 20% of the average character width becomes a space,
/// except between two spaceless-script characters.
pub fn join_line_spans(spans: &[TextSpan]) -> String {
    let mut result = String::new();

    for (i, span) in spans.iter().enumerate() {
        if i == 0 {
            result.push_str(&span.text);
            continue;
        }
        let prev = &spans[i - 1];
        let gap = span.bbox.x0 - prev.bbox.x1;

        let char_count = span.text.chars().count();
        let avg_char_width = if char_count > 0 && span.bbox.width() > 0.0 {
            span.bbox.width() / char_count as f32
        } else {
            span.font.size * 0.5
        };

        let both_spaceless = matches!(
            (prev.text.chars().last(), span.text.chars().next()),
            (Some(a), Some(b)) if is_spaceless_script_char(a) && is_spaceless_script_char(b)
        );
        let has_space = result.ends_with(char::is_whitespace) || span.text.starts_with(char::is_whitespace);

        if gap > avg_char_width * 0.2 && !both_spaceless && !has_space {
            result.push(' ');
        }
        result.push_str(&span.text);
    }

    result
}

/// Join consecutive line texts into one paragraph string.
///
/// A trailing hyphen between two letters is treated as end-of-line
/// hyphenation and removed; otherwise lines are joined with a single space
/// unless both sides are spaceless-script characters.
pub fn join_lines<S: AsRef<str>>(lines: &[S]) -> String {
    let mut result = String::new();

    for line in lines {
        let line = line.as_ref().trim();
        if line.is_empty() {
            continue;
        }
        if result.is_empty() {
            result.push_str(line);
            continue;
        }

        let mut prev_chars = result.chars().rev();
        let last = prev_chars.next();
        let before_last = prev_chars.next();
        let next = line.chars().next();

        let hyphenated = last == Some('-')
            && before_last.is_some_and(char::is_alphabetic)
            && next.is_some_and(char::is_lowercase);

        if hyphenated {
            result.pop();
        } else if !matches!(
            (last, next),
            (Some(a), Some(b)) if is_spaceless_script_char(a) && is_spaceless_script_char(b)
        ) {
            result.push(' ');
        }
        result.push_str(line);
    }

    result
}
