/*!
 * Quick-add parser for bulk question entry.
 *
 * Each non-empty line is `marks|subject|chapter|year|text`. Fields are
 * trimmed; the text keeps any further pipes. Lines are never rejected:
 * anything missing or unparsable falls back to a default.
 */

use crate::database::models::DEFAULT_MARKS;

/// Subject and chapter name used when a line leaves them blank
pub const DEFAULT_GROUP: &str = "General";

/// Fallback values applied while parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickAddDefaults {
    pub marks: i64,
    pub group: String,
}

impl Default for QuickAddDefaults {
    fn default() -> Self {
        Self {
            marks: DEFAULT_MARKS,
            group: DEFAULT_GROUP.to_string(),
        }
    }
}

/// One parsed quick-add line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickAddEntry {
    pub marks: i64,
    pub subject: String,
    pub chapter: String,
    pub year: Option<i64>,
    pub text: String,
}

/// Parse a block of quick-add text into entries
pub fn parse_block(text: &str, defaults: &QuickAddDefaults) -> Vec<QuickAddEntry> {
    text.split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| parse_line(line, defaults))
        .collect()
}

/// Parse one quick-add line
pub fn parse_line(line: &str, defaults: &QuickAddDefaults) -> QuickAddEntry {
    let parts: Vec<&str> = line.split('|').map(str::trim).collect();
    let field = |i: usize| parts.get(i).copied().unwrap_or("");
    let or_group = |value: &str| {
        if value.is_empty() {
            defaults.group.clone()
        } else {
            value.to_string()
        }
    };

    let marks = leading_integer(field(0))
        .filter(|m| *m != 0)
        .unwrap_or(defaults.marks);
    let year = leading_integer(field(3)).filter(|y| *y != 0);

    let rest = parts.get(4..).map(|tail| tail.join(" | ")).unwrap_or_default();
    let text = if !rest.is_empty() {
        rest
    } else if let Some(last) = parts.last().filter(|last| !last.is_empty()) {
        last.to_string()
    } else {
        line.to_string()
    };

    QuickAddEntry {
        marks,
        subject: or_group(field(1)),
        chapter: or_group(field(2)),
        year,
        text,
    }
}

/// Parse the integer at the start of a field, ignoring anything after it.
///
/// `"5 marks"` gives 5, `"-2"` gives -2, `"abc"` and `""` give nothing.
pub fn leading_integer(field: &str) -> Option<i64> {
    let field = field.trim_start();
    let (sign, digits) = match field.as_bytes().first() {
        Some(b'-') => (-1, &field[1..]),
        Some(b'+') => (1, &field[1..]),
        _ => (1, field),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }

    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}
