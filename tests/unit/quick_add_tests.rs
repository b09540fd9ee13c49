/*!
 * Tests for the quick-add parser through the public API
 */

use studyme::quick_add::{QuickAddDefaults, parse_block, parse_line};

/// Test the documented full-field example
#[test]
fn test_parseLine_withDocumentedExample_shouldExtractAllFields() {
    let entry = parse_line(
        "5|Physics|Motion|2021|What is velocity?",
        &QuickAddDefaults::default(),
    );

    assert_eq!(entry.marks, 5);
    assert_eq!(entry.subject, "Physics");
    assert_eq!(entry.chapter, "Motion");
    assert_eq!(entry.year, Some(2021));
    assert_eq!(entry.text, "What is velocity?");
}

/// Test the documented fallback example
#[test]
fn test_parseLine_withUnparsableFields_shouldUseFallbacks() {
    let entry = parse_line("abc|  |  | |Just text", &QuickAddDefaults::default());

    assert_eq!(entry.marks, 3);
    assert_eq!(entry.subject, "General");
    assert_eq!(entry.chapter, "General");
    assert!(entry.year.is_none());
    assert_eq!(entry.text, "Just text");
}

/// Test that numeric coercion keeps the leading digits only
#[test]
fn test_parseLine_withTrailingJunk_shouldKeepLeadingNumber() {
    let entry = parse_line("4 marks|Maths|Algebra|2018 (March)|Solve x+1=2", &QuickAddDefaults::default());

    assert_eq!(entry.marks, 4);
    assert_eq!(entry.year, Some(2018));
}

/// Test that every non-blank line becomes an entry, malformed or not
#[test]
fn test_parseBlock_withMixedLines_shouldNeverRejectALine() {
    let block = "5|Physics|Motion|2021|What is velocity?\n\
                 garbage line\n\
                 \n\
                 ||||\n\
                 x|y";

    let entries = parse_block(block, &QuickAddDefaults::default());

    assert_eq!(entries.len(), 4);
    assert_eq!(entries[1].text, "garbage line");
    assert_eq!(entries[2].text, "||||");
    assert_eq!(entries[3].subject, "y");
    assert_eq!(entries[3].text, "y");
}

/// Test Windows line endings
#[test]
fn test_parseBlock_withCrLf_shouldTrimCarriageReturns() {
    let entries = parse_block("1|A|B|2020|First\r\n2|A|B|2020|Second\r\n", &QuickAddDefaults::default());

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].text, "First");
    assert_eq!(entries[1].text, "Second");
}
