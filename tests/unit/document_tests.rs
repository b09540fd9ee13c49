/*!
 * Tests for document splitting and discovery
 */

use anyhow::Result;
use std::fs;

use studyme::document::{self, PageSource, TextDocument};
use studyme::errors::DocumentError;

use crate::common;

/// Source whose pages come from a fixed list, standing in for an extractor
struct FixedPages(Vec<&'static str>);

impl PageSource for FixedPages {
    fn pages(&self) -> Vec<String> {
        self.0.iter().map(|p| p.to_string()).collect()
    }
}

/// Test that a block split across a page boundary becomes two blocks
#[test]
fn test_splitBlocks_withPageBoundary_shouldSeparatePages() {
    let source = FixedPages(vec!["Q1 starts here", "Q2 on the next page\n\nQ3"]);

    let blocks = document::split_blocks(&source);

    assert_eq!(blocks, vec!["Q1 starts here", "Q2 on the next page", "Q3"]);
}

/// Test that blank pages produce nothing
#[test]
fn test_splitBlocks_withBlankPages_shouldBeEmpty() {
    let source = FixedPages(vec!["", "   \n  ", "\n\n"]);

    assert!(document::split_blocks(&source).is_empty());
}

/// Test loading a text document from disk
#[tokio::test]
async fn test_load_withTextFile_shouldSplitPagesAtFormFeed() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "paper.txt", "Page one\x0CPage two\n\nMore")?;

    let doc = TextDocument::load(&path).await?;

    assert_eq!(doc.pages().len(), 2);
    assert_eq!(document::split_blocks(&doc), vec!["Page one", "Page two", "More"]);
    Ok(())
}

/// Test that unsupported and missing files are reported as document errors
#[tokio::test]
async fn test_load_withBadInput_shouldReturnDocumentError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let pdf = common::create_test_file(temp_dir.path(), "paper.pdf", "%PDF-1.7")?;

    let unsupported = TextDocument::load(&pdf).await;
    assert!(matches!(unsupported, Err(DocumentError::Unsupported(_))));

    let missing = TextDocument::load(temp_dir.path().join("missing.txt")).await;
    assert!(matches!(missing, Err(DocumentError::Unreadable { .. })));
    Ok(())
}

/// Test directory discovery
#[test]
fn test_collectDocuments_withNestedDirs_shouldFindTextFilesInOrder() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let nested = temp_dir.path().join("physics");
    fs::create_dir_all(&nested)?;

    common::create_test_file(temp_dir.path(), "b.txt", "B")?;
    common::create_test_file(temp_dir.path(), "a.TXT", "A")?;
    common::create_test_file(temp_dir.path(), "notes.md", "skip")?;
    common::create_test_file(&nested, "c.txt", "C")?;

    let found = document::collect_documents(temp_dir.path());

    let names: Vec<String> = found
        .iter()
        .map(|p| p.strip_prefix(temp_dir.path()).unwrap().display().to_string())
        .collect();
    assert_eq!(names, vec!["a.TXT", "b.txt", "physics/c.txt"]);
    Ok(())
}
