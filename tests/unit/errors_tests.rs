/*!
 * Tests for the error types
 */

use std::error::Error;

use studyme::errors::{AppError, DocumentError, StoreError};
use studyme::database::slot;

/// Test error messages
#[test]
fn test_storeError_display_shouldDescribeProblem() {
    let not_found = StoreError::NotFound { entity: "board", id: 7 };
    assert_eq!(not_found.to_string(), "board 7 not found");

    let invalid = StoreError::InvalidBlob("missing SQLite header".to_string());
    assert_eq!(invalid.to_string(), "Invalid store blob: missing SQLite header");
}

/// Test that slot decoding keeps the base64 cause
#[test]
fn test_decodeBlob_withInvalidText_shouldKeepSource() {
    let err = slot::decode_blob("studyme_db", "not base64 !!!").unwrap_err();

    assert!(matches!(err, StoreError::SlotEncoding { ref key, .. } if key == "studyme_db"));
    assert!(err.source().is_some());
}

/// Test conversions into the application error
#[test]
fn test_appError_from_shouldWrapEachKind() {
    let store: AppError = StoreError::NotFound { entity: "playlist", id: 1 }.into();
    assert!(matches!(store, AppError::Store(_)));

    let document: AppError = DocumentError::Unsupported("x.pdf".to_string()).into();
    assert!(matches!(document, AppError::Document(_)));
    assert_eq!(document.to_string(), "Document error: Unsupported document: x.pdf");

    let io: AppError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
    assert!(matches!(io, AppError::File(_)));

    let other: AppError = anyhow::anyhow!("boom").into();
    assert!(matches!(other, AppError::Unknown(ref msg) if msg == "boom"));
}

/// Test that typed errors keep their kind after travelling through anyhow
#[test]
fn test_appError_fromAnyhow_shouldRecoverTypedError() {
    use anyhow::Context;

    let wrapped: anyhow::Result<()> = Err(StoreError::NotFound { entity: "board", id: 3 })
        .context("Failed to select board");
    let store = AppError::from(wrapped.unwrap_err());
    assert!(matches!(store, AppError::Store(StoreError::NotFound { id: 3, .. })));
    assert_eq!(store.exit_code(), 4);

    let document = AppError::from(anyhow::Error::from(DocumentError::Unsupported("a.pdf".to_string())));
    assert!(matches!(document, AppError::Document(_)));
    assert_eq!(document.exit_code(), 5);

    let io = AppError::from(anyhow::Error::from(std::io::Error::other("disk")));
    assert!(matches!(io, AppError::File(ref msg) if msg == "disk"));

    let plain = AppError::from(anyhow::anyhow!("boom").context("while testing"));
    assert!(matches!(plain, AppError::Unknown(ref msg) if msg == "while testing: boom"));
    assert_eq!(plain.exit_code(), 1);
}
