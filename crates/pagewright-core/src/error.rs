// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Pagewright.

use thiserror::Error;

/// Top-level error type for all Pagewright operations.
#[derive(Debug, Error)]
pub enum PagewrightError {
    // -- Environment --
    #[error("missing system dependencies: {}\n\nInstallation:\n{hint}", .missing.join(", "))]
    MissingDependency { missing: Vec<String>, hint: String },

    #[error("failed to launch {tool}: {reason}")]
    ToolLaunch { tool: String, reason: String },

    // -- Text extraction --
    #[error("text extraction failed: {0}")]
    Extraction(String),

    // -- Rasterisation / OCR --
    #[error("page rendering failed: {0}")]
    Render(String),

    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- PDF structure --
    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("page {page} out of range (document has {total} pages)")]
    PageOutOfRange { page: u32, total: u32 },

    #[error("replacement page PDF has no pages: {path}")]
    EmptyFragment { path: String },

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PagewrightError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_dependency_lists_every_tool() {
        let err = PagewrightError::MissingDependency {
            missing: vec!["pdftotext (poppler/poppler-utils)".into(), "tesseract".into()],
            hint: "brew install poppler tesseract".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("pdftotext (poppler/poppler-utils), tesseract"));
        assert!(msg.ends_with("brew install poppler tesseract"));
    }

    #[test]
    fn out_of_range_message() {
        let err = PagewrightError::PageOutOfRange { page: 7, total: 5 };
        assert_eq!(err.to_string(), "page 7 out of range (document has 5 pages)");
    }
}
