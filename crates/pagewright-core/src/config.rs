// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tool configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{Dependency, PageNumbering};

/// Executables and parameters used by the document operations.
///
/// Every field has a default, so a partial JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// poppler text extractor.
    pub pdftotext: PathBuf,
    /// poppler page rasteriser.
    pub pdftoppm: PathBuf,
    /// Tesseract OCR engine.
    pub tesseract: PathBuf,
    /// Resolution pages are rendered at, and the resolution OCR assumes.
    pub render_dpi: u32,
    /// Tesseract language code(s), e.g. `eng` or `eng+deu`.
    pub ocr_language: String,
    /// Per-page character cap for extracted text.
    pub max_page_chars: usize,
    /// Numbering of `<page-N>` tags.
    pub page_numbering: PageNumbering,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            pdftotext: PathBuf::from(Dependency::Pdftotext.executable()),
            pdftoppm: PathBuf::from(Dependency::Pdftoppm.executable()),
            tesseract: PathBuf::from(Dependency::Tesseract.executable()),
            render_dpi: 200,
            ocr_language: "eng".to_string(),
            max_page_chars: 2000,
            page_numbering: PageNumbering::Survivor,
        }
    }
}

impl ToolConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    /// Configured program for a dependency.
    pub fn executable(&self, dependency: Dependency) -> &Path {
        match dependency {
            Dependency::Pdftotext => &self.pdftotext,
            Dependency::Pdftoppm => &self.pdftoppm,
            Dependency::Tesseract => &self.tesseract,
        }
    }
}
