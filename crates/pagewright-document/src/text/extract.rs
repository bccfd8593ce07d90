// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text extractor — runs poppler's `pdftotext` in layout mode and reshapes its
// output into per-page `<page-N>` blocks inside a `<document_context>`
// envelope.

use std::ffi::OsStr;
use std::path::Path;

use pagewright_core::error::{PagewrightError, Result};
use pagewright_core::{PageNumbering, ToolConfig};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::tool;

/// Page separator emitted by `pdftotext`.
const PAGE_SEPARATOR: char = '\u{000C}';

/// Appended to page text cut at the character limit.
pub const TRUNCATION_MARKER: &str = "...[truncated]";

/// Text of one non-blank page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageText {
    /// Number used in the `<page-N>` tag (see [`PageNumbering`]).
    pub number: u32,
    /// Whitespace-trimmed text, possibly truncated.
    pub text: String,
    /// Whether `text` was cut and carries [`TRUNCATION_MARKER`].
    pub truncated: bool,
}

/// Ordered per-page text of a whole document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentContext {
    pub pages: Vec<PageText>,
}

impl DocumentContext {
    /// Split raw `pdftotext` output into tagged pages.
    ///
    /// Segments that are blank after trimming are dropped, including a blank
    /// page in the middle of the document.
    pub fn from_raw(raw: &str, max_page_chars: usize, numbering: PageNumbering) -> Self {
        let mut pages: Vec<PageText> = Vec::new();

        for (index, segment) in raw.split(PAGE_SEPARATOR).enumerate() {
            let clean = segment.trim();
            if clean.is_empty() {
                continue;
            }

            let number = match numbering {
                PageNumbering::Survivor => pages.len() + 1,
                PageNumbering::Original => index + 1,
            } as u32;

            let (text, truncated) = truncate_chars(clean, max_page_chars);
            pages.push(PageText {
                number,
                text,
                truncated,
            });
        }

        Self { pages }
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Render the `<document_context>` envelope.
    pub fn render(&self) -> String {
        let blocks: Vec<String> = self
            .pages
            .iter()
            .map(|page| format!("<page-{n}>\n{}\n</page-{n}>", page.text, n = page.number))
            .collect();
        format!("<document_context>\n{}\n</document_context>", blocks.join("\n"))
    }
}

impl std::fmt::Display for DocumentContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

/// Keep at most `max_chars` characters, appending the marker when cut.
fn truncate_chars(text: &str, max_chars: usize) -> (String, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => (format!("{}{}", &text[..byte_index], TRUNCATION_MARKER), true),
        None => (text.to_string(), false),
    }
}

/// Runs `pdftotext` with the configured executable and limits.
#[derive(Debug, Clone, Default)]
pub struct TextExtractor {
    config: ToolConfig,
}

impl TextExtractor {
    pub fn new(config: ToolConfig) -> Self {
        Self { config }
    }

    /// Raw layout-preserving text of the whole document, pages separated by
    /// form feeds.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn extract_raw(&self, path: &Path) -> Result<String> {
        let output = tool::run(
            &self.config.pdftotext,
            [
                OsStr::new("-layout"),
                OsStr::new("-enc"),
                OsStr::new("UTF-8"),
                path.as_os_str(),
                OsStr::new("-"),
            ],
        )?;

        if !output.status.success() {
            let reason = tool::failure_reason(&output);
            warn!(%reason, "pdftotext failed");
            return Err(PagewrightError::Extraction(format!(
                "pdftotext on {}: {}",
                path.display(),
                reason
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Extract the document's text as tagged pages.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn extract_context(&self, path: &Path) -> Result<DocumentContext> {
        info!("Extracting document text");
        let raw = self.extract_raw(path)?;
        let segments = raw.split(PAGE_SEPARATOR).count();
        let context =
            DocumentContext::from_raw(&raw, self.config.max_page_chars, self.config.page_numbering);

        debug!(
            segments,
            pages = context.pages.len(),
            truncated = context.pages.iter().filter(|page| page.truncated).count(),
            "Text extraction complete"
        );
        Ok(context)
    }
}

/// Extract tagged per-page text using the default configuration.
pub fn extract_document_context(path: impl AsRef<Path>) -> Result<DocumentContext> {
    TextExtractor::default().extract_context(path.as_ref())
}

/// Extract the full text of a PDF wrapped in `<document_context>` and
/// `<page-N>` tags. Tool failure is reported as
/// [`PagewrightError::Extraction`], never as an empty string.
pub fn extract_full_text(path: impl AsRef<Path>) -> Result<String> {
    Ok(extract_document_context(path)?.render())
}
