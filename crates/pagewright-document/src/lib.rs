// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagewright-document — PDF page operations for Pagewright.
//
// Extracts per-page text into a tagged context block (pdftotext), renders
// single pages to bitmaps (pdftoppm), OCRs a bitmap back into a searchable
// single-page PDF (tesseract, or `ocrs` behind the `ocr` feature), and
// rebuilds documents with pages swapped for replacements rescaled to the
// original page size (lopdf).

pub mod pdf;
pub mod probe;
pub mod render;
pub mod scan;
pub mod text;

mod tool;

// Re-export the primary entry points so callers can use
// `pagewright_document::batch_replace_pages` etc.
pub use pdf::rebuild::{PageRebuilder, batch_replace_pages, replace_page_in_pdf};
pub use pdf::reader::{PdfReader, get_page_count, page_geometry};
pub use probe::{DependencyReport, check_system_dependencies, probe_dependencies, probe_with_config};
pub use render::rasterize::{PageImage, PageRasterizer, render_page_as_image};
pub use scan::rehydrate::{Rehydrator, TesseractRehydrator, rehydrate_image_to_pdf};
pub use text::extract::{
    DocumentContext, PageText, TextExtractor, extract_document_context, extract_full_text,
};

pub use pagewright_core::{
    Dependency, HostPlatform, PageGeometry, PageNumbering, PagewrightError, ReplacementMap,
    Result, ToolConfig,
};

#[cfg(feature = "ocr")]
pub use scan::ocr::{OcrModels, OcrsRehydrator};
