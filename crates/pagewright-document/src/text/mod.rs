// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text module — whole-document text extraction with page markers.

pub mod extract;

pub use extract::{
    DocumentContext, PageText, TextExtractor, extract_document_context, extract_full_text,
};
