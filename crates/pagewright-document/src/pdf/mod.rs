// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — page counting, page geometry, and page replacement.

pub mod rebuild;
pub mod reader;

pub use rebuild::{PageRebuilder, batch_replace_pages, replace_page_in_pdf};
pub use reader::{PdfReader, get_page_count, page_geometry};
