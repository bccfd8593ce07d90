// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning pipeline — OCR "rehydration" of page bitmaps back into searchable
// single-page PDFs.

pub mod rehydrate;

#[cfg(feature = "ocr")]
pub mod ocr;

pub use rehydrate::{Rehydrator, TesseractRehydrator, rehydrate_image_to_pdf};

#[cfg(feature = "ocr")]
pub use ocr::{OcrModels, OcrsRehydrator};
