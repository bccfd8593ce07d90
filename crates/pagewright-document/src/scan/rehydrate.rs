// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page rehydrator — turns a page bitmap back into a single-page PDF whose
// visible content is the bitmap and whose text layer is the OCR result,
// rendered invisibly. Layout of the text layer is left to the OCR engine.

use std::ffi::OsString;
use std::path::Path;

use pagewright_core::ToolConfig;
use pagewright_core::error::{PagewrightError, Result};
use tracing::{debug, info, instrument};

use crate::render::PageImage;
use crate::tool;

/// Converts a page image into a searchable single-page PDF.
pub trait Rehydrator {
    /// Produce the PDF bytes for `image`.
    fn rehydrate_to_bytes(&self, image: &PageImage) -> Result<Vec<u8>>;

    /// Produce the PDF and write it to `output`, replacing any existing file.
    fn rehydrate(&self, image: &PageImage, output: &Path) -> Result<()> {
        let bytes = self.rehydrate_to_bytes(image)?;
        std::fs::write(output, &bytes)?;
        info!(bytes = bytes.len(), "Wrote rehydrated page to {}", output.display());
        Ok(())
    }
}

/// Rehydration through the `tesseract` command-line engine and its PDF
/// renderer.
#[derive(Debug, Clone, Default)]
pub struct TesseractRehydrator {
    config: ToolConfig,
}

impl TesseractRehydrator {
    pub fn new(config: ToolConfig) -> Self {
        Self { config }
    }
}

impl Rehydrator for TesseractRehydrator {
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    fn rehydrate_to_bytes(&self, image: &PageImage) -> Result<Vec<u8>> {
        let scratch = tempfile::tempdir()?;
        let input = scratch.path().join("page.png");
        image.save(&input)?;

        // The bitmap carries no resolution metadata tesseract can trust, so
        // pass the one it was rendered at.
        let dpi = image.dpi().unwrap_or(self.config.render_dpi);
        let args: Vec<OsString> = vec![
            input.into(),
            "stdout".into(),
            "--dpi".into(),
            dpi.to_string().into(),
            "-l".into(),
            self.config.ocr_language.clone().into(),
            "pdf".into(),
        ];
        let output = tool::run(&self.config.tesseract, args)?;

        if !output.status.success() {
            return Err(PagewrightError::Ocr(format!(
                "tesseract {}",
                tool::failure_reason(&output)
            )));
        }
        if !output.stdout.starts_with(b"%PDF") {
            return Err(PagewrightError::Ocr(format!(
                "tesseract returned {} bytes that are not a PDF",
                output.stdout.len()
            )));
        }

        debug!(dpi, pdf_bytes = output.stdout.len(), "OCR complete");
        Ok(output.stdout)
    }
}

/// OCR `image` with tesseract and write the resulting single-page PDF to
/// `output`. The image is consumed.
pub fn rehydrate_image_to_pdf(image: PageImage, output: impl AsRef<Path>) -> Result<()> {
    TesseractRehydrator::default().rehydrate(&image, output.as_ref())
}
