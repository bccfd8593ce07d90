// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page rasteriser — renders one page of a PDF to an in-memory bitmap with
// poppler's `pdftoppm`. Only the requested page is rendered.

use std::ffi::OsString;
use std::path::Path;

use image::{DynamicImage, ImageFormat};
use pagewright_core::ToolConfig;
use pagewright_core::error::{PagewrightError, Result};
use tracing::{debug, info, instrument};

use crate::tool;

/// Bitmap of exactly one page, owned by whoever holds it.
#[derive(Debug, Clone)]
pub struct PageImage {
    image: DynamicImage,
    /// Resolution the page was rendered at, if known.
    dpi: Option<u32>,
}

impl PageImage {
    /// Wrap an image from any source, e.g. an externally edited page.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image, dpi: None }
    }

    /// Load an image file (PNG, JPEG, ...).
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let image = image::open(path.as_ref()).map_err(|err| {
            PagewrightError::ImageError(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        Ok(Self::from_dynamic(image))
    }

    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = Some(dpi);
        self
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dpi(&self) -> Option<u32> {
        self.dpi
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    /// Encode as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        self.image
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|err| PagewrightError::ImageError(format!("PNG encoding failed: {}", err)))?;
        Ok(buffer)
    }

    /// Write the image to a file. The format is inferred from the file extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.image.save(path.as_ref()).map_err(|err| {
            PagewrightError::ImageError(format!(
                "failed to save image to {}: {}",
                path.as_ref().display(),
                err
            ))
        })
    }
}

impl From<DynamicImage> for PageImage {
    fn from(image: DynamicImage) -> Self {
        Self::from_dynamic(image)
    }
}

/// Renders single pages via `pdftoppm`.
#[derive(Debug, Clone, Default)]
pub struct PageRasterizer {
    config: ToolConfig,
}

impl PageRasterizer {
    pub fn new(config: ToolConfig) -> Self {
        Self { config }
    }

    /// Render a 1-indexed page. The page number is not checked against the
    /// document; an out-of-range page makes `pdftoppm` render nothing, which
    /// is reported as [`PagewrightError::Render`].
    #[instrument(skip(self), fields(path = %path.display(), dpi = self.config.render_dpi))]
    pub fn render_page(&self, path: &Path, page_number: u32) -> Result<PageImage> {
        info!("Rendering page");

        let scratch = tempfile::tempdir()?;
        let prefix = scratch.path().join("page");
        let page = page_number.to_string();
        let dpi = self.config.render_dpi.to_string();

        let args: Vec<OsString> = vec![
            "-png".into(),
            "-r".into(),
            dpi.into(),
            "-f".into(),
            page.clone().into(),
            "-l".into(),
            page.into(),
            "-singlefile".into(),
            path.into(),
            prefix.clone().into(),
        ];
        let output = tool::run(&self.config.pdftoppm, args)?;

        if !output.status.success() {
            return Err(PagewrightError::Render(format!(
                "pdftoppm could not render page {} of {}: {}",
                page_number,
                path.display(),
                tool::failure_reason(&output)
            )));
        }

        let rendered = prefix.with_extension("png");
        if !rendered.exists() {
            return Err(PagewrightError::Render(format!(
                "could not render page {}",
                page_number
            )));
        }

        let image = image::open(&rendered).map_err(|err| {
            PagewrightError::ImageError(format!("failed to decode rendered page: {}", err))
        })?;
        debug!(width = image.width(), height = image.height(), "Page rendered");

        Ok(PageImage::from_dynamic(image).with_dpi(self.config.render_dpi))
    }
}

/// Render a 1-indexed page of the PDF at `path` with the default settings.
pub fn render_page_as_image(path: impl AsRef<Path>, page_number: u32) -> Result<PageImage> {
    PageRasterizer::default().render_page(path.as_ref(), page_number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn checkerboard() -> PageImage {
        let img = RgbImage::from_fn(8, 4, |x, y| {
            if (x + y) % 2 == 0 { Rgb([255, 255, 255]) } else { Rgb([0, 0, 0]) }
        });
        PageImage::from_dynamic(DynamicImage::ImageRgb8(img))
    }

    #[test]
    fn png_bytes_round_trip_dimensions() {
        let page = checkerboard();
        let bytes = page.to_png_bytes().unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 4));
    }

    #[test]
    fn dpi_is_only_known_when_set() {
        let page = checkerboard();
        assert_eq!(page.dpi(), None);
        assert_eq!(page.with_dpi(300).dpi(), Some(300));
    }

    #[test]
    fn save_and_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.png");
        checkerboard().save(&path).unwrap();

        let reopened = PageImage::open(&path).unwrap();
        assert_eq!((reopened.width(), reopened.height()), (8, 4));
    }

    #[cfg(unix)]
    #[test]
    fn renderer_that_writes_nothing_is_a_render_error() {
        // `true` exits 0 without producing a PNG.
        let rasterizer = PageRasterizer::new(ToolConfig {
            pdftoppm: "true".into(),
            ..ToolConfig::default()
        });
        let err = rasterizer.render_page(Path::new("doc.pdf"), 4).unwrap_err();
        match err {
            PagewrightError::Render(msg) => assert!(msg.contains("page 4"), "{msg}"),
            other => panic!("unexpected error variant: {other}"),
        }
    }
}
