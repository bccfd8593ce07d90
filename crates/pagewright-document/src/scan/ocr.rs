// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-process rehydration using the `ocrs` crate, a pure-Rust OCR engine
// backed by neural network models executed via `rten`, with the output page
// assembled by `printpdf`.
//
// # Feature Gate
//
// This module is only available when the `ocr` feature is enabled:
//
// ```toml
// pagewright-document = { path = "crates/pagewright-document", features = ["ocr"] }
// ```
//
// # Model Setup
//
// The engine requires two model files:
//
// - **Detection model** (`text-detection.rten`): locates text regions in the image.
// - **Recognition model** (`text-recognition.rten`): decodes characters from detected regions.
//
// Running `ocrs-cli` once downloads both to `$XDG_CACHE_HOME/ocrs`
// (typically `~/.cache/ocrs`), which is where the default config looks.

use std::path::{Path, PathBuf};

use ocrs::{ImageSource, OcrEngine as OcrsEngine, OcrEngineParams, TextItem};
use pagewright_core::error::{PagewrightError, Result};
use printpdf::{
    BuiltinFont, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Point, Pt, RawImage,
    RawImageData, RawImageFormat, TextItem as PdfTextItem, TextRenderingMode, XObjectTransform,
};
use rten::Model;
use rten_imageproc::Rect;
use tracing::{debug, info, instrument};

use super::rehydrate::Rehydrator;
use crate::render::PageImage;

/// Resolution assumed for images that do not say what they were rendered at.
const FALLBACK_DPI: u32 = 200;

const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// `$XDG_CACHE_HOME/ocrs`, falling back to `~/.cache/ocrs`.
fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        PathBuf::from("ocrs-models")
    }
}

/// Locations of the two `ocrs` model files.
#[derive(Debug, Clone)]
pub struct OcrModels {
    pub detection_model_path: PathBuf,
    pub recognition_model_path: PathBuf,
}

impl Default for OcrModels {
    fn default() -> Self {
        Self::from_dir(default_model_dir())
    }
}

impl OcrModels {
    /// Expects `dir` to contain `text-detection.rten` and `text-recognition.rten`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection_model_path: dir.join(DETECTION_MODEL_FILENAME),
            recognition_model_path: dir.join(RECOGNITION_MODEL_FILENAME),
        }
    }

    pub fn validate(&self) -> Result<()> {
        for path in [&self.detection_model_path, &self.recognition_model_path] {
            if !path.exists() {
                return Err(PagewrightError::Ocr(format!(
                    "model not found at {}; run `ocrs-cli` once to download models",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

/// One recognised line, in image pixel coordinates (origin top-left).
#[derive(Debug, Clone)]
struct RecognizedLine {
    text: String,
    left: f32,
    bottom: f32,
    height: f32,
}

/// Rehydrator that runs OCR in-process and draws recognised lines with the
/// invisible text rendering mode over the full-page bitmap.
pub struct OcrsRehydrator {
    engine: OcrsEngine,
}

impl OcrsRehydrator {
    /// Load both models. This is the expensive step; reuse the rehydrator
    /// across pages.
    #[instrument(skip_all, fields(
        detection = %models.detection_model_path.display(),
        recognition = %models.recognition_model_path.display()
    ))]
    pub fn new(models: OcrModels) -> Result<Self> {
        models.validate()?;

        let load = |path: &Path| {
            Model::load_file(path).map_err(|err| {
                PagewrightError::Ocr(format!("failed to load model {}: {}", path.display(), err))
            })
        };
        let detection_model = load(&models.detection_model_path)?;
        let recognition_model = load(&models.recognition_model_path)?;

        let engine = OcrsEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|err| PagewrightError::Ocr(format!("failed to initialise OCR engine: {}", err)))?;

        info!("OCR engine initialised");
        Ok(Self { engine })
    }

    pub fn with_defaults() -> Result<Self> {
        Self::new(OcrModels::default())
    }

    fn recognize_lines(&self, image: &PageImage) -> Result<Vec<RecognizedLine>> {
        let rgb = image.as_dynamic().to_rgb8();
        let (width, height) = rgb.dimensions();

        let source = ImageSource::from_bytes(rgb.as_raw(), (width, height)).map_err(|err| {
            PagewrightError::Ocr(format!("failed to create image source ({}x{}): {}", width, height, err))
        })?;
        let input = self
            .engine
            .prepare_input(source)
            .map_err(|err| PagewrightError::Ocr(format!("OCR preprocessing failed: {}", err)))?;

        let word_rects = self
            .engine
            .detect_words(&input)
            .map_err(|err| PagewrightError::Ocr(format!("word detection failed: {}", err)))?;
        let line_rects = self.engine.find_text_lines(&input, &word_rects);
        let line_texts = self
            .engine
            .recognize_text(&input, &line_rects)
            .map_err(|err| PagewrightError::Ocr(format!("line recognition failed: {}", err)))?;

        let lines: Vec<RecognizedLine> = line_texts
            .iter()
            .flatten()
            .filter_map(|line| {
                let text = line.to_string();
                if text.trim().is_empty() {
                    return None;
                }
                let rect: Rect = line.bounding_rect();
                Some(RecognizedLine {
                    text,
                    left: rect.left() as f32,
                    bottom: rect.bottom() as f32,
                    height: rect.height() as f32,
                })
            })
            .collect();

        debug!(words = word_rects.len(), lines = lines.len(), "OCR recognition complete");
        Ok(lines)
    }
}

impl Rehydrator for OcrsRehydrator {
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    fn rehydrate_to_bytes(&self, image: &PageImage) -> Result<Vec<u8>> {
        let lines = self.recognize_lines(image)?;
        let dpi = image.dpi().unwrap_or(FALLBACK_DPI) as f32;
        Ok(compose_page(image, &lines, dpi))
    }
}

/// Lay out one page the size of the bitmap at `dpi`: the bitmap fills the
/// page and every line is written invisibly over where it was recognised.
fn compose_page(image: &PageImage, lines: &[RecognizedLine], dpi: f32) -> Vec<u8> {
    let px_to_pt = 72.0 / dpi;
    let page_w_pt = image.width() as f32 * px_to_pt;
    let page_h_pt = image.height() as f32 * px_to_pt;

    let mut doc = PdfDocument::new("Rehydrated page");
    let rgb = image.as_dynamic().to_rgb8();
    let raw = RawImage {
        pixels: RawImageData::U8(rgb.into_raw()),
        width: image.width() as usize,
        height: image.height() as usize,
        data_format: RawImageFormat::RGB8,
        tag: Vec::new(),
    };
    let xobject_id = doc.add_image(&raw);

    let mut ops = vec![Op::UseXobject {
        id: xobject_id,
        transform: XObjectTransform {
            translate_x: Some(Pt(0.0)),
            translate_y: Some(Pt(0.0)),
            scale_x: Some(1.0),
            scale_y: Some(1.0),
            dpi: Some(dpi),
            rotate: None,
        },
    }];

    for line in lines {
        ops.push(Op::StartTextSection);
        ops.push(Op::SetTextRenderingMode {
            mode: TextRenderingMode::Invisible,
        });
        ops.push(Op::SetTextCursor {
            pos: Point {
                x: Pt(line.left * px_to_pt),
                y: Pt(page_h_pt - line.bottom * px_to_pt),
            },
        });
        ops.push(Op::SetFontSizeBuiltinFont {
            size: Pt((line.height * px_to_pt).max(1.0)),
            font: BuiltinFont::Helvetica,
        });
        ops.push(Op::WriteTextBuiltinFont {
            items: vec![PdfTextItem::Text(line.text.clone())],
            font: BuiltinFont::Helvetica,
        });
        ops.push(Op::EndTextSection);
    }

    let to_mm = |pt: f32| Mm(pt * 25.4 / 72.0);
    doc.with_pages(vec![PdfPage::new(to_mm(page_w_pt), to_mm(page_h_pt), ops)]);

    let mut warnings: Vec<PdfWarnMsg> = Vec::new();
    doc.save(&PdfSaveOptions::default(), &mut warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GrayImage, Luma};

    #[test]
    fn models_from_dir() {
        let models = OcrModels::from_dir("/tmp/my-models");
        assert_eq!(
            models.detection_model_path,
            PathBuf::from("/tmp/my-models/text-detection.rten")
        );
        assert_eq!(
            models.recognition_model_path,
            PathBuf::from("/tmp/my-models/text-recognition.rten")
        );
    }

    #[test]
    fn validate_missing_models() {
        assert!(OcrModels::from_dir("/nonexistent/ocr-models").validate().is_err());
    }

    #[test]
    fn composed_page_matches_bitmap_size() {
        let image = PageImage::from_dynamic(DynamicImage::ImageLuma8(GrayImage::from_pixel(
            200,
            400,
            Luma([255u8]),
        )));
        let lines = vec![RecognizedLine {
            text: "Hello".into(),
            left: 10.0,
            bottom: 50.0,
            height: 20.0,
        }];
        let bytes = compose_page(&image, &lines, 100.0);

        let reader = crate::pdf::PdfReader::from_bytes(&bytes).unwrap();
        assert_eq!(reader.page_count(), 1);
        let geometry = reader.page_geometry(1).unwrap();
        assert!((geometry.width - 144.0).abs() < 0.5, "width {}", geometry.width);
        assert!((geometry.height - 288.0).abs() < 0.5, "height {}", geometry.height);
    }
}
