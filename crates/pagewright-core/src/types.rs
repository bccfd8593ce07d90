// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for Pagewright.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Intrinsic geometry of a page in PDF user-space units (1/72 inch).
///
/// `x` and `y` are the lower-left corner of the media box, which is not
/// always the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PageGeometry {
    /// Build a geometry from a `[llx lly urx ury]` media box.
    pub fn from_media_box(llx: f32, lly: f32, urx: f32, ury: f32) -> Self {
        Self {
            x: llx.min(urx),
            y: lly.min(ury),
            width: (urx - llx).abs(),
            height: (ury - lly).abs(),
        }
    }

    /// Independent horizontal and vertical factors that map `self` onto
    /// `target`'s width and height.
    pub fn scale_factors_to(&self, target: &PageGeometry) -> (f32, f32) {
        let sx = if self.width > 0.0 { target.width / self.width } else { 1.0 };
        let sy = if self.height > 0.0 { target.height / self.height } else { 1.0 };
        (sx, sy)
    }
}

/// Page position → replacement single-page PDF.
///
/// Keys are 1-indexed page numbers and unique by construction. Keys that are
/// out of range for the target document are not rejected here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplacementMap(BTreeMap<u32, PathBuf>);

impl ReplacementMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `page_number` to `fragment`, returning the path it replaced.
    pub fn insert(&mut self, page_number: u32, fragment: impl Into<PathBuf>) -> Option<PathBuf> {
        self.0.insert(page_number, fragment.into())
    }

    pub fn get(&self, page_number: u32) -> Option<&Path> {
        self.0.get(&page_number).map(PathBuf::as_path)
    }

    pub fn contains(&self, page_number: u32) -> bool {
        self.0.contains_key(&page_number)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &Path)> {
        self.0.iter().map(|(page, path)| (*page, path.as_path()))
    }

    /// Page numbers that fall outside `1..=page_count`.
    pub fn out_of_range(&self, page_count: u32) -> Vec<u32> {
        self.0
            .keys()
            .copied()
            .filter(|page| *page == 0 || *page > page_count)
            .collect()
    }
}

impl<P: Into<PathBuf>> FromIterator<(u32, P)> for ReplacementMap {
    fn from_iter<I: IntoIterator<Item = (u32, P)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(page, path)| (page, path.into())).collect())
    }
}

/// How `<page-N>` tags are numbered in extracted text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageNumbering {
    /// Position among non-blank pages. Interior blank pages shift the
    /// numbers of every page after them.
    #[default]
    Survivor,
    /// True page number in the source document.
    Original,
}

/// External executables the toolkit shells out to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dependency {
    /// poppler's text extractor.
    Pdftotext,
    /// poppler's page rasteriser.
    Pdftoppm,
    /// Tesseract OCR engine.
    Tesseract,
}

impl Dependency {
    pub const ALL: [Dependency; 3] = [Self::Pdftotext, Self::Pdftoppm, Self::Tesseract];

    /// Default executable name on the search path.
    pub fn executable(&self) -> &'static str {
        match self {
            Self::Pdftotext => "pdftotext",
            Self::Pdftoppm => "pdftoppm",
            Self::Tesseract => "tesseract",
        }
    }

    /// Name shown to users, including the package that provides it.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pdftotext => "pdftotext (poppler/poppler-utils)",
            Self::Pdftoppm => "pdftoppm (poppler/poppler-utils)",
            Self::Tesseract => "tesseract",
        }
    }
}

impl std::fmt::Display for Dependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Host operating system family, used to pick an install command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostPlatform {
    MacOs,
    Linux,
    Other,
}

impl HostPlatform {
    pub fn current() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    /// Classify a `std::env::consts::OS` value.
    pub fn from_os(os: &str) -> Self {
        match os {
            "macos" => Self::MacOs,
            "linux" => Self::Linux,
            _ => Self::Other,
        }
    }

    pub fn install_hint(&self) -> &'static str {
        match self {
            Self::MacOs => "brew install poppler tesseract",
            Self::Linux => "sudo apt-get install poppler-utils tesseract-ocr",
            Self::Other => {
                "choco install poppler tesseract\n(You may need to restart your terminal after installation)"
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry_from_offset_media_box() {
        let geometry = PageGeometry::from_media_box(10.0, 20.0, 622.0, 812.0);
        assert_eq!(geometry.x, 10.0);
        assert_eq!(geometry.y, 20.0);
        assert_eq!(geometry.width, 612.0);
        assert_eq!(geometry.height, 792.0);
    }

    #[test]
    fn scale_factors_are_independent() {
        let fragment = PageGeometry::from_media_box(0.0, 0.0, 1000.0, 500.0);
        let target = PageGeometry::from_media_box(0.0, 0.0, 500.0, 500.0);
        assert_eq!(fragment.scale_factors_to(&target), (0.5, 1.0));
    }

    #[test]
    fn replacement_map_reports_out_of_range_keys() {
        let map: ReplacementMap = [(0, "a.pdf"), (2, "b.pdf"), (6, "c.pdf")].into_iter().collect();
        assert_eq!(map.out_of_range(5), vec![0, 6]);
        assert!(map.contains(2));
        assert_eq!(map.get(2), Some(Path::new("b.pdf")));
    }

    #[test]
    fn replacement_map_keys_are_unique() {
        let mut map = ReplacementMap::new();
        assert!(map.insert(3, "first.pdf").is_none());
        assert_eq!(map.insert(3, "second.pdf"), Some(PathBuf::from("first.pdf")));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn platform_hints() {
        assert_eq!(HostPlatform::from_os("macos"), HostPlatform::MacOs);
        assert_eq!(HostPlatform::from_os("linux"), HostPlatform::Linux);
        assert_eq!(HostPlatform::from_os("windows"), HostPlatform::Other);
        assert!(HostPlatform::Linux.install_hint().contains("poppler-utils"));
        assert!(HostPlatform::Other.install_hint().starts_with("choco"));
    }
}
