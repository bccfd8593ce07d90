// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader — open existing documents and inspect their page sequence and
// page geometry using the `lopdf` crate.

use std::path::Path;

use lopdf::{Dictionary, Document, Object, ObjectId};
use pagewright_core::PageGeometry;
use pagewright_core::error::{PagewrightError, Result};
use tracing::{debug, info, instrument};

/// Page attributes a page may inherit from its ancestors in the page tree.
pub(crate) const INHERITABLE_KEYS: [&[u8]; 4] = [b"MediaBox", b"Resources", b"CropBox", b"Rotate"];

/// Guard against malformed page trees whose /Parent chain loops.
const MAX_TREE_DEPTH: usize = 64;

/// Read-only view of an existing PDF's page sequence.
///
/// Wraps `lopdf::Document`. Opened fresh for each operation; nothing is cached
/// across calls.
pub struct PdfReader {
    /// The underlying lopdf document.
    document: Document,
    /// Source path, if opened from a file (useful for diagnostics).
    source_path: Option<String>,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        info!("Opening PDF: {}", path_ref.display());

        let document = Document::load(path_ref).map_err(|err| {
            PagewrightError::PdfError(format!("failed to open {}: {}", path_ref.display(), err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded");

        Ok(Self {
            document,
            source_path: Some(path_ref.display().to_string()),
        })
    }

    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data).map_err(|err| {
            PagewrightError::PdfError(format!("failed to load PDF from memory: {}", err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");

        Ok(Self {
            document,
            source_path: None,
        })
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    /// Return the source path if the reader was created via [`PdfReader::open`].
    pub fn source_path(&self) -> Option<&str> {
        self.source_path.as_deref()
    }

    /// Object id of a 1-indexed page.
    pub fn page_id(&self, page_number: u32) -> Result<ObjectId> {
        let pages = self.document.get_pages();
        pages
            .get(&page_number)
            .copied()
            .ok_or(PagewrightError::PageOutOfRange {
                page: page_number,
                total: pages.len() as u32,
            })
    }

    /// Effective media box of a 1-indexed page, following inheritance.
    pub fn page_geometry(&self, page_number: u32) -> Result<PageGeometry> {
        let page_id = self.page_id(page_number)?;
        media_box(&self.document, page_id)
    }

    /// Geometry of every page, in page order.
    pub fn geometries(&self) -> Result<Vec<PageGeometry>> {
        self.document
            .get_pages()
            .values()
            .map(|page_id| media_box(&self.document, *page_id))
            .collect()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }
}

/// Number of pages in the PDF at `path`.
pub fn get_page_count(path: impl AsRef<Path>) -> Result<u32> {
    Ok(PdfReader::open(path)?.page_count())
}

/// Width and height of a 1-indexed page of the PDF at `path`.
pub fn page_geometry(path: impl AsRef<Path>, page_number: u32) -> Result<PageGeometry> {
    PdfReader::open(path)?.page_geometry(page_number)
}

// -- Page tree helpers ---------------------------------------------------------

/// Follow a reference to the object it names; direct objects pass through.
pub(crate) fn resolve<'a>(document: &'a Document, object: &'a Object) -> Result<&'a Object> {
    match object {
        Object::Reference(id) => document.get_object(*id).map_err(|err| {
            PagewrightError::PdfError(format!("cannot resolve reference {:?}: {}", id, err))
        }),
        other => Ok(other),
    }
}

pub(crate) fn page_dictionary(document: &Document, page_id: ObjectId) -> Result<&Dictionary> {
    document.get_dictionary(page_id).map_err(|err| {
        PagewrightError::PdfError(format!("cannot read page object {:?}: {}", page_id, err))
    })
}

/// Look up `key` on a page, walking up the /Parent chain for inheritable
/// attributes. The returned object is resolved if it was a reference.
pub(crate) fn inherited_attribute<'a>(
    document: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Result<Option<&'a Object>> {
    let mut node = page_dictionary(document, page_id)?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = node.get(key) {
            return resolve(document, value).map(Some);
        }
        let parent_id = match node.get(b"Parent") {
            Ok(Object::Reference(id)) => *id,
            _ => return Ok(None),
        };
        node = document.get_dictionary(parent_id).map_err(|err| {
            PagewrightError::PdfError(format!("broken /Parent {:?}: {}", parent_id, err))
        })?;
    }
    Err(PagewrightError::PdfError(format!(
        "page tree deeper than {} levels above {:?}",
        MAX_TREE_DEPTH, page_id
    )))
}

/// Numeric value of an Integer or Real object.
pub(crate) fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value as f32),
        _ => None,
    }
}

/// Parse a `[llx lly urx ury]` rectangle.
pub(crate) fn rectangle(document: &Document, object: &Object) -> Result<[f32; 4]> {
    let invalid = || PagewrightError::PdfError(format!("malformed rectangle: {:?}", object));
    let array = resolve(document, object)?.as_array().map_err(|_| invalid())?;
    if array.len() != 4 {
        return Err(invalid());
    }
    let mut rect = [0.0f32; 4];
    for (slot, item) in rect.iter_mut().zip(array) {
        *slot = number(resolve(document, item)?).ok_or_else(invalid)?;
    }
    Ok(rect)
}

/// Effective /MediaBox of a page.
pub(crate) fn media_box(document: &Document, page_id: ObjectId) -> Result<PageGeometry> {
    let object = inherited_attribute(document, page_id, b"MediaBox")?.ok_or_else(|| {
        PagewrightError::PdfError(format!("page {:?} has no /MediaBox", page_id))
    })?;
    let [llx, lly, urx, ury] = rectangle(document, object)?;
    Ok(PageGeometry::from_media_box(llx, lly, urx, ury))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Stream, dictionary};

    /// Two pages: the first inherits its media box from /Pages, the second
    /// overrides it with a landscape box stored as an indirect object.
    fn inherited_box_document() -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let content_id = doc.add_object(Stream::new(dictionary! {}, b"".to_vec()));
        let first = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        let landscape = doc.add_object(Object::Array(vec![
            0.into(),
            0.into(),
            792.into(),
            Object::Real(612.5f32.into()),
        ]));
        let second = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => landscape,
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![first.into(), second.into()],
                "Count" => 2,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn counts_pages() {
        let reader = PdfReader::from_bytes(&inherited_box_document()).unwrap();
        assert_eq!(reader.page_count(), 2);
        assert!(reader.source_path().is_none());
    }

    #[test]
    fn media_box_is_inherited_from_page_tree() {
        let reader = PdfReader::from_bytes(&inherited_box_document()).unwrap();
        let geometry = reader.page_geometry(1).unwrap();
        assert_eq!((geometry.width, geometry.height), (612.0, 792.0));
    }

    #[test]
    fn indirect_media_box_is_resolved() {
        let reader = PdfReader::from_bytes(&inherited_box_document()).unwrap();
        let geometry = reader.page_geometry(2).unwrap();
        assert_eq!((geometry.width, geometry.height), (792.0, 612.5));
    }

    #[test]
    fn page_lookup_is_bounds_checked() {
        let reader = PdfReader::from_bytes(&inherited_box_document()).unwrap();
        for page in [0, 3] {
            match reader.page_geometry(page).unwrap_err() {
                PagewrightError::PageOutOfRange { page: p, total } => {
                    assert_eq!((p, total), (page, 2));
                }
                other => panic!("unexpected error variant: {other}"),
            }
        }
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        assert!(matches!(
            PdfReader::from_bytes(b"not a pdf"),
            Err(PagewrightError::PdfError(_))
        ));
    }
}
