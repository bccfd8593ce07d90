// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page rebuilder — swap selected pages of a document for single-page PDFs,
// rescaling each replacement to the geometry of the page it replaces.

use std::collections::HashMap;
use std::path::Path;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use pagewright_core::error::{PagewrightError, Result};
use pagewright_core::ReplacementMap;
use tracing::{debug, info, instrument, warn};

use super::reader::{
    INHERITABLE_KEYS, inherited_attribute, media_box, page_dictionary, rectangle, resolve,
};

/// Page boxes rescaled together with the content.
const PAGE_BOXES: [&[u8]; 5] = [b"MediaBox", b"CropBox", b"BleedBox", b"TrimBox", b"ArtBox"];

/// Rebuilds a document in memory, one replacement at a time.
///
/// Untouched pages keep their original objects. The page tree shape, page
/// count, and page order never change: a replacement takes over the exact
/// /Kids slot of the page it replaces.
pub struct PageRebuilder {
    document: Document,
    /// Page number → page object id, snapshotted at open.
    pages: Vec<ObjectId>,
    replaced: usize,
}

impl PageRebuilder {
    // -- Construction ---------------------------------------------------------

    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        let document = Document::load(path_ref).map_err(|err| {
            PagewrightError::PdfError(format!("failed to open {}: {}", path_ref.display(), err))
        })?;
        Ok(Self::from_document(document))
    }

    pub fn from_document(document: Document) -> Self {
        let pages = document.get_pages().into_values().collect();
        Self {
            document,
            pages,
            replaced: 0,
        }
    }

    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Number of pages replaced so far.
    pub fn replaced(&self) -> usize {
        self.replaced
    }

    // -- Replacement ----------------------------------------------------------

    /// Replace a 1-indexed page with the first page of `fragment`, scaled to
    /// the replaced page's width and height.
    #[instrument(skip(self, fragment), fields(page_number))]
    pub fn replace_page(&mut self, page_number: u32, fragment: &Document) -> Result<()> {
        let total = self.page_count();
        let target_id = page_number
            .checked_sub(1)
            .and_then(|index| self.pages.get(index as usize))
            .copied()
            .ok_or(PagewrightError::PageOutOfRange {
                page: page_number,
                total,
            })?;

        let fragment_page = fragment.get_pages().values().next().copied().ok_or_else(|| {
            PagewrightError::EmptyFragment {
                path: "<in-memory document>".to_string(),
            }
        })?;

        let target = media_box(&self.document, target_id)?;
        let source = media_box(fragment, fragment_page)?;

        let new_page = import_page(fragment, &mut self.document, fragment_page)?;
        let (sx, sy) = source.scale_factors_to(&target);
        scale_page(&mut self.document, new_page, sx, sy)?;
        swap_into_tree(&mut self.document, target_id, new_page)?;

        self.pages[(page_number - 1) as usize] = new_page;
        self.replaced += 1;

        debug!(
            page_number,
            source_width = source.width,
            source_height = source.height,
            target_width = target.width,
            target_height = target.height,
            sx,
            sy,
            "Page replaced"
        );
        Ok(())
    }

    /// Apply every in-range entry of `replacements`. Keys outside
    /// `1..=page_count` are skipped without error and their files are never
    /// opened.
    #[instrument(skip_all, fields(replacements = replacements.len()))]
    pub fn apply(&mut self, replacements: &ReplacementMap) -> Result<usize> {
        let total = self.page_count();
        let ignored = replacements.out_of_range(total);
        if !ignored.is_empty() {
            warn!(?ignored, total, "Ignoring replacements outside the document");
        }

        let mut applied = 0;
        for (page_number, fragment_path) in replacements.iter() {
            if page_number == 0 || page_number > total {
                continue;
            }
            let fragment = load_fragment(fragment_path)?;
            self.replace_page(page_number, &fragment)?;
            applied += 1;
        }
        Ok(applied)
    }

    // -- Output ---------------------------------------------------------------

    /// Drop objects orphaned by replacement and serialise the document.
    pub fn to_bytes(mut self) -> Result<Vec<u8>> {
        if self.replaced > 0 {
            let pruned = self.document.prune_objects();
            debug!(pruned = pruned.len(), "Unreferenced objects pruned");
        }

        let mut output = Vec::new();
        self.document.save_to(&mut output).map_err(|err| {
            PagewrightError::PdfError(format!("failed to serialise rebuilt PDF: {}", err))
        })?;
        Ok(output)
    }

    /// Serialise in memory, then write `path` in one go so a failed rebuild
    /// never leaves a partial file behind.
    pub fn save(self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path.as_ref(), &bytes)?;
        info!(
            bytes = bytes.len(),
            "Wrote rebuilt PDF to {}",
            path.as_ref().display()
        );
        Ok(())
    }

    pub fn into_document(self) -> Document {
        self.document
    }
}

/// Replace one page (1-indexed) of `original` with the single-page PDF at
/// `fragment` and write the result to `output`.
///
/// A `page_number` outside the document leaves every page unchanged.
pub fn replace_page_in_pdf(
    original: impl AsRef<Path>,
    fragment: impl AsRef<Path>,
    page_number: u32,
    output: impl AsRef<Path>,
) -> Result<()> {
    let mut replacements = ReplacementMap::new();
    replacements.insert(page_number, fragment.as_ref());
    batch_replace_pages(original, &replacements, output)
}

/// Replace several pages of `original` in one pass and write the result to
/// `output`.
#[instrument(skip_all, fields(
    original = %original.as_ref().display(),
    output = %output.as_ref().display(),
    replacements = replacements.len()
))]
pub fn batch_replace_pages(
    original: impl AsRef<Path>,
    replacements: &ReplacementMap,
    output: impl AsRef<Path>,
) -> Result<()> {
    let mut rebuilder = PageRebuilder::open(original.as_ref())?;
    let applied = rebuilder.apply(replacements)?;
    info!(applied, pages = rebuilder.page_count(), "Rebuild complete");
    rebuilder.save(output)
}

/// Load a replacement PDF, rejecting one that has no pages.
fn load_fragment(path: &Path) -> Result<Document> {
    let fragment = Document::load(path).map_err(|err| {
        PagewrightError::PdfError(format!("failed to open {}: {}", path.display(), err))
    })?;
    if fragment.get_pages().is_empty() {
        return Err(PagewrightError::EmptyFragment {
            path: path.display().to_string(),
        });
    }
    Ok(fragment)
}

// -- Page import ---------------------------------------------------------------

/// Copy a page and everything it references from `source` into `target`,
/// returning the new page's id. The page is not yet linked into the tree.
///
/// Inherited attributes are written onto the copied page so it no longer
/// depends on the source document's page tree.
fn import_page(source: &Document, target: &mut Document, page_id: ObjectId) -> Result<ObjectId> {
    let mut page = page_dictionary(source, page_id)?.clone();
    for key in INHERITABLE_KEYS {
        if !page.has(key) {
            if let Some(value) = inherited_attribute(source, page_id, key)? {
                page.set(key.to_vec(), value.clone());
            }
        }
    }
    page.remove(b"Parent");

    let mut importer = Importer {
        source,
        copied: HashMap::new(),
    };
    let new_id = target.new_object_id();
    importer.copied.insert(page_id, new_id);
    let cloned = importer.copy_dictionary(target, &page)?;
    target.objects.insert(new_id, Object::Dictionary(cloned));

    debug!(objects = importer.copied.len(), "Page imported");
    Ok(new_id)
}

/// Deep copy of objects between documents. Each source object is copied once;
/// repeated and cyclic references map to the same target id.
struct Importer<'a> {
    source: &'a Document,
    copied: HashMap<ObjectId, ObjectId>,
}

impl Importer<'_> {
    fn copy_object(&mut self, target: &mut Document, object: &Object) -> Result<Object> {
        match object {
            Object::Dictionary(dict) => Ok(Object::Dictionary(self.copy_dictionary(target, dict)?)),
            Object::Array(items) => {
                let mut copied = Vec::with_capacity(items.len());
                for item in items {
                    copied.push(self.copy_object(target, item)?);
                }
                Ok(Object::Array(copied))
            }
            Object::Stream(stream) => {
                let dict = self.copy_dictionary(target, &stream.dict)?;
                let mut copy = Stream::new(dict, stream.content.clone());
                copy.allows_compression = stream.allows_compression;
                Ok(Object::Stream(copy))
            }
            Object::Reference(ref_id) => {
                if let Some(new_id) = self.copied.get(ref_id) {
                    return Ok(Object::Reference(*new_id));
                }
                let new_id = target.new_object_id();
                self.copied.insert(*ref_id, new_id);
                let copy = match self.source.get_object(*ref_id) {
                    Ok(referenced) => self.copy_object(target, referenced)?,
                    Err(err) => {
                        warn!(?ref_id, %err, "Cannot resolve reference, using Null");
                        Object::Null
                    }
                };
                target.objects.insert(new_id, copy);
                Ok(Object::Reference(new_id))
            }
            other => Ok(other.clone()),
        }
    }

    /// Copy a dictionary, skipping /Parent: the only parent that matters is
    /// the one the page is linked under in the target.
    fn copy_dictionary(&mut self, target: &mut Document, dict: &Dictionary) -> Result<Dictionary> {
        let mut copy = Dictionary::new();
        for (key, value) in dict.iter() {
            if key == b"Parent" {
                continue;
            }
            copy.set(key.clone(), self.copy_object(target, value)?);
        }
        Ok(copy)
    }
}

// -- Rescaling -----------------------------------------------------------------

/// Scale a page's content and boxes by independent x/y factors.
///
/// The existing content streams are bracketed by `q sx 0 0 sy 0 0 cm` and
/// `Q` without being decoded, and every page box and annotation rectangle is
/// multiplied through.
fn scale_page(document: &mut Document, page_id: ObjectId, sx: f32, sy: f32) -> Result<()> {
    let mut contents = content_references(document, page_id)?;
    let prefix = document.add_object(Stream::new(
        Dictionary::new(),
        format!("q {} 0 0 {} 0 0 cm\n", rounded(sx), rounded(sy)).into_bytes(),
    ));
    let suffix = document.add_object(Stream::new(Dictionary::new(), b"\nQ\n".to_vec()));
    contents.insert(0, Object::Reference(prefix));
    contents.push(Object::Reference(suffix));

    let mut boxes = Vec::new();
    let page = page_dictionary(document, page_id)?;
    for key in PAGE_BOXES {
        if let Ok(value) = page.get(key) {
            boxes.push((key, scale_rectangle(rectangle(document, value)?, sx, sy)));
        }
    }
    let annotations = annotation_rectangles(document, page, sx, sy)?;

    let page = document
        .get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(|err| PagewrightError::PdfError(format!("cannot edit page {:?}: {}", page_id, err)))?;
    page.set("Contents", Object::Array(contents));
    for (key, rect) in boxes {
        page.set(key.to_vec(), rect);
    }

    for (owner, rect) in annotations {
        match owner {
            Some(annot_id) => {
                if let Ok(annot) = document.get_object_mut(annot_id).and_then(Object::as_dict_mut) {
                    annot.set("Rect", rect);
                }
            }
            None => debug!("Inline annotation left unscaled"),
        }
    }
    Ok(())
}

/// The page's content streams as a list of references, whatever shape
/// /Contents had.
fn content_references(document: &Document, page_id: ObjectId) -> Result<Vec<Object>> {
    let page = page_dictionary(document, page_id)?;
    let Ok(contents) = page.get(b"Contents") else {
        return Ok(Vec::new());
    };
    match contents {
        Object::Array(items) => Ok(items.clone()),
        Object::Reference(id) => match resolve(document, contents)? {
            Object::Array(items) => Ok(items.clone()),
            _ => Ok(vec![Object::Reference(*id)]),
        },
        other => Err(PagewrightError::PdfError(format!(
            "unsupported /Contents on page {:?}: {:?}",
            page_id, other
        ))),
    }
}

/// Scaled /Rect of every indirect annotation on a page.
fn annotation_rectangles(
    document: &Document,
    page: &Dictionary,
    sx: f32,
    sy: f32,
) -> Result<Vec<(Option<ObjectId>, Object)>> {
    let Ok(annots) = page.get(b"Annots") else {
        return Ok(Vec::new());
    };
    let Ok(items) = resolve(document, annots)?.as_array() else {
        return Ok(Vec::new());
    };

    let mut scaled = Vec::new();
    for item in items {
        let owner = item.as_reference().ok();
        let Ok(annot) = resolve(document, item)?.as_dict() else {
            continue;
        };
        if let Ok(rect) = annot.get(b"Rect") {
            scaled.push((owner, scale_rectangle(rectangle(document, rect)?, sx, sy)));
        }
    }
    Ok(scaled)
}

fn scale_rectangle([llx, lly, urx, ury]: [f32; 4], sx: f32, sy: f32) -> Object {
    Object::Array(vec![real(llx * sx), real(lly * sy), real(urx * sx), real(ury * sy)])
}

/// Four decimal places, so replacing an already-replaced page reproduces
/// the same factors and boxes.
fn rounded(value: f32) -> f32 {
    (value * 10_000.0).round() / 10_000.0
}

fn real(value: f32) -> Object {
    Object::Real(rounded(value).into())
}

// -- Page tree -----------------------------------------------------------------

/// Put `new_id` in the /Kids slot held by `old_id` and adopt its parent.
fn swap_into_tree(document: &mut Document, old_id: ObjectId, new_id: ObjectId) -> Result<()> {
    let parent_id = page_dictionary(document, old_id)?
        .get(b"Parent")
        .and_then(Object::as_reference)
        .map_err(|err| {
            PagewrightError::PdfError(format!("page {:?} has no /Parent: {}", old_id, err))
        })?;

    // /Kids is normally inline but may be an indirect array.
    let kids_holder = match document.get_dictionary(parent_id).and_then(|p| p.get(b"Kids")) {
        Ok(Object::Reference(id)) => Some(*id),
        Ok(_) => None,
        Err(err) => {
            return Err(PagewrightError::PdfError(format!(
                "page tree node {:?} has no /Kids: {}",
                parent_id, err
            )));
        }
    };

    let kids = match kids_holder {
        Some(array_id) => document.get_object_mut(array_id).and_then(Object::as_array_mut),
        None => document
            .get_object_mut(parent_id)
            .and_then(Object::as_dict_mut)
            .and_then(|parent| parent.get_mut(b"Kids"))
            .and_then(Object::as_array_mut),
    }
    .map_err(|err| PagewrightError::PdfError(format!("cannot edit /Kids: {}", err)))?;

    let slot = kids
        .iter_mut()
        .find(|kid| matches!(kid, Object::Reference(id) if *id == old_id))
        .ok_or_else(|| {
            PagewrightError::PdfError(format!(
                "page {:?} not listed in /Kids of {:?}",
                old_id, parent_id
            ))
        })?;
    *slot = Object::Reference(new_id);

    document
        .get_object_mut(new_id)
        .and_then(Object::as_dict_mut)
        .map_err(|err| PagewrightError::PdfError(format!("cannot edit page {:?}: {}", new_id, err)))?
        .set("Parent", Object::Reference(parent_id));
    Ok(())
}
