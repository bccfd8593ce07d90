// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fixture documents shared by the integration tests.

#![allow(dead_code)]

use std::path::Path;

use lopdf::{Document, Object, Stream, dictionary};

/// Route `tracing` output through the test harness. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// One page of a fixture: its media box size and the text it shows.
#[derive(Debug, Clone, Copy)]
pub struct FixturePage<'a> {
    pub width: i64,
    pub height: i64,
    pub text: &'a str,
}

pub const fn page(width: i64, height: i64, text: &str) -> FixturePage<'_> {
    FixturePage {
        width,
        height,
        text,
    }
}

/// Build a document whose pages each carry their own /MediaBox and show
/// their text in Helvetica.
pub fn build(pages: &[FixturePage<'_>]) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids = Vec::with_capacity(pages.len());
    for fixture in pages {
        let content = format!("BT /F1 24 Tf 72 72 Td ({}) Tj ET", fixture.text);
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), fixture.width.into(), fixture.height.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

/// Build a document and write it to `path`.
pub fn write(path: &Path, pages: &[FixturePage<'_>]) {
    let mut doc = build(pages);
    doc.save(path).expect("fixture should save");
}

/// A document with an empty page tree.
pub fn write_empty(path: &Path) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.add_object(dictionary! {
        "Type" => "Pages",
        "Kids" => Vec::<Object>::new(),
        "Count" => 0,
    });
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).expect("fixture should save");
}

/// Decoded content stream(s) of every page, in page order.
pub fn page_contents(path: &Path) -> Vec<String> {
    let doc = Document::load(path).expect("output should load");
    doc.get_pages()
        .values()
        .map(|page_id| {
            let bytes = doc.get_page_content(*page_id).expect("page content");
            String::from_utf8_lossy(&bytes).into_owned()
        })
        .collect()
}
