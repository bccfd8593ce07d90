// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Render module — single-page rasterisation to in-memory bitmaps.

pub mod rasterize;

pub use rasterize::{PageImage, PageRasterizer, render_page_as_image};
