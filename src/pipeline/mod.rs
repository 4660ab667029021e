//! Pipeline stages for turning documents into handwritten pages.
//!
//! Each submodule implements exactly one transformation step.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ chunk ──▶ layout ──▶ render ──▶ encode ──▶ write
//! (txt/docx/pdf)      (glyphs)   (pdfium)   (png/jpg)  (files)
//! ```
//!
//! 1. [`input`]: extract plain text from TXT, DOCX or PDF files
//! 2. [`chunk`]: split long text by characters, or rendered pages by count
//! 3. [`layout`]: place every glyph with Gaussian jitter; pure and seeded
//! 4. [`render`]: draw the laid-out glyphs over the background via pdfium
//! 5. [`encode`]: PNG/JPEG bytes, vertical page stacking
//! 6. [`write`]: PNG/JPEG/PDF/DOCX files, written atomically
//!
//! [`engine`] binds pdfium for stages 1, 4
//! and 6.

pub mod chunk;
pub mod encode;
pub mod engine;
pub mod input;
pub mod layout;
pub mod render;
pub mod write;
