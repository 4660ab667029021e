//! pdfium library binding.
//!
//! pdfium backs three stages: PDF text extraction on import, glyph
//! rasterisation in the handwriting renderer, and PDF assembly on export.
//! Each operation builds its own [`Pdfium`] and drops it when done; only
//! the library location that bound successfully is cached, so later calls
//! skip the search. A failed search is not cached.
//!
//! Library resolution order:
//! 1. `PDFIUM_LIB_PATH`: explicit path to the shared library
//! 2. the platform library name in the current working directory
//! 3. the system library search path

use crate::error::ScrawlError;
use pdfium_render::prelude::*;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing::{debug, info};

/// Where the pdfium shared library was found.
#[derive(Debug, Clone, PartialEq, Eq)]
enum LibrarySource {
    File(PathBuf),
    System,
}

static RESOLVED_SOURCE: OnceLock<LibrarySource> = OnceLock::new();

/// Bind pdfium for one operation.
pub fn pdfium() -> Result<Pdfium, ScrawlError> {
    if let Some(source) = RESOLVED_SOURCE.get() {
        return bind(source)
            .map(Pdfium::new)
            .map_err(|e| ScrawlError::PdfiumBindingFailed(format!("{source:?}: {e:?}")));
    }

    let (source, bindings) = resolve()?;
    info!("pdfium library bound ({:?})", source);
    let _ = RESOLVED_SOURCE.set(source);
    Ok(Pdfium::new(bindings))
}

/// Whether pdfium can be bound in this process.
pub fn is_available() -> bool {
    pdfium().is_ok()
}

fn bind(source: &LibrarySource) -> Result<Box<dyn PdfiumLibraryBindings>, PdfiumError> {
    match source {
        LibrarySource::File(path) => Pdfium::bind_to_library(path),
        LibrarySource::System => Pdfium::bind_to_system_library(),
    }
}

fn resolve() -> Result<(LibrarySource, Box<dyn PdfiumLibraryBindings>), ScrawlError> {
    if let Ok(path) = std::env::var("PDFIUM_LIB_PATH") {
        if !path.is_empty() {
            debug!("Binding pdfium from PDFIUM_LIB_PATH={}", path);
            let source = LibrarySource::File(PathBuf::from(&path));
            return bind(&source)
                .map(|b| (source, b))
                .map_err(|e| ScrawlError::PdfiumBindingFailed(format!("{path}: {e:?}")));
        }
    }

    let local = LibrarySource::File(PathBuf::from(
        Pdfium::pdfium_platform_library_name_at_path("./"),
    ));
    match bind(&local) {
        Ok(bindings) => Ok((local, bindings)),
        Err(local_err) => {
            debug!("No pdfium in working directory: {:?}", local_err);
            bind(&LibrarySource::System)
                .map(|b| (LibrarySource::System, b))
                .map_err(|e| ScrawlError::PdfiumBindingFailed(format!("{e:?}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_operation_gets_its_own_binding() {
        if !is_available() {
            println!("SKIP — pdfium library not found (set PDFIUM_LIB_PATH)");
            return;
        }
        assert!(RESOLVED_SOURCE.get().is_some());

        let first = pdfium().unwrap();
        let document = first.create_new_pdf().unwrap();
        drop(document);
        drop(first);

        // A later operation on another thread binds again from the cached source.
        let pages = std::thread::spawn(|| {
            let pdfium = pdfium().unwrap();
            let mut document = pdfium.create_new_pdf().unwrap();
            document
                .pages_mut()
                .create_page_at_end(PdfPagePaperSize::a4())
                .unwrap();
            document.pages().len()
        })
        .join()
        .unwrap();
        assert_eq!(pages, 1);
    }
}
