//! Output writers: one chunk's page images → files of one format.
//!
//! Every file is written to a uniquely named temp file next to its target
//! and persisted into place, so a failed write never leaves a truncated
//! output under the final name. The temp file is removed on any failure.

use crate::config::{ExportConfig, ExportFormat};
use crate::error::FormatError;
use crate::pipeline::encode;
use crate::pipeline::engine;
use docx_rs::{BreakType, Docx, Paragraph, Pic, Run};
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::ffi::OsString;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Width of each page picture in DOCX output: 6 inches in EMU.
pub const DOCX_IMAGE_WIDTH_EMU: u32 = 6 * 914_400;

/// Write `pages` as `format`, naming files from `base` (directory + stem,
/// no extension). Returns every file written.
pub fn write_format(
    format: ExportFormat,
    pages: &[DynamicImage],
    base: &Path,
    chunk: usize,
    config: &ExportConfig,
) -> Result<Vec<PathBuf>, FormatError> {
    let split = pages.len() > 1
        && (config.split_raster_pages || (format == ExportFormat::Jpeg && !jpeg_stack_fits(pages)));
    match format {
        ExportFormat::Png | ExportFormat::Jpeg if split => {
            if !config.split_raster_pages {
                warn!(
                    "Part {}: {} stacked pages exceed the JPEG size limit; writing one file per page",
                    chunk,
                    pages.len()
                );
            }
            let mut files = Vec::with_capacity(pages.len());
            for (idx, page) in pages.iter().enumerate() {
                let path = with_suffix(base, &format!("_page{}.{}", idx + 1, format.extension()));
                write_raster(format, page, &path, chunk, config)?;
                files.push(path);
            }
            Ok(files)
        }
        ExportFormat::Png | ExportFormat::Jpeg => {
            let path = with_suffix(base, &format!(".{}", format.extension()));
            let stacked = encode::stack_vertically(pages);
            write_raster(format, &stacked, &path, chunk, config)?;
            Ok(vec![path])
        }
        ExportFormat::Pdf => {
            let path = with_suffix(base, ".pdf");
            write_pdf(pages, &path, chunk, config.dpi)?;
            Ok(vec![path])
        }
        ExportFormat::Docx => {
            let path = with_suffix(base, ".docx");
            write_docx(pages, &path, chunk)?;
            Ok(vec![path])
        }
    }
}

/// Whether `pages` stacked vertically stay within the JPEG dimension limit.
fn jpeg_stack_fits(pages: &[DynamicImage]) -> bool {
    let height: u64 = pages.iter().map(|p| u64::from(p.height())).sum();
    height <= u64::from(encode::JPEG_MAX_DIMENSION)
}

/// `base` with `suffix` appended to its final component. Unlike
/// `Path::with_extension` this keeps any dots already in the stem.
pub fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

fn write_raster(
    format: ExportFormat,
    page: &DynamicImage,
    path: &Path,
    chunk: usize,
    config: &ExportConfig,
) -> Result<(), FormatError> {
    let bytes = match format {
        ExportFormat::Jpeg => encode::encode_jpeg(page, config.jpeg_quality),
        _ => encode::encode_png(page),
    }
    .map_err(|e| encode_failed(chunk, format, e.to_string()))?;
    write_atomic(path, &bytes, chunk)
}

fn write_pdf(pages: &[DynamicImage], path: &Path, chunk: usize, dpi: u32) -> Result<(), FormatError> {
    let fail = |detail: String| encode_failed(chunk, ExportFormat::Pdf, detail);

    let pdfium = engine::pdfium().map_err(|e| fail(e.to_string()))?;
    let mut document = pdfium.create_new_pdf().map_err(|e| fail(format!("{e:?}")))?;

    let scale = 72.0 / dpi.max(1) as f32;
    for (idx, image) in pages.iter().enumerate() {
        let width = PdfPoints::new(image.width() as f32 * scale);
        let height = PdfPoints::new(image.height() as f32 * scale);
        let mut page = document
            .pages_mut()
            .create_page_at_end(PdfPagePaperSize::Custom(width, height))
            .map_err(|e| fail(format!("page {}: {e:?}", idx + 1)))?;
        page.objects_mut()
            .create_image_object(PdfPoints::ZERO, PdfPoints::ZERO, image, Some(width), Some(height))
            .map_err(|e| fail(format!("page {}: {e:?}", idx + 1)))?;
    }

    let bytes = document
        .save_to_bytes()
        .map_err(|e| fail(format!("{e:?}")))?;
    write_atomic(path, &bytes, chunk)
}

fn write_docx(pages: &[DynamicImage], path: &Path, chunk: usize) -> Result<(), FormatError> {
    let mut docx = Docx::new();
    for (idx, image) in pages.iter().enumerate() {
        let png = encode::encode_png(image)
            .map_err(|e| encode_failed(chunk, ExportFormat::Docx, e.to_string()))?;
        let height_emu = u64::from(DOCX_IMAGE_WIDTH_EMU) * u64::from(image.height())
            / u64::from(image.width().max(1));
        let pic = Pic::new(&png).size(DOCX_IMAGE_WIDTH_EMU, height_emu.min(u64::from(u32::MAX)) as u32);

        let mut run = Run::new().add_image(pic);
        if idx + 1 < pages.len() {
            run = run.add_break(BreakType::Page);
        }
        docx = docx.add_paragraph(Paragraph::new().add_run(run));
    }

    let mut buf = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buf)
        .map_err(|e| encode_failed(chunk, ExportFormat::Docx, e.to_string()))?;
    write_atomic(path, buf.get_ref(), chunk)
}

// ── Atomic file helpers ──────────────────────────────────────────────────

/// Write `bytes` to a temp file beside `path`, then persist it under
/// `path`. Dropping the temp file on an early return deletes it.
fn write_atomic(path: &Path, bytes: &[u8], chunk: usize) -> Result<(), FormatError> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| write_failed(chunk, path, e.to_string()))?;
    tmp.write_all(bytes)
        .and_then(|_| tmp.flush())
        .map_err(|e| write_failed(chunk, path, e.to_string()))?;
    tmp.persist(path)
        .map_err(|e| write_failed(chunk, path, e.error.to_string()))?;
    debug!("Wrote {}", path.display());
    Ok(())
}

fn encode_failed(chunk: usize, format: ExportFormat, detail: String) -> FormatError {
    FormatError::EncodeFailed {
        chunk,
        format: format.to_string(),
        detail,
    }
}

fn write_failed(chunk: usize, path: &Path, detail: String) -> FormatError {
    FormatError::WriteFailed {
        chunk,
        path: path.to_path_buf(),
        detail,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn page(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([250, 250, 240])))
    }

    #[test]
    fn suffix_keeps_dots_in_stem() {
        let p = with_suffix(Path::new("/out/notes.v2"), ".png");
        assert_eq!(p, PathBuf::from("/out/notes.v2.png"));
    }

    #[test]
    fn stacked_png_is_one_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = ExportConfig::default();
        let base = dir.path().join("doc");
        let files =
            write_format(ExportFormat::Png, &[page(20, 30), page(20, 30)], &base, 1, &config).unwrap();
        assert_eq!(files, vec![dir.path().join("doc.png")]);

        let img = image::open(&files[0]).unwrap();
        assert_eq!((img.width(), img.height()), (20, 60));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn tall_jpeg_stack_falls_back_to_one_file_per_page() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("doc");
        let pages = [page(8, 30_000), page(8, 30_000), page(8, 30_000)];
        let config = ExportConfig::default();

        let jpeg = write_format(ExportFormat::Jpeg, &pages, &base, 1, &config).unwrap();
        let names: Vec<String> = jpeg
            .iter()
            .map(|f| f.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["doc_page1.jpg", "doc_page2.jpg", "doc_page3.jpg"]);

        // PNG has no such limit and still stacks.
        let png = write_format(ExportFormat::Png, &pages, &base, 1, &config).unwrap();
        assert_eq!(png, vec![dir.path().join("doc.png")]);
    }

    #[test]
    fn unrelated_tmp_file_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let user_file = dir.path().join("doc.png.tmp");
        std::fs::write(&user_file, b"keep").unwrap();

        let base = dir.path().join("doc");
        write_format(ExportFormat::Png, &[page(4, 4)], &base, 1, &ExportConfig::default()).unwrap();
        assert_eq!(std::fs::read(&user_file).unwrap(), b"keep");
    }

    #[test]
    fn failed_persist_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        // A directory squatting on the target name makes the final rename fail.
        std::fs::create_dir(dir.path().join("doc.png")).unwrap();

        let base = dir.path().join("doc");
        let err = write_format(ExportFormat::Png, &[page(4, 4)], &base, 3, &ExportConfig::default())
            .unwrap_err();
        assert!(matches!(err, FormatError::WriteFailed { chunk: 3, .. }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn split_jpeg_is_one_file_per_page() {
        let dir = tempfile::tempdir().unwrap();
        let config = ExportConfig::builder().split_raster_pages(true).build().unwrap();
        let base = dir.path().join("doc");
        let pages = [page(10, 10), page(10, 10), page(10, 10)];
        let files = write_format(ExportFormat::Jpeg, &pages, &base, 1, &config).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|f| f.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["doc_page1.jpg", "doc_page2.jpg", "doc_page3.jpg"]);
        assert!(files.iter().all(|f| f.exists()));
    }

    #[test]
    fn docx_is_a_zip_container() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("doc");
        let files = write_format(
            ExportFormat::Docx,
            &[page(40, 60), page(40, 60)],
            &base,
            1,
            &ExportConfig::default(),
        )
        .unwrap();
        let bytes = std::fs::read(&files[0]).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn missing_directory_is_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("no_such_dir").join("doc");
        let err = write_format(ExportFormat::Png, &[page(4, 4)], &base, 2, &ExportConfig::default())
            .unwrap_err();
        match err {
            FormatError::WriteFailed { chunk, .. } => assert_eq!(chunk, 2),
            other => panic!("expected WriteFailed, got {other:?}"),
        }
    }
}
