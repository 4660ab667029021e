//! Text extraction from input files.
//!
//! Dispatch is by lower-cased extension. Before handing a file to a parser
//! its magic bytes are checked (`%PDF` for PDF, `PK` for the DOCX zip
//! container), so a renamed or truncated file is reported as a parse error
//! with a readable message instead of a parser crash.

use crate::error::ScrawlError;
use crate::pipeline::engine;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extensions the loader accepts (lower case, without the dot).
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["txt", "docx", "pdf"];

const LEGACY_OFFICE_EXTENSIONS: [&str; 3] = ["doc", "xls", "ppt"];

/// Recognised input format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Text,
    Docx,
    Pdf,
}

impl SourceFormat {
    /// Classify `path` by extension.
    pub fn from_path(path: &Path) -> Result<Self, ScrawlError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "txt" => Ok(SourceFormat::Text),
            "docx" => Ok(SourceFormat::Docx),
            "pdf" => Ok(SourceFormat::Pdf),
            other => {
                let hint = if LEGACY_OFFICE_EXTENSIONS.contains(&other) {
                    " (legacy Office format; save it as .docx first)".to_string()
                } else {
                    format!(" (supported: {})", SUPPORTED_EXTENSIONS.join(", "))
                };
                Err(ScrawlError::UnsupportedFormat {
                    path: path.to_path_buf(),
                    extension: other.to_string(),
                    hint,
                })
            }
        }
    }
}

/// Whether the loader accepts `path`'s extension.
pub fn is_supported(path: &Path) -> bool {
    SourceFormat::from_path(path).is_ok()
}

/// Extract the plain text of one file.
pub fn load_file(path: &Path) -> Result<String, ScrawlError> {
    let format = SourceFormat::from_path(path)?;
    if !path.is_file() {
        return Err(ScrawlError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let text = match format {
        SourceFormat::Text => read_text(path)?,
        SourceFormat::Docx => read_docx(path)?,
        SourceFormat::Pdf => read_pdf(path)?,
    };
    debug!(
        "Loaded {} ({:?}, {} chars)",
        path.display(),
        format,
        text.chars().count()
    );
    Ok(text)
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, ScrawlError> {
    std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ScrawlError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => parse_error(path, e.to_string()),
    })
}

fn parse_error(path: &Path, detail: impl Into<String>) -> ScrawlError {
    ScrawlError::Parse {
        path: PathBuf::from(path),
        detail: detail.into(),
    }
}

// ── Plain text ───────────────────────────────────────────────────────────

fn read_text(path: &Path) -> Result<String, ScrawlError> {
    let bytes = read_bytes(path)?;
    decode_text(&bytes).ok_or_else(|| {
        parse_error(
            path,
            "not valid UTF-8 or BOM-marked UTF-16; re-save the file as UTF-8",
        )
    })
}

/// Decode UTF-8 (optional BOM) or UTF-16 with a byte-order mark.
pub fn decode_text(bytes: &[u8]) -> Option<String> {
    match bytes {
        [0xEF, 0xBB, 0xBF, rest @ ..] => String::from_utf8(rest.to_vec()).ok(),
        [0xFF, 0xFE, rest @ ..] => decode_utf16(rest, u16::from_le_bytes),
        [0xFE, 0xFF, rest @ ..] => decode_utf16(rest, u16::from_be_bytes),
        _ => String::from_utf8(bytes.to_vec()).ok(),
    }
}

fn decode_utf16(bytes: &[u8], to_unit: fn([u8; 2]) -> u16) -> Option<String> {
    if bytes.len() % 2 != 0 {
        return None;
    }
    let units = bytes.chunks_exact(2).map(|pair| to_unit([pair[0], pair[1]]));
    char::decode_utf16(units).collect::<Result<String, _>>().ok()
}

// ── DOCX ─────────────────────────────────────────────────────────────────

fn read_docx(path: &Path) -> Result<String, ScrawlError> {
    let bytes = read_bytes(path)?;
    if !bytes.starts_with(b"PK") {
        return Err(parse_error(path, "not a DOCX (zip) container"));
    }

    let docx = docx_rs::read_docx(&bytes).map_err(|e| parse_error(path, format!("{e:?}")))?;

    let paragraphs: Vec<String> = docx
        .document
        .children
        .iter()
        .filter_map(|child| match child {
            docx_rs::DocumentChild::Paragraph(para) => Some(paragraph_text(para)),
            _ => None,
        })
        .filter(|text| !text.trim().is_empty())
        .collect();

    Ok(paragraphs.join("\n"))
}

/// Paragraph → Run → Text; runs are parts of one sentence, joined directly.
fn paragraph_text(para: &docx_rs::Paragraph) -> String {
    let mut text = String::new();
    for child in &para.children {
        if let docx_rs::ParagraphChild::Run(run) = child {
            for run_child in &run.children {
                match run_child {
                    docx_rs::RunChild::Text(t) => text.push_str(&t.text),
                    docx_rs::RunChild::Tab(_) => text.push('\t'),
                    _ => {}
                }
            }
        }
    }
    text
}

// ── PDF ──────────────────────────────────────────────────────────────────

fn read_pdf(path: &Path) -> Result<String, ScrawlError> {
    let mut magic = [0u8; 4];
    {
        use std::io::Read;
        let mut f = std::fs::File::open(path).map_err(|e| parse_error(path, e.to_string()))?;
        if f.read_exact(&mut magic).is_err() || &magic != b"%PDF" {
            return Err(parse_error(
                path,
                format!("not a PDF (first bytes: {magic:?})"),
            ));
        }
    }

    let pdfium = engine::pdfium()?;
    let document = pdfium.load_pdf_from_file(path, None).map_err(|e| {
        let detail = format!("{e:?}");
        if detail.contains("Password") || detail.contains("password") {
            parse_error(path, "PDF is encrypted and requires a password")
        } else {
            parse_error(path, detail)
        }
    })?;

    let mut pages_text = Vec::new();
    for (idx, page) in document.pages().iter().enumerate() {
        let text = page
            .text()
            .map_err(|e| parse_error(path, format!("page {}: {e:?}", idx + 1)))?
            .all();
        if !text.trim().is_empty() {
            pages_text.push(text);
        }
    }
    debug!("Extracted text from {} PDF pages", pages_text.len());
    Ok(pages_text.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_extensions_case_insensitively() {
        assert_eq!(
            SourceFormat::from_path(Path::new("a/B.TXT")).unwrap(),
            SourceFormat::Text
        );
        assert_eq!(
            SourceFormat::from_path(Path::new("x.Docx")).unwrap(),
            SourceFormat::Docx
        );
        assert_eq!(
            SourceFormat::from_path(Path::new("x.pdf")).unwrap(),
            SourceFormat::Pdf
        );
    }

    #[test]
    fn rtf_is_unsupported() {
        match SourceFormat::from_path(Path::new("letter.rtf")) {
            Err(ScrawlError::UnsupportedFormat { extension, .. }) => assert_eq!(extension, "rtf"),
            other => panic!("expected UnsupportedFormat, got {other:?}"),
        }
        assert!(!is_supported(Path::new("letter.rtf")));
        assert!(!is_supported(Path::new("no_extension")));
    }

    #[test]
    fn legacy_office_gets_hint() {
        let err = SourceFormat::from_path(Path::new("old.doc")).unwrap_err();
        assert!(err.to_string().contains("legacy Office"));
    }

    #[test]
    fn decode_utf8_with_and_without_bom() {
        assert_eq!(decode_text(b"plain").as_deref(), Some("plain"));
        assert_eq!(
            decode_text(&[0xEF, 0xBB, 0xBF, b'h', b'i']).as_deref(),
            Some("hi")
        );
    }

    #[test]
    fn decode_utf16_le_and_be() {
        let le = [0xFF, 0xFE, b'o', 0, b'k', 0];
        assert_eq!(decode_text(&le).as_deref(), Some("ok"));
        let be = [0xFE, 0xFF, 0, b'o', 0, b'k'];
        assert_eq!(decode_text(&be).as_deref(), Some("ok"));
        assert!(decode_text(&[0xFF, 0xFE, b'o']).is_none());
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        assert!(decode_text(&[0xC3, 0x28]).is_none());
    }

    #[test]
    fn load_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.txt");
        std::fs::write(&path, "line one\nline two").unwrap();
        assert_eq!(load_file(&path).unwrap(), "line one\nline two");
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.txt");
        assert!(matches!(
            load_file(&path),
            Err(ScrawlError::FileNotFound { .. })
        ));
    }

    #[test]
    fn fake_pdf_is_parse_error_without_pdfium() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, "definitely not a pdf").unwrap();
        assert!(matches!(load_file(&path), Err(ScrawlError::Parse { .. })));
    }

    #[test]
    fn fake_docx_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.docx");
        std::fs::write(&path, "plain text pretending").unwrap();
        assert!(matches!(load_file(&path), Err(ScrawlError::Parse { .. })));
    }

    #[test]
    fn docx_paragraphs_are_extracted() {
        use docx_rs::{Docx, Paragraph, Run};

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("letter.docx");
        let file = std::fs::File::create(&path).unwrap();
        Docx::new()
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Dear ")).add_run(Run::new().add_text("reader,")))
            .add_paragraph(Paragraph::new())
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Goodbye.")))
            .build()
            .pack(file)
            .unwrap();

        assert_eq!(load_file(&path).unwrap(), "Dear reader,\nGoodbye.");
    }

    macro_rules! skip_unless_pdfium {
        () => {
            if !engine::is_available() {
                println!("SKIP — pdfium library not found (set PDFIUM_LIB_PATH)");
                return;
            }
        };
    }

    #[test]
    fn pdf_page_text_is_extracted_and_blank_pages_skipped() {
        use pdfium_render::prelude::*;
        skip_unless_pdfium!();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memo.pdf");
        {
            let pdfium = engine::pdfium().unwrap();
            let mut document = pdfium.create_new_pdf().unwrap();
            let font = document.fonts_mut().helvetica();
            for text in [Some("First page"), None, Some("Third page")] {
                let mut page = document
                    .pages_mut()
                    .create_page_at_end(PdfPagePaperSize::a4())
                    .unwrap();
                if let Some(text) = text {
                    page.objects_mut()
                        .create_text_object(
                            PdfPoints::new(72.0),
                            PdfPoints::new(720.0),
                            text,
                            font,
                            PdfPoints::new(14.0),
                        )
                        .unwrap();
                }
            }
            document.save_to_file(&path).unwrap();
        }

        let text = load_file(&path).unwrap();
        let first = text.find("First page").unwrap();
        let third = text.find("Third page").unwrap();
        assert!(first < third);
        assert!(text.split('\n').all(|line| !line.trim().is_empty()));
    }

    #[test]
    fn truncated_pdf_is_parse_error() {
        skip_unless_pdfium!();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cut.pdf");
        std::fs::write(&path, b"%PDF-1.7\n1 0 obj\n<< /Type /Catalog").unwrap();
        assert!(matches!(load_file(&path), Err(ScrawlError::Parse { .. })));
    }
}
