//! Document Extraction
//!
//! Turns raw uploaded bytes into a [`NormalizedDocument`]. Dispatch is on the
//! lower-cased file extension:
//!
//! - `.pdf` - per-page text plus the document Info dictionary
//! - `.jpg/.jpeg/.png/.tiff/.bmp` - OCR text plus image dimensions/format/mode
//! - `.txt/.csv/.md/.html` - lossy UTF-8 decode
//! - `.doc/.docx` - not implemented, sentinel text
//! - anything else - sentinel text
//!
//! Only a corrupt PDF or image is an error; everything else degrades to
//! sentinel content so the pipeline always has a document to classify.

pub mod raster;
pub mod ocr;
pub mod pdf;

use std::path::Path;

use tracing::{debug, info};

use crate::config::OcrConfig;
use crate::models::{Metadata, NormalizedDocument};
use crate::types::ExtractionError;

pub use ocr::{NoopOcr, OcrEngine};
#[cfg(feature = "ocr")]
pub use ocr::TesseractOcr;

pub const UNSUPPORTED_FILE_TYPE: &str = "Unsupported file type";
pub const EXTRACTION_NOT_IMPLEMENTED: &str =
    "Document content extraction not implemented for this type";

/// Format family selected from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Image,
    Text,
    WordProcessor,
    Unsupported,
}

impl FileKind {
    pub fn from_extension(extension: &str) -> Self {
        match extension {
            ".pdf" => FileKind::Pdf,
            ".jpg" | ".jpeg" | ".png" | ".tiff" | ".bmp" => FileKind::Image,
            ".txt" | ".csv" | ".md" | ".html" => FileKind::Text,
            ".doc" | ".docx" => FileKind::WordProcessor,
            _ => FileKind::Unsupported,
        }
    }
}

/// Lower-cased extension with its leading dot, or an empty string.
pub fn file_extension(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

pub struct Extractor {
    ocr: Box<dyn OcrEngine>,
}

impl Extractor {
    pub fn new(ocr: Box<dyn OcrEngine>) -> Self {
        Self { ocr }
    }

    /// Extractor with the OCR engine compiled into this build.
    pub fn from_config(config: &OcrConfig) -> Self {
        let ocr = ocr::default_engine(config);
        info!(engine = ocr.name(), "Extractor initialised");
        Self::new(ocr)
    }

    /// Extract normalized content from `bytes`. The input is only borrowed,
    /// so callers can hand the same bytes to delivery afterwards.
    pub fn extract(
        &self,
        bytes: &[u8],
        filename: &str,
        declared_mime_type: &str,
    ) -> Result<NormalizedDocument, ExtractionError> {
        let file_extension = file_extension(filename);
        let mime_type = if declared_mime_type.is_empty() {
            mime_guess::from_path(filename)
                .first_or_octet_stream()
                .essence_str()
                .to_string()
        } else {
            declared_mime_type.to_string()
        };

        let kind = FileKind::from_extension(&file_extension);
        debug!(filename, extension = %file_extension, ?kind, bytes = bytes.len(), "Extracting document");

        let (text_content, pages, metadata) = match kind {
            FileKind::Pdf => {
                let content = pdf::extract_pdf(bytes)?;
                let text = content
                    .pages
                    .iter()
                    .map(|page| format!("{}\n\n", page))
                    .collect::<String>();
                (text, content.pages, content.metadata)
            }
            FileKind::Image => {
                let content = raster::extract_image(bytes, self.ocr.as_ref())?;
                (content.text.clone(), vec![content.text], content.metadata)
            }
            FileKind::Text => {
                let text = String::from_utf8_lossy(bytes).into_owned();
                (text.clone(), vec![text], Metadata::new())
            }
            FileKind::WordProcessor => sentinel(EXTRACTION_NOT_IMPLEMENTED),
            FileKind::Unsupported => sentinel(UNSUPPORTED_FILE_TYPE),
        };

        Ok(NormalizedDocument {
            filename: filename.to_string(),
            mime_type,
            file_extension,
            text_content,
            pages,
            metadata,
        })
    }
}

fn sentinel(text: &str) -> (String, Vec<String>, Metadata) {
    (text.to_string(), vec![text.to_string()], Metadata::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> Extractor {
        Extractor::new(Box::new(NoopOcr))
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("Scan.PDF"), ".pdf");
        assert_eq!(file_extension("archive.tar.gz"), ".gz");
        assert_eq!(file_extension("README"), "");
        assert_eq!(file_extension(".bashrc"), "");
    }

    #[test]
    fn test_text_extraction() {
        for name in ["notes.txt", "table.csv", "readme.MD", "page.html"] {
            let doc = extractor().extract("héllo, world".as_bytes(), name, "text/plain").unwrap();
            assert_eq!(doc.text_content, "héllo, world");
            assert_eq!(doc.pages, vec![doc.text_content.clone()]);
            assert!(doc.metadata.is_empty());
        }
    }

    #[test]
    fn test_text_extraction_replaces_invalid_utf8() {
        let bytes = [b'a', 0xff, 0xfe, b'b'];
        let doc = extractor().extract(&bytes, "data.txt", "text/plain").unwrap();
        assert_eq!(doc.text_content, String::from_utf8_lossy(&bytes));
        assert!(doc.text_content.contains('\u{FFFD}'));
        assert_eq!(doc.pages.len(), 1);
    }

    #[test]
    fn test_word_documents_are_not_implemented() {
        let doc = extractor()
            .extract(b"PK\x03\x04", "offer.docx", "application/octet-stream")
            .unwrap();
        assert_eq!(doc.text_content, EXTRACTION_NOT_IMPLEMENTED);
        assert_eq!(doc.pages, vec![EXTRACTION_NOT_IMPLEMENTED.to_string()]);
    }

    #[test]
    fn test_unsupported_extension_never_fails() {
        for name in ["binary.exe", "noext", "movie.mp4"] {
            let doc = extractor().extract(&[0, 1, 2, 3], name, "").unwrap();
            assert_eq!(doc.text_content, UNSUPPORTED_FILE_TYPE);
            assert_eq!(doc.pages[0], UNSUPPORTED_FILE_TYPE);
        }
    }

    #[test]
    fn test_mime_type_guessed_when_undeclared() {
        let doc = extractor().extract(b"a,b", "table.csv", "").unwrap();
        assert_eq!(doc.mime_type, "text/csv");

        let doc = extractor().extract(b"a,b", "table.csv", "application/x-custom").unwrap();
        assert_eq!(doc.mime_type, "application/x-custom");
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let bytes = b"same input".to_vec();
        let first = extractor().extract(&bytes, "a.txt", "text/plain").unwrap();
        let second = extractor().extract(&bytes, "a.txt", "text/plain").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_pdf_dispatch_joins_pages() {
        let bytes = pdf::tests::build_pdf(&["First page", "Second page"], None);
        let doc = extractor().extract(&bytes, "Report.PDF", "application/pdf").unwrap();
        assert_eq!(doc.file_extension, ".pdf");
        assert_eq!(doc.pages.len(), 2);
        assert_eq!(
            doc.text_content,
            format!("{}\n\n{}\n\n", doc.pages[0], doc.pages[1])
        );
        let first = doc.text_content.find("First").unwrap();
        let second = doc.text_content.find("Second").unwrap();
        assert!(first < second);
    }

    struct FixedOcr(&'static str);

    impl OcrEngine for FixedOcr {
        fn recognize(&self, _image_bytes: &[u8]) -> Result<String, ExtractionError> {
            Ok(self.0.to_string())
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    #[test]
    fn test_image_dispatch_uses_ocr_text() {
        let image = image::RgbaImage::new(12, 7);
        let mut buffer = std::io::Cursor::new(Vec::new());
        image.write_to(&mut buffer, image::ImageFormat::Png).unwrap();

        let extractor = Extractor::new(Box::new(FixedOcr("UNITED STATES PASSPORT")));
        let doc = extractor.extract(buffer.get_ref(), "scan.PNG", "").unwrap();

        assert_eq!(doc.file_extension, ".png");
        assert_eq!(doc.mime_type, "image/png");
        assert_eq!(doc.text_content, "UNITED STATES PASSPORT");
        assert_eq!(doc.pages, vec!["UNITED STATES PASSPORT".to_string()]);
        assert_eq!(doc.metadata["width"], 12);
        assert_eq!(doc.metadata["height"], 7);
        assert_eq!(doc.metadata["mode"], "RGBA");
    }

    #[test]
    fn test_corrupt_pdf_is_an_error() {
        let err = extractor()
            .extract(b"definitely not a pdf", "broken.pdf", "application/pdf")
            .unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidPdf(_)));
    }
}
