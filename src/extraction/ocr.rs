// OCR engines for image text extraction

use tracing::debug;

use crate::config::OcrConfig;
use crate::types::ExtractionError;

/// "Extract text from image" capability. Receives the encoded image file.
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image_bytes: &[u8]) -> Result<String, ExtractionError>;

    fn name(&self) -> &'static str;
}

/// Engine used when the crate is built without the `ocr` feature.
/// Images still yield dimensions and format, with empty text.
pub struct NoopOcr;

impl OcrEngine for NoopOcr {
    fn recognize(&self, image_bytes: &[u8]) -> Result<String, ExtractionError> {
        debug!(bytes = image_bytes.len(), "OCR disabled in this build, returning empty text");
        Ok(String::new())
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}

/// Tesseract through the system libtesseract/leptonica.
#[cfg(feature = "ocr")]
pub struct TesseractOcr {
    tessdata_dir: Option<String>,
    language: String,
}

#[cfg(feature = "ocr")]
impl TesseractOcr {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            tessdata_dir: config.tessdata_dir.clone(),
            language: config.language.clone(),
        }
    }
}

#[cfg(feature = "ocr")]
impl OcrEngine for TesseractOcr {
    fn recognize(&self, image_bytes: &[u8]) -> Result<String, ExtractionError> {
        let tess = tesseract::Tesseract::new(self.tessdata_dir.as_deref(), Some(&self.language))
            .map_err(|e| ExtractionError::Ocr(format!("{e:?}")))?;

        let mut tess = tess
            .set_image_from_mem(image_bytes)
            .map_err(|e| ExtractionError::Ocr(format!("{e:?}")))?;

        tess.get_text()
            .map_err(|e| ExtractionError::Ocr(format!("{e:?}")))
    }

    fn name(&self) -> &'static str {
        "tesseract"
    }
}

pub fn default_engine(config: &OcrConfig) -> Box<dyn OcrEngine> {
    #[cfg(feature = "ocr")]
    {
        Box::new(TesseractOcr::new(config))
    }
    #[cfg(not(feature = "ocr"))]
    {
        let _ = config;
        Box::new(NoopOcr)
    }
}
