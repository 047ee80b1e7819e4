// Image decoding and OCR

use image::{ColorType, ImageFormat};
use tracing::warn;

use super::ocr::OcrEngine;
use crate::models::Metadata;
use crate::types::ExtractionError;

#[derive(Debug)]
pub struct ImageContent {
    pub text: String,
    pub metadata: Metadata,
}

/// Decode the image, then OCR it. A decode failure is an error; an OCR
/// failure on a valid image degrades to empty text.
pub fn extract_image(bytes: &[u8], ocr: &dyn OcrEngine) -> Result<ImageContent, ExtractionError> {
    let format = image::guess_format(bytes).map_err(|e| ExtractionError::InvalidImage(e.to_string()))?;
    let decoded = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| ExtractionError::InvalidImage(e.to_string()))?;

    let text = match ocr.recognize(bytes) {
        Ok(text) => text,
        Err(e) => {
            warn!(engine = ocr.name(), error = %e, "OCR failed, continuing with empty text");
            String::new()
        }
    };

    let mut metadata = Metadata::new();
    metadata.insert("width".into(), decoded.width().into());
    metadata.insert("height".into(), decoded.height().into());
    metadata.insert("format".into(), format_name(format).into());
    metadata.insert("mode".into(), color_mode(decoded.color()).into());

    Ok(ImageContent { text, metadata })
}

fn format_name(format: ImageFormat) -> String {
    match format {
        ImageFormat::Png => "PNG".to_string(),
        ImageFormat::Jpeg => "JPEG".to_string(),
        ImageFormat::Tiff => "TIFF".to_string(),
        ImageFormat::Bmp => "BMP".to_string(),
        other => format!("{:?}", other).to_uppercase(),
    }
}

/// Color mode names as used by common imaging toolkits.
fn color_mode(color: ColorType) -> &'static str {
    match color {
        ColorType::L8 => "L",
        ColorType::La8 => "LA",
        ColorType::Rgb8 => "RGB",
        ColorType::Rgba8 => "RGBA",
        ColorType::L16 => "I;16",
        ColorType::La16 => "LA;16",
        ColorType::Rgb16 => "RGB;16",
        ColorType::Rgba16 => "RGBA;16",
        ColorType::Rgb32F | ColorType::Rgba32F => "F",
        _ => "unknown",
    }
}
