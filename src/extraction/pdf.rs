// PDF text and document-property extraction over lopdf

use lopdf::{Document, Object};
use tracing::warn;

use crate::models::Metadata;
use crate::types::ExtractionError;

#[derive(Debug)]
pub struct PdfContent {
    /// One entry per page, in page-number order
    pub pages: Vec<String>,
    pub metadata: Metadata,
}

pub fn extract_pdf(bytes: &[u8]) -> Result<PdfContent, ExtractionError> {
    let doc = Document::load_mem(bytes).map_err(|e| ExtractionError::InvalidPdf(e.to_string()))?;

    let pages = doc
        .get_pages()
        .into_keys()
        .map(|page_number| page_text(&doc, page_number))
        .collect();

    Ok(PdfContent {
        pages,
        metadata: document_info(&doc),
    })
}

/// Text of a single page. A page the text layer cannot be decoded from
/// contributes an empty string so page numbering stays aligned.
fn page_text(doc: &Document, page_number: u32) -> String {
    match doc.extract_text(&[page_number]) {
        Ok(text) => text,
        Err(e) => {
            warn!(page = page_number, error = %e, "Failed to extract PDF page text");
            String::new()
        }
    }
}

/// Truthy entries of the trailer's Info dictionary, keyed by PDF name
/// (with the leading slash, e.g. `/Title`). Empty strings, zero and `false`
/// are dropped.
fn document_info(doc: &Document) -> Metadata {
    let mut metadata = Metadata::new();

    let info = match doc.trailer.get(b"Info") {
        Ok(Object::Reference(id)) => doc.get_object(*id).ok(),
        Ok(object) => Some(object),
        Err(_) => None,
    };
    let Some(Object::Dictionary(info)) = info else {
        return metadata;
    };

    for (key, value) in info.iter() {
        if key.is_empty() {
            continue;
        }
        let value = match value {
            Object::Reference(id) => match doc.get_object(*id) {
                Ok(resolved) => resolved,
                Err(_) => continue,
            },
            other => other,
        };
        if let Some(value) = info_value(value) {
            metadata.insert(format!("/{}", String::from_utf8_lossy(key)), value);
        }
    }

    metadata
}

fn info_value(object: &Object) -> Option<serde_json::Value> {
    match object {
        Object::String(bytes, _) => {
            let text = decode_text_string(bytes);
            (!text.is_empty()).then(|| text.into())
        }
        Object::Name(name) if !name.is_empty() => Some(String::from_utf8_lossy(name).into_owned().into()),
        Object::Integer(i) if *i != 0 => Some((*i).into()),
        Object::Real(r) if *r != 0.0 => serde_json::Number::from_f64(*r as f64).map(serde_json::Value::Number),
        Object::Boolean(true) => Some(true.into()),
        _ => None,
    }
}

/// PDF text strings are UTF-16BE when they carry a byte-order mark,
/// otherwise PDFDocEncoding, approximated here as UTF-8 then Latin-1.
fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
        return char::decode_utf16(units)
            .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect();
    }

    String::from_utf8(bytes.to_vec()).unwrap_or_else(|_| bytes.iter().map(|&b| b as char).collect())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Dictionary, Stream};

    /// Build an in-memory PDF with one text line per page.
    pub(crate) fn build_pdf(page_texts: &[&str], info: Option<Dictionary>) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in page_texts {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![72.into(), 700.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        if let Some(info) = info {
            let info_id = doc.add_object(info);
            doc.trailer.set("Info", info_id);
        }

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }

    #[test]
    fn test_page_count_and_order() {
        let bytes = build_pdf(&["Invoice 1001", "Terms and conditions", "Signature"], None);
        let content = extract_pdf(&bytes).unwrap();
        assert_eq!(content.pages.len(), 3);
        assert!(content.pages[0].contains("Invoice"));
        assert!(content.pages[1].contains("Terms"));
        assert!(content.pages[2].contains("Signature"));
    }

    #[test]
    fn test_info_dictionary_skips_empty_values() {
        let info = dictionary! {
            "Title" => Object::string_literal("Quarterly Report"),
            "Author" => Object::string_literal("Finance Team"),
            "Subject" => Object::string_literal(""),
            "Trapped" => Object::Null,
        };
        let bytes = build_pdf(&["Body"], Some(info));
        let content = extract_pdf(&bytes).unwrap();

        let mut expected = Metadata::new();
        expected.insert("/Title".into(), "Quarterly Report".into());
        expected.insert("/Author".into(), "Finance Team".into());
        assert_eq!(content.metadata, expected);
    }

    #[test]
    fn test_info_dictionary_skips_zero_and_false() {
        let info = dictionary! {
            "Title" => Object::string_literal("W-2"),
            "Revision" => Object::Integer(0),
            "Scale" => Object::Real(0.0),
            "Marked" => Object::Boolean(false),
            "Copies" => Object::Integer(3),
            "Signed" => Object::Boolean(true),
        };
        let bytes = build_pdf(&["Body"], Some(info));
        let content = extract_pdf(&bytes).unwrap();

        let mut expected = Metadata::new();
        expected.insert("/Title".into(), "W-2".into());
        expected.insert("/Copies".into(), 3.into());
        expected.insert("/Signed".into(), true.into());
        assert_eq!(content.metadata, expected);
    }

    #[test]
    fn test_missing_info_dictionary_yields_empty_metadata() {
        let bytes = build_pdf(&["Body"], None);
        assert!(extract_pdf(&bytes).unwrap().metadata.is_empty());
    }

    #[test]
    fn test_decode_utf16_text_string() {
        let bytes = [0xFE, 0xFF, 0x00, b'W', 0x00, b'-', 0x00, b'2'];
        assert_eq!(decode_text_string(&bytes), "W-2");
    }

    #[test]
    fn test_decode_latin1_fallback() {
        assert_eq!(decode_text_string(&[b'C', 0xE9, b'd']), "Céd");
    }
}
