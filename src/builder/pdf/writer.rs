//! Serialization of laid-out pages into a PDF file with lopdf.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};

use super::fonts::Font;
use super::image::ImageXObject;
use crate::error::Result;
use crate::model::Metadata;

/// Operations and resources of one page.
#[derive(Debug, Default)]
pub(crate) struct PageDraft {
    pub operations: Vec<Operation>,
    pub fonts: BTreeSet<Font>,
    pub images: BTreeSet<usize>,
    pub has_content: bool,
}

/// Resource name of an image XObject.
pub(crate) fn image_name(index: usize) -> String {
    format!("Im{}", index)
}

/// Write pages, fonts and images into a complete PDF file.
pub(crate) fn write_pdf(
    pages: &[PageDraft],
    images: &[ImageXObject],
    metadata: &Metadata,
    page_size: (f32, f32),
) -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let used_fonts: BTreeSet<Font> = pages.iter().flat_map(|p| p.fonts.iter().copied()).collect();
    let font_ids: BTreeMap<Font, ObjectId> = used_fonts
        .into_iter()
        .map(|font| {
            let id = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => font.base_font(),
                "Encoding" => "WinAnsiEncoding",
            });
            (font, id)
        })
        .collect();

    let image_ids: Vec<ObjectId> = images
        .iter()
        .map(|img| {
            let dict = dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => img.width as i64,
                "Height" => img.height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "FlateDecode",
            };
            // Data is already deflated
            doc.add_object(Stream::new(dict, img.data.clone()).with_compression(false))
        })
        .collect();

    let media_box: Vec<Object> = vec![
        0.into(),
        0.into(),
        Object::Real(page_size.0),
        Object::Real(page_size.1),
    ];

    let mut kids = Vec::with_capacity(pages.len());
    for page in pages {
        let content = Content {
            operations: page.operations.clone(),
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

        let mut font_resources = Dictionary::new();
        for font in &page.fonts {
            if let Some(id) = font_ids.get(font) {
                font_resources.set(font.resource_name(), *id);
            }
        }
        let mut image_resources = Dictionary::new();
        for &index in &page.images {
            if let Some(id) = image_ids.get(index) {
                image_resources.set(image_name(index), *id);
            }
        }

        let mut resources = Dictionary::new();
        resources.set("Font", font_resources);
        if !image_resources.is_empty() {
            resources.set("XObject", image_resources);
        }

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => media_box.clone(),
            "Contents" => content_id,
            "Resources" => resources,
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

    let info_id = doc.add_object(info_dictionary(metadata));
    doc.trailer.set("Info", info_id);

    doc.compress();
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}

fn info_dictionary(metadata: &Metadata) -> Dictionary {
    let mut info = Dictionary::new();
    let fields = [
        ("Title", &metadata.title),
        ("Author", &metadata.author),
        ("Subject", &metadata.subject),
        ("Keywords", &metadata.keywords),
        ("Creator", &metadata.creator),
    ];
    for (key, value) in fields {
        if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
            info.set(key, text_string(value));
        }
    }
    info.set(
        "Producer",
        text_string(&format!("docpdf {}", env!("CARGO_PKG_VERSION"))),
    );

    let created = metadata.created.unwrap_or_else(Utc::now);
    info.set(
        "CreationDate",
        Object::string_literal(created.format("D:%Y%m%d%H%M%SZ").to_string()),
    );
    info.set(
        "ModDate",
        Object::string_literal(Utc::now().format("D:%Y%m%d%H%M%SZ").to_string()),
    );
    info
}

/// PDF text string: literal for ASCII, UTF-16BE with BOM otherwise.
pub(crate) fn text_string(value: &str) -> Object {
    if value.is_ascii() {
        return Object::string_literal(value);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in value.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}
