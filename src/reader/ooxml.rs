//! Helpers shared by the XML-based readers.

use std::io::{Read, Seek};

use chrono::{DateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader as XmlReader;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::error::Result;
use crate::model::Metadata;

/// Read a ZIP entry into a string; `Ok(None)` if the entry does not exist.
pub(crate) fn read_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<String>> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut xml = String::new();
    file.read_to_string(&mut xml)?;
    Ok(Some(xml))
}

/// Read document properties from `docProps/core.xml` and `docProps/app.xml`.
///
/// Missing or unparsable property parts yield empty metadata; they are
/// optional in OOXML packages.
pub(crate) fn read_core_properties<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Metadata {
    let mut metadata = Metadata::default();

    match read_part(archive, "docProps/core.xml") {
        Ok(Some(xml)) => {
            if let Err(e) = parse_core_xml(&xml, &mut metadata) {
                log::warn!("Ignoring unreadable docProps/core.xml: {}", e);
            }
        }
        Ok(None) => {}
        Err(e) => log::warn!("Ignoring docProps/core.xml: {}", e),
    }

    if let Ok(Some(xml)) = read_part(archive, "docProps/app.xml") {
        if let Ok(Some(app)) = element_text(&xml, b"Application") {
            metadata.creator = Some(app);
        }
    }

    metadata
}

fn parse_core_xml(xml: &str, metadata: &mut Metadata) -> Result<()> {
    let mut reader = XmlReader::from_str(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut current: Option<Vec<u8>> = None;
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => current = Some(e.local_name().as_ref().to_vec()),
            Event::Text(e) => {
                let text = e.unescape()?.trim().to_string();
                match current.as_deref() {
                    _ if text.is_empty() => {}
                    Some(b"title") => metadata.title = Some(text),
                    Some(b"creator") => metadata.author = Some(text),
                    Some(b"subject") => metadata.subject = Some(text),
                    Some(b"keywords") => metadata.keywords = Some(text),
                    Some(b"created") => metadata.created = parse_datetime(&text),
                    Some(b"modified") => metadata.modified = parse_datetime(&text),
                    _ => {}
                }
            }
            Event::End(_) => current = None,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(())
}

/// Text of the first element with the given local name.
fn element_text(xml: &str, local_name: &[u8]) -> Result<Option<String>> {
    let mut reader = XmlReader::from_str(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut inside = false;
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == local_name => inside = true,
            Event::Text(e) if inside => {
                let text = e.unescape()?.trim().to_string();
                return Ok((!text.is_empty()).then_some(text));
            }
            Event::End(_) => inside = false,
            Event::Eof => return Ok(None),
            _ => {}
        }
        buf.clear();
    }
}

/// Value of the attribute with the given local name, ignoring any prefix.
pub(crate) fn attribute(element: &BytesStart<'_>, local_name: &[u8]) -> Result<Option<String>> {
    for attr in element.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref().eq_ignore_ascii_case(local_name) {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// Parse a W3CDTF timestamp as used by `dcterms:created`.
pub(crate) fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|naive| naive.and_utc())
        })
}
