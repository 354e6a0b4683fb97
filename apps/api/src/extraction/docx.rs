use std::io::{Cursor, Read};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::DocumentError;

const DOCUMENT_PART: &str = "word/document.xml";

/// Upper bound on the inflated size of `word/document.xml`. The upload cap only
/// bounds compressed bytes.
pub const MAX_DOCUMENT_XML_BYTES: u64 = 16 * 1024 * 1024;

/// Run content nested inside these elements is not part of the paragraph text
/// (text boxes, drawings, legacy VML, tracked deletions).
const SKIPPED_CONTAINERS: &[&[u8]] = &[b"txbxContent", b"drawing", b"pict", b"object", b"del"];

/// Extracts the body paragraphs of a DOCX file, joined with `\n`.
///
/// Only paragraphs that are direct children of `w:body` count; paragraphs
/// inside tables are excluded. Empty paragraphs are kept as empty lines.
pub fn extract_docx_text(data: &[u8]) -> Result<String, DocumentError> {
    extract_docx_text_bounded(data, MAX_DOCUMENT_XML_BYTES)
}

fn extract_docx_text_bounded(data: &[u8], max_xml_bytes: u64) -> Result<String, DocumentError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data))?;
    let part = archive.by_name(DOCUMENT_PART)?;
    if part.size() > max_xml_bytes {
        return Err(DocumentError::PartTooLarge {
            part: DOCUMENT_PART,
            limit: max_xml_bytes,
        });
    }

    // The header size is not trusted: never inflate more than one byte past
    // the limit.
    let mut raw = Vec::new();
    part.take(max_xml_bytes + 1).read_to_end(&mut raw)?;
    if raw.len() as u64 > max_xml_bytes {
        return Err(DocumentError::PartTooLarge {
            part: DOCUMENT_PART,
            limit: max_xml_bytes,
        });
    }

    let xml = std::str::from_utf8(&raw)?;
    Ok(body_paragraphs(xml)?.join("\n"))
}

fn body_paragraphs(xml: &str) -> Result<Vec<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut buf = Vec::new();
    // Local names of the currently open elements.
    let mut stack: Vec<Vec<u8>> = Vec::new();
    // Stack depth at which the current body paragraph was opened.
    let mut paragraph_depth: Option<usize> = None;
    let mut current = String::new();
    let mut paragraphs = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let name = local_name(&e);
                if name == b"p" && paragraph_depth.is_none() && parent_is(&stack, b"body") {
                    paragraph_depth = Some(stack.len());
                    current.clear();
                }
                stack.push(name);
            }
            Event::Empty(e) => {
                let name = local_name(&e);
                if name == b"p" && paragraph_depth.is_none() && parent_is(&stack, b"body") {
                    paragraphs.push(String::new());
                } else if let Some(depth) = paragraph_depth {
                    if in_run(&stack, depth) {
                        match name.as_slice() {
                            b"tab" => current.push('\t'),
                            b"br" | b"cr" => current.push('\n'),
                            _ => {}
                        }
                    }
                }
            }
            Event::Text(e) => {
                if let Some(depth) = paragraph_depth {
                    if parent_is(&stack, b"t") && in_run(&stack[..stack.len() - 1], depth) {
                        current.push_str(&e.unescape()?);
                    }
                }
            }
            Event::CData(e) => {
                if let Some(depth) = paragraph_depth {
                    if parent_is(&stack, b"t") && in_run(&stack[..stack.len() - 1], depth) {
                        current.push_str(&String::from_utf8_lossy(&e));
                    }
                }
            }
            Event::End(_) => {
                stack.pop();
                if paragraph_depth == Some(stack.len()) {
                    paragraphs.push(std::mem::take(&mut current));
                    paragraph_depth = None;
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs)
}

fn local_name(e: &BytesStart<'_>) -> Vec<u8> {
    e.local_name().as_ref().to_vec()
}

fn parent_is(stack: &[Vec<u8>], name: &[u8]) -> bool {
    stack.last().map(|n| n.as_slice() == name).unwrap_or(false)
}

/// True when the innermost open element is a run (`w:r`) that belongs to the
/// paragraph opened at `paragraph_depth` and is not inside a skipped container.
fn in_run(stack: &[Vec<u8>], paragraph_depth: usize) -> bool {
    if !parent_is(stack, b"r") || stack.len() <= paragraph_depth {
        return false;
    }
    !stack[paragraph_depth..]
        .iter()
        .any(|name| SKIPPED_CONTAINERS.contains(&name.as_slice()))
}
