//! Streaming element source for OSM XML exports
//!
//! Reads one top-level element at a time so exports far larger than memory
//! can flow through the shaper. Each yielded `Element` carries its
//! attributes and direct children only; deeper descendants are skipped.

use std::io::BufRead;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use thiserror::Error;

use crate::shape::Element;

/// Failures while reading the export. These are fatal to the run: the
/// stream cannot be trusted past a malformed document.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("malformed attribute: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),

    #[error("document ended inside an element")]
    UnexpectedEof,
}

/// Forward-only iterator over the top-level elements of an OSM export.
pub struct OsmReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
}

impl<R: BufRead> OsmReader<R> {
    pub fn new(input: R) -> Self {
        let mut reader = Reader::from_reader(input);
        reader.trim_text(true);
        OsmReader {
            reader,
            buf: Vec::new(),
        }
    }

    fn is_top_level(name: &[u8]) -> bool {
        matches!(name, b"node" | b"way" | b"relation")
    }

    fn element_from(start: &BytesStart) -> Result<Element, SourceError> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut element = Element::new(name);

        for attribute in start.attributes() {
            let attribute = attribute?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = attribute.unescape_value()?.into_owned();
            element.attrs.insert(key, value);
        }

        Ok(element)
    }

    /// Collect the direct children of an element opened with a start tag,
    /// up to its matching end tag.
    fn fill_children(&mut self, mut element: Element) -> Result<Element, SourceError> {
        let mut child_buf = Vec::new();

        loop {
            child_buf.clear();
            match self.reader.read_event_into(&mut child_buf)? {
                Event::Empty(e) => {
                    element.children.push(Self::element_from(&e)?);
                }
                Event::Start(e) => {
                    // A child occasionally arrives in start/end form; its
                    // own descendants are irrelevant here.
                    let child = Self::element_from(&e)?;
                    let end = e.to_end().into_owned();
                    let mut skip_buf = Vec::new();
                    self.reader.read_to_end_into(end.name(), &mut skip_buf)?;
                    element.children.push(child);
                }
                Event::End(_) => return Ok(element),
                Event::Eof => return Err(SourceError::UnexpectedEof),
                _ => {}
            }
        }
    }

    fn next_element(&mut self) -> Option<Result<Element, SourceError>> {
        loop {
            self.buf.clear();
            let event = match self.reader.read_event_into(&mut self.buf) {
                Ok(event) => event,
                Err(e) => return Some(Err(e.into())),
            };

            match event {
                Event::Eof => return None,
                Event::Empty(e) if Self::is_top_level(e.name().as_ref()) => {
                    return Some(Self::element_from(&e));
                }
                Event::Start(e) if Self::is_top_level(e.name().as_ref()) => {
                    let element = match Self::element_from(&e) {
                        Ok(element) => element,
                        Err(err) => return Some(Err(err)),
                    };
                    return Some(self.fill_children(element));
                }
                _ => {}
            }
        }
    }
}

impl<R: BufRead> Iterator for OsmReader<R> {
    type Item = Result<Element, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_element()
    }
}
