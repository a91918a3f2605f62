//! Structural check separating empty changesets from ones with data.
//!
//! The API answers an empty changeset with a self-closing root
//! (`<osmChange version="0.6" generator="..."/>`). Only the first element of
//! the document is inspected.

use std::io::BufRead;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::config::CHANGESET_ROOT_ELEMENT;
use crate::xml::local_name;

/// Check whether a changeset document contains data.
///
/// # Examples
/// ```
/// use osm_changeset::validity::is_valid;
///
/// assert!(!is_valid(br#"<osmChange version="0.6" generator="x"/>"#));
/// assert!(is_valid(br#"<osmChange version="0.6"><create/></osmChange>"#));
/// ```
pub fn is_valid(xml: &[u8]) -> bool {
    is_valid_reader(xml)
}

/// Check whether a changeset document contains data, reading from a stream.
///
/// Stops at the first element. A document without any element, or one that
/// is malformed before its first element, is not valid.
pub fn is_valid_reader<R: BufRead>(reader: R) -> bool {
    let mut reader = Reader::from_reader(reader);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(element)) => {
                return local_name(&element) != CHANGESET_ROOT_ELEMENT.as_bytes();
            }
            Ok(Event::Start(_)) => return true,
            Ok(Event::Eof) => return false,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(error = %e, "malformed document before first element");
                return false;
            }
        }
    }
}
