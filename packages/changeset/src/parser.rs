//! Streaming extraction of edit records from changeset XML.
//!
//! A changeset download is an `osmChange` document:
//!
//! ```xml
//! <osmChange version="0.6">
//!   <create>
//!     <node id="1" version="1" changeset="42" user="alice" uid="7" timestamp="...">
//!       <tag k="name" v="Main St"/>
//!     </node>
//!   </create>
//!   <modify>
//!     <way id="2" version="3" changeset="42" .../>
//!   </modify>
//! </osmChange>
//! ```
//!
//! The document is read in a single forward pass. The edit type is not an
//! element of the record itself: it is inherited from the last `create` or
//! `modify` block opened before the record. Every `tag` element attaches to
//! whichever record is current when it is seen.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::errors::IllFormedError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::Result;
use crate::types::{EditRecord, EditType, ObjectType};
use crate::xml::{local_name, parse_timestamp, RawAttributes};

/// Attributes that are read but not modelled.
const DISCARDED_ATTRIBUTES: [&str; 3] = ["lat", "lon", "visible"];

/// Mutable cursor state of one parse.
#[derive(Debug, Default)]
struct ParserState {
    current_edit_type: Option<EditType>,
    current_record: Option<EditRecord>,
    /// Names of elements started but not yet ended, innermost last.
    open_elements: Vec<String>,
}

impl ParserState {
    /// Handle an element start (or self-closing element).
    ///
    /// Returns the previous record when a new one replaces it.
    fn on_element_start(&mut self, element: &BytesStart<'_>) -> Option<EditRecord> {
        let name = local_name(element);

        if let Some(edit_type) = EditType::from_element_name(name) {
            self.current_edit_type = Some(edit_type);
            return None;
        }

        if let Some(object_type) = ObjectType::from_element_name(name) {
            let record = build_record(object_type, self.current_edit_type, element);
            return self.current_record.replace(record);
        }

        if name == b"tag" {
            self.attach_tag(element);
        }

        None
    }

    fn attach_tag(&mut self, element: &BytesStart<'_>) {
        let Some(record) = self.current_record.as_mut() else {
            tracing::debug!("dropping tag outside of any node, way or relation");
            return;
        };

        let mut attrs = RawAttributes::from_element(element);
        let Some(key) = attrs.take("k") else {
            tracing::debug!(osm_id = record.osm_id, "dropping tag without key");
            return;
        };
        let value = attrs.take("v").unwrap_or_default();

        record.tags.insert(normalize_tag_key(&key), value);
    }
}

/// Build a record from the attributes of a node, way or relation element.
fn build_record(
    object_type: ObjectType,
    edit_type: Option<EditType>,
    element: &BytesStart<'_>,
) -> EditRecord {
    let mut attrs = RawAttributes::from_element(element);
    let mut record = EditRecord::new(object_type, edit_type);

    record.osm_id = attrs.take_int("id");
    record.version = attrs.take_int("version");
    record.changeset_id = attrs.take_int("changeset");
    record.uid = attrs.take_int("uid");
    record.username = attrs.take("user");
    record.created_at = attrs.take("timestamp").and_then(|ts| {
        let parsed = parse_timestamp(&ts);
        if parsed.is_none() {
            tracing::warn!(osm_id = record.osm_id, timestamp = %ts, "unparseable timestamp");
        }
        parsed
    });

    for name in DISCARDED_ATTRIBUTES {
        attrs.take(name);
    }
    if !attrs.is_empty() {
        tracing::trace!(
            osm_id = record.osm_id,
            ignored = ?attrs.keys().collect::<Vec<_>>(),
            "ignoring unmodelled attributes"
        );
    }

    record
}

/// Rewrite a tag key to the sink's column naming convention (`.` → `-`).
///
/// # Examples
/// ```
/// use osm_changeset::parser::normalize_tag_key;
///
/// assert_eq!(normalize_tag_key("addr.street"), "addr-street");
/// ```
pub fn normalize_tag_key(key: &str) -> String {
    key.replace('.', "-")
}

/// Lazy sequence of every record in a changeset document, in document order.
///
/// A record is yielded once the next record starts or the document ends,
/// so trailing `tag` elements still reach it. A document that ends with
/// elements still open is truncated: the pending record is discarded and
/// an error is yielded in its place.
pub struct ChangesetRecords<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    state: ParserState,
    finished: bool,
}

impl<R: BufRead> ChangesetRecords<R> {
    /// Stream records from a buffered reader.
    pub fn from_reader(reader: R) -> Self {
        Self {
            reader: Reader::from_reader(reader),
            buf: Vec::new(),
            state: ParserState::default(),
            finished: false,
        }
    }
}

impl<'a> ChangesetRecords<&'a [u8]> {
    /// Stream records from an in-memory document.
    pub fn from_bytes(xml: &'a [u8]) -> Self {
        Self::from_reader(xml)
    }
}

impl<R: BufRead> Iterator for ChangesetRecords<R> {
    type Item = Result<EditRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            self.buf.clear();
            match self.reader.read_event_into(&mut self.buf) {
                Ok(Event::Start(element)) => {
                    let name = String::from_utf8_lossy(local_name(&element)).into_owned();
                    self.state.open_elements.push(name);
                    if let Some(completed) = self.state.on_element_start(&element) {
                        return Some(Ok(completed));
                    }
                }
                Ok(Event::Empty(element)) => {
                    if let Some(completed) = self.state.on_element_start(&element) {
                        return Some(Ok(completed));
                    }
                }
                Ok(Event::End(_)) => {
                    self.state.open_elements.pop();
                }
                Ok(Event::Eof) => {
                    self.finished = true;
                    if let Some(unclosed) = self.state.open_elements.pop() {
                        self.state.current_record = None;
                        let error = IllFormedError::MissingEndTag(unclosed);
                        return Some(Err(quick_xml::Error::IllFormed(error).into()));
                    }
                    return self.state.current_record.take().map(Ok);
                }
                Ok(_) => {}
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e.into()));
                }
            }
        }
    }
}

/// Parse a changeset document and return its last record.
///
/// Returns `None` when the document holds no node, way or relation.
///
/// # Examples
/// ```
/// use osm_changeset::parser::parse_changeset;
/// use osm_changeset::types::{EditType, ObjectType};
///
/// let xml = br#"<osmChange><modify>
///     <way id="5" version="2" changeset="42"><tag k="highway" v="path"/></way>
/// </modify></osmChange>"#;
///
/// let record = parse_changeset(xml).unwrap().unwrap();
/// assert_eq!(record.object_type, ObjectType::Way);
/// assert_eq!(record.edit_type, Some(EditType::Modify));
/// assert_eq!(record.tags["highway"], "path");
/// ```
pub fn parse_changeset(xml: &[u8]) -> Result<Option<EditRecord>> {
    last_record(ChangesetRecords::from_bytes(xml))
}

/// Parse a changeset file and return its last record, streaming from disk.
pub fn parse_changeset_file(path: &Path) -> Result<Option<EditRecord>> {
    let file = File::open(path)?;
    last_record(ChangesetRecords::from_reader(BufReader::new(file)))
}

/// Read every record of a changeset file, streaming from disk.
pub fn read_changeset_records(path: &Path) -> Result<Vec<EditRecord>> {
    let file = File::open(path)?;
    ChangesetRecords::from_reader(BufReader::new(file)).collect()
}

fn last_record<R: BufRead>(records: ChangesetRecords<R>) -> Result<Option<EditRecord>> {
    let mut last = None;
    for record in records {
        last = Some(record?);
    }
    Ok(last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn parse_all(xml: &str) -> Vec<EditRecord> {
        ChangesetRecords::from_bytes(xml.as_bytes())
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_record_fields_projected_from_attributes() {
        let xml = r#"<osmChange version="0.6">
            <create>
                <node id="123" version="4" changeset="99" uid="7" user="alice"
                      timestamp="2020-01-01T00:00:00Z" lat="52.1" lon="4.3" visible="true"/>
            </create>
        </osmChange>"#;

        let record = parse_changeset(xml.as_bytes()).unwrap().unwrap();

        assert_eq!(record.osm_id, 123);
        assert_eq!(record.object_type, ObjectType::Node);
        assert_eq!(record.edit_type, Some(EditType::Create));
        assert_eq!(record.version, 4);
        assert_eq!(record.changeset_id, 99);
        assert_eq!(record.uid, 7);
        assert_eq!(record.username.as_deref(), Some("alice"));
        assert_eq!(
            record.created_at,
            Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap())
        );
        assert!(record.tags.is_empty());
    }

    #[test]
    fn test_malformed_numbers_degrade_to_zero() {
        let xml = r#"<osmChange><modify>
            <way id="x1" version="abc" changeset="" uid="anon"/>
        </modify></osmChange>"#;

        let record = parse_changeset(xml.as_bytes()).unwrap().unwrap();

        assert_eq!(record.osm_id, 0);
        assert_eq!(record.version, 0);
        assert_eq!(record.changeset_id, 0);
        assert_eq!(record.uid, 0);
    }

    #[test]
    fn test_anonymous_edit_without_user_or_timestamp() {
        let xml = r#"<osmChange><create><node id="1" version="1" changeset="3"/></create></osmChange>"#;

        let record = parse_changeset(xml.as_bytes()).unwrap().unwrap();

        assert_eq!(record.username, None);
        assert_eq!(record.uid, 0);
        assert_eq!(record.created_at, None);
    }

    #[test]
    fn test_tag_keys_rewrite_dots() {
        let xml = r#"<osmChange><create>
            <node id="1" version="1" changeset="42">
                <tag k="addr.street" v="Main St"/>
                <tag k="name" v="X"/>
                <tag k="a.b.c" v="1"/>
            </node>
        </create></osmChange>"#;

        let record = parse_changeset(xml.as_bytes()).unwrap().unwrap();

        assert_eq!(record.tags.len(), 3);
        assert_eq!(record.tags["addr-street"], "Main St");
        assert_eq!(record.tags["name"], "X");
        assert_eq!(record.tags["a-b-c"], "1");
        assert!(!record.tags.contains_key("addr.street"));
    }

    #[test]
    fn test_duplicate_tag_key_last_wins() {
        let xml = r#"<osmChange><create><node id="1" changeset="1">
            <tag k="name" v="first"/><tag k="name" v="second"/>
        </node></create></osmChange>"#;

        let record = parse_changeset(xml.as_bytes()).unwrap().unwrap();
        assert_eq!(record.tags["name"], "second");
    }

    #[test]
    fn test_tag_without_key_is_dropped_and_missing_value_is_empty() {
        let xml = r#"<osmChange><create><node id="1" changeset="1">
            <tag v="orphan"/><tag k="fixme"/>
        </node></create></osmChange>"#;

        let record = parse_changeset(xml.as_bytes()).unwrap().unwrap();
        assert_eq!(record.tags.len(), 1);
        assert_eq!(record.tags["fixme"], "");
    }

    #[test]
    fn test_tag_before_any_record_is_dropped() {
        let xml = r#"<osmChange><create>
            <tag k="stray" v="1"/>
            <node id="1" changeset="1"/>
        </create></osmChange>"#;

        let record = parse_changeset(xml.as_bytes()).unwrap().unwrap();
        assert!(record.tags.is_empty());
    }

    #[test]
    fn test_non_self_closing_tag_element() {
        let xml = r#"<osmChange><create><node id="1" changeset="1">
            <tag k="name" v="X"></tag>
        </node></create></osmChange>"#;

        let record = parse_changeset(xml.as_bytes()).unwrap().unwrap();
        assert_eq!(record.tags["name"], "X");
    }

    #[test]
    fn test_records_inherit_enclosing_edit_type() {
        let xml = r#"<osmChange version="0.6">
            <create>
                <node id="1" version="1" changeset="42"><tag k="amenity" v="cafe"/></node>
            </create>
            <modify>
                <way id="2" version="5" changeset="42">
                    <nd ref="1"/>
                    <tag k="highway" v="residential"/>
                </way>
                <relation id="3" version="2" changeset="42">
                    <member type="way" ref="2" role="outer"/>
                    <tag k="type" v="multipolygon"/>
                </relation>
            </modify>
        </osmChange>"#;

        let records = parse_all(xml);

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].object_type, ObjectType::Node);
        assert_eq!(records[0].edit_type, Some(EditType::Create));
        assert_eq!(records[0].tags["amenity"], "cafe");
        assert_eq!(records[1].object_type, ObjectType::Way);
        assert_eq!(records[1].edit_type, Some(EditType::Modify));
        assert_eq!(records[1].tags.len(), 1);
        assert_eq!(records[2].object_type, ObjectType::Relation);
        assert_eq!(records[2].edit_type, Some(EditType::Modify));
        assert_eq!(records[2].tags["type"], "multipolygon");
    }

    #[test]
    fn test_parse_changeset_returns_last_record() {
        let xml = r#"<osmChange>
            <create><node id="1" changeset="8"/></create>
            <modify><way id="2" changeset="8"><tag k="name" v="Last"/></way></modify>
        </osmChange>"#;

        let last = parse_changeset(xml.as_bytes()).unwrap().unwrap();
        let all = parse_all(xml);

        assert_eq!(last.osm_id, 2);
        assert_eq!(all.last(), Some(&last));
    }

    #[test]
    fn test_delete_block_does_not_change_edit_type() {
        let xml = r#"<osmChange>
            <modify><node id="1" changeset="8"/></modify>
            <delete><node id="2" changeset="8"/></delete>
        </osmChange>"#;

        let records = parse_all(xml);
        assert_eq!(records[1].edit_type, Some(EditType::Modify));
    }

    #[test]
    fn test_record_outside_any_block_has_no_edit_type() {
        let xml = r#"<osmChange><node id="1" changeset="8"/></osmChange>"#;

        let record = parse_changeset(xml.as_bytes()).unwrap().unwrap();
        assert_eq!(record.edit_type, None);
    }

    #[test]
    fn test_empty_changeset_has_no_record() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
            <osmChange version="0.6" generator="OpenStreetMap server"/>"#;

        assert_eq!(parse_changeset(xml.as_bytes()).unwrap(), None);
    }

    #[test]
    fn test_unknown_elements_are_ignored() {
        let xml = r#"<osmChange><!-- note --><create>
            <bounds minlat="1"/>
            <node id="1" changeset="8"><extra>text</extra><tag k="a" v="b"/></node>
        </create></osmChange>"#;

        let record = parse_changeset(xml.as_bytes()).unwrap().unwrap();
        assert_eq!(record.tags["a"], "b");
    }

    #[test]
    fn test_mismatched_end_tag_is_an_error() {
        let xml = r#"<osmChange><create><node id="1" changeset="8"></way></create></osmChange>"#;

        assert!(parse_changeset(xml.as_bytes()).is_err());
    }

    #[test]
    fn test_iterator_stops_after_error() {
        let xml = r#"<osmChange><create><node id="1" changeset="8"></way>"#;
        let mut records = ChangesetRecords::from_bytes(xml.as_bytes());

        assert!(matches!(records.next(), Some(Err(_))));
        assert!(records.next().is_none());
    }

    fn assert_truncated(xml: &str, unclosed: &str) {
        let err = parse_changeset(xml.as_bytes()).unwrap_err();

        match err {
            crate::ChangesetError::XmlParse(quick_xml::Error::IllFormed(
                IllFormedError::MissingEndTag(name),
            )) => assert_eq!(name, unclosed),
            other => panic!("expected missing end tag, got {other:?}"),
        }
    }

    #[test]
    fn test_document_cut_after_complete_tag_is_an_error() {
        let xml = r#"<?xml version="1.0"?><osmChange version="0.6"><create><node id="1" version="1" changeset="5" user="a" uid="1"><tag k="name" v="X"/>"#;

        assert_truncated(xml, "node");
    }

    #[test]
    fn test_unclosed_root_is_an_error() {
        let xml = r#"<osmChange version="0.6"><create><node id="1" changeset="5"/></create>"#;

        assert_truncated(xml, "osmChange");
    }

    #[test]
    fn test_unclosed_create_block_is_an_error() {
        let xml = r#"<osmChange><create><node id="1" changeset="5"><tag k="a" v="b"/></node>"#;

        assert_truncated(xml, "create");
    }

    #[test]
    fn test_truncated_document_yields_earlier_records_then_error() {
        let xml = r#"<osmChange><create><node id="1" changeset="5"/><node id="2" changeset="5">"#;
        let mut records = ChangesetRecords::from_bytes(xml.as_bytes());

        assert_eq!(records.next().unwrap().unwrap().osm_id, 1);
        assert!(matches!(records.next(), Some(Err(_))));
        assert!(records.next().is_none());
    }

    #[test]
    fn test_all_records_of_truncated_document_is_an_error() {
        let xml = r#"<osmChange><modify><way id="2" changeset="5"/>"#;

        let result: Result<Vec<_>> = ChangesetRecords::from_bytes(xml.as_bytes()).collect();
        assert!(result.is_err());
    }

    #[test]
    fn test_normalize_tag_key() {
        assert_eq!(normalize_tag_key("name"), "name");
        assert_eq!(normalize_tag_key("."), "-");
    }
}
