//! Helpers for reading element names and attributes from reader events.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use quick_xml::events::BytesStart;

/// Naive timestamp layouts accepted after RFC 3339 fails.
const NAIVE_TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Get the element name without namespace prefix.
///
/// # Examples
/// ```
/// use quick_xml::events::BytesStart;
/// use osm_changeset::xml::local_name;
///
/// let start = BytesStart::new("osm:node");
/// assert_eq!(local_name(&start), b"node");
/// ```
pub fn local_name<'a>(element: &'a BytesStart<'_>) -> &'a [u8] {
    element.local_name().into_inner()
}

/// Attributes of one element, keyed by local name.
///
/// Attributes that fail to parse or unescape are skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawAttributes(BTreeMap<String, String>);

impl RawAttributes {
    /// Collect the attributes of an element start event.
    pub fn from_element(element: &BytesStart<'_>) -> Self {
        let mut map = BTreeMap::new();
        for attr in element.attributes().flatten() {
            let key = String::from_utf8_lossy(attr.key.local_name().into_inner()).into_owned();
            match attr.unescape_value() {
                Ok(value) => {
                    map.insert(key, value.into_owned());
                }
                Err(e) => {
                    tracing::debug!(attribute = %key, error = %e, "skipping malformed attribute");
                }
            }
        }
        Self(map)
    }

    /// Borrow an attribute value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Remove an attribute and return its value.
    pub fn take(&mut self, name: &str) -> Option<String> {
        self.0.remove(name)
    }

    /// Remove an attribute and parse it as an integer, `0` when absent or malformed.
    pub fn take_int<T>(&mut self, name: &str) -> T
    where
        T: FromStr + Default,
    {
        parse_int(self.take(name).as_deref())
    }

    /// Names of the attributes still present.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Whether every attribute has been taken.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Parse an integer attribute, degrading to the type's default.
///
/// # Examples
/// ```
/// use osm_changeset::xml::parse_int;
///
/// assert_eq!(parse_int::<i32>(Some("4")), 4);
/// assert_eq!(parse_int::<i32>(Some("abc")), 0);
/// assert_eq!(parse_int::<i64>(None), 0);
/// ```
pub fn parse_int<T>(value: Option<&str>) -> T
where
    T: FromStr + Default,
{
    value
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or_default()
}

/// Parse an OSM timestamp.
///
/// Accepts RFC 3339 and naive `YYYY-MM-DDTHH:MM:SS` (taken as UTC).
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}
