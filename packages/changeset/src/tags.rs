//! Flattening of record tags into rows.

use crate::types::{EditRecord, Tag};

/// Flatten a record's tags into [`Tag`] rows bound to its changeset and edit type.
///
/// # Examples
/// ```
/// use osm_changeset::tags::extract_tags;
/// use osm_changeset::types::{EditRecord, EditType, ObjectType};
///
/// let mut record = EditRecord::new(ObjectType::Node, Some(EditType::Create));
/// record.changeset_id = 42;
/// record.tags.insert("name".into(), "X".into());
///
/// let tags = extract_tags(&record);
/// assert_eq!(tags.len(), 1);
/// assert_eq!(tags[0].changeset_id, 42);
/// ```
pub fn extract_tags(record: &EditRecord) -> Vec<Tag> {
    record
        .tags
        .iter()
        .map(|(key, value)| Tag {
            changeset_id: record.changeset_id,
            key: key.clone(),
            value: value.clone(),
            edit_type: record.edit_type,
        })
        .collect()
}
