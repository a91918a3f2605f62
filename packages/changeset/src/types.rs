//! Core data types for changeset edits.
//!
//! An [`EditRecord`] is one node, way or relation as it appeared in a
//! changeset; a [`Tag`] is one of its tags flattened into a row.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of OSM object an edit applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectType {
    Node,
    Way,
    Relation,
}

impl ObjectType {
    /// Get the string value stored in the `type` column.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Way => "way",
            Self::Relation => "relation",
        }
    }

    /// Match an element name (`node`, `way`, `relation`).
    #[must_use]
    pub fn from_element_name(name: &[u8]) -> Option<Self> {
        match name {
            b"node" => Some(Self::Node),
            b"way" => Some(Self::Way),
            b"relation" => Some(Self::Relation),
            _ => None,
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operation block an edit was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditType {
    Create,
    Modify,
}

impl EditType {
    /// Get the string value stored in the `edit_type` columns.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Modify => "modify",
        }
    }

    /// Match an operation element name (`create`, `modify`).
    ///
    /// `delete` blocks are not an edit context.
    #[must_use]
    pub fn from_element_name(name: &[u8]) -> Option<Self> {
        match name {
            b"create" => Some(Self::Create),
            b"modify" => Some(Self::Modify),
            _ => None,
        }
    }
}

impl fmt::Display for EditType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One node, way or relation as it appeared in one changeset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditRecord {
    /// Object identifier in OSM.
    pub osm_id: i64,

    /// Object kind, from the element name.
    pub object_type: ObjectType,

    /// Enclosing `create`/`modify` block, if one was open.
    pub edit_type: Option<EditType>,

    /// Object version at this edit.
    pub version: i32,

    /// Changeset the edit belongs to.
    pub changeset_id: i32,

    /// Editor's display name; absent for anonymous edits.
    pub username: Option<String>,

    /// Editor's user id; 0 for anonymous edits.
    pub uid: i32,

    /// Edit timestamp.
    pub created_at: Option<DateTime<Utc>>,

    /// Object tags, with `.` in keys rewritten to `-`.
    pub tags: BTreeMap<String, String>,
}

impl EditRecord {
    /// Create an untagged record with every numeric field zeroed.
    pub fn new(object_type: ObjectType, edit_type: Option<EditType>) -> Self {
        Self {
            osm_id: 0,
            object_type,
            edit_type,
            version: 0,
            changeset_id: 0,
            username: None,
            uid: 0,
            created_at: None,
            tags: BTreeMap::new(),
        }
    }

    /// Borrow the record without its tags, as written to the `changes` table.
    pub fn change(&self) -> Change<'_> {
        Change {
            osm_id: self.osm_id,
            object_type: self.object_type,
            edit_type: self.edit_type,
            version: self.version,
            changeset_id: self.changeset_id,
            username: self.username.as_deref(),
            uid: self.uid,
            created_at: self.created_at,
        }
    }
}

/// An [`EditRecord`] minus its tags.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Change<'a> {
    pub osm_id: i64,
    pub object_type: ObjectType,
    pub edit_type: Option<EditType>,
    pub version: i32,
    pub changeset_id: i32,
    pub username: Option<&'a str>,
    pub uid: i32,
    pub created_at: Option<DateTime<Utc>>,
}

/// A tag row bound to its changeset and edit type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub changeset_id: i32,
    pub key: String,
    pub value: String,
    pub edit_type: Option<EditType>,
}
