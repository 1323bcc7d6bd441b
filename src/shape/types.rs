use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

/// One parsed element from the export: its tag name, attributes, and
/// direct children. Children carry their own attributes but never
/// grandchildren; the shaper only looks one level down.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub name: String,
    pub attrs: HashMap<String, String>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Element {
            name: name.into(),
            attrs: HashMap::new(),
            children: Vec::new(),
        }
    }

    /// Look up an attribute value by name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }
}

/// One row in the `nodes` relation. Field order matches the CSV column
/// order expected downstream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeRow {
    pub id: i64,
    pub lat: f64,
    pub lon: f64,
    pub user: String,
    pub uid: i64,
    pub version: i64,
    pub changeset: i64,
    pub timestamp: String,
}

/// One row in the `ways` relation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WayRow {
    pub id: i64,
    pub user: String,
    pub uid: i64,
    pub version: i64,
    pub changeset: i64,
    pub timestamp: String,
}

/// One row in `nodes_tags` or `ways_tags`. `id` is the owning entity's id;
/// `kind` is the namespace prefix of the raw key, or the configured default
/// for keys without one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagRow {
    pub id: i64,
    pub key: String,
    pub value: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// One row in `ways_nodes`: the way's id, a referenced node id, and the
/// zero-based position of the reference within the way. Position order is
/// the way's geometry and must survive exactly as encountered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WayNodeRow {
    pub id: i64,
    pub node_id: i64,
    pub position: u64,
}

/// Everything one element shapes into. Tag and way-node lists are always
/// present, possibly empty.
#[derive(Debug, Clone, PartialEq)]
pub enum RowBundle {
    Node {
        node: NodeRow,
        tags: Vec<TagRow>,
    },
    Way {
        way: WayRow,
        way_nodes: Vec<WayNodeRow>,
        tags: Vec<TagRow>,
    },
}

/// Configuration for the shaping process
#[derive(Debug, Clone)]
pub struct ShapeConfig {
    /// Tag type assigned to keys without a namespace prefix
    pub default_tag_type: String,
}

impl Default for ShapeConfig {
    fn default() -> Self {
        ShapeConfig {
            default_tag_type: String::from("regular"),
        }
    }
}

/// Failures that abort shaping of a single element. Rows already emitted
/// for other elements are unaffected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("{element} element is missing required attribute `{attribute}`")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    #[error("{element} attribute `{attribute}` has unparseable value `{value}`")]
    InvalidAttribute {
        element: &'static str,
        attribute: &'static str,
        value: String,
    },
}
