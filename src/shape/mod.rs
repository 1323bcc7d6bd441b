//! Element shaping - turn raw export elements into relational rows
//!
//! This module is the pure core of the crate: given one `node` or `way`
//! element it decides which rows the element becomes, how namespaced tag
//! keys split into type and key, and which malformed tag keys are dropped.
//! It performs no I/O and keeps no state between elements.

pub mod classify;
pub mod shaper;
pub mod types;

pub use classify::{classify_key, KeyClass};
pub use shaper::ElementShaper;
pub use types::{
    Element, NodeRow, RowBundle, ShapeConfig, ShapeError, TagRow, WayNodeRow, WayRow,
};
