//! Run accounting
//!
//! Counts what a processing run saw, emitted, and dropped, so data-quality
//! regressions show up in the summary instead of needing to be re-derived
//! from the outputs.

use std::fmt;

use serde::Serialize;

use crate::shape::{Element, RowBundle};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Top-level elements pulled from the source
    pub elements: u64,
    /// Elements shaped into node rows
    pub nodes: u64,
    /// Elements shaped into way rows
    pub ways: u64,
    /// Elements of kinds this transform ignores
    pub skipped: u64,
    /// Elements abandoned because a required attribute was missing or bad
    pub failed: u64,
    pub node_tags: u64,
    pub way_tags: u64,
    pub way_nodes: u64,
    /// Tag children dropped for malformed keys or missing k/v attributes
    pub dropped_tags: u64,
}

impl RunReport {
    /// Account for one successfully shaped element.
    pub fn tally(&mut self, element: &Element, bundle: &RowBundle) {
        let tag_children = element
            .children
            .iter()
            .filter(|child| child.name == "tag")
            .count() as u64;

        match bundle {
            RowBundle::Node { tags, .. } => {
                self.nodes += 1;
                self.node_tags += tags.len() as u64;
                self.dropped_tags += tag_children - tags.len() as u64;
            }
            RowBundle::Way {
                way_nodes, tags, ..
            } => {
                self.ways += 1;
                self.way_tags += tags.len() as u64;
                self.way_nodes += way_nodes.len() as u64;
                self.dropped_tags += tag_children - tags.len() as u64;
            }
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "elements processed: {}", self.elements)?;
        writeln!(f, "  nodes:            {}", self.nodes)?;
        writeln!(f, "  ways:             {}", self.ways)?;
        writeln!(f, "  skipped:          {}", self.skipped)?;
        writeln!(f, "  failed:           {}", self.failed)?;
        writeln!(f, "rows emitted")?;
        writeln!(f, "  node tags:        {}", self.node_tags)?;
        writeln!(f, "  way tags:         {}", self.way_tags)?;
        writeln!(f, "  way nodes:        {}", self.way_nodes)?;
        write!(f, "tags dropped:       {}", self.dropped_tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{ElementShaper, ShapeConfig};

    #[test]
    fn tally_counts_dropped_tags() {
        let mut element = Element::new("node");
        for (name, value) in [
            ("id", "1"),
            ("lat", "36.1"),
            ("lon", "-86.7"),
            ("user", "a"),
            ("uid", "7"),
            ("version", "1"),
            ("changeset", "11"),
            ("timestamp", "t"),
        ] {
            element.attrs.insert(name.to_string(), value.to_string());
        }
        let mut bad = Element::new("tag");
        bad.attrs.insert("k".to_string(), "has space".to_string());
        bad.attrs.insert("v".to_string(), "x".to_string());
        element.children.push(bad);
        let mut good = Element::new("tag");
        good.attrs.insert("k".to_string(), "building".to_string());
        good.attrs.insert("v".to_string(), "yes".to_string());
        element.children.push(good);

        let bundle = ElementShaper::new(ShapeConfig::default())
            .shape(&element)
            .unwrap()
            .unwrap();

        let mut report = RunReport::default();
        report.tally(&element, &bundle);
        assert_eq!(report.nodes, 1);
        assert_eq!(report.node_tags, 1);
        assert_eq!(report.dropped_tags, 1);
    }
}
