use std::str::FromStr;

use crate::shape::classify::{classify_key, KeyClass};
use crate::shape::types::{
    Element, NodeRow, RowBundle, ShapeConfig, ShapeError, TagRow, WayNodeRow, WayRow,
};

/// Shapes one top-level element into its relational row bundle.
///
/// The shaper holds no state across calls; shaping the same element twice
/// yields identical bundles.
pub struct ElementShaper {
    config: ShapeConfig,
}

impl ElementShaper {
    pub fn new(config: ShapeConfig) -> Self {
        ElementShaper { config }
    }

    /// Shape one element. Returns `Ok(None)` for element kinds this
    /// transform does not care about (relations, bounds, ...). A missing
    /// or unparseable required attribute fails the whole element; nothing
    /// partial is emitted.
    pub fn shape(&self, element: &Element) -> Result<Option<RowBundle>, ShapeError> {
        match element.name.as_str() {
            "node" => self.shape_node(element).map(Some),
            "way" => self.shape_way(element).map(Some),
            _ => Ok(None),
        }
    }

    fn shape_node(&self, element: &Element) -> Result<RowBundle, ShapeError> {
        let node = NodeRow {
            id: parse_attr(element, "node", "id")?,
            lat: parse_attr(element, "node", "lat")?,
            lon: parse_attr(element, "node", "lon")?,
            user: require_attr(element, "node", "user")?.to_string(),
            uid: parse_attr(element, "node", "uid")?,
            version: parse_attr(element, "node", "version")?,
            changeset: parse_attr(element, "node", "changeset")?,
            timestamp: require_attr(element, "node", "timestamp")?.to_string(),
        };

        let tags = self.shape_tags(element, node.id);
        Ok(RowBundle::Node { node, tags })
    }

    fn shape_way(&self, element: &Element) -> Result<RowBundle, ShapeError> {
        let way = WayRow {
            id: parse_attr(element, "way", "id")?,
            user: require_attr(element, "way", "user")?.to_string(),
            uid: parse_attr(element, "way", "uid")?,
            version: parse_attr(element, "way", "version")?,
            changeset: parse_attr(element, "way", "changeset")?,
            timestamp: require_attr(element, "way", "timestamp")?.to_string(),
        };

        // The position counter advances only on `nd` children, so tags
        // interleaved between node references leave the numbering intact.
        // Duplicate references (closed ways) each get their own row.
        let mut way_nodes = Vec::new();
        let mut position: u64 = 0;
        for child in &element.children {
            if child.name == "nd" {
                let node_id = parse_attr(child, "nd", "ref")?;
                way_nodes.push(WayNodeRow {
                    id: way.id,
                    node_id,
                    position,
                });
                position += 1;
            }
        }

        let tags = self.shape_tags(element, way.id);
        Ok(RowBundle::Way {
            way,
            way_nodes,
            tags,
        })
    }

    fn shape_tags(&self, element: &Element, owner: i64) -> Vec<TagRow> {
        element
            .children
            .iter()
            .filter(|child| child.name == "tag")
            .filter_map(|child| self.shape_tag(child, owner))
            .collect()
    }

    /// One `tag` child to at most one row. A rejected key, or a child
    /// without `k`/`v` attributes, drops the tag and nothing else. The
    /// value always passes through in full, namespaced key or not.
    fn shape_tag(&self, child: &Element, owner: i64) -> Option<TagRow> {
        let key = child.attr("k")?;
        let value = child.attr("v")?;

        match classify_key(key) {
            KeyClass::Rejected => None,
            KeyClass::Regular => Some(TagRow {
                id: owner,
                key: key.to_string(),
                value: value.to_string(),
                kind: self.config.default_tag_type.clone(),
            }),
            KeyClass::Namespaced { prefix, rest } => Some(TagRow {
                id: owner,
                key: rest,
                value: value.to_string(),
                kind: prefix,
            }),
        }
    }
}

fn require_attr<'a>(
    element: &'a Element,
    kind: &'static str,
    attribute: &'static str,
) -> Result<&'a str, ShapeError> {
    element.attr(attribute).ok_or(ShapeError::MissingAttribute {
        element: kind,
        attribute,
    })
}

fn parse_attr<T: FromStr>(
    element: &Element,
    kind: &'static str,
    attribute: &'static str,
) -> Result<T, ShapeError> {
    let raw = require_attr(element, kind, attribute)?;
    raw.parse().map_err(|_| ShapeError::InvalidAttribute {
        element: kind,
        attribute,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_element() -> Element {
        let mut element = Element::new("node");
        for (name, value) in [
            ("id", "26734845"),
            ("lat", "36.1627"),
            ("lon", "-86.7816"),
            ("user", "woodpeck"),
            ("uid", "4321"),
            ("version", "3"),
            ("changeset", "1043791"),
            ("timestamp", "2017-01-17T22:01:37Z"),
        ] {
            element.attrs.insert(name.to_string(), value.to_string());
        }
        element
    }

    fn way_element() -> Element {
        let mut element = Element::new("way");
        for (name, value) in [
            ("id", "209809850"),
            ("user", "chrissyh"),
            ("uid", "674454"),
            ("version", "1"),
            ("changeset", "15353317"),
            ("timestamp", "2013-03-13T15:58:04Z"),
        ] {
            element.attrs.insert(name.to_string(), value.to_string());
        }
        element
    }

    fn tag(k: &str, v: &str) -> Element {
        let mut child = Element::new("tag");
        child.attrs.insert("k".to_string(), k.to_string());
        child.attrs.insert("v".to_string(), v.to_string());
        child
    }

    fn nd(reference: &str) -> Element {
        let mut child = Element::new("nd");
        child.attrs.insert("ref".to_string(), reference.to_string());
        child
    }

    fn shaper() -> ElementShaper {
        ElementShaper::new(ShapeConfig::default())
    }

    #[test]
    fn node_shapes_all_attributes() {
        let bundle = shaper().shape(&node_element()).unwrap().unwrap();

        match bundle {
            RowBundle::Node { node, tags } => {
                assert_eq!(node.id, 26734845);
                assert_eq!(node.lat, 36.1627);
                assert_eq!(node.lon, -86.7816);
                assert_eq!(node.user, "woodpeck");
                assert_eq!(node.uid, 4321);
                assert_eq!(node.version, 3);
                assert_eq!(node.changeset, 1043791);
                assert_eq!(node.timestamp, "2017-01-17T22:01:37Z");
                assert!(tags.is_empty());
            }
            other => panic!("expected node bundle, got {other:?}"),
        }
    }

    #[test]
    fn node_missing_uid_fails_whole_element() {
        let mut element = node_element();
        element.attrs.remove("uid");
        element.children.push(tag("building", "yes"));

        let err = shaper().shape(&element).unwrap_err();
        assert_eq!(
            err,
            ShapeError::MissingAttribute {
                element: "node",
                attribute: "uid",
            }
        );
    }

    #[test]
    fn node_with_garbage_id_fails_whole_element() {
        let mut element = node_element();
        element.attrs.insert("id".to_string(), "not-a-number".to_string());

        let err = shaper().shape(&element).unwrap_err();
        assert_eq!(
            err,
            ShapeError::InvalidAttribute {
                element: "node",
                attribute: "id",
                value: "not-a-number".to_string(),
            }
        );
    }

    #[test]
    fn unknown_kind_shapes_to_nothing() {
        let element = Element::new("relation");
        assert_eq!(shaper().shape(&element).unwrap(), None);
    }

    #[test]
    fn closed_way_keeps_duplicate_node_refs() {
        let mut element = way_element();
        element.children.push(nd("10"));
        element.children.push(nd("20"));
        element.children.push(nd("10"));

        let bundle = shaper().shape(&element).unwrap().unwrap();
        match bundle {
            RowBundle::Way { way_nodes, .. } => {
                let got: Vec<(i64, u64)> = way_nodes
                    .iter()
                    .map(|row| (row.node_id, row.position))
                    .collect();
                assert_eq!(got, vec![(10, 0), (20, 1), (10, 2)]);
            }
            other => panic!("expected way bundle, got {other:?}"),
        }
    }

    #[test]
    fn tags_between_nds_do_not_disturb_positions() {
        let mut element = way_element();
        element.children.push(nd("1"));
        element.children.push(tag("highway", "residential"));
        element.children.push(nd("2"));
        element.children.push(tag("name", "Church Street"));
        element.children.push(nd("3"));

        let bundle = shaper().shape(&element).unwrap().unwrap();
        match bundle {
            RowBundle::Way {
                way_nodes, tags, ..
            } => {
                let positions: Vec<u64> = way_nodes.iter().map(|row| row.position).collect();
                assert_eq!(positions, vec![0, 1, 2]);
                assert_eq!(tags.len(), 2);
            }
            other => panic!("expected way bundle, got {other:?}"),
        }
    }

    #[test]
    fn way_end_to_end() {
        let mut element = way_element();
        element.children.push(tag("addr:street", "Main St"));
        element.children.push(tag("building", "yes"));
        element.children.push(nd("1"));
        element.children.push(nd("2"));
        element.children.push(nd("3"));

        let bundle = shaper().shape(&element).unwrap().unwrap();
        match bundle {
            RowBundle::Way {
                way,
                way_nodes,
                tags,
            } => {
                assert_eq!(way.id, 209809850);

                assert_eq!(tags.len(), 2);
                assert_eq!(tags[0].key, "street");
                assert_eq!(tags[0].kind, "addr");
                assert_eq!(tags[0].value, "Main St");
                assert_eq!(tags[1].key, "building");
                assert_eq!(tags[1].kind, "regular");
                assert_eq!(tags[1].value, "yes");

                assert_eq!(way_nodes.len(), 3);
                for (expected, row) in [(1, 0), (2, 1), (3, 2)].iter().zip(&way_nodes) {
                    assert_eq!(row.id, 209809850);
                    assert_eq!((row.node_id, row.position), (expected.0, expected.1));
                }
            }
            other => panic!("expected way bundle, got {other:?}"),
        }
    }

    #[test]
    fn rejected_key_drops_only_that_tag() {
        let mut element = node_element();
        element.children.push(tag("The Stahlman", "building"));
        element.children.push(tag("amenity", "restaurant"));

        let bundle = shaper().shape(&element).unwrap().unwrap();
        match bundle {
            RowBundle::Node { tags, .. } => {
                assert_eq!(tags.len(), 1);
                assert_eq!(tags[0].key, "amenity");
            }
            other => panic!("expected node bundle, got {other:?}"),
        }
    }

    #[test]
    fn namespaced_value_passes_through_in_full() {
        // Values containing colons must never be truncated.
        let mut element = node_element();
        element
            .children
            .push(tag("opening_hours:kitchen", "Mo-Fr 11:00-22:00"));

        let bundle = shaper().shape(&element).unwrap().unwrap();
        match bundle {
            RowBundle::Node { tags, .. } => {
                assert_eq!(tags[0].kind, "opening_hours");
                assert_eq!(tags[0].key, "kitchen");
                assert_eq!(tags[0].value, "Mo-Fr 11:00-22:00");
            }
            other => panic!("expected node bundle, got {other:?}"),
        }
    }

    #[test]
    fn tag_child_without_value_is_dropped() {
        let mut element = node_element();
        let mut bare = Element::new("tag");
        bare.attrs.insert("k".to_string(), "amenity".to_string());
        element.children.push(bare);
        element.children.push(tag("building", "yes"));

        let bundle = shaper().shape(&element).unwrap().unwrap();
        match bundle {
            RowBundle::Node { tags, .. } => {
                assert_eq!(tags.len(), 1);
                assert_eq!(tags[0].key, "building");
            }
            other => panic!("expected node bundle, got {other:?}"),
        }
    }

    #[test]
    fn shaping_is_deterministic() {
        let mut element = way_element();
        element.children.push(tag("addr:street", "Main St"));
        element.children.push(nd("1"));
        element.children.push(nd("2"));

        let shaper = shaper();
        let first = shaper.shape(&element).unwrap();
        let second = shaper.shape(&element).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn custom_default_tag_type_is_used() {
        let shaper = ElementShaper::new(ShapeConfig {
            default_tag_type: String::from("plain"),
        });
        let mut element = node_element();
        element.children.push(tag("building", "yes"));

        let bundle = shaper.shape(&element).unwrap().unwrap();
        match bundle {
            RowBundle::Node { tags, .. } => assert_eq!(tags[0].kind, "plain"),
            other => panic!("expected node bundle, got {other:?}"),
        }
    }
}
