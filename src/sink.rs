//! Per-relation CSV sinks
//!
//! One writer per output relation, headers in the column order the
//! downstream tables expect. Headers are written up front so a relation
//! that receives no rows still produces a loadable file. Rows are
//! appended in emission order, which for `ways_nodes` is also position
//! order.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::shape::RowBundle;

const NODES_FILE: &str = "nodes.csv";
const NODE_TAGS_FILE: &str = "nodes_tags.csv";
const WAYS_FILE: &str = "ways.csv";
const WAY_TAGS_FILE: &str = "ways_tags.csv";
const WAY_NODES_FILE: &str = "ways_nodes.csv";

const NODE_COLUMNS: [&str; 8] = [
    "id",
    "lat",
    "lon",
    "user",
    "uid",
    "version",
    "changeset",
    "timestamp",
];
const WAY_COLUMNS: [&str; 6] = ["id", "user", "uid", "version", "changeset", "timestamp"];
const TAG_COLUMNS: [&str; 4] = ["id", "key", "value", "type"];
const WAY_NODE_COLUMNS: [&str; 3] = ["id", "node_id", "position"];

/// Writes shaped bundles to five CSV outputs, one per relation.
pub struct CsvSink<W: Write> {
    nodes: csv::Writer<W>,
    node_tags: csv::Writer<W>,
    ways: csv::Writer<W>,
    way_tags: csv::Writer<W>,
    way_nodes: csv::Writer<W>,
}

fn writer_with_header<W: Write>(writer: W, columns: &[&str]) -> Result<csv::Writer<W>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    writer
        .write_record(columns)
        .context("failed to write CSV header")?;
    Ok(writer)
}

impl CsvSink<File> {
    /// Create the five CSV files inside `dir`, creating the directory if
    /// needed.
    pub fn create<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create output directory {}", dir.display()))?;

        let open = |name: &str| -> Result<File> {
            let path = dir.join(name);
            File::create(&path).with_context(|| format!("failed to create {}", path.display()))
        };

        Self::from_writers(
            open(NODES_FILE)?,
            open(NODE_TAGS_FILE)?,
            open(WAYS_FILE)?,
            open(WAY_TAGS_FILE)?,
            open(WAY_NODES_FILE)?,
        )
    }
}

impl<W: Write> CsvSink<W> {
    /// Build a sink over arbitrary writers, in relation order: nodes,
    /// node tags, ways, way tags, way nodes. Writes each relation's
    /// header immediately.
    pub fn from_writers(nodes: W, node_tags: W, ways: W, way_tags: W, way_nodes: W) -> Result<Self> {
        Ok(CsvSink {
            nodes: writer_with_header(nodes, &NODE_COLUMNS)?,
            node_tags: writer_with_header(node_tags, &TAG_COLUMNS)?,
            ways: writer_with_header(ways, &WAY_COLUMNS)?,
            way_tags: writer_with_header(way_tags, &TAG_COLUMNS)?,
            way_nodes: writer_with_header(way_nodes, &WAY_NODE_COLUMNS)?,
        })
    }

    /// Append one shaped bundle to the relevant relations.
    pub fn write(&mut self, bundle: &RowBundle) -> Result<()> {
        match bundle {
            RowBundle::Node { node, tags } => {
                self.nodes.serialize(node).context("failed to write node row")?;
                for tag in tags {
                    self.node_tags
                        .serialize(tag)
                        .context("failed to write node tag row")?;
                }
            }
            RowBundle::Way {
                way,
                way_nodes,
                tags,
            } => {
                self.ways.serialize(way).context("failed to write way row")?;
                for way_node in way_nodes {
                    self.way_nodes
                        .serialize(way_node)
                        .context("failed to write way node row")?;
                }
                for tag in tags {
                    self.way_tags
                        .serialize(tag)
                        .context("failed to write way tag row")?;
                }
            }
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.nodes.flush().context("failed to flush nodes writer")?;
        self.node_tags
            .flush()
            .context("failed to flush node tags writer")?;
        self.ways.flush().context("failed to flush ways writer")?;
        self.way_tags
            .flush()
            .context("failed to flush way tags writer")?;
        self.way_nodes
            .flush()
            .context("failed to flush way nodes writer")?;
        Ok(())
    }

    /// Flush and hand back the underlying writers, in relation order.
    pub fn into_writers(mut self) -> Result<(W, W, W, W, W)> {
        self.flush()?;

        fn recover<W: Write>(writer: csv::Writer<W>, relation: &str) -> Result<W> {
            writer
                .into_inner()
                .map_err(|e| anyhow::anyhow!("failed to recover {relation} writer: {}", e.error()))
        }

        Ok((
            recover(self.nodes, "nodes")?,
            recover(self.node_tags, "node tags")?,
            recover(self.ways, "ways")?,
            recover(self.way_tags, "way tags")?,
            recover(self.way_nodes, "way nodes")?,
        ))
    }
}
