//! # Osmelt - OSM Export Shaping Toolkit
//!
//! Streams an OpenStreetMap XML export and melts its nodes and ways into
//! five normalized relations (nodes, nodes_tags, ways, ways_tags,
//! ways_nodes) ready for loading into a relational store.
//!
//! ## Modules
//!
//! - **shape**: the pure element-to-row transform and tag-key classifier
//! - **source**: streaming element reader over the XML export
//! - **sink**: per-relation CSV writers
//! - **audit**: tag-key census, street-name auditing, abbreviation cleanup
//! - **report**: run counters
//!
//! ## Quick Start
//!
//! ```rust
//! use osmelt::{process_osm, CsvSink, ShapeConfig};
//!
//! # fn main() -> anyhow::Result<()> {
//! let xml = r#"<osm>
//!   <node id="1" lat="36.16" lon="-86.78" user="woodpeck" uid="4321"
//!         version="1" changeset="11" timestamp="2017-01-17T22:01:37Z">
//!     <tag k="amenity" v="cafe"/>
//!   </node>
//! </osm>"#;
//!
//! let mut sink = CsvSink::from_writers(Vec::new(), Vec::new(), Vec::new(), Vec::new(), Vec::new())?;
//! let report = process_osm(xml.as_bytes(), &mut sink, ShapeConfig::default())?;
//!
//! assert_eq!(report.nodes, 1);
//! assert_eq!(report.node_tags, 1);
//! # Ok(())
//! # }
//! ```

use std::io::{BufRead, Write};

use anyhow::{Context, Result};

pub mod audit;
pub mod report;
pub mod shape;
pub mod sink;
pub mod source;

// Re-export commonly used types for convenience
pub use report::RunReport;
pub use shape::{
    classify_key, Element, ElementShaper, KeyClass, NodeRow, RowBundle, ShapeConfig, ShapeError,
    TagRow, WayNodeRow, WayRow,
};
pub use sink::CsvSink;
pub use source::{OsmReader, SourceError};

/// Main entry point: stream an OSM export and write shaped rows to the sink.
///
/// One malformed element does not abort the run: its failure is logged and
/// counted, and the stream continues. Source-level XML errors are fatal.
pub fn process_osm<R: BufRead, W: Write>(
    reader: R,
    sink: &mut CsvSink<W>,
    config: ShapeConfig,
) -> Result<RunReport> {
    let shaper = ElementShaper::new(config);
    let mut run_report = RunReport::default();

    for element in OsmReader::new(reader) {
        let element = element.context("failed to read element from OSM export")?;
        run_report.elements += 1;

        match shaper.shape(&element) {
            Ok(Some(bundle)) => {
                run_report.tally(&element, &bundle);
                sink.write(&bundle)?;
            }
            Ok(None) => run_report.skipped += 1,
            Err(err) => {
                log::warn!(
                    "skipping {} element (id {}): {err}",
                    element.name,
                    element.attr("id").unwrap_or("unknown"),
                );
                run_report.failed += 1;
            }
        }
    }

    sink.flush()?;
    Ok(run_report)
}
