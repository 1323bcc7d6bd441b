//! osmelt: shape an OSM XML export into relational CSV tables
//!
//! Usage:
//!   # Read an export, write nodes.csv / nodes_tags.csv / ways.csv /
//!   # ways_tags.csv / ways_nodes.csv into the current directory
//!   osmelt map.osm
//!
//!   # Read from stdin, write to a directory
//!   cat map.osm | osmelt --output-dir ./tables
//!
//!   # Audit street names instead of writing tables
//!   osmelt --audit map.osm

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use structured_logger::{json::new_writer, Builder};

use osmelt::audit::{normalize_street, KeyCensus, StreetAudit};
use osmelt::{process_osm, CsvSink, OsmReader, ShapeConfig};

#[derive(Parser, Debug)]
#[command(name = "osmelt")]
#[command(about = "Shape an OSM XML export into relational CSV tables", long_about = None)]
struct Args {
    /// Input OSM XML file (use stdin if omitted)
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Directory for the output CSV files
    #[arg(long, short = 'o', default_value = ".")]
    output_dir: PathBuf,

    /// Audit street names instead of writing tables
    #[arg(long)]
    audit: bool,

    /// Print the run report as JSON instead of a plain summary
    #[arg(long)]
    json_report: bool,

    /// Tag type recorded for keys without a namespace prefix
    #[arg(long, default_value = "regular")]
    default_tag_type: String,
}

fn open_input(input: &Option<PathBuf>) -> Result<Box<dyn BufRead>> {
    match input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(BufReader::new(io::stdin()))),
    }
}

fn main() -> Result<()> {
    Builder::with_level("info")
        .with_target_writer("*", new_writer(io::stderr()))
        .init();

    let args = Args::parse();
    let reader = open_input(&args.input)?;

    if args.audit {
        return run_audit(reader);
    }

    let config = ShapeConfig {
        default_tag_type: args.default_tag_type,
    };
    let mut sink = CsvSink::create(&args.output_dir)?;
    let report = process_osm(reader, &mut sink, config)?;

    if args.json_report {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{report}");
    }

    Ok(())
}

/// Census tag-key shapes and tally street types across all `addr:street`
/// tags, then print what needs attention, with suggested rewrites where
/// an abbreviation mapping applies.
fn run_audit(reader: impl BufRead) -> Result<()> {
    let mut census = KeyCensus::new();
    let mut audit = StreetAudit::new();

    for element in OsmReader::new(reader) {
        let element = element.context("failed to read element from OSM export")?;
        for child in element.children.iter().filter(|c| c.name == "tag") {
            let Some(key) = child.attr("k") else {
                continue;
            };
            census.observe(key);
            if key == "addr:street" {
                if let Some(value) = child.attr("v") {
                    audit.observe(value);
                }
            }
        }
    }

    println!("tag keys:");
    println!("  lowercase:       {}", census.lower);
    println!("  lowercase:colon: {}", census.lower_colon);
    println!("  problem chars:   {}", census.problem);
    println!("  other:           {}", census.other);
    for key in census.problem_keys() {
        println!("    dropped by shaping: {key}");
    }

    println!("street types:");
    for (street_type, count) in audit.counts() {
        println!("  {street_type}: {count}");
    }

    let abbreviated: Vec<_> = audit.abbreviated().collect();
    if !abbreviated.is_empty() {
        println!("abbreviated street names:");
        for (_, names) in abbreviated {
            for name in names {
                println!("  {name} => {}", normalize_street(name));
            }
        }
    }

    let unexpected: Vec<_> = audit.unexpected().collect();
    if !unexpected.is_empty() {
        println!("unexpected street types:");
        for (street_type, names) in unexpected {
            println!("  {street_type}:");
            for name in names {
                println!("    {name}");
            }
        }
    }

    Ok(())
}
