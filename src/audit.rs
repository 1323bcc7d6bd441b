//! Data-quality auditing
//!
//! Exploratory support for deciding what cleanup an export needs before
//! shaping: a census of tag-key shapes, and an audit of `addr:street`
//! values that tallies street types (the trailing token of the name),
//! flags types outside the expected vocabulary, and rewrites known
//! abbreviations to their full forms.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::shape::{classify_key, KeyClass};

// The street type is the last whitespace-delimited token, trailing
// period included ("Ave." stays "Ave." so the dotted abbreviations map).
static STREET_TYPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S+\.?$").unwrap());

/// Street types that need no cleanup.
pub const EXPECTED_STREET_TYPES: &[&str] = &[
    "Alley", "Artery", "Avenue", "Boulevard", "Broadway", "Commons", "Court", "Drive", "East",
    "Lane", "Park", "Parkway", "Place", "Road", "Square", "Street", "Terrace", "Trail",
    "Turnpike", "Way", "West", "Wharf", "Yard",
];

static ABBREVIATIONS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("Ave", "Avenue"),
        ("Ave.", "Avenue"),
        ("AVENUE", "Avenue"),
        ("ave", "Avenue"),
        ("avenue", "Avenue"),
        ("St", "Street"),
        ("BLVD", "Boulevard"),
        ("Blvd", "Boulevard"),
        ("Blvd.", "Boulevard"),
        ("Rd", "Road"),
        ("S", "South"),
        ("N", "North"),
    ])
});

/// The street-type token of a name, if the name ends in one.
pub fn street_type_of(name: &str) -> Option<&str> {
    STREET_TYPE.find(name).map(|m| m.as_str())
}

/// Rewrite a trailing abbreviation to its full form. Names whose type is
/// not a known abbreviation come back unchanged.
pub fn normalize_street(name: &str) -> Cow<'_, str> {
    let Some(suffix) = street_type_of(name) else {
        return Cow::Borrowed(name);
    };
    match ABBREVIATIONS.get(suffix) {
        Some(full) => {
            let stem = &name[..name.len() - suffix.len()];
            Cow::Owned(format!("{stem}{full}"))
        }
        None => Cow::Borrowed(name),
    }
}

/// Accumulates street-type counts plus samples of every name whose type
/// falls outside the expected vocabulary, split into fixable
/// abbreviations and likely typos.
#[derive(Debug, Default)]
pub struct StreetAudit {
    counts: BTreeMap<String, u64>,
    samples: BTreeMap<String, Vec<String>>,
}

impl StreetAudit {
    pub fn new() -> Self {
        StreetAudit::default()
    }

    pub fn observe(&mut self, name: &str) {
        let Some(street_type) = street_type_of(name) else {
            return;
        };
        *self.counts.entry(street_type.to_string()).or_insert(0) += 1;

        if !EXPECTED_STREET_TYPES.contains(&street_type) {
            self.samples
                .entry(street_type.to_string())
                .or_default()
                .push(name.to_string());
        }
    }

    /// All street types seen, with counts, sorted by type.
    pub fn counts(&self) -> &BTreeMap<String, u64> {
        &self.counts
    }

    /// Names whose street type is a known abbreviation; `normalize_street`
    /// rewrites these.
    pub fn abbreviated(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.samples
            .iter()
            .filter(|(street_type, _)| ABBREVIATIONS.contains_key(street_type.as_str()))
            .map(|(street_type, names)| (street_type.as_str(), names.as_slice()))
    }

    /// Names whose street type is neither expected nor a known
    /// abbreviation: typo candidates that need a human look.
    pub fn unexpected(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.samples
            .iter()
            .filter(|(street_type, _)| !ABBREVIATIONS.contains_key(street_type.as_str()))
            .map(|(street_type, names)| (street_type.as_str(), names.as_slice()))
    }
}

static LOWERCASE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z_]*$").unwrap());
static LOWERCASE_COLON: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z_]*:[a-z_]*$").unwrap());

/// Census of tag-key shapes across an export: how many keys are plain
/// lowercase, lowercase with a single namespace colon, carry a problem
/// character, or something else. Problem keys are kept verbatim so the
/// ones the shaper will drop can be eyeballed before a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyCensus {
    pub lower: u64,
    pub lower_colon: u64,
    pub problem: u64,
    pub other: u64,
    problem_keys: Vec<String>,
}

impl KeyCensus {
    pub fn new() -> Self {
        KeyCensus::default()
    }

    pub fn observe(&mut self, key: &str) {
        if LOWERCASE.is_match(key) {
            self.lower += 1;
        } else if LOWERCASE_COLON.is_match(key) {
            self.lower_colon += 1;
        } else if matches!(classify_key(key), KeyClass::Rejected) {
            self.problem += 1;
            self.problem_keys.push(key.to_string());
        } else {
            self.other += 1;
        }
    }

    /// Every key seen with a problem character, in encounter order.
    pub fn problem_keys(&self) -> &[String] {
        &self.problem_keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn street_type_is_the_last_token() {
        assert_eq!(street_type_of("Church Street"), Some("Street"));
        assert_eq!(street_type_of("4th Avenue South"), Some("South"));
        assert_eq!(street_type_of("Elliston Pl"), Some("Pl"));
    }

    #[test]
    fn dotted_abbreviation_keeps_its_period() {
        assert_eq!(street_type_of("Granny White Ave."), Some("Ave."));
    }

    #[test]
    fn normalize_rewrites_known_abbreviations() {
        assert_eq!(normalize_street("Granny White Ave"), "Granny White Avenue");
        assert_eq!(normalize_street("Granny White Ave."), "Granny White Avenue");
        assert_eq!(normalize_street("Charlotte Blvd"), "Charlotte Boulevard");
        assert_eq!(normalize_street("Demonbreun St"), "Demonbreun Street");
    }

    #[test]
    fn normalize_leaves_full_names_alone() {
        assert_eq!(normalize_street("Church Street"), "Church Street");
        assert_eq!(normalize_street("Music Square East"), "Music Square East");
    }

    #[test]
    fn audit_splits_abbreviations_from_typo_candidates() {
        let mut audit = StreetAudit::new();
        audit.observe("Church Street");
        audit.observe("Broadway");
        audit.observe("Elliston Pl");
        audit.observe("Demonbreun St");

        assert_eq!(audit.counts().get("Street"), Some(&1));
        assert_eq!(audit.counts().get("Pl"), Some(&1));

        // "St" is fixable mechanically; "Pl" needs a human look.
        let abbreviated: Vec<_> = audit.abbreviated().collect();
        assert_eq!(
            abbreviated,
            vec![("St", &["Demonbreun St".to_string()][..])]
        );

        let unexpected: Vec<_> = audit.unexpected().collect();
        assert_eq!(unexpected, vec![("Pl", &["Elliston Pl".to_string()][..])]);
    }

    #[test]
    fn census_buckets_key_shapes() {
        let mut census = KeyCensus::new();
        census.observe("building");
        census.observe("addr:street");
        census.observe("The Stahlman");
        census.observe("FIXME");

        assert_eq!(census.lower, 1);
        assert_eq!(census.lower_colon, 1);
        assert_eq!(census.problem, 1);
        assert_eq!(census.other, 1);
        assert_eq!(census.problem_keys(), ["The Stahlman"]);
    }

    #[test]
    fn census_single_colon_only() {
        // A second colon pushes the key out of the lower_colon bucket
        // even though the shaper still accepts it.
        let mut census = KeyCensus::new();
        census.observe("addr:street:name");

        assert_eq!(census.lower_colon, 0);
        assert_eq!(census.other, 1);
        assert!(census.problem_keys().is_empty());
    }
}
