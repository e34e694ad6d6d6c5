use std::collections::{HashMap, HashSet};
use tracing::info;

use crate::types::{OutputRecord, ZipRate};

/// Number of distinct rate areas each zipcode reaches.
fn area_counts(rows: &[ZipRate]) -> HashMap<&str, usize> {
    let mut areas: HashMap<&str, HashSet<u32>> = HashMap::new();
    for row in rows {
        areas.entry(row.zipcode.as_str()).or_default().insert(row.rate_area);
    }
    areas.into_iter().map(|(zip, set)| (zip, set.len())).collect()
}

/// Returns zipcodes that map to more than one rate area, in the order they
/// first appear.
pub fn find_ambiguous_zipcodes(rows: &[ZipRate]) -> Vec<String> {
    let counts = area_counts(rows);
    let mut seen = HashSet::new();

    rows.iter()
        .map(|r| r.zipcode.as_str())
        .filter(|zip| counts[zip] > 1 && seen.insert(*zip))
        .map(str::to_string)
        .collect()
}

/// Collapses rows to one per zipcode and clears the rate of ambiguous
/// zipcodes.
///
/// The first row of each zipcode is kept, with its `rate_area`. An ambiguous
/// zipcode gets `None` even when all of its areas share the same rate.
#[tracing::instrument(skip_all, fields(rows = rows.len()))]
pub fn nullify_ambiguous_zipcodes(rows: &[ZipRate]) -> Vec<ZipRate> {
    let counts = area_counts(rows);
    let mut seen = HashSet::with_capacity(counts.len());
    let mut ambiguous = 0usize;

    let collapsed: Vec<ZipRate> = rows
        .iter()
        .filter(|r| seen.insert(r.zipcode.as_str()))
        .map(|r| {
            if counts[r.zipcode.as_str()] > 1 {
                ambiguous += 1;
                ZipRate { rate: None, ..r.clone() }
            } else {
                r.clone()
            }
        })
        .collect();

    info!(zipcodes = collapsed.len(), ambiguous, "Ambiguous zipcodes resolved");
    collapsed
}

/// Projects collapsed rows down to the `(zipcode, rate)` output table.
pub fn clean_output(rows: &[ZipRate]) -> Vec<OutputRecord> {
    rows.iter()
        .map(|r| OutputRecord {
            zipcode: r.zipcode.clone(),
            rate: r.rate,
        })
        .collect()
}

/// [`nullify_ambiguous_zipcodes`] followed by [`clean_output`].
pub fn resolve_ambiguity(rows: &[ZipRate]) -> Vec<OutputRecord> {
    clean_output(&nullify_ambiguous_zipcodes(rows))
}
