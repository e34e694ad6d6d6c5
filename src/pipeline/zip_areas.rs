use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

use crate::types::{TargetZip, ZipAreaRecord};

/// Collapses exact duplicate `(zipcode, rate_area)` pairs, keeping the first
/// copy of each. A zipcode listed under different rate areas keeps every
/// area.
pub fn dedup_zip_areas(zips: &[ZipAreaRecord]) -> Vec<ZipAreaRecord> {
    let mut seen: HashSet<&ZipAreaRecord> = HashSet::with_capacity(zips.len());

    zips.iter()
        .filter(|z| seen.insert(*z))
        .cloned()
        .collect()
}

/// Joins each target zipcode to every rate area it maps to in the
/// deduplicated zip table.
///
/// Output follows target order, then zip table order within a target. A
/// zipcode that maps to N areas yields N rows; one that is not in the zip
/// table yields none.
#[tracing::instrument(skip_all, fields(targets = targets.len(), zips = zips.len()))]
pub fn assign_areas_to_zipcodes(
    targets: &[TargetZip],
    zips: &[ZipAreaRecord],
) -> Vec<ZipAreaRecord> {
    let cleaned = dedup_zip_areas(zips);

    let mut areas_by_zip: HashMap<&str, Vec<u32>> = HashMap::new();
    for record in &cleaned {
        areas_by_zip
            .entry(record.zipcode.as_str())
            .or_default()
            .push(record.rate_area);
    }

    let mut joined = Vec::with_capacity(targets.len());
    let mut unmatched = 0usize;

    for target in targets {
        match areas_by_zip.get(target.zipcode.as_str()) {
            Some(areas) => joined.extend(areas.iter().map(|&rate_area| ZipAreaRecord {
                zipcode: target.zipcode.clone(),
                rate_area,
            })),
            None => unmatched += 1,
        }
    }

    if unmatched > 0 {
        warn!(unmatched, "Target zipcodes missing from the zip table were dropped");
    }
    info!(
        duplicates_removed = zips.len() - cleaned.len(),
        rows = joined.len(),
        "Zipcodes joined to rate areas"
    );

    joined
}
