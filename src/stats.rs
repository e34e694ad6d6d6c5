use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;

use crate::pipeline::AreaRateSummary;
use crate::types::{OutputRecord, TargetZip};

#[derive(Debug, Clone, Serialize)]
pub struct RunStats {
    pub generated_at: DateTime<Utc>,

    // target zipcodes
    pub target_zips: usize,
    pub matched_zips: usize,
    pub unmatched_zips: usize,

    // matched zipcodes by outcome
    pub rated_zips: usize,
    pub unrated_zips: usize,
    pub ambiguous_zips: usize,

    // area rates
    pub rate_areas: usize,
    pub skipped_rate_areas: Vec<u32>,
}

impl RunStats {
    pub fn collect(
        targets: &[TargetZip],
        records: &[OutputRecord],
        ambiguous_zips: usize,
        area_rates: &AreaRateSummary,
    ) -> Self {
        let target_zips = targets
            .iter()
            .map(|t| t.zipcode.as_str())
            .collect::<HashSet<_>>()
            .len();
        let matched_zips = records.len();
        let rated_zips = records.iter().filter(|r| r.rate.is_some()).count();

        RunStats {
            generated_at: Utc::now(),
            target_zips,
            matched_zips,
            unmatched_zips: target_zips - matched_zips,
            rated_zips,
            unrated_zips: matched_zips - rated_zips - ambiguous_zips,
            ambiguous_zips,
            rate_areas: area_rates.rates.len(),
            skipped_rate_areas: area_rates.skipped.clone(),
        }
    }

    pub fn pct(part: usize, total: usize) -> f64 {
        if total == 0 {
            0.0
        } else {
            (part as f64 / total as f64) * 100.0
        }
    }

    /// Share of target zipcodes that received a rate.
    pub fn coverage_pct(&self) -> f64 {
        Self::pct(self.rated_zips, self.target_zips)
    }
}
