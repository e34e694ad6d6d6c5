use ordered_float::OrderedFloat;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

use crate::error::{Result, SlcspError};
use crate::types::{AreaRates, PlanRecord};

/// Metal level whose plans set the benchmark.
pub const SILVER: &str = "Silver";

/// What to do with a rate area that has fewer than two distinct Silver rates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InsufficientRatesPolicy {
    /// Abort with [`SlcspError::InsufficientRates`].
    #[default]
    Fail,
    /// Leave the area out of the result; zipcodes in it get no rate.
    Skip,
}

/// Result of aggregation, including the areas left out under
/// [`InsufficientRatesPolicy::Skip`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AreaRateSummary {
    pub rates: AreaRates,
    pub skipped: Vec<u32>,
}

/// Computes the second-lowest distinct Silver rate of every rate area.
///
/// Duplicate rates count once: Silver rates {100, 100, 150, 200} give 150.
/// Fails with [`SlcspError::InsufficientRates`] if any area with Silver
/// plans has fewer than two distinct rates.
pub fn create_area_rates(plans: &[PlanRecord]) -> Result<AreaRates> {
    create_area_rates_with(plans, InsufficientRatesPolicy::Fail).map(|s| s.rates)
}

#[tracing::instrument(skip_all, fields(plans = plans.len(), policy = ?policy))]
pub fn create_area_rates_with(
    plans: &[PlanRecord],
    policy: InsufficientRatesPolicy,
) -> Result<AreaRateSummary> {
    let mut groups: BTreeMap<u32, BTreeSet<OrderedFloat<f64>>> = BTreeMap::new();

    for plan in plans.iter().filter(|p| p.metal_level == SILVER) {
        groups
            .entry(plan.rate_area)
            .or_default()
            .insert(OrderedFloat(plan.rate));
    }

    let mut summary = AreaRateSummary::default();

    for (rate_area, distinct) in groups {
        match distinct.iter().nth(1) {
            Some(second_lowest) => summary.rates.insert(rate_area, second_lowest.0),
            None => match policy {
                InsufficientRatesPolicy::Fail => {
                    return Err(SlcspError::InsufficientRates {
                        rate_area,
                        distinct: distinct.len(),
                    });
                }
                InsufficientRatesPolicy::Skip => {
                    warn!(
                        rate_area,
                        distinct = distinct.len(),
                        "Skipping rate area without a second-lowest Silver rate"
                    );
                    summary.skipped.push(rate_area);
                }
            },
        }
    }

    info!(
        areas = summary.rates.len(),
        skipped = summary.skipped.len(),
        "Area rates computed"
    );
    Ok(summary)
}
