//! Benchmark rate pipeline.
//!
//! Area rates and zipcode/area pairs are computed independently, joined
//! into per-zipcode rates, and finally collapsed so that every zipcode maps
//! to a single rate, or to none when it spans several rate areas. Each stage
//! returns a new table and leaves its input untouched.

pub mod ambiguity;
pub mod area_rates;
pub mod assign;
pub mod zip_areas;

pub use ambiguity::{clean_output, find_ambiguous_zipcodes, nullify_ambiguous_zipcodes, resolve_ambiguity};
pub use area_rates::{
    AreaRateSummary, InsufficientRatesPolicy, create_area_rates, create_area_rates_with,
};
pub use assign::assign_rates_to_zipcodes;
pub use zip_areas::{assign_areas_to_zipcodes, dedup_zip_areas};

use crate::error::Result;
use crate::stats::RunStats;
use crate::types::{OutputRecord, PlanRecord, TargetZip, ZipAreaRecord};

/// Final table together with counts describing how it was reached.
#[derive(Debug)]
pub struct PipelineOutput {
    pub records: Vec<OutputRecord>,
    pub stats: RunStats,
}

/// Runs all four stages over in-memory tables.
///
/// Nothing is returned unless every stage succeeds.
#[tracing::instrument(skip_all, fields(plans = plans.len(), zips = zips.len(), targets = targets.len()))]
pub fn run_pipeline(
    plans: &[PlanRecord],
    zips: &[ZipAreaRecord],
    targets: &[TargetZip],
    policy: InsufficientRatesPolicy,
) -> Result<PipelineOutput> {
    let area_rates = create_area_rates_with(plans, policy)?;
    let zip_areas = assign_areas_to_zipcodes(targets, zips);
    let zip_rates = assign_rates_to_zipcodes(&zip_areas, &area_rates.rates);
    let ambiguous = find_ambiguous_zipcodes(&zip_rates);
    let records = resolve_ambiguity(&zip_rates);

    let stats = RunStats::collect(targets, &records, ambiguous.len(), &area_rates);

    Ok(PipelineOutput { records, stats })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SlcspError;

    fn plan(rate_area: u32, rate: f64) -> PlanRecord {
        PlanRecord {
            metal_level: "Silver".to_string(),
            rate_area,
            rate,
        }
    }

    fn zip(zipcode: &str, rate_area: u32) -> ZipAreaRecord {
        ZipAreaRecord {
            zipcode: zipcode.to_string(),
            rate_area,
        }
    }

    fn target(zipcode: &str) -> TargetZip {
        TargetZip {
            zipcode: zipcode.to_string(),
        }
    }

    fn out(zipcode: &str, rate: Option<f64>) -> OutputRecord {
        OutputRecord {
            zipcode: zipcode.to_string(),
            rate,
        }
    }

    #[test]
    fn test_single_area_zip_gets_second_lowest() {
        let plans = vec![plan(1, 100.0), plan(1, 100.0), plan(1, 150.0)];
        let result = run_pipeline(
            &plans,
            &[zip("00501", 1)],
            &[target("00501")],
            InsufficientRatesPolicy::Fail,
        )
        .unwrap();

        assert_eq!(result.records, vec![out("00501", Some(150.0))]);
    }

    #[test]
    fn test_ambiguous_zip_gets_no_rate() {
        let plans = vec![
            plan(15, 190.0),
            plan(15, 196.64),
            plan(11, 200.0),
            plan(11, 235.65),
        ];
        let zips = vec![zip("54923", 15), zip("54923", 11)];
        let result = run_pipeline(&plans, &zips, &[target("54923")], InsufficientRatesPolicy::Fail).unwrap();

        assert_eq!(result.records, vec![out("54923", None)]);
        assert_eq!(result.stats.ambiguous_zips, 1);
    }

    #[test]
    fn test_unmatched_zip_is_absent_and_order_kept() {
        let plans = vec![plan(1, 100.0), plan(1, 110.0), plan(2, 200.0), plan(2, 210.0)];
        let zips = vec![zip("22222", 2), zip("11111", 1)];
        let targets = vec![target("22222"), target("99999"), target("11111")];
        let result = run_pipeline(&plans, &zips, &targets, InsufficientRatesPolicy::Fail).unwrap();

        assert_eq!(
            result.records,
            vec![out("22222", Some(210.0)), out("11111", Some(110.0))]
        );
        assert_eq!(result.stats.unmatched_zips, 1);
    }

    #[test]
    fn test_insufficient_rates_aborts_run() {
        let plans = vec![plan(1, 100.0)];
        let err = run_pipeline(&plans, &[zip("00501", 1)], &[target("00501")], InsufficientRatesPolicy::Fail)
            .unwrap_err();

        assert!(matches!(err, SlcspError::InsufficientRates { rate_area: 1, .. }));
    }

    #[test]
    fn test_skip_policy_gives_null_rate() {
        let plans = vec![plan(1, 100.0), plan(2, 200.0), plan(2, 210.0)];
        let zips = vec![zip("00501", 1), zip("00502", 2)];
        let targets = vec![target("00501"), target("00502")];
        let result = run_pipeline(&plans, &zips, &targets, InsufficientRatesPolicy::Skip).unwrap();

        assert_eq!(
            result.records,
            vec![out("00501", None), out("00502", Some(210.0))]
        );
        assert_eq!(result.stats.unrated_zips, 1);
        assert_eq!(result.stats.skipped_rate_areas, vec![1]);
    }
}
