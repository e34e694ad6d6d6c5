use tracing::info;

use crate::types::{AreaRates, ZipAreaRecord, ZipRate};

/// Left-joins zipcode/area pairs to the area rates.
///
/// Every input row is kept. A row whose area has no rate gets `None`.
#[tracing::instrument(skip_all, fields(rows = zip_areas.len(), areas = area_rates.len()))]
pub fn assign_rates_to_zipcodes(zip_areas: &[ZipAreaRecord], area_rates: &AreaRates) -> Vec<ZipRate> {
    let rows: Vec<ZipRate> = zip_areas
        .iter()
        .map(|za| ZipRate {
            zipcode: za.zipcode.clone(),
            rate_area: za.rate_area,
            rate: area_rates.get(za.rate_area),
        })
        .collect();

    let without_rate = rows.iter().filter(|r| r.rate.is_none()).count();
    info!(rows = rows.len(), without_rate, "Rates assigned to zipcodes");

    rows
}
