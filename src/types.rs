//! Tables passed between the pipeline stages.

use serde::Serialize;
use std::collections::BTreeMap;

/// A single plan row from the plans table.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanRecord {
    pub metal_level: String,
    pub rate_area: u32,
    pub rate: f64,
}

/// A zipcode to rate area mapping row. The same type carries the joined
/// `(zipcode, rate_area)` pairs produced for target zipcodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ZipAreaRecord {
    pub zipcode: String,
    pub rate_area: u32,
}

/// A zipcode that needs a benchmark rate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetZip {
    pub zipcode: String,
}

/// Second-lowest Silver rate for one rate area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AreaRate {
    pub rate_area: u32,
    pub rate: f64,
}

/// One [`AreaRate`] per rate area, ordered by area.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AreaRates {
    rates: BTreeMap<u32, f64>,
}

impl AreaRates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, rate_area: u32, rate: f64) {
        self.rates.insert(rate_area, rate);
    }

    pub fn get(&self, rate_area: u32) -> Option<f64> {
        self.rates.get(&rate_area).copied()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = AreaRate> + '_ {
        self.rates
            .iter()
            .map(|(&rate_area, &rate)| AreaRate { rate_area, rate })
    }
}

impl FromIterator<AreaRate> for AreaRates {
    fn from_iter<I: IntoIterator<Item = AreaRate>>(iter: I) -> Self {
        Self {
            rates: iter.into_iter().map(|a| (a.rate_area, a.rate)).collect(),
        }
    }
}

/// A joined zipcode row with the rate of its area, if that area has one.
#[derive(Debug, Clone, PartialEq)]
pub struct ZipRate {
    pub zipcode: String,
    pub rate_area: u32,
    pub rate: Option<f64>,
}

/// Final output row. A `None` rate serializes as an empty field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputRecord {
    pub zipcode: String,
    pub rate: Option<f64>,
}
