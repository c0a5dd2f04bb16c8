use crate::model::{Complex, ExportError, Pyeong, Region, TradeType};
use std::collections::BTreeMap;

/// Plausible range for approval-year thresholds.
pub const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1900..=2200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildTier {
    New,
    SemiNew,
    Old,
    Unknown,
}

/// Approval-year thresholds separating new builds from semi-new and old ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierYears {
    pub new_year: i32,
    pub semi_new_year: i32,
}

impl TierYears {
    pub fn new(new_year: i32, semi_new_year: i32) -> Result<Self, ExportError> {
        for year in [new_year, semi_new_year] {
            if !YEAR_RANGE.contains(&year) {
                return Err(ExportError::YearOutOfRange(year));
            }
        }
        if semi_new_year >= new_year {
            return Err(ExportError::InvalidYears {
                new: new_year,
                semi_new: semi_new_year,
            });
        }
        Ok(Self {
            new_year,
            semi_new_year,
        })
    }

    pub fn tier(&self, approval_year: Option<i32>) -> BuildTier {
        match approval_year {
            Some(y) if y >= self.new_year => BuildTier::New,
            Some(y) if y >= self.semi_new_year => BuildTier::SemiNew,
            Some(_) => BuildTier::Old,
            None => BuildTier::Unknown,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TierAverage {
    deal_sum: u64,
    deal_count: usize,
    lease_sum: u64,
    lease_count: usize,
    ratio_sum: f64,
    ratio_count: usize,
}

impl TierAverage {
    fn add_pyeong(&mut self, pyeong: &Pyeong) {
        for trade_type in [TradeType::Deal, TradeType::Lease] {
            if let Some(price) = pyeong.price(trade_type) {
                self.add(trade_type, price.low_trade_price);
            }
        }
        if let Some(ratio) = pyeong.lease_ratio() {
            self.ratio_sum += ratio;
            self.ratio_count += 1;
        }
    }

    fn add(&mut self, trade_type: TradeType, amount: u64) {
        match trade_type {
            TradeType::Deal => {
                self.deal_sum += amount;
                self.deal_count += 1;
            }
            TradeType::Lease => {
                self.lease_sum += amount;
                self.lease_count += 1;
            }
        }
    }

    pub fn deal(&self) -> Option<f64> {
        (self.deal_count > 0).then(|| self.deal_sum as f64 / self.deal_count as f64)
    }

    pub fn lease(&self) -> Option<f64> {
        (self.lease_count > 0).then(|| self.lease_sum as f64 / self.lease_count as f64)
    }

    /// Mean lease ratio over the pyeongs that carry both a DEAL and a LEASE price.
    pub fn lease_ratio(&self) -> Option<f64> {
        (self.ratio_count > 0).then(|| self.ratio_sum / self.ratio_count as f64)
    }

    pub fn samples(&self) -> usize {
        self.deal_count.max(self.lease_count)
    }
}

/// Average representative prices of one size class within a town.
#[derive(Debug, Clone, PartialEq)]
pub struct SizeClassSummary {
    pub region_name: String,
    pub size_class: u32,
    pub new: TierAverage,
    pub semi_new: TierAverage,
    pub old: TierAverage,
}

impl SizeClassSummary {
    fn tier_mut(&mut self, tier: BuildTier) -> Option<&mut TierAverage> {
        match tier {
            BuildTier::New => Some(&mut self.new),
            BuildTier::SemiNew => Some(&mut self.semi_new),
            BuildTier::Old => Some(&mut self.old),
            BuildTier::Unknown => None,
        }
    }
}

pub struct TownAnalyzer;

impl TownAnalyzer {
    /// Groups the representative pyeongs of every complex in `town` by size class
    /// and build tier. Complexes without an approval date are skipped.
    pub fn town_price_summary(
        town: &Region,
        complexes: &[Complex],
        years: &TierYears,
    ) -> Vec<SizeClassSummary> {
        let mut classes: BTreeMap<u32, SizeClassSummary> = BTreeMap::new();

        for complex in complexes {
            let tier = years.tier(complex.approval_year);
            if tier == BuildTier::Unknown {
                continue;
            }
            for pyeong in complex.representative_pyeongs() {
                let class = pyeong.size_class();
                let summary = classes.entry(class).or_insert_with(|| SizeClassSummary {
                    region_name: town.region_name.clone(),
                    size_class: class,
                    new: TierAverage::default(),
                    semi_new: TierAverage::default(),
                    old: TierAverage::default(),
                });
                if let Some(bucket) = summary.tier_mut(tier) {
                    bucket.add_pyeong(pyeong);
                }
            }
        }

        classes.into_values().collect()
    }
}
