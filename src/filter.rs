use crate::model::{FilterError, TownComplexes};

pub const MIN_HOUSEHOLD_COUNT: u32 = 0;
pub const MAX_HOUSEHOLD_COUNT: u32 = 100_000;

/// Inclusive bounds on a complex's total household count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HouseholdRange {
    low: u32,
    high: u32,
}

impl Default for HouseholdRange {
    fn default() -> Self {
        Self {
            low: MIN_HOUSEHOLD_COUNT,
            high: MAX_HOUSEHOLD_COUNT,
        }
    }
}

impl HouseholdRange {
    /// Missing bounds fall back to the full range.
    pub fn new(low: Option<u32>, high: Option<u32>) -> Result<Self, FilterError> {
        let low = low.unwrap_or(MIN_HOUSEHOLD_COUNT);
        let high = high.unwrap_or(MAX_HOUSEHOLD_COUNT);
        for bound in [low, high] {
            if !(MIN_HOUSEHOLD_COUNT..=MAX_HOUSEHOLD_COUNT).contains(&bound) {
                return Err(FilterError::OutOfBounds(bound));
            }
        }
        if low > high {
            return Err(FilterError::Inverted { low, high });
        }
        Ok(Self { low, high })
    }

    pub fn low(&self) -> u32 {
        self.low
    }

    pub fn high(&self) -> u32 {
        self.high
    }

    pub fn contains(&self, household_count: u32) -> bool {
        self.low <= household_count && household_count <= self.high
    }
}

/// Keeps every town but only the complexes whose household count is in `range`.
pub fn filtered_data(data: &[TownComplexes], range: &HouseholdRange) -> Vec<TownComplexes> {
    data.iter()
        .map(|entry| TownComplexes {
            town: entry.town.clone(),
            complexes: entry
                .complexes
                .iter()
                .filter(|c| range.contains(c.total_household_count))
                .cloned()
                .collect(),
        })
        .collect()
}
