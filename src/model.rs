// Core structs: Region, Complex, Pyeong, Price
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

/// Square metres per pyeong.
pub const SQM_PER_PYEONG: f64 = 3.3058;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub region_no: String,
    pub region_name: String,
    pub region_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeType {
    Deal,
    Lease,
}

impl TradeType {
    /// Code the portal uses in its `tradeType` query parameter.
    pub fn code(&self) -> &'static str {
        match self {
            TradeType::Deal => "A1",
            TradeType::Lease => "B1",
        }
    }
}

impl fmt::Display for TradeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeType::Deal => write!(f, "deal"),
            TradeType::Lease => write!(f, "lease"),
        }
    }
}

/// A reported transaction price, in units of 10,000 KRW.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub trade_date: NaiveDate,
    pub low_trade_price: u64,
    pub high_trade_price: u64,
    pub floor: Option<i32>,
}

/// One month of a price series. Series are ordered newest month first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceMonth {
    pub year: i32,
    pub month: u32,
    pub prices: Vec<Price>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pyeong {
    pub pyeong_no: String,
    pub pyeong_name: String,
    pub supply_area: f64,
    pub exclusive_area: f64,
    pub trade_price: Option<Price>,
    pub lease_price: Option<Price>,
}

impl Pyeong {
    pub fn pyeong_size(&self) -> f64 {
        self.supply_area / SQM_PER_PYEONG
    }

    /// Size bucket in steps of ten pyeong: 34.2 falls into 30.
    pub fn size_class(&self) -> u32 {
        let size = self.pyeong_size().max(0.0).floor() as u32;
        size / 10 * 10
    }

    pub fn price(&self, trade_type: TradeType) -> Option<&Price> {
        match trade_type {
            TradeType::Deal => self.trade_price.as_ref(),
            TradeType::Lease => self.lease_price.as_ref(),
        }
    }

    /// Lease deposit as a percentage of the deal price.
    pub fn lease_ratio(&self) -> Option<f64> {
        let deal = self.trade_price.as_ref()?.low_trade_price;
        let lease = self.lease_price.as_ref()?.low_trade_price;
        if deal == 0 {
            return None;
        }
        Some(lease as f64 / deal as f64 * 100.0)
    }
}

/// Representative pyeong of one size class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepresentativePyeong {
    pub size_class: u32,
    pub pyeong_no: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Complex {
    pub complex_no: String,
    pub complex_name: String,
    pub total_household_count: u32,
    pub approval_year: Option<i32>,
    pub address: String,
    pub pyeongs: Vec<Pyeong>,
    #[serde(default)]
    pub representatives: Vec<RepresentativePyeong>,
}

impl Complex {
    pub fn select_trade_price(&mut self, pyeong_no: &str, prices: &[Price]) {
        self.select_price(pyeong_no, prices, TradeType::Deal);
    }

    pub fn select_lease_price(&mut self, pyeong_no: &str, prices: &[Price]) {
        self.select_price(pyeong_no, prices, TradeType::Lease);
    }

    fn select_price(&mut self, pyeong_no: &str, prices: &[Price], trade_type: TradeType) {
        let Some(selected) = crate::analyzer::select_representative(prices) else {
            return;
        };
        let Some(pyeong) = self.pyeongs.iter_mut().find(|p| p.pyeong_no == pyeong_no) else {
            return;
        };
        match trade_type {
            TradeType::Deal => pyeong.trade_price = Some(selected.clone()),
            TradeType::Lease => pyeong.lease_price = Some(selected.clone()),
        }
    }

    /// Picks one pyeong per size class. `order` ranks two prices, `Less` meaning
    /// the first one is preferred. DEAL prices decide; a class with no DEAL price
    /// at all falls back to LEASE prices. Classes without any price get none.
    pub fn set_representative_pyeongs<F>(&mut self, order: F)
    where
        F: Fn(&Price, &Price) -> Ordering,
    {
        let mut classes: Vec<u32> = self.pyeongs.iter().map(Pyeong::size_class).collect();
        classes.sort_unstable();
        classes.dedup();

        let mut representatives = Vec::new();
        for class in classes {
            let members: Vec<&Pyeong> = self
                .pyeongs
                .iter()
                .filter(|p| p.size_class() == class)
                .collect();

            let best = [TradeType::Deal, TradeType::Lease].iter().find_map(|&tt| {
                members
                    .iter()
                    .filter_map(|&p| p.price(tt).map(|price| (p, price)))
                    .min_by(|a, b| order(a.1, b.1))
                    .map(|(p, _)| p)
            });

            if let Some(pyeong) = best {
                representatives.push(RepresentativePyeong {
                    size_class: class,
                    pyeong_no: pyeong.pyeong_no.clone(),
                });
            }
        }
        self.representatives = representatives;
    }

    pub fn is_representative(&self, pyeong_no: &str) -> bool {
        self.representatives.iter().any(|r| r.pyeong_no == pyeong_no)
    }

    pub fn representative_pyeongs(&self) -> impl Iterator<Item = &Pyeong> {
        self.pyeongs.iter().filter(|p| self.is_representative(&p.pyeong_no))
    }
}

/// Complexes collected for one town.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TownComplexes {
    pub town: Region,
    pub complexes: Vec<Complex>,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },
    #[error("invalid response payload: {0}")]
    Decode(String),
    #[error("invalid client setting: {0}")]
    Setup(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("stored payload is corrupt: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("collection {0} not found")]
    NotFound(i64),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("semi-new year {semi_new} must be earlier than new-build year {new}")]
    InvalidYears { new: i32, semi_new: i32 },
    #[error("year {0} is outside 1900..=2200")]
    YearOutOfRange(i32),
}

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("household count {0} is outside 0..=100000")]
    OutOfBounds(u32),
    #[error("minimum household count {low} exceeds maximum {high}")]
    Inverted { low: u32, high: u32 },
}

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("import cancelled")]
    Cancelled,
    #[error(transparent)]
    Provider(#[from] ProviderError),
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::analyzer::representative_order;

    #[test]
    fn size_class_buckets_by_ten_pyeong() {
        assert_eq!(pyeong("1", 82.0).size_class(), 20);
        assert_eq!(pyeong("2", 112.0).size_class(), 30);
        assert_eq!(pyeong("3", 33.0).size_class(), 0);
    }

    #[test]
    fn select_trade_price_stores_representative_on_pyeong() {
        let mut c = complex("100", 500, Some(2010));
        let prices = vec![
            price("2024-03-02", 90000),
            price("2024-03-09", 95000),
            price("2024-03-09", 93000),
        ];
        c.select_trade_price("2", &prices);

        let chosen = c.pyeongs[1].trade_price.as_ref().unwrap();
        assert_eq!(chosen.low_trade_price, 93000);
        assert!(c.pyeongs[0].trade_price.is_none());
    }

    #[test]
    fn select_price_ignores_unknown_pyeong_and_empty_list() {
        let mut c = complex("100", 500, None);
        c.select_lease_price("99", &[price("2024-01-01", 1)]);
        c.select_lease_price("1", &[]);
        assert!(c.pyeongs.iter().all(|p| p.lease_price.is_none()));
    }

    #[test]
    fn representative_pyeongs_one_per_size_class() {
        let mut c = complex("100", 500, None);
        c.select_trade_price("1", &[price("2024-01-05", 50000)]);
        c.select_trade_price("2", &[price("2024-02-01", 80000)]);
        c.select_trade_price("3", &[price("2024-02-01", 78000)]);
        c.set_representative_pyeongs(representative_order);

        assert_eq!(
            c.representatives,
            vec![
                RepresentativePyeong { size_class: 20, pyeong_no: "1".into() },
                RepresentativePyeong { size_class: 30, pyeong_no: "3".into() },
            ]
        );
        assert!(!c.is_representative("2"));
    }

    #[test]
    fn representative_falls_back_to_lease() {
        let mut c = complex("100", 500, None);
        c.select_lease_price("2", &[price("2024-01-01", 40000)]);
        c.select_lease_price("3", &[price("2024-02-01", 42000)]);
        c.set_representative_pyeongs(representative_order);

        assert_eq!(c.representatives.len(), 1);
        assert_eq!(c.representatives[0].pyeong_no, "3");
    }

    #[test]
    fn lease_ratio_needs_both_prices() {
        let mut p = pyeong("1", 82.0);
        assert_eq!(p.lease_ratio(), None);
        p.trade_price = Some(price("2024-01-01", 50000));
        p.lease_price = Some(price("2024-01-01", 30000));
        assert_eq!(p.lease_ratio(), Some(60.0));
    }
}
