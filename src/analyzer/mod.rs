// Analyzer module: representative price selection and per-town comparisons.

pub mod representative;
pub mod town_summary;

pub use representative::{representative_order, select_representative};
pub use town_summary::{TierYears, TownAnalyzer};
