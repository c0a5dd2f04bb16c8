use crate::model::TradeType;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "land-scout", version, about = "Collects apartment complex prices by region and exports them")]
pub struct Cli {
    /// Path to the JSON config file
    #[arg(long, default_value = "config.json")]
    pub config: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the sub-regions of a region (cities when no code is given)
    Regions { region_no: Option<String> },

    /// List the complexes of a town with their details
    Complexes { town_no: String },

    /// Show the transaction series of one pyeong
    Prices {
        complex_no: String,
        pyeong_no: String,
        #[arg(long, value_enum, default_value_t = TradeArg::Deal)]
        trade_type: TradeArg,
    },

    /// Collect priced complexes for towns of a district and store them
    Collect {
        /// District region code
        #[arg(long)]
        district: String,
        /// Town codes to collect; all towns of the district when omitted
        #[arg(long = "town")]
        towns: Vec<String>,
    },

    /// List stored collections
    List,

    /// Show the complexes of a stored collection
    Show { id: i64 },

    /// Delete a stored collection
    Remove { id: i64 },

    /// Export every stored pyeong with its representative prices
    ExportRaw {
        #[arg(long)]
        out: PathBuf,
        #[command(flatten)]
        households: HouseholdArgs,
    },

    /// Export per-town price comparison of new, semi-new and old complexes
    ExportAnalysis {
        #[arg(long)]
        out: PathBuf,
        /// Approval year from which a complex counts as new
        #[arg(long)]
        new_year: i32,
        /// Approval year from which a complex counts as semi-new
        #[arg(long)]
        semi_new_year: i32,
        #[command(flatten)]
        households: HouseholdArgs,
    },
}

#[derive(Debug, Args)]
pub struct HouseholdArgs {
    #[arg(long)]
    pub min_households: Option<u32>,
    #[arg(long)]
    pub max_households: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TradeArg {
    Deal,
    Lease,
}

impl From<TradeArg> for TradeType {
    fn from(arg: TradeArg) -> Self {
        match arg {
            TradeArg::Deal => TradeType::Deal,
            TradeArg::Lease => TradeType::Lease,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_collect_with_towns() {
        let cli = Cli::parse_from([
            "land-scout", "collect", "--district", "1168000000", "--town", "1168010300", "--town",
            "1168010400",
        ]);
        match cli.command {
            Command::Collect { district, towns } => {
                assert_eq!(district, "1168000000");
                assert_eq!(towns.len(), 2);
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert_eq!(cli.config, "config.json");
    }

    #[test]
    fn parses_export_analysis() {
        let cli = Cli::parse_from([
            "land-scout", "export-analysis", "--out", "cmp", "--new-year", "2020",
            "--semi-new-year", "2012", "--min-households", "300",
        ]);
        match cli.command {
            Command::ExportAnalysis { new_year, semi_new_year, households, .. } => {
                assert_eq!((new_year, semi_new_year), (2020, 2012));
                assert_eq!(households.min_households, Some(300));
                assert_eq!(households.max_households, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn trade_type_defaults_to_deal() {
        let cli = Cli::parse_from(["land-scout", "prices", "8928", "1"]);
        match cli.command {
            Command::Prices { trade_type, .. } => assert_eq!(TradeType::from(trade_type), TradeType::Deal),
            other => panic!("unexpected command {:?}", other),
        }
    }
}
