// Command handlers behind the CLI
use crate::analyzer::TierYears;
use crate::cli::{Command, HouseholdArgs};
use crate::config::AppConfig;
use crate::export::{ensure_csv_extension, write_analysis, write_raw};
use crate::filter::{filtered_data, HouseholdRange};
use crate::model::{
    CollectError, Complex, ExportError, FilterError, ProviderError, Region, StorageError,
    TownComplexes,
};
use crate::scraper::{LandProvider, NaverLandProvider};
use crate::service::{self, Collector};
use crate::storage::SqliteStorage;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tokio::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error(transparent)]
    Collect(#[from] CollectError),
    #[error("none of the requested towns belong to district {0}")]
    NoTowns(String),
    #[error("no collected data to export")]
    NothingToExport,
}

pub async fn run(command: Command, config: &AppConfig) -> Result<(), AppError> {
    match command {
        Command::Regions { region_no } => {
            let provider = NaverLandProvider::new(config)?;
            let regions = match region_no {
                Some(no) => service::get_regions(&provider, &no).await?,
                None => service::get_main_cities(&provider).await?,
            };
            print_regions(&regions);
        }
        Command::Complexes { town_no } => {
            let provider = NaverLandProvider::new(config)?;
            let complexes = service::get_complexes(&provider, &town_no).await?;
            for complex in &complexes {
                print_complex_line(complex);
            }
        }
        Command::Prices { complex_no, pyeong_no, trade_type } => {
            let provider = NaverLandProvider::new(config)?;
            let months =
                service::get_prices(&provider, &complex_no, &pyeong_no, trade_type.into()).await?;
            for month in &months {
                println!("{}-{:02}", month.year, month.month);
                for price in &month.prices {
                    println!(
                        "   {}  {} 만원  floor {}",
                        price.trade_date,
                        price.low_trade_price,
                        price.floor.map(|f| f.to_string()).unwrap_or_else(|| "-".into())
                    );
                }
            }
        }
        Command::Collect { district, towns } => {
            let provider = NaverLandProvider::new(config)?;
            let mut storage = SqliteStorage::new(&config.db_path)?;
            collect(&provider, &mut storage, config, &district, &towns).await?;
        }
        Command::List => {
            let storage = SqliteStorage::new(&config.db_path)?;
            for info in storage.list_collections()? {
                println!(
                    "{:>4}  {} ({})  {} complexes  {}",
                    info.id,
                    info.town.region_name,
                    info.town.region_no,
                    info.complex_count,
                    info.collected_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        Command::Show { id } => {
            let storage = SqliteStorage::new(&config.db_path)?;
            let entry = storage.load_collection(id)?;
            println!("{} ({})", entry.town.region_name, entry.town.region_no);
            for complex in &entry.complexes {
                print_complex_detail(complex);
            }
        }
        Command::Remove { id } => {
            let storage = SqliteStorage::new(&config.db_path)?;
            storage.remove_collection(id)?;
            info!("Removed collection {}", id);
        }
        Command::ExportRaw { out, households } => {
            let data = export_data(config, &households)?;
            let path = ensure_csv_extension(&out);
            write_raw(&path, &data)?;
            println!("Exported to {}", path.display());
        }
        Command::ExportAnalysis { out, new_year, semi_new_year, households } => {
            let years = TierYears::new(new_year, semi_new_year)?;
            let data = export_data(config, &households)?;
            let path = ensure_csv_extension(&out);
            write_analysis(&path, &data, &years)?;
            println!("Exported to {}", path.display());
        }
    }
    Ok(())
}

/// Resolves the requested towns under `district`, collects them and stores
/// each town as its own collection. Returns the stored collection ids.
pub async fn collect(
    provider: &dyn LandProvider,
    storage: &mut SqliteStorage,
    config: &AppConfig,
    district: &str,
    town_nos: &[String],
) -> Result<Vec<i64>, AppError> {
    let all_towns = service::get_regions(provider, district).await?;
    let towns = select_towns(all_towns, town_nos);
    if towns.is_empty() {
        return Err(AppError::NoTowns(district.to_string()));
    }

    let cancel = Arc::new(AtomicBool::new(false));
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Cancel requested, stopping after the current request...");
                cancel.store(true, Ordering::SeqCst);
            }
        })
    };

    let collector = Collector::new(
        provider,
        Duration::from_millis(config.request_delay_ms),
        Duration::from_millis(config.town_delay_ms),
        cancel,
    );
    let result = collector.collect(&towns).await;
    watcher.abort();
    let collected = result?;

    let ids = storage.save_collections(&collected)?;
    for (entry, id) in collected.iter().zip(&ids) {
        info!(
            "Stored {} complexes of {} as collection {}",
            entry.complexes.len(),
            entry.town.region_name,
            id
        );
    }
    Ok(ids)
}

/// Keeps the towns named in `town_nos`, or all of them when none are named.
fn select_towns(all_towns: Vec<Region>, town_nos: &[String]) -> Vec<Region> {
    if town_nos.is_empty() {
        return all_towns;
    }
    for no in town_nos {
        if !all_towns.iter().any(|t| &t.region_no == no) {
            warn!("Town {} is not part of the selected district, skipping", no);
        }
    }
    all_towns
        .into_iter()
        .filter(|t| town_nos.contains(&t.region_no))
        .collect()
}

fn export_data(config: &AppConfig, households: &HouseholdArgs) -> Result<Vec<TownComplexes>, AppError> {
    let range = HouseholdRange::new(households.min_households, households.max_households)?;
    if !Path::new(&config.db_path).exists() {
        return Err(AppError::NothingToExport);
    }
    let storage = SqliteStorage::new(&config.db_path)?;
    let data = storage.load_all()?;
    if data.is_empty() {
        return Err(AppError::NothingToExport);
    }
    info!(
        "Filtering {} towns by household count {}..={}",
        data.len(),
        range.low(),
        range.high()
    );
    Ok(filtered_data(&data, &range))
}

fn print_regions(regions: &[Region]) {
    if regions.is_empty() {
        println!("(no regions)");
    }
    for region in regions {
        println!("{}  {}  {}", region.region_no, region.region_name, region.region_type);
    }
}

fn print_complex_line(complex: &Complex) {
    println!(
        "{}  {}  {} households  approved {}  {} pyeong types",
        complex.complex_no,
        complex.complex_name,
        complex.total_household_count,
        complex.approval_year.map(|y| y.to_string()).unwrap_or_else(|| "-".into()),
        complex.pyeongs.len()
    );
}

fn print_complex_detail(complex: &Complex) {
    print_complex_line(complex);
    for pyeong in &complex.pyeongs {
        let marker = if complex.is_representative(&pyeong.pyeong_no) { "*" } else { " " };
        let fmt_price = |p: Option<&crate::model::Price>| {
            p.map(|p| format!("{} ({})", p.low_trade_price, p.trade_date))
                .unwrap_or_else(|| "-".into())
        };
        println!(
            "  {} {:<6} {:>7.2}m²  deal {}  lease {}",
            marker,
            pyeong.pyeong_name,
            pyeong.supply_area,
            fmt_price(pyeong.trade_price.as_ref()),
            fmt_price(pyeong.lease_price.as_ref())
        );
    }
}
