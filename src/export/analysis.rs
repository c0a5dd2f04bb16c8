use super::{fmt_decimal, open_writer};
use crate::analyzer::{TierYears, TownAnalyzer};
use crate::model::{ExportError, TownComplexes};
use std::path::Path;
use tracing::info;

/// Writes one row per town and size class comparing average representative
/// prices of new, semi-new and old complexes. Returns the number of data rows.
pub fn write_analysis(
    path: &Path,
    data: &[TownComplexes],
    years: &TierYears,
) -> Result<usize, ExportError> {
    let mut writer = open_writer(path)?;
    let new = format!("신축({}~)", years.new_year);
    let semi_new = format!("준신축({}~{})", years.semi_new_year, years.new_year.saturating_sub(1));
    let old = format!("구축(~{})", years.semi_new_year.saturating_sub(1));

    let mut header = vec!["지역".to_string(), "평형대".to_string()];
    for tier in [&new, &semi_new, &old] {
        header.push(format!("{} 매매", tier));
        header.push(format!("{} 전세", tier));
        header.push(format!("{} 전세가율", tier));
        header.push(format!("{} 표본수", tier));
    }
    writer.write_record(&header)?;

    let mut rows = 0;
    for entry in data {
        for summary in TownAnalyzer::town_price_summary(&entry.town, &entry.complexes, years) {
            let mut record = vec![summary.region_name.clone(), format!("{}평대", summary.size_class)];
            for tier in [&summary.new, &summary.semi_new, &summary.old] {
                record.push(fmt_decimal(tier.deal(), 0));
                record.push(fmt_decimal(tier.lease(), 0));
                record.push(fmt_decimal(tier.lease_ratio(), 1));
                record.push(tier.samples().to_string());
            }
            writer.write_record(&record)?;
            rows += 1;
        }
    }

    writer.flush()?;
    info!("Wrote {} town comparison rows to {}", rows, path.display());
    Ok(rows)
}
