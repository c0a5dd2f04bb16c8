use super::{fmt_decimal, fmt_opt, open_writer};
use crate::model::{ExportError, TownComplexes};
use std::path::Path;
use tracing::info;

const HEADER: [&str; 15] = [
    "지역",
    "단지명",
    "세대수",
    "사용승인년도",
    "주소",
    "평형",
    "공급면적",
    "전용면적",
    "평형대",
    "대표평형",
    "매매일자",
    "매매가",
    "전세일자",
    "전세가",
    "전세가율",
];

/// Writes one row per pyeong of every complex. Returns the number of data rows.
pub fn write_raw(path: &Path, data: &[TownComplexes]) -> Result<usize, ExportError> {
    let mut writer = open_writer(path)?;
    writer.write_record(HEADER)?;

    let mut rows = 0;
    for entry in data {
        for complex in &entry.complexes {
            for pyeong in &complex.pyeongs {
                let trade = pyeong.trade_price.as_ref();
                let lease = pyeong.lease_price.as_ref();
                writer.write_record([
                    entry.town.region_name.clone(),
                    complex.complex_name.clone(),
                    complex.total_household_count.to_string(),
                    fmt_opt(complex.approval_year),
                    complex.address.clone(),
                    pyeong.pyeong_name.clone(),
                    format!("{:.2}", pyeong.supply_area),
                    format!("{:.2}", pyeong.exclusive_area),
                    format!("{}평대", pyeong.size_class()),
                    if complex.is_representative(&pyeong.pyeong_no) { "Y" } else { "" }.to_string(),
                    fmt_opt(trade.map(|p| p.trade_date)),
                    fmt_opt(trade.map(|p| p.low_trade_price)),
                    fmt_opt(lease.map(|p| p.trade_date)),
                    fmt_opt(lease.map(|p| p.low_trade_price)),
                    fmt_decimal(pyeong.lease_ratio(), 1),
                ])?;
                rows += 1;
            }
        }
    }

    writer.flush()?;
    info!("Wrote {} pyeong rows to {}", rows, path.display());
    Ok(rows)
}
