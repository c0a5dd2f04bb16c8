// Naver Land JSON payload parsing
use crate::model::{Complex, Price, PriceMonth, ProviderError, Pyeong, Region, TradeType};
use chrono::NaiveDate;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

/// The portal is inconsistent about quoting numbers.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Flex {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Flex {
    fn as_text(&self) -> String {
        match self {
            Flex::Int(v) => v.to_string(),
            Flex::Float(v) => v.to_string(),
            Flex::Text(s) => s.trim().to_string(),
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Flex::Int(v) => Some(*v as f64),
            Flex::Float(v) => Some(*v),
            Flex::Text(s) => s.trim().parse().ok(),
        }
    }

    fn as_i64(&self) -> Option<i64> {
        match self {
            Flex::Int(v) => Some(*v),
            Flex::Float(v) => Some(v.round() as i64),
            Flex::Text(s) => s.trim().parse().ok(),
        }
    }

    /// Negative values read as absent.
    fn as_u64(&self) -> Option<u64> {
        self.as_i64().and_then(|v| u64::try_from(v).ok())
    }
}

/// Missing or unreadable counters and amounts count as zero.
fn flex_or_zero<T: TryFrom<u64> + Default>(value: Option<&Flex>) -> T {
    value
        .and_then(Flex::as_u64)
        .and_then(|v| T::try_from(v).ok())
        .unwrap_or_default()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegionListResponse {
    #[serde(default)]
    region_list: Vec<RegionItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegionItem {
    cortar_no: String,
    cortar_name: String,
    #[serde(default)]
    cortar_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ComplexListResponse {
    #[serde(default)]
    complex_list: Vec<ComplexItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ComplexItem {
    complex_no: Flex,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ComplexDetailResponse {
    complex_detail: ComplexDetail,
    #[serde(default)]
    complex_pyeong_detail_list: Vec<PyeongItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ComplexDetail {
    complex_no: Flex,
    complex_name: String,
    total_household_count: Option<Flex>,
    use_approve_ymd: Option<String>,
    #[serde(default)]
    address: String,
    #[serde(default)]
    detail_address: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PyeongItem {
    pyeong_no: Flex,
    #[serde(default)]
    pyeong_name: String,
    supply_area: Option<Flex>,
    exclusive_area: Option<Flex>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RealPriceResponse {
    #[serde(default)]
    real_price_on_month_list: Vec<MonthItem>,
    added_row_count: Option<Flex>,
    total_row_count: Option<Flex>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MonthItem {
    trade_base_year: Flex,
    trade_base_month: Flex,
    #[serde(default)]
    real_price_list: Vec<RealPriceItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RealPriceItem {
    trade_year: Option<Flex>,
    trade_month: Option<Flex>,
    trade_date: Option<Flex>,
    deal_price: Option<Flex>,
    lease_price: Option<Flex>,
    floor: Option<Flex>,
}

/// One page of the paginated real-price table.
#[derive(Debug, Clone, PartialEq)]
pub struct RealPricePage {
    pub months: Vec<PriceMonth>,
    pub added_row_count: u32,
    pub total_row_count: u32,
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ProviderError> {
    serde_json::from_str(body).map_err(|e| ProviderError::Decode(e.to_string()))
}

pub fn parse_regions(body: &str) -> Result<Vec<Region>, ProviderError> {
    let response: RegionListResponse = decode(body)?;
    Ok(response
        .region_list
        .into_iter()
        .map(|r| Region {
            region_no: r.cortar_no,
            region_name: r.cortar_name,
            region_type: r.cortar_type,
        })
        .collect())
}

pub fn parse_complex_nos(body: &str) -> Result<Vec<String>, ProviderError> {
    let response: ComplexListResponse = decode(body)?;
    Ok(response
        .complex_list
        .into_iter()
        .map(|c| c.complex_no.as_text())
        .collect())
}

pub fn parse_complex_detail(body: &str) -> Result<Complex, ProviderError> {
    let response: ComplexDetailResponse = decode(body)?;
    let detail = response.complex_detail;

    let pyeongs = response
        .complex_pyeong_detail_list
        .into_iter()
        .map(|p| Pyeong {
            pyeong_no: p.pyeong_no.as_text(),
            pyeong_name: p.pyeong_name,
            supply_area: p.supply_area.and_then(|a| a.as_f64()).unwrap_or(0.0),
            exclusive_area: p.exclusive_area.and_then(|a| a.as_f64()).unwrap_or(0.0),
            trade_price: None,
            lease_price: None,
        })
        .collect();

    let address = if detail.detail_address.is_empty() {
        detail.address
    } else {
        format!("{} {}", detail.address, detail.detail_address)
    };

    Ok(Complex {
        complex_no: detail.complex_no.as_text(),
        complex_name: detail.complex_name,
        total_household_count: detail
            .total_household_count
            .and_then(|c| c.as_i64())
            .and_then(|c| u32::try_from(c).ok())
            .unwrap_or(0),
        approval_year: detail.use_approve_ymd.as_deref().and_then(approval_year),
        address,
        pyeongs,
        representatives: Vec::new(),
    })
}

/// `useApproveYmd` comes as `YYYYMMDD` or `YYYYMM`.
fn approval_year(ymd: &str) -> Option<i32> {
    ymd.trim().get(..4)?.parse().ok()
}

pub fn parse_real_price_page(
    body: &str,
    trade_type: TradeType,
) -> Result<RealPricePage, ProviderError> {
    let response: RealPriceResponse = decode(body)?;

    let mut months = Vec::new();
    for month in response.real_price_on_month_list {
        let (Some(year), Some(mon)) = (
            month.trade_base_year.as_i64(),
            month.trade_base_month.as_i64(),
        ) else {
            debug!("Skipping month with unreadable header");
            continue;
        };
        let prices = month
            .real_price_list
            .into_iter()
            .filter_map(|row| to_price(row, year, mon, trade_type))
            .collect();
        months.push(PriceMonth {
            year: year as i32,
            month: mon as u32,
            prices,
        });
    }

    Ok(RealPricePage {
        months,
        added_row_count: flex_or_zero(response.added_row_count.as_ref()),
        total_row_count: flex_or_zero(response.total_row_count.as_ref()),
    })
}

fn to_price(row: RealPriceItem, base_year: i64, base_month: i64, trade_type: TradeType) -> Option<Price> {
    let amount: u64 = flex_or_zero(match trade_type {
        TradeType::Deal => row.deal_price.as_ref(),
        TradeType::Lease => row.lease_price.as_ref(),
    });
    if amount == 0 {
        return None;
    }
    let year = row.trade_year.and_then(|v| v.as_i64()).unwrap_or(base_year);
    let month = row.trade_month.and_then(|v| v.as_i64()).unwrap_or(base_month);
    let day = row.trade_date.and_then(|v| v.as_i64())?;
    let trade_date = NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32)?;

    Some(Price {
        trade_date,
        low_trade_price: amount,
        high_trade_price: amount,
        floor: row.floor.and_then(|f| f.as_i64()).map(|f| f as i32),
    })
}

/// Appends a page of months to `acc`. A month split across a page boundary is
/// merged, and the result stays ordered newest month first.
pub fn merge_months(acc: &mut Vec<PriceMonth>, page: Vec<PriceMonth>) {
    for month in page {
        match acc
            .iter_mut()
            .find(|m| m.year == month.year && m.month == month.month)
        {
            Some(existing) => existing.prices.extend(month.prices),
            None => acc.push(month),
        }
    }
    acc.sort_by(|a, b| (b.year, b.month).cmp(&(a.year, a.month)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_region_list() {
        let body = r#"{"regionList":[
            {"cortarNo":"1100000000","centerLat":37.56,"centerLon":126.97,"cortarName":"서울시","cortarType":"city"},
            {"cortarNo":"4100000000","cortarName":"경기도","cortarType":"city"}
        ]}"#;
        let regions = parse_regions(body).unwrap();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].region_no, "1100000000");
        assert_eq!(regions[1].region_name, "경기도");
    }

    #[test]
    fn complex_numbers_accept_strings_and_numbers() {
        let body = r#"{"complexList":[{"complexNo":"8928"},{"complexNo":104512}]}"#;
        assert_eq!(parse_complex_nos(body).unwrap(), vec!["8928", "104512"]);
    }

    #[test]
    fn parses_complex_detail_with_pyeongs() {
        let body = r#"{
            "complexDetail": {
                "complexNo": "8928",
                "complexName": "래미안블레스티지",
                "totalHouseholdCount": 1957,
                "useApproveYmd": "20190228",
                "address": "서울시 강남구 개포동",
                "detailAddress": "12"
            },
            "complexPyeongDetailList": [
                {"pyeongNo": "1", "pyeongName": "84A", "supplyArea": "112.4", "exclusiveArea": "84.96"},
                {"pyeongNo": 2, "pyeongName": "59B", "supplyArea": 79.3, "exclusiveArea": 59.9}
            ]
        }"#;
        let complex = parse_complex_detail(body).unwrap();
        assert_eq!(complex.complex_name, "래미안블레스티지");
        assert_eq!(complex.total_household_count, 1957);
        assert_eq!(complex.approval_year, Some(2019));
        assert_eq!(complex.address, "서울시 강남구 개포동 12");
        assert_eq!(complex.pyeongs.len(), 2);
        assert_eq!(complex.pyeongs[1].pyeong_no, "2");
        assert_eq!(complex.pyeongs[0].supply_area, 112.4);
    }

    #[test]
    fn missing_detail_is_a_decode_error() {
        assert!(matches!(
            parse_complex_detail(r#"{"complexPyeongDetailList":[]}"#),
            Err(ProviderError::Decode(_))
        ));
    }

    #[test]
    fn real_price_page_keeps_rows_for_requested_trade_type() {
        let body = r#"{
            "addedRowCount": 3, "totalRowCount": 5,
            "realPriceOnMonthList": [{
                "tradeBaseYear": "2024", "tradeBaseMonth": "3",
                "realPriceList": [
                    {"tradeType":"A1","tradeYear":"2024","tradeMonth":3,"tradeDate":"12","dealPrice":245000,"floor":11},
                    {"tradeType":"B1","tradeYear":"2024","tradeMonth":3,"tradeDate":"15","leasePrice":120000,"floor":"4"},
                    {"tradeType":"A1","tradeYear":"2024","tradeMonth":3,"tradeDate":"2","dealPrice":238000}
                ]
            }]
        }"#;
        let page = parse_real_price_page(body, TradeType::Deal).unwrap();
        assert_eq!(page.added_row_count, 3);
        assert_eq!(page.total_row_count, 5);
        let prices = &page.months[0].prices;
        assert_eq!(prices.len(), 2);
        assert_eq!(prices[0].trade_date, NaiveDate::from_ymd_opt(2024, 3, 12).unwrap());
        assert_eq!(prices[0].floor, Some(11));

        let lease = parse_real_price_page(body, TradeType::Lease).unwrap();
        assert_eq!(lease.months[0].prices[0].low_trade_price, 120000);
        assert_eq!(lease.months[0].prices[0].floor, Some(4));
    }

    #[test]
    fn quoted_amounts_and_row_counts_are_read() {
        let body = r#"{
            "addedRowCount": "3", "totalRowCount": "10",
            "realPriceOnMonthList": [{
                "tradeBaseYear": 2024, "tradeBaseMonth": 6,
                "realPriceList": [
                    {"tradeDate":"7","dealPrice":"245000","leasePrice":""},
                    {"tradeDate":"9","dealPrice":null},
                    {"tradeDate":"11","dealPrice":"-5"}
                ]
            }]
        }"#;
        let page = parse_real_price_page(body, TradeType::Deal).unwrap();
        assert_eq!(page.added_row_count, 3);
        assert_eq!(page.total_row_count, 10);
        let prices = &page.months[0].prices;
        assert_eq!(prices.len(), 1);
        assert_eq!(prices[0].low_trade_price, 245000);
        assert_eq!(prices[0].trade_date, NaiveDate::from_ymd_opt(2024, 6, 7).unwrap());

        let lease = parse_real_price_page(body, TradeType::Lease).unwrap();
        assert!(lease.months[0].prices.is_empty());
    }

    #[test]
    fn merge_joins_split_month_and_orders_newest_first() {
        let month = |year, month, n: usize| PriceMonth {
            year,
            month,
            prices: vec![crate::model::fixtures::price("2024-01-01", 1); n],
        };
        let mut acc = vec![month(2024, 3, 2), month(2024, 2, 1)];
        merge_months(&mut acc, vec![month(2024, 2, 2), month(2023, 12, 1)]);

        assert_eq!(acc.len(), 3);
        assert_eq!((acc[0].year, acc[0].month), (2024, 3));
        assert_eq!(acc[1].prices.len(), 3);
        assert_eq!((acc[2].year, acc[2].month), (2023, 12));
    }
}
