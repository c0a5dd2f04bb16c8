use crate::config::AppConfig;
use crate::model::{Complex, PriceMonth, ProviderError, Region, TradeType};
use crate::parser::{
    merge_months, parse_complex_detail, parse_complex_nos, parse_real_price_page, parse_regions,
};
use crate::scraper::traits::LandProvider;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, REFERER};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

pub struct NaverLandProvider {
    client: Client,
    base_url: String,
    price_years: u32,
    max_price_pages: u32,
    real_estate_type: String,
}

impl NaverLandProvider {
    pub fn new(config: &AppConfig) -> Result<Self, ProviderError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();

        let mut headers = HeaderMap::new();
        let referer = HeaderValue::from_str(&base_url)
            .map_err(|e| ProviderError::Setup(format!("base_url: {}", e)))?;
        headers.insert(REFERER, referer);
        if let Some(token) = &config.bearer_token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| ProviderError::Setup(format!("bearer_token: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url,
            price_years: config.price_years,
            max_price_pages: config.max_price_pages.max(1),
            real_estate_type: config.real_estate_type.clone(),
        })
    }

    async fn get_text(&self, path: &str, query: &[(&str, String)]) -> Result<String, ProviderError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {} {:?}", url, query);

        let response = self.client.get(&url).query(query).send().await?;

        if !response.status().is_success() {
            return Err(ProviderError::Status {
                status: response.status().as_u16(),
                url,
            });
        }

        Ok(response.text().await?)
    }
}

#[async_trait::async_trait]
impl LandProvider for NaverLandProvider {
    async fn list_regions(&self, region_no: &str) -> Result<Vec<Region>, ProviderError> {
        let body = self
            .get_text("/api/regions/list", &[("cortarNo", region_no.to_string())])
            .await?;
        parse_regions(&body)
    }

    async fn list_complexes(&self, region_no: &str) -> Result<Vec<String>, ProviderError> {
        let body = self
            .get_text(
                "/api/regions/complexes",
                &[
                    ("cortarNo", region_no.to_string()),
                    ("realEstateType", self.real_estate_type.clone()),
                    ("order", String::new()),
                ],
            )
            .await?;
        parse_complex_nos(&body)
    }

    async fn get_complex_detail(&self, complex_no: &str) -> Result<Complex, ProviderError> {
        let body = self
            .get_text(
                &format!("/api/complexes/{}", complex_no),
                &[("sameAddressGroup", "false".to_string())],
            )
            .await?;
        parse_complex_detail(&body)
    }

    async fn list_real_prices(
        &self,
        complex_no: &str,
        pyeong_no: &str,
        trade_type: TradeType,
    ) -> Result<Vec<PriceMonth>, ProviderError> {
        let path = format!("/api/complexes/{}/prices/real", complex_no);
        let mut months = Vec::new();
        let mut added = 0u32;

        for page_no in 0..self.max_price_pages {
            let body = self
                .get_text(
                    &path,
                    &[
                        ("complexNo", complex_no.to_string()),
                        ("tradeType", trade_type.code().to_string()),
                        ("year", self.price_years.to_string()),
                        ("priceChartChange", "false".to_string()),
                        ("areaNo", pyeong_no.to_string()),
                        ("type", "table".to_string()),
                        ("addedRowCount", added.to_string()),
                    ],
                )
                .await?;
            let page = parse_real_price_page(&body, trade_type)?;
            merge_months(&mut months, page.months);

            if page.added_row_count <= added || page.added_row_count >= page.total_row_count {
                return Ok(months);
            }
            debug!(
                "Real prices {}/{} {}: page {} read {}/{} rows",
                complex_no, pyeong_no, trade_type, page_no, page.added_row_count, page.total_row_count
            );
            added = page.added_row_count;
        }

        warn!(
            "Real prices {}/{} {}: stopped after {} pages",
            complex_no, pyeong_no, trade_type, self.max_price_pages
        );
        Ok(months)
    }
}
