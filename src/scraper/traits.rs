use crate::model::{Complex, PriceMonth, ProviderError, Region, TradeType};

/// Source of region, complex and transaction data.
#[async_trait::async_trait]
pub trait LandProvider: Send + Sync {
    async fn list_regions(&self, region_no: &str) -> Result<Vec<Region>, ProviderError>;

    async fn list_complexes(&self, region_no: &str) -> Result<Vec<String>, ProviderError>;

    async fn get_complex_detail(&self, complex_no: &str) -> Result<Complex, ProviderError>;

    /// Transaction series for one pyeong, newest month first.
    async fn list_real_prices(
        &self,
        complex_no: &str,
        pyeong_no: &str,
        trade_type: TradeType,
    ) -> Result<Vec<PriceMonth>, ProviderError>;
}
