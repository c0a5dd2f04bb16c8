// Orchestration over a LandProvider: region walk, complex discovery, pricing
use crate::analyzer::representative_order;
use crate::model::{
    CollectError, Complex, PriceMonth, ProviderError, Region, TownComplexes, TradeType,
};
use crate::scraper::LandProvider;
use rand::Rng;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::time::{sleep, Duration};
use tracing::{info, warn};

pub const ROOT_REGION_NO: &str = "0000000000";

pub async fn get_main_cities(provider: &dyn LandProvider) -> Result<Vec<Region>, ProviderError> {
    provider.list_regions(ROOT_REGION_NO).await
}

pub async fn get_regions(
    provider: &dyn LandProvider,
    region_no: &str,
) -> Result<Vec<Region>, ProviderError> {
    provider.list_regions(region_no).await
}

/// Lists the complexes of a town and fetches the detail of each one.
pub async fn get_complexes(
    provider: &dyn LandProvider,
    region_no: &str,
) -> Result<Vec<Complex>, ProviderError> {
    let complex_nos = provider.list_complexes(region_no).await?;
    let mut complexes = Vec::with_capacity(complex_nos.len());
    for no in &complex_nos {
        complexes.push(provider.get_complex_detail(no).await?);
    }
    Ok(complexes)
}

pub async fn get_prices(
    provider: &dyn LandProvider,
    complex_no: &str,
    pyeong_no: &str,
    trade_type: TradeType,
) -> Result<Vec<PriceMonth>, ProviderError> {
    provider
        .list_real_prices(complex_no, pyeong_no, trade_type)
        .await
}

/// Selects DEAL and LEASE representative prices for every pyeong of `complex`
/// from the newest month that has any, then picks representative pyeongs.
pub async fn apply_price(
    provider: &dyn LandProvider,
    complex: &mut Complex,
) -> Result<(), ProviderError> {
    let pyeong_nos: Vec<String> = complex.pyeongs.iter().map(|p| p.pyeong_no.clone()).collect();

    for pyeong_no in &pyeong_nos {
        let deals = get_prices(provider, &complex.complex_no, pyeong_no, TradeType::Deal).await?;
        if let Some(month) = newest_with_prices(&deals) {
            complex.select_trade_price(pyeong_no, &month.prices);
        }

        let leases = get_prices(provider, &complex.complex_no, pyeong_no, TradeType::Lease).await?;
        if let Some(month) = newest_with_prices(&leases) {
            complex.select_lease_price(pyeong_no, &month.prices);
        }
    }

    complex.set_representative_pyeongs(representative_order);
    Ok(())
}

fn newest_with_prices(months: &[PriceMonth]) -> Option<&PriceMonth> {
    months.iter().find(|m| !m.prices.is_empty())
}

/// Drives an import over several towns with request pacing and cancellation.
pub struct Collector<'a> {
    provider: &'a dyn LandProvider,
    request_delay: Duration,
    town_delay: Duration,
    cancel: Arc<AtomicBool>,
}

impl<'a> Collector<'a> {
    pub fn new(
        provider: &'a dyn LandProvider,
        request_delay: Duration,
        town_delay: Duration,
        cancel: Arc<AtomicBool>,
    ) -> Self {
        Self {
            provider,
            request_delay,
            town_delay,
            cancel,
        }
    }

    fn check_cancel(&self) -> Result<(), CollectError> {
        if self.cancel.load(Ordering::SeqCst) {
            warn!("Import cancelled, discarding collected data");
            return Err(CollectError::Cancelled);
        }
        Ok(())
    }

    async fn pace(&self, base: Duration) {
        if base.is_zero() {
            return;
        }
        let jitter_ms = rand::rng().random_range(0..=base.as_millis() as u64 / 5);
        sleep(base + Duration::from_millis(jitter_ms)).await;
    }

    /// Collects priced complexes for `towns`. Towns without complexes, or whose
    /// complex list could not be fetched, are left out.
    pub async fn collect(&self, towns: &[Region]) -> Result<Vec<TownComplexes>, CollectError> {
        let mut town_complexes = Vec::new();
        let mut complex_count = 0usize;

        for (i, town) in towns.iter().enumerate() {
            self.check_cancel()?;
            info!("[{}/{}] Listing complexes in {}", i + 1, towns.len(), town.region_name);
            match get_complexes(self.provider, &town.region_no).await {
                Ok(complexes) if complexes.is_empty() => {
                    info!("No complexes in {}", town.region_name);
                }
                Ok(complexes) => {
                    complex_count += complexes.len();
                    town_complexes.push(TownComplexes {
                        town: town.clone(),
                        complexes,
                    });
                }
                Err(e) => warn!("Failed to list complexes in {}: {}", town.region_name, e),
            }
        }
        self.pace(self.town_delay).await;

        let selected: Vec<&str> = town_complexes.iter().map(|t| t.town.region_name.as_str()).collect();
        info!("Collecting prices for {} complexes in {:?}", complex_count, selected);

        let mut progress = 0usize;
        for entry in town_complexes.iter_mut() {
            for complex in entry.complexes.iter_mut() {
                self.check_cancel()?;
                self.pace(self.request_delay).await;
                progress += 1;
                info!(
                    "[{}/{}] {} - {}",
                    progress, complex_count, entry.town.region_name, complex.complex_name
                );
                if let Err(e) = apply_price(self.provider, complex).await {
                    warn!("Pricing failed for {}: {}", complex.complex_name, e);
                }
            }
        }

        Ok(town_complexes)
    }
}


#[cfg(test)]
mod tests {
    use super::fake::*;
    use super::*;
    use crate::model::fixtures::complex;

    fn collector(provider: &dyn LandProvider, cancel: Arc<AtomicBool>) -> Collector<'_> {
        Collector::new(provider, Duration::ZERO, Duration::ZERO, cancel)
    }

    #[tokio::test]
    async fn main_cities_query_root_region() {
        let mut fake = FakeProvider::default();
        fake.regions
            .insert(ROOT_REGION_NO.to_string(), vec![town("1100000000", "서울시")]);
        let cities = get_main_cities(&fake).await.unwrap();
        assert_eq!(cities[0].region_no, "1100000000");
    }

    #[tokio::test]
    async fn apply_price_uses_newest_non_empty_month() {
        let mut fake = FakeProvider::with_town("t", vec![complex("100", 500, Some(2015))]);
        fake.add_prices(
            "100",
            "1",
            TradeType::Deal,
            vec![
                month(2024, 5, &[]),
                month(2024, 4, &[("2024-04-20", 61000), ("2024-04-20", 59000)]),
                month(2024, 3, &[("2024-03-01", 10000)]),
            ],
        );
        fake.add_prices("100", "1", TradeType::Lease, vec![month(2024, 5, &[("2024-05-02", 35000)])]);

        let mut c = complex("100", 500, Some(2015));
        apply_price(&fake, &mut c).await.unwrap();

        assert_eq!(c.pyeongs[0].trade_price.as_ref().unwrap().low_trade_price, 59000);
        assert_eq!(c.pyeongs[0].lease_price.as_ref().unwrap().low_trade_price, 35000);
        assert!(c.pyeongs[1].trade_price.is_none());
        assert!(c.is_representative("1"));
        // two trade types per pyeong
        assert_eq!(*fake.calls.lock().unwrap(), 6);
    }

    #[tokio::test]
    async fn collect_drops_empty_towns_and_keeps_failed_complexes() {
        let mut fake = FakeProvider::with_town(
            "t1",
            vec![complex("100", 500, None), complex("200", 80, None)],
        );
        fake.complexes.insert("t2".into(), Vec::new());
        fake.add_prices("100", "2", TradeType::Deal, vec![month(2024, 1, &[("2024-01-03", 70000)])]);
        fake.failing_prices.push("200".into());

        let towns = vec![town("t1", "개포동"), town("t2", "일원동")];
        let result = collector(&fake, Arc::new(AtomicBool::new(false)))
            .collect(&towns)
            .await
            .unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].town.region_name, "개포동");
        assert_eq!(result[0].complexes.len(), 2);
        assert!(result[0].complexes[0].pyeongs[1].trade_price.is_some());
        assert!(result[0].complexes[1].representatives.is_empty());
    }

    #[tokio::test]
    async fn cancelled_collect_returns_nothing() {
        let fake = FakeProvider::with_town("t1", vec![complex("100", 500, None)]);
        let cancel = Arc::new(AtomicBool::new(true));
        let result = collector(&fake, cancel).collect(&[town("t1", "개포동")]).await;
        assert!(matches!(result, Err(CollectError::Cancelled)));
        assert_eq!(*fake.calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn cancel_during_pricing_stops_before_next_complex() {
        let cancel = Arc::new(AtomicBool::new(false));
        let mut fake = FakeProvider::with_town(
            "t1",
            vec![complex("100", 500, None), complex("200", 300, None)],
        );
        fake.cancel_on_prices = Some(cancel.clone());

        let result = collector(&fake, cancel).collect(&[town("t1", "개포동")]).await;

        assert!(matches!(result, Err(CollectError::Cancelled)));
        let priced = fake.priced_complexes.lock().unwrap();
        assert!(!priced.is_empty());
        assert!(priced.iter().all(|c| c == "100"));
    }

    #[tokio::test]
    async fn town_with_failing_complex_list_is_skipped() {
        let mut fake = FakeProvider::with_town("t2", vec![complex("300", 800, None)]);
        fake.failing_towns.push("t1".into());

        let towns = vec![town("t1", "개포동"), town("t2", "일원동")];
        let result = collector(&fake, Arc::new(AtomicBool::new(false)))
            .collect(&towns)
            .await
            .unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].town.region_no, "t2");
        assert_eq!(result[0].complexes[0].complex_no, "300");
    }
}
