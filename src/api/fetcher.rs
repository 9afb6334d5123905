// ============================================================================
// Fetchers mémoïsés
// ============================================================================
// get_all_stocks()            : liste des tickers, un seul slot de cache
// get_stock_time_history(name): historique, un slot par ticker (non borné)
//
// Les deux caches partagent la même TTL (Config::cache_ttl)
// Un même appel dans la durée de vie du cache retourne le même Arc
// ============================================================================

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::api::brapi::BrapiClient;
use crate::api::transport::{HttpTransport, Transport};
use crate::cache::TtlCache;
use crate::config::Config;
use crate::error::FetchError;
use crate::models::PriceSeries;

/// Point d'entrée des données : client brapi + caches
pub struct StockFetcher {
    client: BrapiClient,
    directory: TtlCache<(), Vec<String>>,
    history: TtlCache<String, PriceSeries>,
}

impl StockFetcher {
    /// Crée un fetcher à partir d'un transport quelconque
    pub fn new(transport: Arc<dyn Transport>, config: &Config) -> Self {
        Self {
            client: BrapiClient::new(transport, config.api.clone()),
            directory: TtlCache::new(config.cache_ttl),
            history: TtlCache::new(config.cache_ttl),
        }
    }

    /// Crée un fetcher avec le transport HTTP réel
    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        let transport = HttpTransport::new(&config.api)?;
        Ok(Self::new(Arc::new(transport), config))
    }

    /// Liste de tous les tickers, dans l'ordre de l'API
    #[instrument(skip(self))]
    pub async fn get_all_stocks(&self) -> Result<Arc<Vec<String>>, FetchError> {
        self.directory
            .get_or_try_insert_with((), || async {
                debug!("Directory cache miss");
                self.client.fetch_stock_list().await
            })
            .await
    }

    /// Historique journalier sur un an d'un ticker
    #[instrument(skip(self))]
    pub async fn get_stock_time_history(&self, name: &str) -> Result<Arc<PriceSeries>, FetchError> {
        self.history
            .get_or_try_insert_with(name.to_string(), || async {
                debug!(ticker = %name, "History cache miss");
                self.client.fetch_price_history(name).await
            })
            .await
    }

    /// Oublie l'historique d'un ticker (rechargement forcé)
    pub async fn invalidate_history(&self, name: &str) {
        self.history.invalidate(&name.to_string()).await;
    }

    /// Oublie la liste des tickers
    pub async fn invalidate_directory(&self) {
        self.directory.invalidate(&()).await;
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::brapi::tests::StubTransport;
    use std::time::Duration;

    const LIST: &str = r#"{"stocks":[{"stock":"PETR4"},{"stock":"VALE3"}]}"#;
    const HISTORY: &str = r#"{"results":[{"historicalDataPrice":[
        {"date":1609459200,"open":10,"high":12,"low":9,"close":11},
        {"date":1609718400,"open":11,"high":13,"low":10,"close":12}
    ]}]}"#;

    fn fetcher(responses: Vec<Result<String, FetchError>>, ttl: Option<Duration>) -> (StockFetcher, Arc<StubTransport>) {
        let stub = Arc::new(StubTransport::with_responses(responses));
        let config = Config {
            cache_ttl: ttl,
            ..Config::default()
        };
        (StockFetcher::new(stub.clone(), &config), stub)
    }

    #[tokio::test]
    async fn test_get_all_stocks_example() {
        let (fetcher, _) = fetcher(vec![Ok(LIST.to_string())], None);
        let stocks = fetcher.get_all_stocks().await.unwrap();
        assert_eq!(*stocks, vec!["PETR4".to_string(), "VALE3".to_string()]);
    }

    #[tokio::test]
    async fn test_directory_is_fetched_once() {
        let (fetcher, stub) = fetcher(vec![Ok(LIST.to_string()), Ok(LIST.to_string())], None);

        let first = fetcher.get_all_stocks().await.unwrap();
        let second = fetcher.get_all_stocks().await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(stub.calls(), 1);
    }

    #[tokio::test]
    async fn test_history_is_cached_per_ticker() {
        let (fetcher, stub) = fetcher(
            vec![Ok(HISTORY.to_string()), Ok(HISTORY.to_string()), Ok(HISTORY.to_string())],
            None,
        );

        let a1 = fetcher.get_stock_time_history("PETR4").await.unwrap();
        let a2 = fetcher.get_stock_time_history("PETR4").await.unwrap();
        let b = fetcher.get_stock_time_history("VALE3").await.unwrap();

        assert!(Arc::ptr_eq(&a1, &a2));
        assert_eq!(a1.len(), 2);
        assert_eq!(b.symbol, "VALE3");
        assert_eq!(stub.calls(), 2);
    }

    #[tokio::test]
    async fn test_empty_results_is_format_error_and_not_cached() {
        let (fetcher, stub) = fetcher(
            vec![Ok(r#"{"results":[]}"#.to_string()), Ok(HISTORY.to_string())],
            None,
        );

        let err = fetcher.get_stock_time_history("XXXX3").await.unwrap_err();
        assert!(matches!(err, FetchError::Format(_)));

        // L'échec n'est pas mémorisé : le second appel refait la requête
        let series = fetcher.get_stock_time_history("XXXX3").await.unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(stub.calls(), 2);
    }

    #[tokio::test]
    async fn test_network_error_propagates() {
        let (fetcher, _) = fetcher(vec![Err(FetchError::Network("refused".to_string()))], None);
        let err = fetcher.get_all_stocks().await.unwrap_err();
        assert!(err.is_network());
    }

    #[tokio::test]
    async fn test_invalidate_history_refetches() {
        let (fetcher, stub) = fetcher(vec![Ok(HISTORY.to_string()), Ok(HISTORY.to_string())], None);

        fetcher.get_stock_time_history("PETR4").await.unwrap();
        fetcher.invalidate_history("PETR4").await;
        fetcher.get_stock_time_history("PETR4").await.unwrap();

        assert_eq!(stub.calls(), 2);
    }

    #[tokio::test]
    async fn test_expired_ttl_refetches() {
        let (fetcher, stub) = fetcher(vec![Ok(LIST.to_string()), Ok(LIST.to_string())], Some(Duration::ZERO));

        fetcher.get_all_stocks().await.unwrap();
        fetcher.get_all_stocks().await.unwrap();

        assert_eq!(stub.calls(), 2);
    }
}
