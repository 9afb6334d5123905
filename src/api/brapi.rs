// ============================================================================
// API Client : brapi
// ============================================================================
// Récupère la liste des actions et l'historique d'un ticker depuis brapi
//
// Endpoints :
// - GET {base}/api/quote/list                         -> { "stocks": [...] }
// - GET {base}/api/quote/{ticker}?interval=1d&range=1y -> { "results": [...] }
//
// Pas de cache ici : voir api::fetcher pour la mémoïsation
// ============================================================================

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::api::transport::Transport;
use crate::config::ApiConfig;
use crate::error::FetchError;
use crate::models::price::{local_datetime_from_timestamp, DAILY_INTERVAL, ONE_YEAR_RANGE};
use crate::models::{PriceBar, PriceSeries};

// ============================================================================
// Structures pour parser les réponses JSON de brapi
// ============================================================================
// On ne déclare que les champs utilisés, serde ignore le reste
//
// CONCEPT RUST : #[serde(rename = "...")]
// - "historicalDataPrice" (JSON) -> historical_data_price (Rust)
// ============================================================================

/// Réponse de l'endpoint liste
#[derive(Debug, Deserialize)]
struct ListResponse {
    stocks: Vec<StockEntry>,
}

#[derive(Debug, Deserialize)]
struct StockEntry {
    stock: String,
}

/// Réponse de l'endpoint détail
#[derive(Debug, Deserialize)]
struct QuoteResponse {
    results: Vec<QuoteResult>,
}

#[derive(Debug, Deserialize)]
struct QuoteResult {
    #[serde(rename = "historicalDataPrice")]
    historical_data_price: Vec<HistoricalBar>,
}

/// Une barre telle que brapi l'envoie
///
/// - date : nombre JSON quelconque (entier ou flottant)
/// - prix null : NaN
/// - volume : lu tel quel, interprété par volume_from_json
#[derive(Debug, Deserialize)]
struct HistoricalBar {
    date: f64,
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: Option<f64>,
    #[serde(default)]
    volume: Option<serde_json::Value>,
}

/// Volume entier positif, None pour tout le reste (null, texte, 12.5, -3)
fn volume_from_json(value: &serde_json::Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|v| v.fract() == 0.0 && *v >= 0.0 && *v < u64::MAX as f64)
            .map(|v| v as u64)
    })
}

// ============================================================================
// Parsing
// ============================================================================

/// Parse le corps de l'endpoint liste, ordre de l'API conservé
pub fn parse_stock_list(body: &str) -> Result<Vec<String>, FetchError> {
    let response: ListResponse = serde_json::from_str(body)?;
    Ok(response.stocks.into_iter().map(|s| s.stock).collect())
}

/// Parse le corps de l'endpoint détail en PriceSeries
///
/// CONCEPT RUST : Ownership
/// - into_iter() consomme le Vec : pas de copie des barres
pub fn parse_price_history(symbol: &str, body: &str) -> Result<PriceSeries, FetchError> {
    let response: QuoteResponse = serde_json::from_str(body)?;

    let result = response
        .results
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::Format(format!("no results returned for {}", symbol)))?;

    let mut series = PriceSeries::new(symbol.to_string());
    for bar in result.historical_data_price {
        let date = local_datetime_from_timestamp(bar.date)?;
        series.push(
            PriceBar::new(
                date,
                bar.open.unwrap_or(f64::NAN),
                bar.high.unwrap_or(f64::NAN),
                bar.low.unwrap_or(f64::NAN),
                bar.close.unwrap_or(f64::NAN),
            )
            .with_volume(bar.volume.as_ref().and_then(volume_from_json)),
        );
    }

    let incomplete = series.bars.iter().filter(|b| !b.is_complete()).count();
    if incomplete > 0 {
        warn!(ticker = %symbol, incomplete, total = series.len(), "Bars with missing prices");
    }

    Ok(series)
}

// ============================================================================
// Client
// ============================================================================

/// Client brapi sans cache
#[derive(Clone)]
pub struct BrapiClient {
    transport: Arc<dyn Transport>,
    config: ApiConfig,
}

impl BrapiClient {
    pub fn new(transport: Arc<dyn Transport>, config: ApiConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// GET avec la politique de retry de la configuration
    ///
    /// Seules les erreurs réseau sont rejouées
    async fn get_with_retry(&self, url: &str, query: &[(&str, &str)]) -> Result<String, FetchError> {
        let mut attempt = 0;
        loop {
            match self.transport.get(url, query).await {
                Err(e) if e.is_network() && attempt < self.config.max_retries => {
                    attempt += 1;
                    warn!(url = %url, attempt, max = self.config.max_retries, error = %e, "Retrying request");
                    tokio::time::sleep(self.config.retry_backoff).await;
                }
                other => return other,
            }
        }
    }

    /// Liste de tous les tickers disponibles
    #[instrument(skip(self))]
    pub async fn fetch_stock_list(&self) -> Result<Vec<String>, FetchError> {
        let url = self.config.list_url();
        let body = self.get_with_retry(&url, &[]).await?;

        let stocks = parse_stock_list(&body)?;
        info!(count = stocks.len(), "Fetched stock directory");
        Ok(stocks)
    }

    /// Historique journalier sur un an d'un ticker
    ///
    /// Le ticker n'est pas validé : il est transmis tel quel à l'API
    #[instrument(skip(self))]
    pub async fn fetch_price_history(&self, name: &str) -> Result<PriceSeries, FetchError> {
        let url = self.config.quote_url(name);
        let query = [("interval", DAILY_INTERVAL), ("range", ONE_YEAR_RANGE)];

        debug!(url = %url, "Fetching price history");
        let body = self.get_with_retry(&url, &query).await?;

        let series = parse_price_history(name, &body)?;
        info!(bars = series.len(), "Fetched price history");
        Ok(series)
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
