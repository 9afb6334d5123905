// ============================================================================
// Module : api
// ============================================================================
// Récupération des données depuis l'API brapi
// - transport : GET HTTP (substituable)
// - brapi     : endpoints + parsing JSON
// - fetcher   : fetchers mémoïsés utilisés par l'application
// ============================================================================

pub mod brapi;
pub mod fetcher;
pub mod transport;

// Re-export des types principaux
pub use brapi::BrapiClient;
pub use fetcher::StockFetcher;
pub use transport::{HttpTransport, Transport};
