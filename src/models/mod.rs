// ============================================================================
// Module : models
// ============================================================================
// Structures de données de l'application : séries de prix et graphique
// ============================================================================

pub mod chart; // Graphique en chandeliers (trace + layout)
pub mod price; // PriceBar / PriceSeries

// Re-export des structures principales
// Au lieu de : use stockviz::models::price::PriceSeries;
// On peut faire : use stockviz::models::PriceSeries;
pub use chart::{plot_candlesticks, CandlestickChart, CandlestickTrace, ChartLayout, Rgba, Theme};
pub use price::{PriceBar, PriceSeries};
