// ============================================================================
// Structures : PriceBar et PriceSeries
// ============================================================================
// Une journée de cotation (Open, High, Low, Close) et la série annuelle
// d'un ticker
//
// CONCEPTS RUST :
// 1. NaiveDateTime : date/heure locale sans fuseau (heure "murale")
// 2. f64 : prix en flottant, NaN pour une valeur absente de l'API
// 3. Option<u64> : volume pas toujours fourni
// ============================================================================

use chrono::{Local, NaiveDateTime, TimeZone};

use crate::error::FetchError;

/// Intervalle demandé à l'API : une barre par jour
pub const DAILY_INTERVAL: &str = "1d";

/// Période demandée à l'API : un an glissant
pub const ONE_YEAR_RANGE: &str = "1y";

/// Convertit un timestamp Unix (secondes, éventuellement fractionnaires)
/// en date/heure locale
///
/// CONCEPT : Fuseau local
/// - Local.timestamp_opt() interprète le timestamp dans le fuseau du système
/// - .single() échoue si l'instant est ambigu ou inexistant
/// - naive_local() garde l'heure murale (comme un datetime "naïf")
///
/// La partie fractionnaire devient des nanosecondes (arrondi vers le bas,
/// comme pour un instant négatif)
pub fn local_datetime_from_timestamp(timestamp: f64) -> Result<NaiveDateTime, FetchError> {
    let invalid = || FetchError::Format(format!("invalid timestamp: {}", timestamp));

    if !timestamp.is_finite() || timestamp.abs() >= i64::MAX as f64 {
        return Err(invalid());
    }

    let secs = timestamp.floor();
    let nanos = (((timestamp - secs) * 1e9).round() as u32).min(999_999_999);

    Local
        .timestamp_opt(secs as i64, nanos)
        .single()
        .map(|dt| dt.naive_local())
        .ok_or_else(invalid)
}

/// Une barre de prix journalière
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    /// Date de la séance (heure locale)
    pub date: NaiveDateTime,

    /// Prix d'ouverture (Open)
    pub open: f64,

    /// Prix le plus haut (High)
    pub high: f64,

    /// Prix le plus bas (Low)
    pub low: f64,

    /// Prix de clôture (Close)
    pub close: f64,

    /// Volume échangé, si l'API le fournit
    pub volume: Option<u64>,
}

impl PriceBar {
    /// Constructeur : crée une nouvelle barre sans volume
    pub fn new(date: NaiveDateTime, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume: None,
        }
    }

    /// Ajoute le volume (builder)
    pub fn with_volume(mut self, volume: Option<u64>) -> Self {
        self.volume = volume;
        self
    }

    /// Vrai si les quatre prix sont des nombres (pas de NaN)
    ///
    /// Une barre incomplète reste dans la série mais n'est pas dessinée
    pub fn is_complete(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .all(|p| p.is_finite())
    }

    /// Vérifie si la barre est haussière (close >= open)
    pub fn is_bullish(&self) -> bool {
        self.close >= self.open
    }

    /// Variation en pourcentage depuis l'ouverture
    pub fn change_percent(&self) -> f64 {
        if self.open == 0.0 {
            0.0
        } else {
            ((self.close - self.open) / self.open) * 100.0
        }
    }
}

/// Série de barres journalières d'un ticker
///
/// L'ordre est celui de l'API (supposé chronologique, jamais re-trié)
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    /// Symbole du ticker (ex: "PETR4")
    pub symbol: String,

    /// Barres dans l'ordre reçu
    pub bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Crée une série vide
    pub fn new(symbol: String) -> Self {
        Self {
            symbol,
            bars: Vec::new(),
        }
    }

    /// Crée une série à partir de barres déjà construites
    pub fn with_bars(symbol: String, bars: Vec<PriceBar>) -> Self {
        Self { symbol, bars }
    }

    /// Ajoute une barre en fin de série
    pub fn push(&mut self, bar: PriceBar) {
        self.bars.push(bar);
    }

    /// Nombre de barres
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Vérifie si la série est vide
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Première barre
    pub fn first(&self) -> Option<&PriceBar> {
        self.bars.first()
    }

    /// Barre la plus récente
    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    /// Prix le plus bas sur la période (NaN ignorés)
    pub fn min_price(&self) -> Option<f64> {
        self.bars
            .iter()
            .map(|b| b.low)
            .filter(|p| p.is_finite())
            .reduce(f64::min)
    }

    /// Prix le plus haut sur la période (NaN ignorés)
    pub fn max_price(&self) -> Option<f64> {
        self.bars
            .iter()
            .map(|b| b.high)
            .filter(|p| p.is_finite())
            .reduce(f64::max)
    }

    /// Variation totale en pourcentage (open de la première, close de la dernière)
    pub fn total_change_percent(&self) -> Option<f64> {
        let (first, last) = (self.first()?, self.last()?);
        if first.open == 0.0 || !first.open.is_finite() || !last.close.is_finite() {
            return None;
        }
        Some(((last.close - first.open) / first.open) * 100.0)
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
