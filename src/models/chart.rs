// ============================================================================
// Structure : CandlestickChart
// ============================================================================
// Le graphique en chandeliers sous forme de valeur : une trace + un layout
// Le module ui::candlestick_text se charge ensuite de le dessiner
//
// Une série vide donne un graphique valide (titre + axes) sans chandelier
// ============================================================================

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::models::PriceSeries;

/// Thème visuel du graphique
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Theme {
    /// Fond neutre, axes gris, peu d'ornements
    SimpleWhite,
}

/// Couleur RGBA (a = 0.0 : transparent)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    /// Couleur entièrement transparente
    pub const TRANSPARENT: Rgba = Rgba {
        r: 0,
        g: 0,
        b: 0,
        a: 0.0,
    };

    pub fn is_transparent(&self) -> bool {
        self.a == 0.0
    }
}

/// Trace chandeliers : une colonne par canal OHLC, alignées sur `x`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandlestickTrace {
    pub x: Vec<NaiveDateTime>,
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
}

impl CandlestickTrace {
    /// Nombre de chandeliers
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Chandelier i sous forme (date, open, high, low, close)
    pub fn point(&self, i: usize) -> Option<(NaiveDateTime, f64, f64, f64, f64)> {
        Some((
            *self.x.get(i)?,
            *self.open.get(i)?,
            *self.high.get(i)?,
            *self.low.get(i)?,
            *self.close.get(i)?,
        ))
    }
}

/// Réglages de présentation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartLayout {
    pub title: String,
    pub xaxis_rangeslider_visible: bool,
    pub template: Theme,
    pub plot_bgcolor: Rgba,
}

/// Graphique complet : trace + layout
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandlestickChart {
    pub trace: CandlestickTrace,
    pub layout: ChartLayout,
}

impl CandlestickChart {
    /// Titre affiché
    pub fn title(&self) -> &str {
        &self.layout.title
    }

    /// Nombre de chandeliers
    pub fn len(&self) -> usize {
        self.trace.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trace.is_empty()
    }
}

/// Construit le graphique en chandeliers d'une série
///
/// CONCEPT RUST : Iterators et unzip-like
/// - Une passe par canal : simple et l'ordre d'entrée est conservé
/// - Les NaN sont recopiés tels quels (le rendu les ignore)
pub fn plot_candlesticks(series: &PriceSeries, title: &str) -> CandlestickChart {
    let bars = &series.bars;

    let trace = CandlestickTrace {
        x: bars.iter().map(|b| b.date).collect(),
        open: bars.iter().map(|b| b.open).collect(),
        high: bars.iter().map(|b| b.high).collect(),
        low: bars.iter().map(|b| b.low).collect(),
        close: bars.iter().map(|b| b.close).collect(),
    };

    CandlestickChart {
        trace,
        layout: ChartLayout {
            title: title.to_string(),
            xaxis_rangeslider_visible: false,
            template: Theme::SimpleWhite,
            plot_bgcolor: Rgba::TRANSPARENT,
        },
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PriceBar;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 3, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_empty_series_gives_empty_chart() {
        let chart = plot_candlesticks(&PriceSeries::new("PETR4".to_string()), "PETR4");

        assert!(chart.is_empty());
        assert_eq!(chart.len(), 0);
        assert_eq!(chart.title(), "PETR4");
        assert!(!chart.layout.xaxis_rangeslider_visible);
        assert_eq!(chart.layout.template, Theme::SimpleWhite);
        assert!(chart.layout.plot_bgcolor.is_transparent());
    }

    #[test]
    fn test_points_follow_input_order() {
        let series = PriceSeries::with_bars(
            "VALE3".to_string(),
            vec![
                PriceBar::new(day(2), 10.0, 12.0, 9.0, 11.0),
                PriceBar::new(day(1), 11.0, 13.0, 10.0, 10.5),
                PriceBar::new(day(3), 10.5, 10.8, 8.0, 9.0),
            ],
        );

        let chart = plot_candlesticks(&series, "Vale");

        assert_eq!(chart.len(), 3);
        assert_eq!(chart.title(), "Vale");
        assert_eq!(chart.trace.point(0), Some((day(2), 10.0, 12.0, 9.0, 11.0)));
        assert_eq!(chart.trace.point(1), Some((day(1), 11.0, 13.0, 10.0, 10.5)));
        assert_eq!(chart.trace.point(2), Some((day(3), 10.5, 10.8, 8.0, 9.0)));
        assert_eq!(chart.trace.point(3), None);
    }

    #[test]
    fn test_layout_serializes_like_a_figure_layout() {
        let chart = plot_candlesticks(&PriceSeries::new("PETR4".to_string()), "PETR4");
        let json = serde_json::to_value(&chart).unwrap();

        assert_eq!(json["layout"]["title"], "PETR4");
        assert_eq!(json["layout"]["xaxis_rangeslider_visible"], false);
        assert_eq!(json["layout"]["template"], "SimpleWhite");
        assert_eq!(json["layout"]["plot_bgcolor"]["a"], 0.0);
        assert_eq!(json["trace"]["x"], serde_json::json!([]));
    }
}
