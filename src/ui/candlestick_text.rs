// ============================================================================
// Candlestick Chart - Rendu texte ligne par ligne
// ============================================================================
// Implémentation inspirée de cli-candlestick-chart mais intégrée à ratatui
// Utilise des caractères Unicode pour dessiner les chandeliers japonais
//
// ALGORITHME :
// - Rendu vertical : ligne par ligne de haut en bas
// - Pour chaque ligne, on détermine quel caractère Unicode afficher
// - Logique des 3 zones : mèche supérieure, corps, mèche inférieure
// - Seuils fractionnaires (0.25, 0.75) pour précision sub-caractère
//
// CARACTÈRES UNICODE :
// ┃ Corps plein          │ Mèche pleine
// ╻ Demi-corps (bas)     ╹ Demi-corps (haut)
// ╽ Transition top       ╿ Transition bottom
// ╷ Demi-mèche sup       ╵ Demi-mèche inf
// ============================================================================

use chrono::{Datelike, NaiveDateTime};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::models::{CandlestickChart, Theme};

// ============================================================================
// Constantes
// ============================================================================

/// Caractères Unicode pour le rendu des chandeliers
const UNICODE_VOID: char = ' ';
const UNICODE_BODY: char = '┃'; // Corps plein
const UNICODE_HALF_BODY_BOTTOM: char = '╻'; // Corps avec espace en bas
const UNICODE_HALF_BODY_TOP: char = '╹'; // Corps avec espace en haut
const UNICODE_WICK: char = '│'; // Mèche pleine
const UNICODE_TOP: char = '╽'; // Transition corps→mèche (haut)
const UNICODE_BOTTOM: char = '╿'; // Transition corps→mèche (bas)
const UNICODE_UPPER_WICK: char = '╷'; // Demi-mèche supérieure
const UNICODE_LOWER_WICK: char = '╵'; // Demi-mèche inférieure

/// Couleurs pour chandeliers haussiers et baissiers
const BULLISH_COLOR: Color = Color::Rgb(52, 208, 88); // Vert
const BEARISH_COLOR: Color = Color::Rgb(234, 74, 90); // Rouge

/// Largeur de l'axe Y (pour les prix)
const Y_AXIS_WIDTH: u16 = 12;
const NARROW_Y_AXIS_WIDTH: u16 = 8;
const ADAPTIVE_Y_AXIS_THRESHOLD: u16 = 80;

/// Lignes réservées sous les chandeliers : ticks + mois
const X_AXIS_HEIGHT: u16 = 2;

/// Couleurs dérivées du thème
#[derive(Debug, Clone, Copy)]
struct Palette {
    border: Color,
    axis: Color,
    background: Option<Color>,
}

impl Palette {
    fn for_chart(chart: &CandlestickChart) -> Self {
        let background = if chart.layout.plot_bgcolor.is_transparent() {
            None
        } else {
            let c = chart.layout.plot_bgcolor;
            Some(Color::Rgb(c.r, c.g, c.b))
        };

        match chart.layout.template {
            Theme::SimpleWhite => Palette {
                border: Color::White,
                axis: Color::Gray,
                background,
            },
        }
    }
}

// ============================================================================
// Structure principale
// ============================================================================

/// Un chandelier dessinable (les quatre prix sont des nombres)
#[derive(Debug, Clone, Copy)]
struct Candle {
    date: NaiveDateTime,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
}

impl Candle {
    fn is_bullish(&self) -> bool {
        self.close >= self.open
    }

    fn color(&self) -> Color {
        if self.is_bullish() {
            BULLISH_COLOR
        } else {
            BEARISH_COLOR
        }
    }
}

/// Renderer de chandeliers japonais en mode texte
pub struct CandlestickRenderer {
    candles: Vec<Candle>,
    min_price: f64,
    max_price: f64,
    height: u16,
    width: u16,
    y_axis_width: u16,
    palette: Palette,
}

impl CandlestickRenderer {
    /// Crée un renderer pour la zone intérieure `area` (bordures exclues)
    ///
    /// Largeur < 80 cols : axe Y réduit à 8 caractères
    pub fn new(chart: &CandlestickChart, area: Rect) -> Self {
        let candles: Vec<Candle> = (0..chart.trace.len())
            .filter_map(|i| chart.trace.point(i))
            .map(|(date, open, high, low, close)| Candle {
                date,
                open,
                high,
                low,
                close,
            })
            .filter(|c| [c.open, c.high, c.low, c.close].iter().all(|p| p.is_finite()))
            .collect();

        let (min_price, max_price) = Self::compute_price_bounds(&candles);

        let y_axis_width = if area.width < ADAPTIVE_Y_AXIS_THRESHOLD {
            NARROW_Y_AXIS_WIDTH
        } else {
            Y_AXIS_WIDTH
        };

        Self {
            candles,
            min_price,
            max_price,
            height: area.height.saturating_sub(X_AXIS_HEIGHT),
            width: area.width.saturating_sub(y_axis_width),
            y_axis_width,
            palette: Palette::for_chart(chart),
        }
    }

    /// Calcule les prix min et max avec une marge de 2%
    ///
    /// Sans chandelier : axe 0..1 pour garder des axes valides
    fn compute_price_bounds(candles: &[Candle]) -> (f64, f64) {
        if candles.is_empty() {
            return (0.0, 1.0);
        }

        let max_price = candles.iter().fold(f64::NEG_INFINITY, |max, c| max.max(c.high));
        let min_price = candles.iter().fold(f64::INFINITY, |min, c| min.min(c.low));

        let margin = (max_price - min_price) * 0.02;
        ((min_price - margin).max(0.0), max_price + margin)
    }

    /// Convertit un prix en coordonnée de hauteur
    fn price_to_height(&self, price: f64) -> f64 {
        if self.max_price == self.min_price {
            return self.height as f64 / 2.0;
        }

        (price - self.min_price) / (self.max_price - self.min_price) * self.height as f64
    }

    /// Rend un chandelier à une hauteur donnée
    ///
    /// Cœur de l'algorithme, adapté de cli-candlestick-chart
    fn render_candle(&self, candle: &Candle, y: u16) -> char {
        let height_unit = y as f64;

        let high_y = self.price_to_height(candle.high);
        let low_y = self.price_to_height(candle.low);
        let max_y = self.price_to_height(candle.open.max(candle.close));
        let min_y = self.price_to_height(candle.close.min(candle.open));

        let mut output = UNICODE_VOID;

        // ZONE 1 : Mèche supérieure (high → max)
        if high_y.ceil() >= height_unit && height_unit >= max_y.floor() {
            if max_y - height_unit > 0.75 {
                output = UNICODE_BODY;
            } else if (max_y - height_unit) > 0.25 {
                if (high_y - height_unit) > 0.75 {
                    output = UNICODE_TOP;
                } else {
                    output = UNICODE_HALF_BODY_BOTTOM;
                }
            } else if (high_y - height_unit) > 0.75 {
                output = UNICODE_WICK;
            } else if (high_y - height_unit) > 0.25 {
                output = UNICODE_UPPER_WICK;
            }
        }
        // ZONE 2 : Corps (min → max)
        else if max_y.floor() >= height_unit && height_unit >= min_y.ceil() {
            output = UNICODE_BODY;
        }
        // ZONE 3 : Mèche inférieure (min → low)
        else if min_y.ceil() >= height_unit && height_unit >= low_y.floor() {
            if (min_y - height_unit) < 0.25 {
                output = UNICODE_BODY;
            } else if (min_y - height_unit) < 0.75 {
                if (low_y - height_unit) < 0.25 {
                    output = UNICODE_BOTTOM;
                } else {
                    output = UNICODE_HALF_BODY_TOP;
                }
            } else if low_y - height_unit < 0.25 {
                output = UNICODE_WICK;
            } else if low_y - height_unit < 0.75 {
                output = UNICODE_LOWER_WICK;
            }
        }

        output
    }

    /// Rend une ligne de l'axe Y avec le prix (un label toutes les 4 lignes)
    fn render_y_axis(&self, y: u16) -> String {
        let label_width = self.y_axis_width.saturating_sub(3) as usize;
        if y % 4 == 0 {
            let price = self.min_price + (y as f64 * (self.max_price - self.min_price) / self.height as f64);
            format!("{:>width$.2} │ ", price, width = label_width)
        } else {
            format!("{:>width$} │ ", "", width = label_width)
        }
    }

    /// Les N chandeliers les plus récents qui tiennent à l'écran
    fn visible_candles(&self) -> &[Candle] {
        let max_visible = self.width as usize;
        if self.candles.len() <= max_visible {
            &self.candles
        } else {
            &self.candles[self.candles.len() - max_visible..]
        }
    }

    /// Colonnes occupées par chaque chandelier (1 caractère + espaces)
    fn step(&self, visible: usize) -> usize {
        if visible == 0 {
            1
        } else {
            (self.width as usize / visible).max(1)
        }
    }

    /// Nombre de chandeliers dessinables
    pub fn candle_count(&self) -> usize {
        self.candles.len()
    }

    fn styled(&self, color: Color) -> Style {
        let style = Style::default().fg(color);
        match self.palette.background {
            Some(bg) => style.bg(bg),
            None => style,
        }
    }

    /// Génère toutes les lignes du graphique (chandeliers + axe X)
    pub fn render_lines(&self) -> Vec<Line<'static>> {
        let visible = self.visible_candles();
        let step = self.step(visible.len());
        let gap = " ".repeat(step - 1);

        let mut lines = Vec::with_capacity(self.height as usize + X_AXIS_HEIGHT as usize);

        // Parcourt de haut en bas
        for y in (1..=self.height).rev() {
            let mut spans = vec![Span::styled(self.render_y_axis(y), self.styled(self.palette.axis))];

            for candle in visible {
                spans.push(Span::styled(
                    self.render_candle(candle, y).to_string(),
                    self.styled(candle.color()),
                ));
                if !gap.is_empty() {
                    spans.push(Span::raw(gap.clone()));
                }
            }

            lines.push(Line::from(spans));
        }

        lines.extend(self.render_x_axis(visible, step));
        lines
    }

    /// Axe X : une ligne de ticks et une ligne de mois
    ///
    /// Un label à chaque changement de mois, sauté s'il chevauche le précédent
    fn render_x_axis(&self, visible: &[Candle], step: usize) -> Vec<Line<'static>> {
        let padding = " ".repeat(self.y_axis_width as usize);
        let axis_style = self.styled(self.palette.axis);

        let mut ticks = String::new();
        let mut labels = String::new();
        let mut previous_month = None;

        for (i, candle) in visible.iter().enumerate() {
            let column = i * step;
            let month = (candle.date.year(), candle.date.month());
            let is_month_change = previous_month != Some(month);
            previous_month = Some(month);

            if !is_month_change || labels.chars().count() > column {
                continue;
            }

            // Année affichée en janvier et sur le premier label
            let label = if candle.date.month() == 1 || labels.is_empty() {
                candle.date.format("%b %Y").to_string()
            } else {
                candle.date.format("%b").to_string()
            };

            if column + label.len() > self.width as usize {
                continue;
            }

            ticks.push_str(&" ".repeat(column - ticks.chars().count()));
            ticks.push('┬');
            labels.push_str(&" ".repeat(column - labels.chars().count()));
            labels.push_str(&label);
            labels.push(' ');
        }

        let rule_width = (self.width as usize).saturating_sub(ticks.chars().count());
        ticks.push_str(&"─".repeat(rule_width));

        vec![
            Line::from(vec![Span::raw(padding.clone()), Span::styled(ticks, axis_style)]),
            Line::from(vec![Span::raw(padding), Span::styled(labels, axis_style)]),
        ]
    }
}

// ============================================================================
// Fonction principale de rendu
// ============================================================================

/// Dessine un graphique en chandeliers dans `area`
///
/// Un graphique vide garde son titre et ses axes
pub fn render_candlestick_chart(frame: &mut Frame, chart: &CandlestickChart, area: Rect) {
    let palette = Palette::for_chart(chart);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border))
        .title(format!(" {} ", chart.title()))
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    let renderer = CandlestickRenderer::new(chart, inner);

    let mut lines = renderer.render_lines();
    if renderer.candle_count() == 0 {
        // Message au milieu de la zone de tracé
        let middle = (renderer.height as usize) / 2;
        if let Some(line) = lines.get_mut(middle) {
            line.spans.push(Span::styled(
                "Aucune donnée sur la période",
                Style::default().fg(Color::DarkGray),
            ));
        }
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

// ============================================================================
// Tests unitaires
// ============================================================================
