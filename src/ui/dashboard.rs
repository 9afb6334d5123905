// ============================================================================
// Dashboard - Rendu de la page
// ============================================================================
// Une seule page, de haut en bas :
// 1. Titre "📈 Stock Viz"
// 2. Sélecteur d'action (liste déroulante)
// 3. Zone graphique (chandeliers, chargement ou erreur)
// 4. Raccourcis clavier
//
// CONCEPTS RATATUI :
// 1. Layout : découpage de l'espace en zones
// 2. Clear : efface une zone avant de dessiner un popup par-dessus
// 3. ListState : sélection + scroll automatique d'une List
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::app::{App, ChartState, PAGE_TITLE};
use crate::ui::candlestick_text;

/// Hauteur max de la liste déroulante (bordures comprises)
const DROPDOWN_MAX_HEIGHT: u16 = 15;

/// Largeur de la liste déroulante
const DROPDOWN_WIDTH: u16 = 30;

/// Dessine la page complète
///
/// La liste déroulante est dessinée en dernier, par-dessus le graphique
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = create_layout(frame.size());

    render_header(frame, chunks[0]);
    render_selector(frame, app, chunks[1]);
    render_chart_area(frame, app, chunks[2]);
    render_footer(frame, app, chunks[3]);

    if app.is_dropdown_open() {
        render_dropdown(frame, app, chunks[1], chunks[2]);
    }
}

/// Crée le layout principal (header, sélecteur, graphique, footer)
fn create_layout(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(3), // Sélecteur
            Constraint::Min(0),    // Graphique : tout le reste
            Constraint::Length(3), // Footer
        ])
        .split(area)
        .to_vec()
}

// ============================================================================
// Header
// ============================================================================

fn render_header(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let paragraph = Paragraph::new(Line::from(Span::styled(
        PAGE_TITLE,
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
    )))
    .block(block)
    .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

// ============================================================================
// Sélecteur
// ============================================================================

/// Dessine le contrôle fermé : "Stock : [PETR4 ▾]"
fn render_selector(frame: &mut Frame, app: &App, area: Rect) {
    let border_color = if app.is_dropdown_open() {
        Color::Green
    } else {
        Color::Cyan
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));

    let value = match app.selected_stock() {
        Some(ticker) => Span::styled(
            format!("[{} ▾]", ticker),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        None => {
            let placeholder = match app.chart {
                ChartState::NoStocks => "[aucune action ▾]",
                ChartState::Failed { .. } => "[liste indisponible ▾]",
                _ => "[chargement de la liste… ▾]",
            };
            Span::styled(placeholder, Style::default().fg(Color::Gray))
        }
    };

    let line = Line::from(vec![
        Span::styled(" Stock : ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        value,
        Span::styled(
            format!("   {} actions", app.stocks.len()),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    frame.render_widget(Paragraph::new(line).block(block), area);
}

/// Dessine la liste déroulante ouverte sous le sélecteur
///
/// Première ligne : le filtre tapé, puis les options filtrées.
/// ListState garde l'option surlignée visible quand la liste défile.
fn render_dropdown(frame: &mut Frame, app: &App, selector: Rect, below: Rect) {
    let indices = app.filtered_indices();

    let height = (indices.len() as u16 + 3).min(DROPDOWN_MAX_HEIGHT).min(below.height);
    let area = Rect {
        x: selector.x + 1,
        y: below.y,
        width: DROPDOWN_WIDTH.min(selector.width.saturating_sub(1)),
        height,
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green))
        .title(format!(" Filtre : {}█ ", app.filter));

    let items: Vec<ListItem> = if indices.is_empty() {
        vec![ListItem::new(Span::styled("Aucune action", Style::default().fg(Color::Gray)))]
    } else {
        indices
            .iter()
            .filter_map(|&i| app.stocks.get(i))
            .map(|ticker| ListItem::new(format!(" {}", ticker)))
            .collect()
    };

    let list = List::new(items).block(block).highlight_style(
        Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );

    let mut state = ListState::default();
    if !indices.is_empty() {
        state.select(Some(app.highlighted));
    }

    frame.render_widget(Clear, area);
    frame.render_stateful_widget(list, area, &mut state);
}

// ============================================================================
// Zone graphique
// ============================================================================

/// Dessine le graphique ou l'état qui le remplace
fn render_chart_area(frame: &mut Frame, app: &App, area: Rect) {
    match &app.chart {
        ChartState::Ready(chart) => {
            candlestick_text::render_candlestick_chart(frame, chart, area);
        }
        ChartState::Loading(ticker) => {
            render_message(
                frame,
                area,
                format!("⏳ Chargement de l'historique de {}...", ticker),
                Color::Yellow,
            );
        }
        ChartState::Failed { what, error } => {
            render_message(
                frame,
                area,
                format!("⚠  Impossible de charger {} : {}", what, error),
                Color::Red,
            );
        }
        ChartState::NoStocks => {
            render_message(frame, area, "Aucune action disponible".to_string(), Color::Gray);
        }
        ChartState::Idle => {
            render_message(frame, area, "Chargement de la liste des actions...".to_string(), Color::Gray);
        }
    }
}

/// Message centré dans un cadre à la place du graphique
fn render_message(frame: &mut Frame, area: Rect, message: String, color: Color) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let top_padding = (area.height.saturating_sub(3) / 2) as usize;
    let mut text = vec![Line::from(""); top_padding];
    text.push(Line::from(Span::styled(message, Style::default().fg(color))));

    let paragraph = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

// ============================================================================
// Footer
// ============================================================================

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let key_style = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);

    let shortcuts = if app.is_awaiting_quit_confirmation() {
        Line::from(vec![
            Span::styled(
                "⚠  Appuyez sur ",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                "[q]",
                Style::default()
                    .fg(Color::Red)
                    .add_modifier(Modifier::BOLD)
                    .add_modifier(Modifier::SLOW_BLINK),
            ),
            Span::styled(
                " à nouveau pour quitter, ou n'importe quelle autre touche pour annuler ⚠",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
        ])
    } else if app.is_dropdown_open() {
        Line::from(vec![
            Span::styled("[↑↓]", key_style),
            Span::raw(" Navigate  "),
            Span::styled("[a-z 0-9]", key_style),
            Span::raw(" Filter  "),
            Span::styled("[Enter]", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
            Span::raw(" Select  "),
            Span::styled("[ESC]", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
            Span::raw(" Cancel"),
        ])
    } else {
        Line::from(vec![
            Span::styled("[q]", key_style),
            Span::raw(" Quit  "),
            Span::styled("[Enter]", key_style),
            Span::raw(" Choose stock  "),
            Span::styled("[↑↓ / j k]", key_style),
            Span::raw(" Previous/Next  "),
            Span::styled("[r]", key_style),
            Span::raw(" Reload"),
        ])
    };

    let paragraph = Paragraph::new(vec![shortcuts])
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{plot_candlesticks, PriceBar, PriceSeries};
    use chrono::NaiveDate;
    use ratatui::{backend::TestBackend, Terminal};

    fn draw(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| render(frame, app)).unwrap();

        let buffer = terminal.backend().buffer().clone();
        buffer.content().iter().map(|cell| cell.symbol()).collect()
    }

    fn app() -> App {
        App::with_stocks(vec!["PETR4".to_string(), "VALE3".to_string(), "ITUB4".to_string()])
    }

    #[test]
    fn test_page_shows_title_and_selector() {
        let screen = draw(&app());
        assert!(screen.contains("Stock Viz"));
        assert!(screen.contains("[PETR4 ▾]"));
    }

    #[test]
    fn test_loading_message() {
        let mut app = app();
        app.start_loading("PETR4");
        assert!(draw(&app).contains("Chargement de l'historique de PETR4"));
    }

    #[test]
    fn test_error_replaces_chart() {
        let mut app = app();
        app.show_error("PETR4".to_string(), "network error: timeout".to_string());
        let screen = draw(&app);
        assert!(screen.contains("Impossible de charger PETR4"));
        assert!(screen.contains("network error: timeout"));
    }

    #[test]
    fn test_chart_is_drawn() {
        let mut app = app();
        let date = NaiveDate::from_ymd_opt(2021, 1, 4).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let series = PriceSeries::with_bars("PETR4".to_string(), vec![PriceBar::new(date, 10.0, 12.0, 9.0, 11.0)]);
        app.show_chart("PETR4", plot_candlesticks(&series, "PETR4"));

        let screen = draw(&app);
        assert!(screen.contains('┃'));
    }

    #[test]
    fn test_dropdown_lists_filtered_options() {
        let mut app = app();
        app.open_dropdown();
        app.append_char('V');

        let screen = draw(&app);
        assert!(screen.contains("Filtre : V"));
        assert!(screen.contains("VALE3"));
        assert!(!screen.contains("ITUB4"));
        assert!(screen.contains("[ESC] Cancel"));
    }

    #[test]
    fn test_empty_directory_is_not_shown_as_loading() {
        let mut app = App::new();
        app.on_directory_loaded(Vec::new());

        let screen = draw(&app);
        assert!(screen.contains("Aucune action disponible"));
        assert!(screen.contains("[aucune action ▾]"));
        assert!(!screen.contains("Chargement de la liste"));
        assert!(!screen.contains("chargement de la liste"));
    }

    #[test]
    fn test_quit_confirmation_footer() {
        let mut app = app();
        app.request_quit();
        assert!(draw(&app).contains("à nouveau pour quitter"));
    }
}
