// ============================================================================
// Structure : App
// ============================================================================
// État global du tableau de bord :
// - la liste des actions (sélecteur)
// - l'action sélectionnée
// - l'état de la zone graphique (chargement, graphique, erreur)
//
// PATTERN : "Application State"
// - Tous les composants de l'UI lisent depuis App
// - Toutes les modifications passent par les méthodes de App
// - Les méthodes qui demandent un chargement retournent la Command à
//   envoyer au worker : App ne connaît pas les channels
// ============================================================================

use tracing::info;

use crate::models::CandlestickChart;
use crate::ui::events::{
    get_ticker_char, is_arrow_down_event, is_arrow_up_event, is_backspace_event, is_down_event,
    is_enter_event, is_escape_event, is_quit_event, is_reload_event, is_up_event, Event,
};

/// Titre de la page
pub const PAGE_TITLE: &str = "📈 Stock Viz";

// ============================================================================
// Enum : Screen
// ============================================================================

/// Écrans de l'application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    /// Page principale : sélecteur fermé + graphique
    Page,

    /// Liste déroulante du sélecteur ouverte
    /// - Les caractères tapés filtrent les options
    /// - Enter valide, ESC ferme
    Dropdown,
}

/// Travail demandé au worker thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Charger la liste des tickers
    /// - force: oublie le cache avant de recharger
    LoadDirectory { force: bool },

    /// Charger l'historique d'un ticker
    LoadHistory { ticker: String, force: bool },
}

/// Contenu de la zone graphique
#[derive(Debug, Clone, PartialEq)]
pub enum ChartState {
    /// Rien à afficher (liste des actions pas encore chargée)
    Idle,

    /// Requête en cours pour ce ticker
    Loading(String),

    /// Graphique prêt
    Ready(CandlestickChart),

    /// Liste chargée mais vide : rien à sélectionner
    NoStocks,

    /// Échec : affiché à la place du graphique
    Failed { what: String, error: String },
}

/// État principal de l'application
pub struct App {
    /// Indique si l'application doit continuer à tourner
    pub running: bool,

    /// Options du sélecteur (liste de l'API, dans son ordre)
    pub stocks: Vec<String>,

    /// Index de l'action sélectionnée dans `stocks`
    pub selected_index: usize,

    /// Écran actuellement affiché
    pub current_screen: Screen,

    /// Filtre tapé dans la liste déroulante
    pub filter: String,

    /// Position surlignée dans la liste filtrée
    pub highlighted: usize,

    /// Zone graphique
    pub chart: ChartState,

    /// Première pression de 'q' reçue, attend la seconde
    pub confirm_quit: bool,
}

impl App {
    /// Crée une application sans liste d'actions
    pub fn new() -> Self {
        Self {
            running: true,
            stocks: Vec::new(),
            selected_index: 0,
            current_screen: Screen::Page,
            filter: String::new(),
            highlighted: 0,
            chart: ChartState::Idle,
            confirm_quit: false,
        }
    }

    /// Crée une App avec une liste d'actions préchargée
    pub fn with_stocks(stocks: Vec<String>) -> Self {
        let mut app = Self::new();
        app.set_stocks(stocks);
        app
    }

    /// Remplace les options du sélecteur
    ///
    /// Comme un select HTML : le premier élément est sélectionné par défaut
    pub fn set_stocks(&mut self, stocks: Vec<String>) {
        self.stocks = stocks;
        self.selected_index = 0;
        self.highlighted = 0;
        self.filter.clear();
    }

    /// Quitte l'application
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Vérifie si l'application doit continuer
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Ticker actuellement sélectionné
    pub fn selected_stock(&self) -> Option<&str> {
        self.stocks.get(self.selected_index).map(String::as_str)
    }

    /// Sélectionne l'option suivante sans ouvrir la liste
    ///
    /// Retourne le nouveau ticker, None si déjà en bas de liste
    pub fn select_next(&mut self) -> Option<String> {
        if self.selected_index + 1 >= self.stocks.len() {
            return None;
        }
        self.selected_index += 1;
        self.stocks.get(self.selected_index).cloned()
    }

    /// Sélectionne l'option précédente sans ouvrir la liste
    pub fn select_previous(&mut self) -> Option<String> {
        if self.selected_index == 0 {
            return None;
        }
        self.selected_index -= 1;
        self.stocks.get(self.selected_index).cloned()
    }

    // ========================================================================
    // Liste déroulante
    // ========================================================================

    /// Indices (dans `stocks`) des options qui passent le filtre
    ///
    /// CONCEPT RUST : Iterator chaining
    /// - filter insensible à la casse, ordre de l'API conservé
    pub fn filtered_indices(&self) -> Vec<usize> {
        let needle = self.filter.to_uppercase();
        self.stocks
            .iter()
            .enumerate()
            .filter(|(_, s)| needle.is_empty() || s.to_uppercase().contains(&needle))
            .map(|(i, _)| i)
            .collect()
    }

    /// Ouvre la liste déroulante, surlignage sur l'option sélectionnée
    pub fn open_dropdown(&mut self) {
        self.current_screen = Screen::Dropdown;
        self.filter.clear();
        self.highlighted = self.selected_index;
    }

    /// Ferme la liste sans changer la sélection
    pub fn close_dropdown(&mut self) {
        self.current_screen = Screen::Page;
        self.filter.clear();
        self.highlighted = 0;
    }

    /// Vérifie si la liste déroulante est ouverte
    pub fn is_dropdown_open(&self) -> bool {
        self.current_screen == Screen::Dropdown
    }

    /// Vérifie si on est sur la page
    pub fn is_on_page(&self) -> bool {
        self.current_screen == Screen::Page
    }

    /// Remonte le surlignage
    pub fn navigate_up(&mut self) {
        self.highlighted = self.highlighted.saturating_sub(1);
    }

    /// Descend le surlignage (borné à la liste filtrée)
    pub fn navigate_down(&mut self) {
        let max_index = self.filtered_indices().len().saturating_sub(1);
        self.highlighted = (self.highlighted + 1).min(max_index);
    }

    /// Ajoute un caractère au filtre
    pub fn append_char(&mut self, c: char) {
        self.filter.push(c);
        self.highlighted = 0;
    }

    /// Supprime le dernier caractère du filtre
    pub fn backspace(&mut self) {
        self.filter.pop();
        self.highlighted = 0;
    }

    /// Valide l'option surlignée et ferme la liste
    ///
    /// Retourne le ticker si la sélection a changé (il faut le charger)
    pub fn confirm_selection(&mut self) -> Option<String> {
        let chosen = self.filtered_indices().get(self.highlighted).copied();
        self.close_dropdown();

        let index = chosen?;
        if index == self.selected_index && !matches!(self.chart, ChartState::Idle | ChartState::Failed { .. }) {
            return None;
        }

        self.selected_index = index;
        self.stocks.get(index).cloned()
    }

    // ========================================================================
    // Zone graphique
    // ========================================================================

    /// Marque le chargement d'un ticker
    pub fn start_loading(&mut self, ticker: &str) {
        self.chart = ChartState::Loading(ticker.to_string());
    }

    /// Vérifie si des données sont en cours de chargement
    pub fn is_loading(&self) -> bool {
        matches!(self.chart, ChartState::Loading(_))
    }

    /// Installe un graphique
    ///
    /// Ignoré s'il ne correspond plus à l'action sélectionnée
    /// (l'utilisateur a changé de sélection pendant le chargement)
    pub fn show_chart(&mut self, ticker: &str, chart: CandlestickChart) -> bool {
        if self.selected_stock() != Some(ticker) {
            return false;
        }
        self.chart = ChartState::Ready(chart);
        true
    }

    /// Affiche une erreur à la place du graphique
    pub fn show_error(&mut self, what: String, error: String) {
        self.chart = ChartState::Failed { what, error };
    }

    // ========================================================================
    // Chargements et résultats du worker
    // ========================================================================

    /// Demande la liste des tickers
    pub fn load_directory(&mut self, force: bool) -> Command {
        self.chart = ChartState::Idle;
        Command::LoadDirectory { force }
    }

    /// Passe la zone graphique en chargement et demande l'historique
    pub fn load_history(&mut self, ticker: &str, force: bool) -> Command {
        self.start_loading(ticker);
        Command::LoadHistory {
            ticker: ticker.to_string(),
            force,
        }
    }

    /// Liste reçue : la première action est chargée d'office
    pub fn on_directory_loaded(&mut self, stocks: Vec<String>) -> Option<Command> {
        self.set_stocks(stocks);
        match self.selected_stock().map(str::to_string) {
            Some(first) => Some(self.load_history(&first, false)),
            None => {
                self.chart = ChartState::NoStocks;
                None
            }
        }
    }

    /// Échec de la liste
    pub fn on_directory_failed(&mut self, error: String) {
        self.show_error("la liste des actions".to_string(), error);
    }

    /// Échec d'un historique
    ///
    /// Ignoré si l'action n'est plus sélectionnée
    pub fn on_history_failed(&mut self, ticker: String, error: String) -> bool {
        if self.selected_stock() != Some(ticker.as_str()) {
            return false;
        }
        self.show_error(ticker, error);
        true
    }

    /// Le worker ne répond plus : plus aucun chargement n'aboutira
    pub fn on_worker_stopped(&mut self) {
        self.show_error(
            "les données".to_string(),
            "le thread de chargement s'est arrêté".to_string(),
        );
    }

    /// Recharge l'action courante en ignorant le cache
    ///
    /// Sans action sélectionnable (liste vide ou en échec) : recharge la liste
    pub fn reload(&mut self) -> Command {
        match self.selected_stock().map(str::to_string) {
            Some(ticker) => {
                info!(ticker = %ticker, "Reloading history");
                self.load_history(&ticker, true)
            }
            None => {
                info!("Reloading stock list");
                self.load_directory(true)
            }
        }
    }

    // ========================================================================
    // Gestion des touches
    // ========================================================================

    /// Traite un événement clavier
    ///
    /// Liste ouverte : les lettres filtrent (y compris 'q', 'j', 'k').
    /// Page : 'q' deux fois pour quitter, toute autre touche annule.
    pub fn handle_event(&mut self, event: &Event) -> Option<Command> {
        if matches!(event, Event::Tick) {
            return None;
        }

        if self.is_dropdown_open() {
            return self.handle_dropdown_event(event);
        }

        if self.is_awaiting_quit_confirmation() {
            if is_quit_event(event) {
                info!("Quit confirmed");
                self.quit();
            } else {
                self.cancel_quit();
            }
            return None;
        }

        if is_quit_event(event) {
            self.request_quit();
            None
        } else if is_enter_event(event) {
            if !self.stocks.is_empty() {
                self.open_dropdown();
            }
            None
        } else if is_up_event(event) {
            self.select_previous().map(|ticker| self.load_history(&ticker, false))
        } else if is_down_event(event) {
            self.select_next().map(|ticker| self.load_history(&ticker, false))
        } else if is_reload_event(event) {
            Some(self.reload())
        } else {
            None
        }
    }

    fn handle_dropdown_event(&mut self, event: &Event) -> Option<Command> {
        if is_escape_event(event) {
            self.close_dropdown();
        } else if is_enter_event(event) {
            let ticker = self.confirm_selection()?;
            info!(ticker = %ticker, "Stock selected");
            return Some(self.load_history(&ticker, false));
        } else if is_arrow_up_event(event) {
            self.navigate_up();
        } else if is_arrow_down_event(event) {
            self.navigate_down();
        } else if is_backspace_event(event) {
            self.backspace();
        } else if let Some(c) = get_ticker_char(event) {
            self.append_char(c);
        }
        None
    }

    // ========================================================================
    // Quit confirmation
    // ========================================================================

    /// Première pression de 'q'
    pub fn request_quit(&mut self) {
        self.confirm_quit = true;
    }

    /// Annule la demande de quit
    pub fn cancel_quit(&mut self) {
        self.confirm_quit = false;
    }

    /// Vérifie si on attend la confirmation de quit
    pub fn is_awaiting_quit_confirmation(&self) -> bool {
        self.confirm_quit
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
