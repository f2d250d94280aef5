use logscope_stream::SessionState;
use logscope_types::{FilterCriteria, LogEvent, LogLevel};

/// Cache for filtered results so rendering does not re-filter on every
/// frame. Correctness still comes from full recomputation: the cache is
/// invalidated whenever the buffer revision or the criteria change.
#[derive(Default)]
pub struct FilterCache {
    /// Buffer revision when the cache was built
    cached_revision: u64,

    /// Criteria the cache was built with
    cached_criteria: FilterCriteria,

    /// The cached filtered events, newest-first
    pub cached_events: Vec<LogEvent>,

    /// Whether cache is valid
    pub is_valid: bool,
}

impl FilterCache {
    /// Check if the cache needs rebuilding for the given inputs
    pub fn needs_refresh(&self, revision: u64, criteria: &FilterCriteria) -> bool {
        !self.is_valid || self.cached_revision != revision || &self.cached_criteria != criteria
    }

    /// Store freshly filtered results
    pub fn update(&mut self, revision: u64, criteria: &FilterCriteria, events: Vec<LogEvent>) {
        self.cached_revision = revision;
        self.cached_criteria = criteria.clone();
        self.cached_events = events;
        self.is_valid = true;
    }
}

/// Which criteria field the input line is currently editing
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    None,
    Service,
    Text,
}

/// UI-specific transient state
pub struct UiState {
    /// Active filter criteria for the log table
    pub criteria: FilterCriteria,

    /// Input line mode (service / text editing)
    pub input_mode: InputMode,

    /// Current input line contents
    pub input: String,

    /// Scroll position in the log table (0 = newest)
    pub log_scroll: usize,

    /// Follow mode: stay pinned to the newest events
    pub auto_scroll: bool,

    /// Show the stats panel?
    pub stats_visible: bool,

    /// Show timestamps in the log table?
    pub show_timestamps: bool,

    /// Is help overlay visible?
    pub help_visible: bool,

    /// Error message to display (if any)
    pub error_message: Option<String>,

    /// Cache for filtered results
    pub filter_cache: FilterCache,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            criteria: FilterCriteria::default(),
            input_mode: InputMode::None,
            input: String::new(),
            log_scroll: 0,
            auto_scroll: true,
            stats_visible: true,
            show_timestamps: true,
            help_visible: false,
            error_message: None,
            filter_cache: FilterCache::default(),
        }
    }
}

/// Global application state
pub struct AppState {
    /// Server the dashboard is attached to (for the header)
    pub server: String,

    /// Push-channel connection state, refreshed each loop pass
    pub session_state: SessionState,

    /// Events received over the push channel so far
    pub events_received: u64,

    /// UI state
    pub ui_state: UiState,

    /// Whether app should quit
    pub should_quit: bool,
}

impl AppState {
    pub fn new(server: String) -> Self {
        Self {
            server,
            session_state: SessionState::Disconnected,
            events_received: 0,
            ui_state: UiState::default(),
            should_quit: false,
        }
    }

    /// Cycle the level criterion: all → INFO → WARN → ERROR → all
    pub fn cycle_level_filter(&mut self) {
        let levels = LogLevel::all();
        self.ui_state.criteria.level = match self.ui_state.criteria.level {
            None => Some(levels[0]),
            Some(current) => levels
                .iter()
                .position(|l| *l == current)
                .and_then(|i| levels.get(i + 1))
                .copied(),
        };
        self.ui_state.log_scroll = 0;
    }

    /// Begin editing the service criterion
    pub fn open_service_input(&mut self) {
        self.ui_state.input_mode = InputMode::Service;
        self.ui_state.input = self.ui_state.criteria.service.clone().unwrap_or_default();
    }

    /// Begin editing the text criterion
    pub fn open_text_search(&mut self) {
        self.ui_state.input_mode = InputMode::Text;
        self.ui_state.input = self.ui_state.criteria.text.clone().unwrap_or_default();
    }

    /// Add a character to the input line
    pub fn input_char(&mut self, c: char) {
        self.ui_state.input.push(c);
    }

    /// Remove the last character from the input line
    pub fn input_backspace(&mut self) {
        self.ui_state.input.pop();
    }

    /// Clear the input line
    pub fn input_clear(&mut self) {
        self.ui_state.input.clear();
    }

    /// Commit the input line into the matching criteria field.
    /// An empty input clears that field.
    pub fn apply_input(&mut self) {
        let value = (!self.ui_state.input.is_empty()).then(|| self.ui_state.input.clone());
        match self.ui_state.input_mode {
            InputMode::Service => self.ui_state.criteria.service = value,
            InputMode::Text => self.ui_state.criteria.text = value,
            InputMode::None => {}
        }
        self.ui_state.input_mode = InputMode::None;
        self.ui_state.input.clear();
        self.ui_state.log_scroll = 0;
    }

    /// Abandon the input line without touching the criteria
    pub fn cancel_input(&mut self) {
        self.ui_state.input_mode = InputMode::None;
        self.ui_state.input.clear();
    }

    /// Drop all filter criteria
    pub fn clear_filters(&mut self) {
        self.ui_state.criteria = FilterCriteria::default();
        self.ui_state.log_scroll = 0;
    }

    /// Show an error message
    pub fn show_error(&mut self, msg: String) {
        self.ui_state.error_message = Some(msg);
    }

    /// Dismiss the error message
    pub fn dismiss_error(&mut self) {
        self.ui_state.error_message = None;
    }
}
