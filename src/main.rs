use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::warn;

use logscope_api::{ApiClient, WsTransport};
use logscope_stream::{EventBuffer, StatsCell, StatsPoller, StatsSource, StreamSession};
use logscope_tui::{
    Action, AppState, DashboardScreen, Event, EventHandler, HelpOverlay, InputMode, KeyBindings,
    KeyContext, Tui,
};

mod config;
use config::Config;

/// Logscope - a terminal dashboard for watching a live log stream
#[derive(Parser, Debug)]
#[command(name = "logscope")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to a TOML config file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Base URL of the log service
    #[arg(long, value_name = "URL")]
    pub server: Option<String>,

    /// Seconds between stats polls
    #[arg(long)]
    pub poll_interval: Option<u64>,

    /// Trailing window for aggregate stats, in seconds
    #[arg(long)]
    pub stats_window: Option<u64>,

    /// History bound for the event buffer
    #[arg(long)]
    pub buffer_size: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing for debugging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load(&args)?;

    // Run the application
    let result = run_app(config).await;

    // Handle any errors
    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
    }

    result
}

async fn run_app(config: Config) -> Result<()> {
    let client = ApiClient::new(&config.server)?;
    let buffer = EventBuffer::new(config.buffer_size);

    // Bulk history fetch runs in the background so a slow service never
    // blocks the UI. A live push may land first; the snapshot then
    // replaces the buffer wholesale (replace-on-load).
    {
        let client = client.clone();
        let buffer = buffer.clone();
        tokio::spawn(async move {
            match client.fetch_logs().await {
                Ok(history) => buffer.initialize_from(history),
                Err(e) => {
                    warn!(error = %e, "bulk history fetch failed, starting with an empty buffer");
                }
            }
        });
    }

    // Live push channel
    let transport = Arc::new(WsTransport::from_base(client.base_url())?);
    let session = StreamSession::start(transport, buffer.clone());

    // Stats polling, independent of the event stream
    let poller = StatsPoller::start(
        Arc::new(client.clone()) as Arc<dyn StatsSource>,
        Duration::from_secs(config.poll_interval),
        config.stats_window,
    );
    let stats = poller.cell();

    // Initialize TUI
    let mut tui = Tui::new()?;

    // Initialize event handler
    let mut events = EventHandler::new(Duration::from_millis(250));

    // Initialize keybindings
    let keybindings = KeyBindings::new();

    let mut state = AppState::new(config.server.clone());

    // Main event loop
    loop {
        state.session_state = session.state();
        state.events_received = session.events_received();

        render(&mut tui, &mut state, &buffer, &stats)?;

        let Some(event) = events.next().await else {
            break;
        };

        match event {
            Event::Key(key) => {
                let action = if state.ui_state.input_mode != InputMode::None {
                    keybindings.get_input_action(&key)
                } else {
                    keybindings.get_action(KeyContext::Dashboard, &key)
                };
                if let Some(action) = action {
                    handle_action(&mut state, action);
                }
            }
            Event::Tick => {
                // Re-render to pick up new events and stats
            }
            Event::Resize(_, _) => {}
            Event::Error(e) => {
                handle_action(&mut state, Action::ShowError(e));
            }
        }

        if state.should_quit {
            break;
        }
    }

    // Cleanup
    session.close();
    poller.stop();
    events.shutdown();
    tui.restore()?;

    Ok(())
}

fn handle_action(state: &mut AppState, action: Action) {
    match action {
        Action::Quit => {
            state.should_quit = true;
        }
        Action::ToggleHelp => {
            state.ui_state.help_visible = !state.ui_state.help_visible;
        }
        Action::ToggleStats => {
            state.ui_state.stats_visible = !state.ui_state.stats_visible;
        }
        Action::ToggleTimestamps => {
            state.ui_state.show_timestamps = !state.ui_state.show_timestamps;
        }
        Action::ToggleAutoScroll => {
            state.ui_state.auto_scroll = !state.ui_state.auto_scroll;
        }

        // Scrolling; any manual movement drops out of follow mode
        Action::ScrollUp(n) => {
            state.ui_state.auto_scroll = false;
            state.ui_state.log_scroll = state.ui_state.log_scroll.saturating_sub(n);
        }
        Action::ScrollDown(n) => {
            state.ui_state.auto_scroll = false;
            // render_logs clamps to the actual filtered count
            state.ui_state.log_scroll = state.ui_state.log_scroll.saturating_add(n);
        }
        Action::PageUp => {
            state.ui_state.auto_scroll = false;
            state.ui_state.log_scroll = state.ui_state.log_scroll.saturating_sub(20);
        }
        Action::PageDown => {
            state.ui_state.auto_scroll = false;
            state.ui_state.log_scroll = state.ui_state.log_scroll.saturating_add(20);
        }
        Action::ScrollToTop => {
            state.ui_state.auto_scroll = false;
            state.ui_state.log_scroll = 0;
        }
        Action::ScrollToBottom => {
            state.ui_state.auto_scroll = false;
            state.ui_state.log_scroll = usize::MAX;
        }

        // Filter criteria
        Action::CycleLevelFilter => state.cycle_level_filter(),
        Action::OpenServiceInput => state.open_service_input(),
        Action::OpenTextSearch => state.open_text_search(),
        Action::InputChar(c) => state.input_char(c),
        Action::InputBackspace => state.input_backspace(),
        Action::InputClear => state.input_clear(),
        Action::ApplyInput => state.apply_input(),
        Action::CancelInput => state.cancel_input(),
        Action::ClearFilters => state.clear_filters(),

        Action::ShowError(msg) => {
            state.show_error(msg);
        }
        Action::DismissError => {
            // Esc closes the help overlay first, then the error line
            if state.ui_state.help_visible {
                state.ui_state.help_visible = false;
            } else {
                state.dismiss_error();
            }
        }

        Action::Tick | Action::Render => {
            // No-op, the loop re-renders anyway
        }
    }
}

fn render(
    tui: &mut Tui,
    state: &mut AppState,
    buffer: &EventBuffer,
    stats: &StatsCell,
) -> Result<()> {
    tui.terminal().draw(|frame| {
        DashboardScreen::render(frame, state, buffer, stats);

        // Render help overlay if visible
        if state.ui_state.help_visible {
            HelpOverlay::render(frame);
        }
    })?;

    Ok(())
}
