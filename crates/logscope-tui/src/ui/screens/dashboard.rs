use chrono::Local;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Clear, Paragraph},
};
use unicode_width::UnicodeWidthChar;

use logscope_stream::{EventBuffer, StatsCell, apply_filter, project_levels};
use logscope_types::{LogEvent, LogLevel, StatsSnapshot};

use crate::app::{AppState, InputMode};
use crate::ui::components::{StatusBar, dashboard_hints};
use crate::ui::{Layout, Theme};

/// The single dashboard screen: stats panel, filter bar, log table
pub struct DashboardScreen;

/// Truncate a string to a display width, appending an ellipsis when cut
fn truncate_to_width(s: &str, max_width: usize) -> String {
    let total: usize = s.chars().map(|c| c.width().unwrap_or(0)).sum();
    if total <= max_width {
        return s.to_string();
    }

    let mut out = String::new();
    let mut width = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if width + w + 1 > max_width {
            break;
        }
        out.push(c);
        width += w;
    }
    out.push('…');
    out
}

impl DashboardScreen {
    /// Block cursor shown at the end of the active input field
    fn cursor() -> Span<'static> {
        Span::styled("█", Theme::text_highlight())
    }

    pub fn render(
        frame: &mut Frame,
        state: &mut AppState,
        buffer: &EventBuffer,
        stats: &StatsCell,
    ) {
        let area = frame.area();

        let show_filter_bar =
            state.ui_state.input_mode != InputMode::None || !state.ui_state.criteria.is_empty();

        let areas = Layout::dashboard(area, state.ui_state.stats_visible, show_filter_bar);

        Self::render_header(frame, areas.header, state);

        if let Some(stats_area) = areas.stats {
            Self::render_stats(frame, stats_area, stats.get().as_ref());
        }
        if let Some(filter_area) = areas.filter {
            Self::render_filter_bar(frame, filter_area, state);
        }

        let shown = Self::render_logs(frame, areas.logs, state, buffer);
        Self::render_status_bar(frame, areas.status, buffer, shown);

        if let Some(error) = &state.ui_state.error_message {
            Self::render_error_line(frame, areas.logs, error);
        }
    }

    fn render_header(frame: &mut Frame, area: Rect, state: &AppState) {
        let state_style = match state.session_state {
            logscope_stream::SessionState::Connected => Style::default().fg(Theme::SUCCESS),
            logscope_stream::SessionState::Closed => Theme::text_dim(),
            _ => Style::default().fg(Theme::WARNING),
        };

        let title = Line::from(vec![
            Span::styled("logscope", Theme::title()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(state.server.clone(), Theme::text()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(state.session_state.label(), state_style),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(
                format!("{} events received", state.events_received),
                Theme::text(),
            ),
        ]);

        let header = Paragraph::new(title).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border()),
        );

        frame.render_widget(header, area);
    }

    fn render_stats(frame: &mut Frame, area: Rect, stats: Option<&StatsSnapshot>) {
        let (chart_area, summary_area) = Layout::stats_panel(area);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Theme::border())
            .title(Span::styled(" Logs per Level ", Theme::title()));

        let Some(stats) = stats else {
            let waiting = Paragraph::new(Span::styled("waiting for stats…", Theme::text_dim()))
                .block(block);
            frame.render_widget(waiting, area);
            return;
        };

        let series = project_levels(stats);
        let bars: Vec<Bar> = series
            .labels
            .iter()
            .zip(&series.values)
            .map(|(label, value)| {
                let color = LogLevel::parse(label)
                    .map(|l| l.color())
                    .unwrap_or(Theme::PRIMARY);
                Bar::default()
                    .value(*value)
                    .label(Line::from(label.clone()))
                    .style(Style::default().fg(color))
                    .value_style(
                        Style::default()
                            .fg(Color::Black)
                            .bg(color)
                            .add_modifier(Modifier::BOLD),
                    )
            })
            .collect();

        let chart = BarChart::default()
            .data(BarGroup::default().bars(&bars))
            .bar_width(7)
            .bar_gap(2)
            .block(block);
        frame.render_widget(chart, chart_area);

        let summary = Paragraph::new(vec![
            Line::from(""),
            Line::from(vec![
                Span::styled("Average logs/sec: ", Theme::text_dim()),
                Span::styled(
                    format!("{:.2}", stats.average_per_second),
                    Theme::text_highlight(),
                ),
            ]),
            Line::from(vec![
                Span::styled("Error rate: ", Theme::text_dim()),
                Span::styled(
                    format!("{:.1}%", stats.error_rate * 100.0),
                    if stats.error_rate > 0.1 {
                        Theme::error()
                    } else {
                        Theme::text_highlight()
                    },
                ),
            ]),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border())
                .title(Span::styled(" Summary ", Theme::title())),
        );
        frame.render_widget(summary, summary_area);
    }

    fn render_filter_bar(frame: &mut Frame, area: Rect, state: &AppState) {
        let mut spans = vec![];

        // Level chip
        if let Some(level) = state.ui_state.criteria.level {
            spans.push(Span::styled(" level=", Theme::text_dim()));
            spans.push(Span::styled(
                level.as_str(),
                Style::default().fg(level.color()),
            ));
        }

        // Service chip or input
        if state.ui_state.input_mode == InputMode::Service {
            spans.push(Span::styled(" service=", Theme::text_dim()));
            spans.push(Span::styled(
                state.ui_state.input.clone(),
                Theme::text_highlight(),
            ));
            spans.push(Self::cursor());
        } else if let Some(service) = &state.ui_state.criteria.service {
            spans.push(Span::styled(" service=", Theme::text_dim()));
            spans.push(Span::styled(service.clone(), Theme::text_highlight()));
        }

        // Text chip or input
        if state.ui_state.input_mode == InputMode::Text {
            spans.push(Span::styled(" /", Theme::text_highlight()));
            spans.push(Span::styled(
                state.ui_state.input.clone(),
                Theme::text_highlight(),
            ));
            spans.push(Self::cursor());
        } else if let Some(text) = &state.ui_state.criteria.text {
            spans.push(Span::styled(" text=", Theme::text_dim()));
            spans.push(Span::styled(format!("\"{}\"", text), Theme::text_highlight()));
        }

        // Hints
        if state.ui_state.input_mode != InputMode::None {
            spans.push(Span::styled(
                "  [Enter] Apply  [Esc] Cancel",
                Theme::text_dim(),
            ));
        } else {
            spans.push(Span::styled("  [n] Clear", Theme::text_dim()));
        }

        let filter_bar = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(if state.ui_state.input_mode != InputMode::None {
                    Theme::border_focused()
                } else {
                    Theme::border()
                })
                .title(Span::styled(" Filter ", Theme::title())),
        );

        frame.render_widget(filter_bar, area);
    }

    /// Render the log table; returns how many events matched the criteria
    fn render_logs(
        frame: &mut Frame,
        area: Rect,
        state: &mut AppState,
        buffer: &EventBuffer,
    ) -> usize {
        let revision = buffer.revision();

        // Only recompute the filtered view when buffer or criteria changed
        if state
            .ui_state
            .filter_cache
            .needs_refresh(revision, &state.ui_state.criteria)
        {
            let filtered = apply_filter(&buffer.snapshot(), &state.ui_state.criteria);
            state
                .ui_state
                .filter_cache
                .update(revision, &state.ui_state.criteria, filtered);
        }

        let filtered = &state.ui_state.filter_cache.cached_events;
        let visible = area.height.saturating_sub(2) as usize;

        // Follow mode pins the viewport to the newest events (index 0)
        if state.ui_state.auto_scroll {
            state.ui_state.log_scroll = 0;
        }
        let max_scroll = filtered.len().saturating_sub(visible);
        state.ui_state.log_scroll = state.ui_state.log_scroll.min(max_scroll);

        let width = area.width.saturating_sub(2) as usize;
        let lines: Vec<Line> = filtered
            .iter()
            .skip(state.ui_state.log_scroll)
            .take(visible)
            .map(|event| Self::event_line(event, state.ui_state.show_timestamps, width))
            .collect();

        let title = if state.ui_state.criteria.is_empty() {
            format!(" Logs ({}) ", filtered.len())
        } else {
            format!(" Logs ({} matching) ", filtered.len())
        };

        let follow = if state.ui_state.auto_scroll {
            Span::styled(" following ", Style::default().fg(Theme::SUCCESS))
        } else {
            Span::styled(" paused ", Style::default().fg(Theme::WARNING))
        };

        let logs = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border())
                .title(Span::styled(title, Theme::title()))
                .title_bottom(Line::from(follow).right_aligned()),
        );

        frame.render_widget(logs, area);
        filtered.len()
    }

    fn event_line(event: &LogEvent, show_timestamps: bool, width: usize) -> Line<'static> {
        let mut spans = Vec::new();
        let mut used = 0;

        if show_timestamps {
            let ts = event
                .timestamp
                .with_timezone(&Local)
                .format("%H:%M:%S%.3f")
                .to_string();
            used += ts.len() + 1;
            spans.push(Span::styled(ts, Theme::text_dim()));
            spans.push(Span::raw(" "));
        }

        let level = format!("{:<5}", event.level.as_str());
        used += level.len() + 1;
        spans.push(Span::styled(
            level,
            Style::default().fg(event.level.color()),
        ));
        spans.push(Span::raw(" "));

        let service = truncate_to_width(&event.service, 14);
        used += service.chars().count() + 1;
        spans.push(Span::styled(service, Style::default().fg(Theme::PRIMARY)));
        spans.push(Span::raw(" "));

        let message = truncate_to_width(&event.message, width.saturating_sub(used));
        spans.push(Span::styled(message, Theme::text()));

        Line::from(spans)
    }

    fn render_status_bar(frame: &mut Frame, area: Rect, buffer: &EventBuffer, shown: usize) {
        let right = format!("{} shown · {}/{}", shown, buffer.len(), buffer.capacity());
        let bar = StatusBar::new().hints(dashboard_hints()).right(right);
        frame.render_widget(bar, area);
    }

    fn render_error_line(frame: &mut Frame, logs_area: Rect, error: &str) {
        if logs_area.height < 2 {
            return;
        }
        let line_area = Rect::new(
            logs_area.x + 1,
            logs_area.y + logs_area.height - 2,
            logs_area.width.saturating_sub(2),
            1,
        );
        frame.render_widget(Clear, line_area);
        let error_line = Paragraph::new(Span::styled(
            format!("⚠ {} (Esc to dismiss)", error),
            Theme::error(),
        ));
        frame.render_widget(error_line, line_area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_string_untouched() {
        assert_eq!(truncate_to_width("hello", 10), "hello");
    }

    #[test]
    fn test_truncate_adds_ellipsis() {
        assert_eq!(truncate_to_width("hello world", 6), "hello…");
    }

    #[test]
    fn test_truncate_handles_wide_chars() {
        // Each CJK char is double-width; the result must stay within budget
        let truncated = truncate_to_width("日本語のログ", 5);
        let width: usize = truncated.chars().map(|c| c.width().unwrap_or(0)).sum();
        assert!(width <= 5);
        assert!(truncated.ends_with('…'));
    }
}
