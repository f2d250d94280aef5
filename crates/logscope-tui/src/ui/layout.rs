use ratatui::layout::{Constraint, Direction, Layout as RatatuiLayout, Rect};

/// Layout helper for consistent screen layouts
pub struct Layout;

/// Resolved areas of the dashboard screen
pub struct DashboardAreas {
    pub header: Rect,
    pub stats: Option<Rect>,
    pub filter: Option<Rect>,
    pub logs: Rect,
    pub status: Rect,
}

impl Layout {
    /// Dashboard layout: header, optional stats panel, optional filter
    /// bar, log table, status bar
    pub fn dashboard(area: Rect, show_stats: bool, show_filter: bool) -> DashboardAreas {
        let mut constraints = vec![Constraint::Length(3)]; // Header always

        if show_stats {
            constraints.push(Constraint::Length(9)); // Stats panel
        }
        if show_filter {
            constraints.push(Constraint::Length(3)); // Filter bar
        }
        constraints.push(Constraint::Min(1)); // Logs
        constraints.push(Constraint::Length(1)); // Status bar

        let chunks = RatatuiLayout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        let mut idx = 0;
        let header = chunks[idx];
        idx += 1;

        let stats = show_stats.then(|| {
            let rect = chunks[idx];
            idx += 1;
            rect
        });
        let filter = show_filter.then(|| {
            let rect = chunks[idx];
            idx += 1;
            rect
        });

        DashboardAreas {
            header,
            stats,
            filter,
            logs: chunks[idx],
            status: chunks[idx + 1],
        }
    }

    /// Split the stats panel into chart and summary halves
    pub fn stats_panel(area: Rect) -> (Rect, Rect) {
        let chunks = RatatuiLayout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(area);

        (chunks[0], chunks[1])
    }
}
