use logscope_types::{ChartSeries, StatsSnapshot};

/// Derive a labeled bar series from the per-level counts of a snapshot.
///
/// The label set is exactly whatever level keys the server reported; no
/// fixed INFO/WARN/ERROR triple is assumed. Order is the map's key order,
/// so it is deterministic across renders.
pub fn project_levels(stats: &StatsSnapshot) -> ChartSeries {
    let (labels, values) = stats
        .per_level
        .iter()
        .map(|(label, count)| (label.clone(), *count))
        .unzip();

    ChartSeries { labels, values }
}
