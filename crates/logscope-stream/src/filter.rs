use logscope_types::{FilterCriteria, LogEvent};

/// Apply filter criteria to a buffer snapshot.
///
/// Pure and deterministic: conjunctive across all populated fields, input
/// order preserved, no I/O. The buffer is small and bounded, so the result
/// is recomputed in full whenever either input changes rather than diffed
/// incrementally.
pub fn apply_filter(events: &[LogEvent], criteria: &FilterCriteria) -> Vec<LogEvent> {
    if criteria.is_empty() {
        return events.to_vec();
    }

    let needle = criteria.text.as_ref().map(|t| t.to_lowercase());

    events
        .iter()
        .filter(|event| {
            if let Some(level) = criteria.level {
                if event.level != level {
                    return false;
                }
            }
            if let Some(service) = &criteria.service {
                if &event.service != service {
                    return false;
                }
            }
            if let Some(needle) = &needle {
                if !event.message.to_lowercase().contains(needle) {
                    return false;
                }
            }
            true
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use logscope_types::LogLevel;

    fn event(id: u64, level: LogLevel, service: &str, message: &str) -> LogEvent {
        LogEvent {
            id,
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            level,
            service: service.to_string(),
            message: message.to_string(),
        }
    }

    fn sample() -> Vec<LogEvent> {
        vec![
            event(1, LogLevel::Error, "auth", "fail login"),
            event(2, LogLevel::Info, "auth", "ok"),
            event(3, LogLevel::Warn, "payments", "retrying charge"),
        ]
    }

    #[test]
    fn test_empty_criteria_is_identity() {
        let events = sample();
        let result = apply_filter(&events, &FilterCriteria::default());
        assert_eq!(result, events);
    }

    #[test]
    fn test_level_filter_conjunctive() {
        let events = vec![
            event(1, LogLevel::Error, "auth", "fail login"),
            event(2, LogLevel::Info, "auth", "ok"),
        ];
        let criteria = FilterCriteria {
            level: Some(LogLevel::Error),
            ..Default::default()
        };
        let result = apply_filter(&events, &criteria);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, 1);
    }

    #[test]
    fn test_all_fields_must_match() {
        let events = sample();
        let criteria = FilterCriteria {
            level: Some(LogLevel::Error),
            service: Some("payments".to_string()),
            text: None,
        };
        // Event 1 matches the level but not the service
        assert!(apply_filter(&events, &criteria).is_empty());
    }

    #[test]
    fn test_text_filter_case_insensitive() {
        let events = sample();
        let criteria = FilterCriteria {
            text: Some("LOGIN".to_string()),
            ..Default::default()
        };
        let result = apply_filter(&events, &criteria);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].message, "fail login");
    }

    #[test]
    fn test_text_matches_message_only() {
        let events = vec![event(1, LogLevel::Info, "auth", "ok")];
        let criteria = FilterCriteria {
            text: Some("auth".to_string()),
            ..Default::default()
        };
        // "auth" appears in the service, not the message
        assert!(apply_filter(&events, &criteria).is_empty());
    }

    #[test]
    fn test_idempotent_and_order_preserving() {
        let events = sample();
        let criteria = FilterCriteria {
            service: Some("auth".to_string()),
            ..Default::default()
        };
        let once = apply_filter(&events, &criteria);
        let twice = apply_filter(&once, &criteria);
        assert_eq!(once, twice);

        let ids: Vec<u64> = once.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }
}
