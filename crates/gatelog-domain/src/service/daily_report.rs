//! Per-day summary of the checkpoint log

use chrono::{NaiveDate, TimeZone};
use serde::Serialize;

use gatelog_types::{Direction, LogEntry, VehicleType};

/// Counts shown on the daily report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DailySummary {
    pub date: Option<NaiveDate>,
    pub total: usize,
    pub internal: usize,
    pub visitor: usize,
    pub entries_in: usize,
    pub entries_out: usize,
}

/// Entries whose timestamp falls on `day` in `tz`, newest first
pub fn entries_for_day<'a, Tz: TimeZone>(
    entries: &'a [LogEntry],
    day: NaiveDate,
    tz: &Tz,
) -> Vec<&'a LogEntry> {
    let mut selected: Vec<_> = entries
        .iter()
        .filter(|e| e.timestamp.with_timezone(tz).date_naive() == day)
        .collect();
    selected.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    selected
}

pub fn summarize_day<Tz: TimeZone>(entries: &[LogEntry], day: NaiveDate, tz: &Tz) -> DailySummary {
    let selected = entries_for_day(entries, day, tz);
    let count_type = |t: VehicleType| selected.iter().filter(|e| e.vehicle_type == t).count();
    let count_dir = |d: Direction| selected.iter().filter(|e| e.direction == d).count();

    DailySummary {
        date: Some(day),
        total: selected.len(),
        internal: count_type(VehicleType::Internal),
        visitor: count_type(VehicleType::Visitor),
        entries_in: count_dir(Direction::In),
        entries_out: count_dir(Direction::Out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    fn entry(id: &str, at: &str, direction: Direction, vehicle_type: VehicleType) -> LogEntry {
        let mut e = LogEntry::new(format!("plate-{}", id), direction, vehicle_type);
        e.id = id.to_string();
        e.timestamp = at.parse().unwrap();
        e
    }

    fn sample() -> Vec<LogEntry> {
        vec![
            entry("a", "2024-05-01T08:00:00Z", Direction::In, VehicleType::Internal),
            entry("b", "2024-05-01T12:30:00Z", Direction::In, VehicleType::Visitor),
            entry("c", "2024-05-01T17:45:00Z", Direction::Out, VehicleType::Visitor),
            entry("d", "2024-05-02T09:00:00Z", Direction::Out, VehicleType::Internal),
        ]
    }

    #[test]
    fn test_summary_counts() {
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let summary = summarize_day(&sample(), day, &Utc);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.internal, 1);
        assert_eq!(summary.visitor, 2);
        assert_eq!(summary.entries_in, 2);
        assert_eq!(summary.entries_out, 1);
    }

    #[test]
    fn test_entries_newest_first() {
        let entries = sample();
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let ids: Vec<_> = entries_for_day(&entries, day, &Utc)
            .iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_day_boundary_follows_timezone() {
        // 17:45Z is already 2 May in UTC+7
        let bangkok = FixedOffset::east_opt(7 * 3600).unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        let summary = summarize_day(&sample(), day, &bangkok);
        assert_eq!(summary.total, 2);
    }

    #[test]
    fn test_empty_log() {
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let summary = summarize_day(&[], day, &Utc);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.date, Some(day));
    }
}
