use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::models::AttendanceRecord;

/// Inclusive calendar-day range. Boundary normalization happens at
/// comparison time: `start` widens to the first instant of its day and `end`
/// to the last, so callers may pass days derived from "now" without losing
/// same-day records to a sub-day time offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn single_day(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    fn start_instant(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.start.and_hms_opt(0, 0, 0).expect("valid midnight"))
    }

    fn end_instant(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(
            &self
                .end
                .and_hms_milli_opt(23, 59, 59, 999)
                .expect("valid end of day"),
        )
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start_instant() && instant <= self.end_instant()
    }
}

/// Named relative ranges, all computed against the start of the current
/// calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterPreset {
    Today,
    Yesterday,
    LastWeek,
    Last2Weeks,
    LastMonth,
    ThisMonth,
}

impl FilterPreset {
    /// Unrecognized names resolve to no preset; the caller falls back to an
    /// unset range.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "today" => Some(FilterPreset::Today),
            "yesterday" => Some(FilterPreset::Yesterday),
            "lastWeek" => Some(FilterPreset::LastWeek),
            "last2Weeks" => Some(FilterPreset::Last2Weeks),
            "lastMonth" => Some(FilterPreset::LastMonth),
            "thisMonth" => Some(FilterPreset::ThisMonth),
            _ => None,
        }
    }

    pub fn range_from(&self, today: NaiveDate) -> DateRange {
        match self {
            FilterPreset::Today => DateRange::single_day(today),
            FilterPreset::Yesterday => DateRange::single_day(today - Duration::days(1)),
            FilterPreset::LastWeek => DateRange {
                start: today - Duration::days(7),
                end: today,
            },
            FilterPreset::Last2Weeks => DateRange {
                start: today - Duration::days(14),
                end: today,
            },
            FilterPreset::LastMonth => DateRange {
                start: today - Duration::days(30),
                end: today,
            },
            FilterPreset::ThisMonth => DateRange {
                start: today.with_day(1).expect("first of month"),
                end: today,
            },
        }
    }
}

/// Single order-preserving pass over the canonical records; `None` leaves
/// the list untouched.
pub fn filter_records(
    records: &[AttendanceRecord],
    range: Option<&DateRange>,
) -> Vec<AttendanceRecord> {
    match range {
        None => records.to_vec(),
        Some(range) => records
            .iter()
            .filter(|record| range.contains(record.timestamp))
            .cloned()
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AttendanceStatus;

    fn day(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn record(id: &str, timestamp: &str) -> AttendanceRecord {
        let timestamp = crate::models::record::parse_instant(timestamp).unwrap();
        AttendanceRecord {
            id: id.into(),
            status: AttendanceStatus::Present,
            date: timestamp.format("%-m/%-d/%Y").to_string(),
            timestamp,
            subject: "Class".into(),
        }
    }

    #[test]
    fn preset_table_for_fixed_today() {
        let today = day(2026, 1, 15);

        assert_eq!(
            FilterPreset::Today.range_from(today),
            DateRange::single_day(today)
        );
        assert_eq!(
            FilterPreset::Yesterday.range_from(today),
            DateRange::single_day(day(2026, 1, 14))
        );
        assert_eq!(
            FilterPreset::LastWeek.range_from(today),
            DateRange {
                start: day(2026, 1, 8),
                end: today
            }
        );
        assert_eq!(
            FilterPreset::Last2Weeks.range_from(today),
            DateRange {
                start: day(2026, 1, 1),
                end: today
            }
        );
        assert_eq!(
            FilterPreset::LastMonth.range_from(today),
            DateRange {
                start: day(2025, 12, 16),
                end: today
            }
        );
        assert_eq!(
            FilterPreset::ThisMonth.range_from(today),
            DateRange {
                start: day(2026, 1, 1),
                end: today
            }
        );
    }

    #[test]
    fn unknown_preset_name_resolves_to_none() {
        assert_eq!(FilterPreset::from_name("lastYear"), None);
        assert_eq!(FilterPreset::from_name(""), None);
        assert_eq!(
            FilterPreset::from_name("lastWeek"),
            Some(FilterPreset::LastWeek)
        );
    }

    #[test]
    fn single_day_range_includes_both_boundary_instants() {
        let range = DateRange::single_day(day(2026, 1, 15));

        let last_second = record("a", "2026-01-15T23:59:59Z");
        let next_midnight = record("b", "2026-01-16T00:00:00Z");
        let first_instant = record("c", "2026-01-15T00:00:00Z");

        let kept = filter_records(
            &[last_second.clone(), next_midnight, first_instant.clone()],
            Some(&range),
        );
        assert_eq!(kept, vec![last_second, first_instant]);
    }

    #[test]
    fn unset_range_returns_all_records_unchanged() {
        let records = vec![record("a", "2026-01-15T12:00:00Z"), record("b", "2020-06-01")];
        assert_eq!(filter_records(&records, None), records);
    }

    #[test]
    fn filtering_preserves_input_order() {
        let records = vec![
            record("newest", "2026-01-14T10:00:00Z"),
            record("older", "2026-01-12T10:00:00Z"),
            record("oldest", "2026-01-10T10:00:00Z"),
        ];
        let range = DateRange {
            start: day(2026, 1, 10),
            end: day(2026, 1, 14),
        };

        let kept = filter_records(&records, Some(&range));
        let ids: Vec<_> = kept.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["newest", "older", "oldest"]);
    }

    #[test]
    fn filtering_twice_with_the_same_range_is_idempotent() {
        let records = vec![
            record("a", "2026-01-14T10:00:00Z"),
            record("b", "2026-01-01T10:00:00Z"),
        ];
        let range = DateRange {
            start: day(2026, 1, 10),
            end: day(2026, 1, 15),
        };

        let once = filter_records(&records, Some(&range));
        let twice = filter_records(&once, Some(&range));
        assert_eq!(once, twice);
    }

    #[test]
    fn last_week_preset_keeps_only_recent_records() {
        // Records dated 2026-01-10 (present) and 2026-01-01 (absent), with
        // today = 2026-01-12, must reduce to the 2026-01-10 record.
        let records = vec![record("recent", "2026-01-10"), record("old", "2026-01-01")];
        let range = FilterPreset::LastWeek.range_from(day(2026, 1, 12));

        let kept = filter_records(&records, Some(&range));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "recent");
    }
}
