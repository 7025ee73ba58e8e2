use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use crate::filter::{DateRange, FilterPreset};
use crate::models::{AttendanceRecord, AttendanceStatus};

/// Filter flow state machine: starts Unfiltered; applying a preset or an
/// explicit range moves to the corresponding applied state; clearing moves
/// back to Unfiltered. The screen's lifetime governs the machine's lifetime,
/// so there is no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "value")]
pub enum FilterState {
    Unfiltered,
    PresetApplied(FilterPreset),
    RangeApplied(DateRange),
}

impl Default for FilterState {
    fn default() -> Self {
        FilterState::Unfiltered
    }
}

impl FilterState {
    /// The concrete range to filter with, with presets resolved against the
    /// given current day.
    pub fn active_range(&self, today: NaiveDate) -> Option<DateRange> {
        match self {
            FilterState::Unfiltered => None,
            FilterState::PresetApplied(preset) => Some(preset.range_from(today)),
            FilterState::RangeApplied(range) => Some(*range),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PortalState {
    pub records: Vec<AttendanceRecord>,
    pub filter: FilterState,
    pub loading: bool,
    pub refreshing: bool,
    pub error: Option<String>,
    pub needs_login: bool,
    pub profile: Option<Value>,
}

/// Snapshot handed to the presentation layer after every operation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortalSnapshot {
    pub records: Vec<AttendanceRecord>,
    pub filter: FilterState,
    pub loading: bool,
    pub refreshing: bool,
    pub error: Option<String>,
    pub needs_login: bool,
    pub profile: Option<Value>,
    pub total_count: usize,
    pub present_count: usize,
    pub absent_count: usize,
}

impl PortalState {
    pub fn snapshot(&self) -> PortalSnapshot {
        let count = |status: AttendanceStatus| {
            self.records
                .iter()
                .filter(|record| record.status == status)
                .count()
        };

        PortalSnapshot {
            total_count: self.records.len(),
            present_count: count(AttendanceStatus::Present),
            absent_count: count(AttendanceStatus::Absent),
            records: self.records.clone(),
            filter: self.filter,
            loading: self.loading,
            refreshing: self.refreshing,
            error: self.error.clone(),
            needs_login: self.needs_login,
            profile: self.profile.clone(),
        }
    }
}
