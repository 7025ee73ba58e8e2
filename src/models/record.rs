use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Subject shown when the source record carries none.
pub const DEFAULT_SUBJECT: &str = "Class";

/// Display format for the `date` field, e.g. "1/15/2026".
pub const DISPLAY_DATE_FORMAT: &str = "%-m/%-d/%Y";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Late => "late",
        }
    }

    /// Case-insensitive parse. Unrecognized values are rejected rather than
    /// coerced; the caller drops the record.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "present" => Some(AttendanceStatus::Present),
            "absent" => Some(AttendanceStatus::Absent),
            "late" => Some(AttendanceStatus::Late),
            _ => None,
        }
    }
}

/// The wire shape shared by both attendance endpoints. Field names and the
/// date encoding vary between them, so everything is optional and aliased.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRecord {
    #[serde(default, alias = "_id", alias = "attendanceId")]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
}

/// The single normalized record shape consumed uniformly after fetch,
/// regardless of which endpoint produced it. Immutable once built; a fresh
/// set is produced on every fetch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: String,
    pub status: AttendanceStatus,
    pub date: String,
    pub timestamp: DateTime<Utc>,
    pub subject: String,
}

impl AttendanceRecord {
    /// Normalizes one raw record. Returns `None` when the status is unknown
    /// or neither `timestamp` nor `date` yields a valid instant; such
    /// records are excluded, never retained with sentinel values.
    ///
    /// Precedence: the instant comes from `timestamp` first, falling back to
    /// `date`; the display date prefers the source `date` string, falling
    /// back to formatting the instant.
    pub fn from_raw(raw: &RawRecord) -> Option<Self> {
        let status = AttendanceStatus::parse(raw.status.as_deref()?)?;

        let timestamp = raw
            .timestamp
            .as_deref()
            .and_then(parse_instant)
            .or_else(|| raw.date.as_deref().and_then(parse_instant))?;

        let date = raw
            .date
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| timestamp.format(DISPLAY_DATE_FORMAT).to_string());

        let id = raw
            .id
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let subject = raw
            .subject
            .clone()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SUBJECT.to_string());

        Some(Self {
            id,
            status,
            date,
            timestamp,
            subject,
        })
    }
}

/// Parses whatever date encoding the service emits: an RFC 3339 timestamp,
/// an ISO calendar day, or a locale-formatted day like "1/15/2026".
/// Bare calendar days are taken as UTC midnight.
pub fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Some(instant.with_timezone(&Utc));
    }

    let day = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%m/%d/%Y"))
        .ok()?;

    day.and_hms_opt(0, 0, 0)
        .map(|midnight| Utc.from_utc_datetime(&midnight))
}
