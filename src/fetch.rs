use log::{info, warn};
use serde_json::Value;

use crate::api::PortalApi;
use crate::models::{AttendanceRecord, RawRecord};
use crate::resolver::{EndpointFamily, ResolutionPlan};

/// Executes a resolution plan: walks the steps in order, advancing past any
/// step that fails (transport error, non-success status, unusable payload),
/// and normalizes the first usable payload. Exhausting the plan degrades to
/// an empty list rather than an error; an outage and genuinely empty
/// attendance present the same empty state to the UI, which offers a manual
/// retry either way.
pub async fn fetch_attendance(api: &dyn PortalApi, plan: &ResolutionPlan) -> Vec<AttendanceRecord> {
    for step in plan.steps() {
        let response = match step.endpoint {
            EndpointFamily::ShortIdJoin => api.attendance_by_short_id(&step.identifier).await,
            EndpointFamily::ObjectIdDirect => api.attendance_by_object_id(&step.identifier).await,
        };

        let payload = match response {
            Ok(payload) => payload,
            Err(err) => {
                warn!(
                    "{:?} lookup for '{}' failed: {err:#}",
                    step.endpoint, step.identifier
                );
                continue;
            }
        };

        if payload.get("success").and_then(Value::as_bool) == Some(false) {
            warn!(
                "{:?} lookup for '{}' reported failure",
                step.endpoint, step.identifier
            );
            continue;
        }

        match record_container(&payload) {
            Some(raw) => {
                let records = normalize_records(raw);
                info!(
                    "Normalized {} of {} records via {:?}",
                    records.len(),
                    raw.len(),
                    step.endpoint
                );
                return records;
            }
            None => {
                warn!(
                    "{:?} lookup for '{}' returned no recognizable record container",
                    step.endpoint, step.identifier
                );
                continue;
            }
        }
    }

    Vec::new()
}

/// The join endpoint nests records under `attendances`, the direct endpoint
/// under `attendance`; accept those, a generic `records` field, or a bare
/// top-level array.
fn record_container(payload: &Value) -> Option<&Vec<Value>> {
    if let Some(records) = payload.as_array() {
        return Some(records);
    }

    ["attendances", "attendance", "records"]
        .iter()
        .find_map(|key| payload.get(key).and_then(Value::as_array))
}

/// Shared normalization routine for every endpoint's payload. Malformed
/// records are excluded; input order (descending by recency as served) is
/// preserved.
pub fn normalize_records(raw: &[Value]) -> Vec<AttendanceRecord> {
    raw.iter()
        .filter_map(|value| serde_json::from_value::<RawRecord>(value.clone()).ok())
        .filter_map(|raw| AttendanceRecord::from_raw(&raw))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::api::LoginOutcome;
    use crate::models::StudentSession;
    use crate::resolver::build_plan;

    /// Canned responses per endpoint; `None` simulates a failed request.
    #[derive(Default)]
    struct FakeApi {
        join_response: Option<Value>,
        direct_response: Option<Value>,
        join_calls: AtomicUsize,
        direct_calls: AtomicUsize,
    }

    #[async_trait]
    impl PortalApi for FakeApi {
        async fn login(&self, _email: &str, _password: &str) -> Result<LoginOutcome> {
            Err(anyhow!("not used"))
        }

        async fn attendance_by_short_id(&self, _short_id: &str) -> Result<Value> {
            self.join_calls.fetch_add(1, Ordering::SeqCst);
            self.join_response
                .clone()
                .ok_or_else(|| anyhow!("join endpoint down"))
        }

        async fn attendance_by_object_id(&self, _object_id: &str) -> Result<Value> {
            self.direct_calls.fetch_add(1, Ordering::SeqCst);
            self.direct_response
                .clone()
                .ok_or_else(|| anyhow!("object id endpoint down"))
        }
    }

    fn session(short_id: Option<&str>, primary_id: Option<&str>) -> StudentSession {
        StudentSession {
            short_id: short_id.map(Into::into),
            primary_id: primary_id.map(Into::into),
            profile: None,
        }
    }

    #[tokio::test]
    async fn empty_plan_returns_empty_without_issuing_requests() {
        let api = FakeApi::default();
        let plan = build_plan(&session(None, None));

        let records = fetch_attendance(&api, &plan).await;

        assert!(records.is_empty());
        assert_eq!(api.join_calls.load(Ordering::SeqCst), 0);
        assert_eq!(api.direct_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn join_payload_is_normalized() {
        let api = FakeApi {
            join_response: Some(json!({
                "success": true,
                "attendances": [
                    {"attendanceId": "a1", "status": "present", "timestamp": "2026-01-10T09:00:00Z"},
                    {"attendanceId": "a2", "status": "absent", "date": "1/1/2026"}
                ]
            })),
            ..FakeApi::default()
        };
        let plan = build_plan(&session(Some("9"), None));

        let records = fetch_attendance(&api, &plan).await;

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "a1");
        assert_eq!(records[1].date, "1/1/2026");
        assert_eq!(api.direct_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn falls_back_to_object_id_when_join_fails() {
        let api = FakeApi {
            join_response: None,
            direct_response: Some(json!({
                "success": true,
                "attendance": [
                    {"id": "a1", "status": "late", "timestamp": "2026-01-10T09:00:00Z"}
                ]
            })),
            ..FakeApi::default()
        };
        let plan = build_plan(&session(Some("9"), Some("abc")));

        let records = fetch_attendance(&api, &plan).await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "a1");
        assert_eq!(api.join_calls.load(Ordering::SeqCst), 1);
        assert_eq!(api.direct_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn success_false_payload_advances_to_next_step() {
        let api = FakeApi {
            join_response: Some(json!({"success": false, "error": "Student not found"})),
            direct_response: Some(json!({"success": true, "attendance": []})),
            ..FakeApi::default()
        };
        let plan = build_plan(&session(Some("9"), Some("abc")));

        let records = fetch_attendance(&api, &plan).await;

        assert!(records.is_empty());
        assert_eq!(api.direct_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn payload_without_container_advances_to_next_step() {
        let api = FakeApi {
            join_response: Some(json!({"success": true, "student": {}})),
            direct_response: Some(json!({
                "success": true,
                "attendance": [
                    {"id": "a1", "status": "present", "date": "2026-01-10"}
                ]
            })),
            ..FakeApi::default()
        };
        let plan = build_plan(&session(Some("9"), Some("abc")));

        let records = fetch_attendance(&api, &plan).await;
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn all_steps_exhausted_degrades_to_empty() {
        let api = FakeApi::default();
        let plan = build_plan(&session(Some("9"), Some("abc")));

        let records = fetch_attendance(&api, &plan).await;

        assert!(records.is_empty());
        assert_eq!(api.join_calls.load(Ordering::SeqCst), 1);
        assert_eq!(api.direct_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn bare_array_payload_is_accepted() {
        let api = FakeApi {
            join_response: Some(json!([
                {"id": "a1", "status": "present", "timestamp": "2026-01-10T09:00:00Z"}
            ])),
            ..FakeApi::default()
        };
        let plan = build_plan(&session(Some("9"), None));

        let records = fetch_attendance(&api, &plan).await;
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn malformed_records_are_excluded_not_fatal() {
        let api = FakeApi {
            join_response: Some(json!({
                "success": true,
                "attendances": [
                    {"id": "a1", "status": "excused", "timestamp": "2026-01-10T09:00:00Z"},
                    {"id": "a2", "status": "present"},
                    {"id": "a3", "status": "present", "timestamp": "2026-01-09T09:00:00Z"}
                ]
            })),
            ..FakeApi::default()
        };
        let plan = build_plan(&session(Some("9"), None));

        let records = fetch_attendance(&api, &plan).await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "a3");
    }
}
