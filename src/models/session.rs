use serde::Serialize;
use serde_json::Value;

/// The locally persisted identity: a human-assigned short code, the
/// database-assigned object id, and the cached profile returned at login.
/// Any subset may be absent; a session with neither identifier is expired.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSession {
    pub short_id: Option<String>,
    pub primary_id: Option<String>,
    pub profile: Option<Value>,
}

impl StudentSession {
    pub fn has_identity(&self) -> bool {
        self.short_id.is_some() || self.primary_id.is_some()
    }
}
