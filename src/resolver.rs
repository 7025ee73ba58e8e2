use crate::models::StudentSession;

/// Which remote lookup a resolution step addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointFamily {
    /// Join lookup by the human-assigned short code. The server resolves the
    /// code to the student record and returns joined attendance in one round
    /// trip, so this is preferred when available.
    ShortIdJoin,
    /// Direct lookup by the database-assigned object id. Addresses the
    /// record without a server-side secondary lookup; the reliable fallback.
    ObjectIdDirect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionStep {
    pub endpoint: EndpointFamily,
    pub identifier: String,
}

/// Ordered fallback plan for one fetch. Built fresh from the current session
/// contents on every fetch and never persisted. A zero-step plan is legal:
/// it means "no identity", which yields an empty result set, not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionPlan {
    steps: Vec<ResolutionStep>,
}

impl ResolutionPlan {
    pub fn steps(&self) -> &[ResolutionStep] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Pure function of the session contents; no I/O. Step order is fixed:
/// short-id join first when present, then the object-id direct lookup.
pub fn build_plan(session: &StudentSession) -> ResolutionPlan {
    let mut steps = Vec::new();

    if let Some(short_id) = non_empty(&session.short_id) {
        steps.push(ResolutionStep {
            endpoint: EndpointFamily::ShortIdJoin,
            identifier: short_id,
        });
    }
    if let Some(primary_id) = non_empty(&session.primary_id) {
        steps.push(ResolutionStep {
            endpoint: EndpointFamily::ObjectIdDirect,
            identifier: primary_id,
        });
    }

    ResolutionPlan { steps }
}

// Identifiers are persisted as empty strings by some older clients; treat
// those the same as absent.
fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
