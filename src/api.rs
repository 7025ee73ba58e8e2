use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

pub const DEFAULT_BASE_URL: &str = "https://portal-production-26b9.up.railway.app";

/// Bounded request lifetime; the only cancellation mechanism for in-flight
/// requests.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of a successful login: the two identifiers plus the full profile
/// payload, which is cached locally as an opaque blob.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub primary_id: String,
    pub short_id: Option<String>,
    pub profile: Value,
}

#[derive(Debug, Deserialize)]
struct LoginEnvelope {
    success: bool,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

/// Remote portal surface. Attendance lookups return the raw JSON payload;
/// both endpoints wrap their records differently and normalization is shared
/// downstream.
#[async_trait]
pub trait PortalApi: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome>;
    async fn attendance_by_short_id(&self, short_id: &str) -> Result<Value>;
    async fn attendance_by_object_id(&self, object_id: &str) -> Result<Value>;
}

pub struct HttpPortalClient {
    client: Client,
    base_url: String,
}

impl HttpPortalClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_env() -> Result<Self> {
        let base_url =
            std::env::var("PORTAL_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(base_url)
    }

    async fn get_json(&self, path: &str) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?
            .error_for_status()?;

        response
            .json()
            .await
            .context("response body was not valid JSON")
    }
}

#[async_trait]
impl PortalApi for HttpPortalClient {
    async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome> {
        let url = format!("{}/api/login", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;

        // Failure responses carry their message in the body, so parse it
        // before checking the status.
        let envelope: LoginEnvelope = response
            .json()
            .await
            .context("login response was not valid JSON")?;

        if !envelope.success {
            return Err(anyhow!(envelope
                .error
                .unwrap_or_else(|| "login failed".to_string())));
        }

        let profile = envelope
            .data
            .ok_or_else(|| anyhow!("login succeeded but returned no profile"))?;
        let primary_id = profile
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| anyhow!("login profile is missing the student id"))?;
        let short_id = profile
            .get("studentId")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        Ok(LoginOutcome {
            primary_id,
            short_id,
            profile,
        })
    }

    async fn attendance_by_short_id(&self, short_id: &str) -> Result<Value> {
        self.get_json(&format!("/api/student-attendance-join/{short_id}"))
            .await
    }

    async fn attendance_by_object_id(&self, object_id: &str) -> Result<Value> {
        self.get_json(&format!("/api/attendance/objectId/{object_id}"))
            .await
    }
}
