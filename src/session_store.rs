use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{fs, path::PathBuf, sync::RwLock};

use crate::models::StudentSession;

/// On-disk shape. The profile blob is kept as raw JSON text so a corrupt
/// blob can be dropped on load without invalidating the identifiers stored
/// next to it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedSession {
    short_id: Option<String>,
    primary_id: Option<String>,
    profile: Option<String>,
}

/// JSON-file-backed store for the three session fields. Every mutation
/// rewrites the whole file, so save and clear are atomic from the caller's
/// perspective: a subsequent `load` never observes a partial state.
pub struct SessionStore {
    path: PathBuf,
    data: RwLock<PersistedSession>,
}

impl SessionStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read session from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            PersistedSession::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    /// Reconstructs the session, tolerating any subset of fields being
    /// absent. A profile blob that fails to parse is dropped with a warning;
    /// the identifiers are still returned, so a malformed cached profile
    /// never blocks fetching attendance.
    pub fn load(&self) -> StudentSession {
        let guard = self.data.read().unwrap();

        let profile = guard
            .profile
            .as_deref()
            .and_then(|blob| match serde_json::from_str(blob) {
                Ok(value) => Some(value),
                Err(err) => {
                    warn!("Dropping unparseable cached profile: {err}");
                    None
                }
            });

        StudentSession {
            short_id: guard.short_id.clone(),
            primary_id: guard.primary_id.clone(),
            profile,
        }
    }

    pub fn save(
        &self,
        short_id: Option<String>,
        primary_id: Option<String>,
        profile: Option<&Value>,
    ) -> Result<()> {
        let mut guard = self.data.write().unwrap();
        guard.short_id = short_id;
        guard.primary_id = primary_id;
        guard.profile = profile.map(Value::to_string);
        self.persist(&guard)
    }

    /// Removes all three fields in one file rewrite.
    pub fn clear(&self) -> Result<()> {
        let mut guard = self.data.write().unwrap();
        *guard = PersistedSession::default();
        self.persist(&guard)
    }

    fn persist(&self, data: &PersistedSession) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write session to {}", self.path.display()))
    }
}
