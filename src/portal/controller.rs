use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use anyhow::Result;
use chrono::{Local, NaiveDate};
use log::{error, info, warn};
use tokio::sync::Mutex;

use crate::{
    api::PortalApi,
    fetch::fetch_attendance,
    filter::{filter_records, DateRange, FilterPreset},
    resolver::build_plan,
    session_store::SessionStore,
};

use super::state::{FilterState, PortalSnapshot, PortalState};

const SESSION_EXPIRED_MESSAGE: &str = "Session expired, please log in again";

/// Drives the fetch+filter flow behind the command surface. Cloneable;
/// all clones share the same state, store, and request generation counter.
#[derive(Clone)]
pub struct PortalController {
    state: Arc<Mutex<PortalState>>,
    store: Arc<SessionStore>,
    api: Arc<dyn PortalApi>,
    /// Monotonic fetch generation. A finished fetch whose generation is no
    /// longer the latest issued is stale and must not overwrite newer
    /// results. Logout and session expiry also advance it, so an in-flight
    /// fetch cannot repopulate a state that was just reset.
    generation: Arc<AtomicU64>,
    /// Current calendar day used to resolve presets; swappable in tests.
    today: fn() -> NaiveDate,
}

fn current_day() -> NaiveDate {
    Local::now().date_naive()
}

impl PortalController {
    pub fn new(store: Arc<SessionStore>, api: Arc<dyn PortalApi>) -> Self {
        Self {
            state: Arc::new(Mutex::new(PortalState::default())),
            store,
            api,
            generation: Arc::new(AtomicU64::new(0)),
            today: current_day,
        }
    }

    #[cfg(test)]
    fn with_today(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub async fn snapshot(&self) -> PortalSnapshot {
        self.state.lock().await.snapshot()
    }

    /// Authenticates against the portal and persists the returned session.
    /// On failure any partial session is cleared so the next launch does not
    /// resume from half-written identity.
    pub async fn login(&self, email: &str, password: &str) -> Result<PortalSnapshot> {
        let email = email.trim().to_lowercase();
        let password = password.trim();

        match self.api.login(&email, password).await {
            Ok(outcome) => {
                self.store.save(
                    outcome.short_id.clone(),
                    Some(outcome.primary_id.clone()),
                    Some(&outcome.profile),
                )?;

                {
                    let mut state = self.state.lock().await;
                    state.needs_login = false;
                    state.error = None;
                    state.profile = Some(outcome.profile.clone());
                }

                info!("Logged in as {email}");
                Ok(self.refresh_attendance(false).await)
            }
            Err(err) => {
                if let Err(clear_err) = self.store.clear() {
                    error!("Failed to clear session after login error: {clear_err:#}");
                }
                Err(err)
            }
        }
    }

    /// App-start entry point: reads the persisted session and, when an
    /// identity is present, runs the initial fetch. With neither identifier
    /// the session is expired: the store is cleared and the UI is told to
    /// re-authenticate.
    pub async fn load_session(&self) -> PortalSnapshot {
        let session = self.store.load();

        if !session.has_identity() {
            return self.expire_session().await;
        }

        {
            let mut state = self.state.lock().await;
            state.needs_login = false;
            state.profile = session.profile.clone();
        }

        self.refresh_attendance(false).await
    }

    /// Re-runs the fetch+filter pass against the current session and filter
    /// state. Fetch failures degrade to an empty list; a result arriving
    /// after a newer pass has started is discarded instead of overwriting
    /// the newer outcome.
    pub async fn refresh_attendance(&self, is_refresh: bool) -> PortalSnapshot {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let session = self.store.load();
        let plan = build_plan(&session);

        if plan.is_empty() {
            return self.expire_session().await;
        }

        {
            let mut state = self.state.lock().await;
            if is_refresh {
                state.refreshing = true;
            } else {
                state.loading = true;
            }
            state.error = None;
        }

        let records = fetch_attendance(self.api.as_ref(), &plan).await;

        let mut state = self.state.lock().await;
        if generation != self.generation.load(Ordering::SeqCst) {
            info!("Discarding stale fetch result (generation {generation})");
            return state.snapshot();
        }

        let range = state.filter.active_range((self.today)());
        state.records = filter_records(&records, range.as_ref());
        state.loading = false;
        state.refreshing = false;
        state.snapshot()
    }

    /// Applies a named preset and re-runs the pass. Unknown names clear the
    /// filter rather than erroring.
    pub async fn apply_preset(&self, name: &str) -> PortalSnapshot {
        let next = match FilterPreset::from_name(name) {
            Some(preset) => FilterState::PresetApplied(preset),
            None => {
                warn!("Unknown filter preset '{name}', clearing filter");
                FilterState::Unfiltered
            }
        };
        self.state.lock().await.filter = next;
        self.refresh_attendance(false).await
    }

    pub async fn apply_range(&self, start: NaiveDate, end: NaiveDate) -> PortalSnapshot {
        self.state.lock().await.filter = FilterState::RangeApplied(DateRange { start, end });
        self.refresh_attendance(false).await
    }

    pub async fn clear_filter(&self) -> PortalSnapshot {
        self.state.lock().await.filter = FilterState::Unfiltered;
        self.refresh_attendance(false).await
    }

    /// A stale session is less harmful than trapping the user, so a failed
    /// store clear is logged and logout proceeds regardless.
    pub async fn logout(&self) -> PortalSnapshot {
        // Invalidate any fetch still in flight; its result must not
        // repopulate the logged-out state.
        self.generation.fetch_add(1, Ordering::SeqCst);

        if let Err(err) = self.store.clear() {
            error!("Failed to clear session on logout: {err:#}");
        }

        let mut state = self.state.lock().await;
        *state = PortalState::default();
        state.needs_login = true;
        info!("Logged out, session cleared");
        state.snapshot()
    }

    async fn expire_session(&self) -> PortalSnapshot {
        self.generation.fetch_add(1, Ordering::SeqCst);

        if let Err(err) = self.store.clear() {
            error!("Failed to clear expired session: {err:#}");
        }

        let mut state = self.state.lock().await;
        *state = PortalState::default();
        state.needs_login = true;
        state.error = Some(SESSION_EXPIRED_MESSAGE.to_string());
        state.snapshot()
    }
}
