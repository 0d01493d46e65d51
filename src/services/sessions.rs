use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use parking_lot::RwLock;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use uuid::Uuid;

use crate::services::vocab::VocabPayload;
use crate::session::progress::WeakProgress;
use crate::session::{
    Action, AdvanceTicket, MasteryMap, Outcome, ProgressHandle, SessionError, SessionSnapshot,
    SessionStats, SessionView,
};
use crate::store::keys::ProfileKeys;
use crate::store::KeyValueStore;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("session {0} not found")]
    NotFound(Uuid),
    #[error(transparent)]
    Session(#[from] SessionError),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOptions {
    pub profile: Option<String>,
    pub quiz_length: Option<usize>,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub profile: String,
    pub mastery: MasteryMap,
    pub stats: SessionStats,
}

struct HostedSession {
    view: SessionView<StdRng>,
    timer: Option<JoinHandle<()>>,
    last_touched: Instant,
}

impl HostedSession {
    fn touch(&mut self) {
        self.last_touched = Instant::now();
    }

    fn is_idle(&self, ttl: Duration) -> bool {
        self.last_touched.elapsed() >= ttl
    }

    fn cancel_timer(&mut self) {
        if let Some(handle) = self.timer.take() {
            handle.abort();
        }
    }
}

impl Drop for HostedSession {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}

type SessionHandle = Arc<Mutex<HostedSession>>;

/// Live sessions keyed by id, each with at most one pending auto-advance.
///
/// Sessions on the same profile share one [`ProgressHandle`]. Sessions untouched for
/// longer than the idle TTL are dropped by [`sweep_idle`](Self::sweep_idle).
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, SessionHandle>>>,
    profiles: Arc<parking_lot::Mutex<HashMap<String, WeakProgress>>>,
    store: Arc<dyn KeyValueStore>,
    auto_advance: Duration,
    idle_ttl: Duration,
}

impl SessionRegistry {
    pub fn new(store: Arc<dyn KeyValueStore>, auto_advance: Duration, idle_ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            profiles: Arc::new(parking_lot::Mutex::new(HashMap::new())),
            store,
            auto_advance,
            idle_ttl,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    pub fn create(
        &self,
        payload: VocabPayload,
        options: SessionOptions,
        today: NaiveDate,
    ) -> Result<(Uuid, SessionSnapshot), SessionError> {
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let progress = self.profile_progress(ProfileKeys::new(options.profile.as_deref()));
        let mut view = SessionView::open(payload, progress, rng);
        if let Some(length) = options.quiz_length {
            view.apply(Action::SetQuizLength { length }, today)?;
        }

        let id = Uuid::new_v4();
        let snapshot = view.snapshot(today);
        let session = HostedSession {
            view,
            timer: None,
            last_touched: Instant::now(),
        };
        self.sessions
            .write()
            .insert(id, Arc::new(Mutex::new(session)));

        tracing::info!(session_id = %id, profile = %snapshot.profile, words = snapshot.total_count, "session created");
        Ok((id, snapshot))
    }

    pub async fn snapshot(&self, id: Uuid, today: NaiveDate) -> Result<SessionSnapshot, HostError> {
        let session = self.get(id)?;
        let mut guard = session.lock().await;
        guard.touch();
        Ok(guard.view.snapshot(today))
    }

    pub async fn apply(
        &self,
        id: Uuid,
        action: Action,
        today: NaiveDate,
    ) -> Result<(Outcome, SessionSnapshot), HostError> {
        let session = self.get(id)?;
        let mut guard = session.lock().await;
        guard.touch();

        let action_name = action.name();
        let outcome = guard.view.apply(action, today).map_err(|err| {
            tracing::debug!(session_id = %id, action = action_name, error = %err, "action rejected");
            err
        })?;

        if outcome.changed_state() {
            guard.cancel_timer();
        }
        if let Some(ticket) = outcome.auto_advance() {
            if !self.auto_advance.is_zero() {
                guard.timer = Some(self.schedule(id, &session, ticket));
            }
        }

        Ok((outcome, guard.view.snapshot(today)))
    }

    pub fn remove(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().remove(&id);
        if removed.is_some() {
            tracing::info!(session_id = %id, "session removed");
        }
        removed.is_some()
    }

    pub fn progress(&self, profile: Option<&str>) -> Progress {
        let handle = self.profile_progress(ProfileKeys::new(profile));
        let progress = handle.lock();
        Progress {
            profile: handle.profile().to_string(),
            mastery: progress.mastery.clone(),
            stats: progress.stats.clone(),
        }
    }

    /// Drops sessions idle for at least the TTL. Sessions busy with a request are kept.
    pub fn sweep_idle(&self) -> usize {
        if self.idle_ttl.is_zero() {
            return 0;
        }

        let ttl = self.idle_ttl;
        let expired: Vec<(Uuid, SessionHandle)> = {
            let mut sessions = self.sessions.write();
            let ids: Vec<Uuid> = sessions
                .iter()
                .filter(|(_, session)| {
                    session
                        .try_lock()
                        .map(|guard| guard.is_idle(ttl))
                        .unwrap_or(false)
                })
                .map(|(id, _)| *id)
                .collect();
            ids.into_iter()
                .filter_map(|id| sessions.remove(&id).map(|session| (id, session)))
                .collect()
        };

        for (id, _) in &expired {
            tracing::debug!(session_id = %id, "idle session expired");
        }
        expired.len()
    }

    /// Runs [`sweep_idle`](Self::sweep_idle) every `every` until the handle is aborted.
    pub fn spawn_idle_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let started = Instant::now();
                let expired = registry.sweep_idle();
                if expired > 0 {
                    tracing::info!(
                        expired_sessions = expired,
                        active_sessions = registry.len(),
                        duration_ms = started.elapsed().as_millis() as u64,
                        "Session cleanup completed"
                    );
                }
            }
        })
    }

    /// Drops every session, aborting their timers.
    pub fn shutdown(&self) {
        let drained: Vec<SessionHandle> = self.sessions.write().drain().map(|(_, s)| s).collect();
        for session in drained {
            if let Ok(mut guard) = session.try_lock() {
                guard.cancel_timer();
            }
        }
    }

    fn profile_progress(&self, keys: ProfileKeys) -> ProgressHandle {
        let mut profiles = self.profiles.lock();
        profiles.retain(|_, weak| weak.upgrade().is_some());
        if let Some(handle) = profiles.get(keys.profile()).and_then(WeakProgress::upgrade) {
            return handle;
        }

        let profile = keys.profile().to_string();
        let handle = ProgressHandle::load(Arc::clone(&self.store), keys);
        profiles.insert(profile, handle.downgrade());
        handle
    }

    fn get(&self, id: Uuid) -> Result<SessionHandle, HostError> {
        self.sessions
            .read()
            .get(&id)
            .cloned()
            .ok_or(HostError::NotFound(id))
    }

    fn schedule(&self, id: Uuid, session: &SessionHandle, ticket: AdvanceTicket) -> JoinHandle<()> {
        let weak = Arc::downgrade(session);
        let delay = self.auto_advance;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(session) = weak.upgrade() else {
                return;
            };
            let mut guard = session.lock().await;
            if guard.view.on_timer(ticket) {
                guard.timer = None;
                tracing::debug!(session_id = %id, generation = ticket.generation, "auto-advanced");
            }
        })
    }
}
