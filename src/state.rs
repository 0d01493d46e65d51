use std::sync::Arc;
use std::time::{Instant, SystemTime};

use crate::config::Config;
use crate::services::sessions::SessionRegistry;
use crate::services::vocab::VocabFetcher;
use crate::store::KeyValueStore;

#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    started_at_system: SystemTime,
    config: Arc<Config>,
    fetcher: Arc<VocabFetcher>,
    sessions: SessionRegistry,
}

impl AppState {
    pub fn new(config: Config, fetcher: VocabFetcher, store: Arc<dyn KeyValueStore>) -> Self {
        let sessions = SessionRegistry::new(store, config.auto_advance, config.session_idle);
        Self {
            started_at: Instant::now(),
            started_at_system: SystemTime::now(),
            config: Arc::new(config),
            fetcher: Arc::new(fetcher),
            sessions,
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn started_at_system(&self) -> SystemTime {
        self.started_at_system
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn fetcher(&self) -> Arc<VocabFetcher> {
        Arc::clone(&self.fetcher)
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }
}
