use std::sync::{Arc, Weak};

use parking_lot::{Mutex, MutexGuard};

use super::mastery::MasteryMap;
use super::stats::{level_for_xp, SessionStats};
use crate::store::keys::ProfileKeys;
use crate::store::{self, KeyValueStore};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileProgress {
    pub mastery: MasteryMap,
    pub stats: SessionStats,
}

struct Shared {
    progress: Mutex<ProfileProgress>,
    store: Arc<dyn KeyValueStore>,
    keys: ProfileKeys,
}

/// Mastery and stats of one profile, shared by every session open on it.
///
/// Updates run under a single lock and are written through to the store before it is
/// released, so concurrent sessions never overwrite each other's answers.
#[derive(Clone)]
pub struct ProgressHandle {
    shared: Arc<Shared>,
}

impl ProgressHandle {
    pub fn load(store: Arc<dyn KeyValueStore>, keys: ProfileKeys) -> Self {
        let mastery: MasteryMap = store::load_json(store.as_ref(), &keys.mastery());
        let mut stats: SessionStats = store::load_json(store.as_ref(), &keys.stats());
        stats.level = level_for_xp(stats.xp);

        Self {
            shared: Arc::new(Shared {
                progress: Mutex::new(ProfileProgress { mastery, stats }),
                store,
                keys,
            }),
        }
    }

    pub fn profile(&self) -> &str {
        self.shared.keys.profile()
    }

    pub fn lock(&self) -> MutexGuard<'_, ProfileProgress> {
        self.shared.progress.lock()
    }

    pub fn update<T>(&self, apply: impl FnOnce(&mut ProfileProgress) -> T) -> T {
        let mut progress = self.shared.progress.lock();
        let out = apply(&mut progress);
        self.persist(&progress);
        out
    }

    /// Like [`update`](Self::update), but nothing is written when `apply` fails.
    pub fn try_update<T, E>(
        &self,
        apply: impl FnOnce(&mut ProfileProgress) -> Result<T, E>,
    ) -> Result<T, E> {
        let mut progress = self.shared.progress.lock();
        let out = apply(&mut progress)?;
        self.persist(&progress);
        Ok(out)
    }

    pub fn downgrade(&self) -> WeakProgress {
        WeakProgress(Arc::downgrade(&self.shared))
    }

    fn persist(&self, progress: &ProfileProgress) {
        let Shared { store, keys, .. } = self.shared.as_ref();
        if let Err(err) = store::save_json(store.as_ref(), &keys.mastery(), &progress.mastery) {
            tracing::warn!(profile = keys.profile(), error = %err, "failed to persist mastery");
        }
        if let Err(err) = store::save_json(store.as_ref(), &keys.stats(), &progress.stats) {
            tracing::warn!(profile = keys.profile(), error = %err, "failed to persist stats");
        }
    }
}

/// Non-owning reference kept by the session registry; the profile is dropped from
/// memory once its last session goes away.
#[derive(Clone)]
pub struct WeakProgress(Weak<Shared>);

impl WeakProgress {
    pub fn upgrade(&self) -> Option<ProgressHandle> {
        self.0.upgrade().map(|shared| ProgressHandle { shared })
    }
}
