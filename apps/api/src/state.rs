use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::Config;
use crate::guard::{CooldownGuard, InFlightGuard};
use crate::models::version::{Version, VersionParent};
use crate::upstream::ApiClient;
use crate::versioning::compare::CompareSelection;
use crate::versioning::optimistic::OptimisticList;
use crate::workspace::SelectionStore;

/// Version lists keyed by `VersionParent::key`, with tentative changes applied.
pub type VersionCache = HashMap<String, OptimisticList<Version>>;

/// Shared application state injected into all route handlers via Axum extractors.
/// Locks are only ever held between `.await` points.
#[derive(Clone)]
pub struct AppState {
    pub upstream: ApiClient,
    pub config: Config,
    /// Pluggable persistence for the selected project. Default: JSON file.
    pub selection_store: Arc<dyn SelectionStore>,
    pub versions: Arc<Mutex<VersionCache>>,
    pub compare: Arc<Mutex<HashMap<String, CompareSelection>>>,
    /// One marketplace transition per version at a time.
    pub transitions: InFlightGuard,
    /// Debounce for destructive actions.
    pub cooldown: CooldownGuard,
}

impl AppState {
    pub fn new(
        upstream: ApiClient,
        config: Config,
        selection_store: Arc<dyn SelectionStore>,
    ) -> Self {
        Self {
            cooldown: CooldownGuard::new(config.delete_cooldown),
            upstream,
            config,
            selection_store,
            versions: Arc::new(Mutex::new(HashMap::new())),
            compare: Arc::new(Mutex::new(HashMap::new())),
            transitions: InFlightGuard::default(),
        }
    }

    pub fn version_cache(&self) -> MutexGuard<'_, VersionCache> {
        self.versions.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn compare_selection(&self, parent: &VersionParent) -> CompareSelection {
        self.compare
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&parent.key())
            .cloned()
            .unwrap_or_default()
    }

    /// Runs `f` against the parent's selection while holding the lock.
    pub fn with_compare_selection<R>(
        &self,
        parent: &VersionParent,
        f: impl FnOnce(&mut CompareSelection) -> R,
    ) -> R {
        let mut all = self.compare.lock().unwrap_or_else(|e| e.into_inner());
        f(all.entry(parent.key()).or_default())
    }
}
