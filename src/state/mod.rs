//! Shared application state and the campaign runtime.

/// Campaign record and derived helpers.
pub mod campaign;
/// Connected client registry.
pub mod hub;
/// Pure campaign state machine.
pub mod state_machine;
/// Lock-holding drivers around the state machine, including the tick loop.
pub mod transitions;

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use tokio::sync::{Mutex, RwLock, watch};

use crate::{
    config::AppConfig,
    dao::{campaign_store::CampaignStore, models::LiveStateEntity},
    error::ServiceError,
    state::campaign::CampaignState,
};

pub use self::hub::{ClientHub, ClientKind, ServerEvent};
use self::state_machine::CampaignMachine;

/// Handle shared by every route, service and background task.
pub type SharedState = Arc<AppState>;

/// Central application state: the campaign machine, connected clients and the store handle.
pub struct AppState {
    store: RwLock<Option<Arc<dyn CampaignStore>>>,
    degraded: watch::Sender<bool>,
    hub: ClientHub,
    machine: Mutex<CampaignMachine>,
    persisted: watch::Sender<Option<LiveStateEntity>>,
    bootstrapped: AtomicBool,
    config: Arc<AppConfig>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a store is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        let (persisted_tx, _rx) = watch::channel(None);
        Arc::new(Self {
            store: RwLock::new(None),
            degraded: degraded_tx,
            hub: ClientHub::new(),
            machine: Mutex::new(CampaignMachine::new(config.defaults().clone())),
            persisted: persisted_tx,
            bootstrapped: AtomicBool::new(false),
            config: Arc::new(config),
        })
    }

    /// Obtain a handle to the current store, if one is installed.
    pub async fn store(&self) -> Option<Arc<dyn CampaignStore>> {
        let guard = self.store.read().await;
        guard.as_ref().cloned()
    }

    /// Store handle, or [`ServiceError::Degraded`] while none is usable.
    pub async fn require_store(&self) -> Result<Arc<dyn CampaignStore>, ServiceError> {
        if self.is_degraded() {
            return Err(ServiceError::Degraded);
        }
        self.store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new store implementation and leave degraded mode.
    pub async fn set_store(&self, store: Arc<dyn CampaignStore>) {
        {
            let mut guard = self.store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update the degraded flag, notifying watchers only when it changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }

    /// Registry of clients receiving state and tick broadcasts.
    pub fn hub(&self) -> &ClientHub {
        &self.hub
    }

    /// The campaign machine. Holding the lock is what makes an operation atomic.
    pub fn machine(&self) -> &Mutex<CampaignMachine> {
        &self.machine
    }

    /// Loaded application configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Length of one campaign "second".
    pub fn tick_interval(&self) -> Duration {
        self.config.tick_interval()
    }

    /// Hand the latest record to the background writer; older unsaved values are replaced.
    pub fn persist(&self, record: &CampaignState) {
        self.persisted
            .send_replace(Some(LiveStateEntity::from(record)));
    }

    /// Subscribe to records awaiting persistence.
    pub fn persisted_watcher(&self) -> watch::Receiver<Option<LiveStateEntity>> {
        self.persisted.subscribe()
    }

    /// Whether the first installed store has been seeded and recovered from.
    pub fn is_bootstrapped(&self) -> bool {
        self.bootstrapped.load(Ordering::Acquire)
    }

    pub(crate) fn mark_bootstrapped(&self) {
        self.bootstrapped.store(true, Ordering::Release);
    }
}
