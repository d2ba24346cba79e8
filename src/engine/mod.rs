//! Display-layout reconciliation.
//!
//! The engine is the single owner of session state and of the preference
//! store. It runs on one thread and reacts to [`EngineEvent`]s:
//!
//! - `TopologyChanged` (already debounced): recompute the fingerprint; if it
//!   differs from the last one, look up a saved preference and either move
//!   the Dock or report a new environment.
//! - `SaveOrUpdate` / `Delete`: user edits to the saved preferences. Saving
//!   always re-applies the chosen edge.
//! - `ApplyCompleted`: a Dock move finished on a worker thread.
//!
//! Subscribers are called synchronously on the engine thread after each
//! committed state change.

mod state;

pub use state::{EngineState, Snapshot, Status};

use std::thread::JoinHandle;

use async_channel::Receiver;

use crate::display::{compute_fingerprint, Fingerprint, TopologySource};
use crate::dock::{ActionExecutor, ApplyResult, DockPosition};
use crate::store::{PreferenceStore, Upserted};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    TopologyChanged,
    SaveOrUpdate { name: String, position: DockPosition },
    Delete { index: usize },
    ApplyCompleted {
        position: DockPosition,
        result: ApplyResult,
    },
    Shutdown,
}

pub type Subscriber = Box<dyn FnMut(&Snapshot) + Send>;

pub struct ReconciliationEngine {
    state: EngineState,
    store: PreferenceStore,
    topology: Box<dyn TopologySource>,
    executor: ActionExecutor,
    subscribers: Vec<Subscriber>,
}

impl ReconciliationEngine {
    /// Captures the current fingerprint without applying anything.
    pub fn new(
        store: PreferenceStore,
        topology: Box<dyn TopologySource>,
        executor: ActionExecutor,
    ) -> Self {
        let fingerprint = compute_fingerprint(&topology.displays());
        log::info!("Initial display fingerprint: {:?}", fingerprint.as_str());
        Self {
            state: EngineState::new(fingerprint),
            store,
            topology,
            executor,
            subscribers: Vec::new(),
        }
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn status(&self) -> Status {
        self.state.status
    }

    pub fn current_fingerprint(&self) -> &Fingerprint {
        &self.state.current_fingerprint
    }

    pub fn store(&self) -> &PreferenceStore {
        &self.store
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            fingerprint: self.state.current_fingerprint.clone(),
            status: self.state.status,
            current: self.store.find(&self.state.current_fingerprint).cloned(),
            preferences: self.store.entries().to_vec(),
        }
    }

    /// Registers `subscriber` and immediately hands it the current snapshot.
    pub fn subscribe(&mut self, mut subscriber: Subscriber) {
        subscriber(&self.snapshot());
        self.subscribers.push(subscriber);
    }

    /// Processes one event. Returns `false` once the engine should stop.
    pub fn handle(&mut self, event: EngineEvent) -> bool {
        let changed = match event {
            EngineEvent::TopologyChanged => self.on_topology_changed(),
            EngineEvent::SaveOrUpdate { name, position } => {
                self.save_or_update(&name, position);
                true
            }
            EngineEvent::Delete { index } => self.delete(index),
            EngineEvent::ApplyCompleted { position, result } => {
                self.executor.complete(&mut self.state, position, result);
                true
            }
            EngineEvent::Shutdown => {
                log::info!("Engine shutting down");
                return false;
            }
        };

        if changed {
            self.notify();
        }
        true
    }

    /// Reconciles against the current topology. Returns whether state changed.
    pub fn on_topology_changed(&mut self) -> bool {
        let fingerprint = compute_fingerprint(&self.topology.displays());
        if fingerprint == self.state.current_fingerprint {
            log::debug!("Display change with unchanged fingerprint, skipping");
            return false;
        }

        log::info!(
            "Display fingerprint changed from {:?} to {:?}",
            self.state.current_fingerprint.as_str(),
            fingerprint.as_str()
        );
        self.state.current_fingerprint = fingerprint;

        match self.store.find(&self.state.current_fingerprint) {
            Some(preference) => {
                log::info!(
                    "Matched saved layout '{}' -> {}",
                    preference.name,
                    preference.position
                );
                let position = preference.position;
                self.executor.apply(position);
                self.state.status = Status::Switched(position);
            }
            None => {
                log::info!("No saved layout for this display arrangement");
                self.state.status = Status::NewEnvironment;
            }
        }
        true
    }

    /// Saves `position` for the current layout and applies it right away.
    pub fn save_or_update(&mut self, name: &str, position: DockPosition) {
        let fingerprint = self.state.current_fingerprint.clone();
        self.state.status = match self.store.upsert(fingerprint, name, position) {
            Upserted::Inserted => Status::Saved,
            Upserted::Updated => Status::Updated,
        };
        self.executor.apply(position);
    }

    /// Deletes the saved layout at `index`. Returns whether anything was removed.
    pub fn delete(&mut self, index: usize) -> bool {
        match self.store.delete(index) {
            Some(removed) => {
                log::info!("Deleted saved layout '{}'", removed.name);
                true
            }
            None => false,
        }
    }

    fn notify(&mut self) {
        if self.subscribers.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        for subscriber in &mut self.subscribers {
            subscriber(&snapshot);
        }
    }

    /// Drains `events` until `Shutdown` or until every sender is gone.
    pub fn run(mut self, events: Receiver<EngineEvent>) {
        while let Ok(event) = events.recv_blocking() {
            if !self.handle(event) {
                break;
            }
        }
    }

    /// Moves the engine onto its own thread.
    pub fn spawn(self, events: Receiver<EngineEvent>) -> std::io::Result<JoinHandle<()>> {
        std::thread::Builder::new()
            .name("engine".into())
            .spawn(move || self.run(events))
    }
}
