//! Load-once availability gate for a shared automaton.
//!
//! States: `Unloaded -> Loading -> Ready` on success (terminal) and
//! `Unloaded -> Loading -> Unloaded` on failure (the next call retries).
//! Callers that arrive while a load is running join that attempt and receive
//! its outcome; they never start a second load.

mod source;

pub use source::{AutomatonSource, BinaryFileSource, PatternSource};

use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, OnceLock, PoisonError};
use std::thread;

use tracing::{debug, debug_span, info, warn};

use crate::automaton::{Automaton, AutomatonError};
use crate::matcher::{Match, MatchOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Unloaded,
    Loading,
    Ready,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum GateError {
    /// The source failed. Every caller that joined the attempt gets a clone.
    #[error("automaton data unavailable (attempt {attempt}): {source}")]
    DataUnavailable {
        attempt: u64,
        source: Arc<AutomatonError>,
    },

    /// Scanning was requested before the gate became ready.
    #[error("automaton not ready")]
    NotReady,
}

/// One load attempt, shared by every caller that arrives while it runs.
struct InFlight {
    attempt: u64,
    outcome: OnceLock<Result<Arc<Automaton>, GateError>>,
}

#[derive(Default)]
struct Slot {
    in_flight: Option<Arc<InFlight>>,
    attempts: u64,
}

pub struct AutomatonGate {
    source: Box<dyn AutomatonSource>,
    ready: OnceLock<Arc<Automaton>>,
    slot: Mutex<Slot>,
    settled: Condvar,
}

impl AutomatonGate {
    pub fn new(source: impl AutomatonSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            ready: OnceLock::new(),
            slot: Mutex::new(Slot::default()),
            settled: Condvar::new(),
        }
    }

    /// Non-blocking availability check.
    pub fn is_ready(&self) -> bool {
        self.ready.get().is_some()
    }

    pub fn state(&self) -> GateState {
        if self.is_ready() {
            return GateState::Ready;
        }
        if self.lock_slot().in_flight.is_some() {
            GateState::Loading
        } else {
            GateState::Unloaded
        }
    }

    /// Number of load attempts started so far.
    pub fn load_count(&self) -> u64 {
        self.lock_slot().attempts
    }

    /// The loaded automaton, or `NotReady`.
    pub fn automaton(&self) -> Result<Arc<Automaton>, GateError> {
        self.ready.get().cloned().ok_or(GateError::NotReady)
    }

    /// Scan with the loaded automaton. Calling this before the gate is ready
    /// is a sequencing bug in the host; it returns `NotReady` rather than
    /// loading implicitly.
    pub fn find_matches(
        &self,
        text: &str,
        options: &MatchOptions<'_>,
    ) -> Result<Vec<Match>, GateError> {
        let automaton = self.automaton()?;
        Ok(automaton.find_matches_with(text, options))
    }

    /// Block until the automaton is available, loading it if nobody else is.
    pub fn ensure_ready(&self) -> Result<Arc<Automaton>, GateError> {
        if let Some(automaton) = self.ready.get() {
            return Ok(Arc::clone(automaton));
        }

        let mut slot = self.lock_slot();
        if let Some(automaton) = self.ready.get() {
            return Ok(Arc::clone(automaton));
        }

        if let Some(flight) = slot.in_flight.clone() {
            debug!(attempt = flight.attempt, "joining in-flight load");
            while flight.outcome.get().is_none() {
                slot = self
                    .settled
                    .wait(slot)
                    .unwrap_or_else(PoisonError::into_inner);
            }
            return flight.outcome.get().cloned().unwrap_or(Err(GateError::NotReady));
        }

        slot.attempts += 1;
        let flight = Arc::new(InFlight {
            attempt: slot.attempts,
            outcome: OnceLock::new(),
        });
        slot.in_flight = Some(Arc::clone(&flight));
        drop(slot);

        let outcome = self.run_load(flight.attempt);

        let mut slot = self.lock_slot();
        if let Ok(automaton) = &outcome {
            let _ = self.ready.set(Arc::clone(automaton));
        }
        slot.in_flight = None;
        let _ = flight.outcome.set(outcome.clone());
        drop(slot);
        self.settled.notify_all();
        outcome
    }

    /// Start loading on a named worker thread and return immediately, so a
    /// host can keep rendering plain text until `is_ready()` flips.
    pub fn load_in_background(
        self: &Arc<Self>,
    ) -> io::Result<thread::JoinHandle<Result<Arc<Automaton>, GateError>>> {
        let gate = Arc::clone(self);
        thread::Builder::new()
            .name("kolink-loader".into())
            .spawn(move || gate.ensure_ready())
    }

    fn run_load(&self, attempt: u64) -> Result<Arc<Automaton>, GateError> {
        let description = self.source.describe();
        let _span = debug_span!("load_automaton", attempt, source = %description).entered();

        let result = panic::catch_unwind(AssertUnwindSafe(|| self.source.load()))
            .unwrap_or_else(|_| Err(AutomatonError::Source("loader panicked".to_string())));

        match result {
            Ok(automaton) => {
                let stats = automaton.stats();
                info!(
                    attempt,
                    source = %description,
                    nodes = stats.node_count,
                    patterns = stats.pattern_count,
                    "automaton ready"
                );
                Ok(Arc::new(automaton))
            }
            Err(e) => {
                warn!(attempt, source = %description, error = %e, "automaton load failed");
                Err(GateError::DataUnavailable {
                    attempt,
                    source: Arc::new(e),
                })
            }
        }
    }

    fn lock_slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for AutomatonGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutomatonGate")
            .field("source", &self.source.describe())
            .field("state", &self.state())
            .finish()
    }
}
