//! Concurrency admission control for remote-mode dispatch.
//!
//! Two bounded counters as counting semaphores: a global in-flight cap and a
//! per-caller cap. Admission acquires the global slot first, then the
//! per-caller slot, both with immediate-reject semantics — overload answers
//! "retry later" instead of queuing without bound. The returned permit
//! releases both slots exactly once when dropped, on every exit path
//! including cancellation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, warn};

/// Immediate admission rejection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdmissionError {
    #[error("Global concurrency limit reached")]
    GlobalSaturated,

    #[error("Caller '{0}' has too many requests in flight")]
    CallerSaturated(String),
}

/// RAII admission slot: holds one global and one per-caller permit.
///
/// Dropping the permit is the release; there is no other release path, so
/// each counter is decremented exactly once regardless of success, error or
/// cancellation.
#[derive(Debug)]
pub struct AdmissionPermit {
    _global: OwnedSemaphorePermit,
    _caller: OwnedSemaphorePermit,
}

/// Admission controller shared by all remote-mode requests.
#[derive(Debug)]
pub struct ConcurrencyGovernor {
    global: Arc<Semaphore>,
    callers: Mutex<HashMap<String, Arc<Semaphore>>>,
    global_capacity: usize,
    per_caller_capacity: usize,
}

impl ConcurrencyGovernor {
    pub fn new(global_capacity: usize, per_caller_capacity: usize) -> Self {
        Self {
            global: Arc::new(Semaphore::new(global_capacity.max(1))),
            callers: Mutex::new(HashMap::new()),
            global_capacity: global_capacity.max(1),
            per_caller_capacity: per_caller_capacity.max(1),
        }
    }

    /// Try to admit one request for `caller_id`.
    ///
    /// Global first, then per-caller; if the per-caller slot is unavailable
    /// the already-acquired global permit is dropped on the error path, so a
    /// saturated caller cannot pin global capacity behind its own backlog.
    pub fn admit(&self, caller_id: &str) -> Result<AdmissionPermit, AdmissionError> {
        let global = self
            .global
            .clone()
            .try_acquire_owned()
            .map_err(|_| AdmissionError::GlobalSaturated)?;

        let caller_sem = self.caller_semaphore(caller_id);
        let caller = caller_sem.try_acquire_owned().map_err(|_| {
            debug!(caller = caller_id, "Per-caller cap reached");
            AdmissionError::CallerSaturated(caller_id.to_string())
        })?;

        let utilization = self.utilization();
        if utilization > 0.9 {
            warn!(
                in_flight = self.in_flight(),
                capacity = self.global_capacity,
                "Governor above 90% utilization"
            );
        }

        Ok(AdmissionPermit {
            _global: global,
            _caller: caller,
        })
    }

    /// Requests currently holding a global slot.
    pub fn in_flight(&self) -> usize {
        self.global_capacity - self.global.available_permits()
    }

    /// Fraction of global capacity in use (load monitor; does not affect
    /// admission decisions).
    pub fn utilization(&self) -> f64 {
        self.in_flight() as f64 / self.global_capacity as f64
    }

    fn caller_semaphore(&self, caller_id: &str) -> Arc<Semaphore> {
        let mut callers = self.callers.lock().unwrap_or_else(|e| e.into_inner());

        // Drop entries for callers with nothing in flight so the map stays
        // bounded by the set of active callers.
        let cap = self.per_caller_capacity;
        callers.retain(|_, sem| Arc::strong_count(sem) > 1 || sem.available_permits() < cap);

        callers
            .entry(caller_id.to_string())
            .or_insert_with(|| Arc::new(Semaphore::new(cap)))
            .clone()
    }
}
