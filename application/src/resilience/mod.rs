//! Resilience components guarding the remote path.
//!
//! One [`CircuitBreaker`] instance exists per remote dependency name for the
//! process lifetime, and one [`ConcurrencyGovernor`] bounds all remote-mode
//! dispatch. Both are shared mutable state with internal synchronization,
//! injected into the pipeline rather than reached as globals.

pub mod circuit_breaker;
pub mod governor;

pub use circuit_breaker::{BreakerConfig, BreakerError, CircuitBreaker, CircuitState, GuardedCall};
pub use governor::{AdmissionError, AdmissionPermit, ConcurrencyGovernor};
