//! Circuit breaker for remote dependencies.
//!
//! Three states: `Closed` passes calls through while recording outcomes in a
//! count-based rolling window; `Open` fails every call immediately for a
//! cooldown interval; `HalfOpen` lets exactly one probe through — success
//! closes the circuit and resets the window, failure re-opens it.
//!
//! One instance per distinct remote dependency, shared across all concurrent
//! requests to that dependency. All state lives behind one internal mutex.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CircuitState {
    /// Calls pass through; outcomes are recorded.
    #[default]
    Closed,
    /// Calls fail fast without touching the dependency.
    Open,
    /// A single probe call is testing recovery.
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
            CircuitState::HalfOpen => write!(f, "half-open"),
        }
    }
}

/// Breaker tuning parameters.
#[derive(Debug, Clone)]
pub struct BreakerConfig {
    /// Rolling window length (last N recorded calls).
    pub window_size: usize,
    /// Outcomes required in the window before the rate is evaluated.
    /// Prevents tripping on the very first call.
    pub min_samples: usize,
    /// Failure rate (0.0 to 1.0) at or above which the circuit opens.
    pub failure_rate_threshold: f64,
    /// How long an open circuit waits before allowing a probe.
    pub cooldown: Duration,
    /// How long a half-open probe may stay unresolved before its slot is
    /// reclaimed (covers probes whose caller was cancelled mid-flight).
    pub probe_timeout: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            window_size: 16,
            min_samples: 5,
            failure_rate_threshold: 0.5,
            cooldown: Duration::from_secs(30),
            probe_timeout: Duration::from_secs(10),
        }
    }
}

/// Rejection returned without touching the dependency.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Circuit breaker '{0}' is open")]
pub struct BreakerError(pub String);

/// Outcome of [`CircuitBreaker::call`].
#[derive(Error, Debug)]
pub enum GuardedCall<E> {
    /// The breaker rejected the call without attempting it.
    #[error(transparent)]
    Open(#[from] BreakerError),
    /// The dependency did not answer within the timeout.
    #[error("Call timed out")]
    Timeout,
    /// The dependency answered with an error.
    #[error("Dependency error: {0}")]
    Inner(E),
}

#[derive(Debug, Default)]
struct BreakerInner {
    state: CircuitState,
    /// Rolling outcome window, `true` = success.
    window: VecDeque<bool>,
    opened_at: Option<Instant>,
    probe_started: Option<Instant>,
}

impl BreakerInner {
    fn failure_rate(&self) -> f64 {
        if self.window.is_empty() {
            return 0.0;
        }
        let failures = self.window.iter().filter(|ok| !**ok).count();
        failures as f64 / self.window.len() as f64
    }
}

/// Fail-fast gate around one remote dependency.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: BreakerConfig,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: BreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(BreakerInner::default()),
        }
    }

    pub fn with_defaults(name: impl Into<String>) -> Self {
        Self::new(name, BreakerConfig::default())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ask permission to attempt one call. Sub-millisecond; never touches
    /// the dependency. An `Ok` must be followed by exactly one
    /// [`record_success`](Self::record_success) or
    /// [`record_failure`](Self::record_failure) unless the call was
    /// abandoned (the probe slot self-heals after `probe_timeout`).
    pub fn acquire(&self) -> Result<(), BreakerError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        match inner.state {
            CircuitState::Closed => Ok(()),
            CircuitState::Open => {
                let elapsed = inner
                    .opened_at
                    .map(|at| at.elapsed())
                    .unwrap_or(Duration::ZERO);
                if elapsed >= self.config.cooldown {
                    info!(breaker = %self.name, "Cooldown elapsed, transitioning to half-open");
                    inner.state = CircuitState::HalfOpen;
                    inner.probe_started = Some(Instant::now());
                    Ok(())
                } else {
                    Err(BreakerError(self.name.clone()))
                }
            }
            CircuitState::HalfOpen => match inner.probe_started {
                None => {
                    inner.probe_started = Some(Instant::now());
                    Ok(())
                }
                Some(started) if started.elapsed() >= self.config.probe_timeout => {
                    debug!(breaker = %self.name, "Abandoned probe slot reclaimed");
                    inner.probe_started = Some(Instant::now());
                    Ok(())
                }
                Some(_) => Err(BreakerError(self.name.clone())),
            },
        }
    }

    /// Record a successful call.
    pub fn record_success(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        match inner.state {
            CircuitState::Closed => {
                Self::push_outcome(&mut inner, self.config.window_size, true);
            }
            CircuitState::HalfOpen => {
                info!(breaker = %self.name, "Probe succeeded, closing circuit");
                inner.state = CircuitState::Closed;
                inner.window.clear();
                inner.opened_at = None;
                inner.probe_started = None;
            }
            CircuitState::Open => {
                // A call admitted before the trip can finish late; ignore.
            }
        }
    }

    /// Record a failed or timed-out call.
    pub fn record_failure(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        match inner.state {
            CircuitState::Closed => {
                Self::push_outcome(&mut inner, self.config.window_size, false);
                if inner.window.len() >= self.config.min_samples
                    && inner.failure_rate() >= self.config.failure_rate_threshold
                {
                    warn!(
                        breaker = %self.name,
                        failure_rate = inner.failure_rate(),
                        "Failure rate over threshold, opening circuit"
                    );
                    inner.state = CircuitState::Open;
                    inner.opened_at = Some(Instant::now());
                }
            }
            CircuitState::HalfOpen => {
                warn!(breaker = %self.name, "Probe failed, re-opening circuit");
                inner.state = CircuitState::Open;
                inner.opened_at = Some(Instant::now());
                inner.probe_started = None;
            }
            CircuitState::Open => {}
        }
    }

    /// Current state (for tests and load monitoring).
    pub fn state(&self) -> CircuitState {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).state
    }

    /// Force the circuit open (operational kill switch, test support).
    pub fn force_open(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        warn!(breaker = %self.name, "Circuit forced open");
        inner.state = CircuitState::Open;
        inner.opened_at = Some(Instant::now());
        inner.probe_started = None;
    }

    /// Guard an async operation: acquire, run under `timeout`, record.
    pub async fn call<T, E, Fut>(
        &self,
        timeout: Duration,
        operation: Fut,
    ) -> Result<T, GuardedCall<E>>
    where
        Fut: Future<Output = Result<T, E>>,
    {
        self.acquire()?;
        match tokio::time::timeout(timeout, operation).await {
            Ok(Ok(value)) => {
                self.record_success();
                Ok(value)
            }
            Ok(Err(error)) => {
                self.record_failure();
                Err(GuardedCall::Inner(error))
            }
            Err(_) => {
                self.record_failure();
                Err(GuardedCall::Timeout)
            }
        }
    }

    fn push_outcome(inner: &mut BreakerInner, window_size: usize, ok: bool) {
        inner.window.push_back(ok);
        while inner.window.len() > window_size {
            inner.window.pop_front();
        }
    }
}
