//! Polling waits.
//!
//! Every wait in Pagewright is a blocking spin on the caller's thread: a
//! predicate is evaluated, and between evaluations the thread sleeps for the
//! lesser of the remaining time and the poll interval. A wait therefore never
//! overshoots its timeout by more than one predicate evaluation.

use crate::result::{PagewrightError, PagewrightResult};
use std::time::{Duration, Instant};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for wait operations (30 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 30_000;

/// Default polling interval for `spin_wait` (1 second)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

// =============================================================================
// WAIT RESULT
// =============================================================================

/// Result of a wait operation
#[derive(Debug, Clone)]
pub struct WaitResult {
    /// Whether the condition was satisfied
    pub success: bool,
    /// Time spent waiting
    pub elapsed: Duration,
    /// Description of what was waited for
    pub waited_for: String,
}

// =============================================================================
// WAITER
// =============================================================================

/// A single wait with a fixed budget.
///
/// The clock starts when the waiter is created, so chained `wait_for` calls
/// share one budget. Once a condition fails, later `wait_for` calls are
/// skipped and the waiter stays unsatisfied.
///
/// ```ignore
/// let waiter = Waiter::with_timeout(Duration::from_secs(5), Duration::from_millis(100))
///     .wait_for(|| page_ready());
/// waiter.ensure_satisfied("page did not become ready")?;
/// ```
#[derive(Debug, Clone)]
pub struct Waiter {
    timeout: Duration,
    poll_interval: Duration,
    started: Instant,
    satisfied: bool,
}

impl Waiter {
    /// Start a waiter with the given budget and poll interval
    #[must_use]
    pub fn with_timeout(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
            started: Instant::now(),
            satisfied: true,
        }
    }

    /// Start a waiter from options
    #[must_use]
    pub fn from_options(options: &WaitOptions) -> Self {
        Self::with_timeout(options.timeout(), options.poll_interval())
    }

    /// Evaluate `condition` until it holds or the budget is spent
    #[must_use]
    pub fn wait_for<F>(mut self, mut condition: F) -> Self
    where
        F: FnMut() -> bool,
    {
        if !self.satisfied {
            return self;
        }

        while !condition() {
            let remaining = self.timeout.saturating_sub(self.started.elapsed());
            if remaining.is_zero() {
                self.satisfied = false;
                break;
            }
            std::thread::sleep(remaining.min(self.poll_interval));
        }

        self
    }

    /// Whether every condition so far was satisfied
    #[must_use]
    pub const fn is_satisfied(&self) -> bool {
        self.satisfied
    }

    /// Time since the waiter started
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Fail with [`PagewrightError::Timeout`] when unsatisfied
    pub fn ensure_satisfied(&self, message: &str) -> PagewrightResult<()> {
        if self.satisfied {
            Ok(())
        } else {
            Err(PagewrightError::Timeout {
                ms: self.timeout.as_millis() as u64,
                message: message.to_string(),
            })
        }
    }

    /// Convert into a [`WaitResult`]
    #[must_use]
    pub fn into_result(self, waited_for: impl Into<String>) -> WaitResult {
        WaitResult {
            success: self.satisfied,
            elapsed: self.started.elapsed(),
            waited_for: waited_for.into(),
        }
    }
}

// =============================================================================
// CONVENIENCE FUNCTIONS
// =============================================================================

/// Spin until `condition` holds; `false` once `timeout` is spent
pub fn spin_wait<F>(condition: F, timeout: Duration, poll_interval: Duration) -> bool
where
    F: FnMut() -> bool,
{
    Waiter::with_timeout(timeout, poll_interval)
        .wait_for(condition)
        .is_satisfied()
}

/// Spin until `condition` holds, failing with `message` on timeout
pub fn spin_wait_ensure_satisfied<F>(
    condition: F,
    timeout: Duration,
    poll_interval: Duration,
    message: &str,
) -> PagewrightResult<()>
where
    F: FnMut() -> bool,
{
    Waiter::with_timeout(timeout, poll_interval)
        .wait_for(condition)
        .ensure_satisfied(message)
}

/// Wait for a condition with the default poll interval
pub fn wait_until<F>(predicate: F, timeout_ms: u64) -> PagewrightResult<()>
where
    F: FnMut() -> bool,
{
    let options = WaitOptions::new().with_timeout(timeout_ms);
    Waiter::from_options(&options)
        .wait_for(predicate)
        .ensure_satisfied("condition was not satisfied")
}

/// Run a fallible action and report only whether it succeeded
pub fn try_action<T, E, F>(action: F) -> bool
where
    F: FnOnce() -> Result<T, E>,
{
    action().is_ok()
}

/// Turn a fallible action into a predicate usable with [`spin_wait`]
pub fn make_try<T, E, F>(mut action: F) -> impl FnMut() -> bool
where
    F: FnMut() -> Result<T, E>,
{
    move || action().is_ok()
}
