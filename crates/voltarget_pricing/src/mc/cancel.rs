//! Cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared abort flag checked by the simulation before every path.
///
/// Clones share the same flag.
///
/// # Examples
///
/// ```rust
/// use voltarget_pricing::mc::CancellationToken;
///
/// let token = CancellationToken::new();
/// let handle = token.clone();
/// assert!(!token.is_cancelled());
/// handle.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates an un-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Stop condition for one pricing run: the token plus an optional deadline.
#[derive(Clone, Debug)]
pub struct RunBudget {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl RunBudget {
    /// Budget with no deadline.
    pub fn unbounded(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Budget expiring `ms` milliseconds from now, if given.
    pub fn with_time_limit(token: CancellationToken, ms: Option<u64>) -> Self {
        Self {
            token,
            deadline: ms.map(|ms| Instant::now() + Duration::from_millis(ms)),
        }
    }

    /// Whether simulation should stop before the next path.
    #[inline]
    pub fn should_stop(&self) -> bool {
        if self.token.is_cancelled() {
            return true;
        }
        match self.deadline {
            Some(deadline) => Instant::now() >= deadline,
            None => false,
        }
    }
}
