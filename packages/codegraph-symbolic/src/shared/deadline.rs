//! Deadlines and cooperative cancellation
//!
//! Exploration never spawns watchdog threads. Instead every long-running loop
//! polls a `Deadline` (wall clock) and a `CancellationToken` (caller intent)
//! between units of work.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Wall-clock budget. `None` inside means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    /// A deadline that never expires
    pub fn never() -> Self {
        Self { at: None }
    }

    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now().checked_add(budget),
        }
    }

    /// `0` means unbounded (matches capability snapshot semantics)
    pub fn from_millis(ms: u64) -> Self {
        if ms == 0 {
            Self::never()
        } else {
            Self::after(Duration::from_millis(ms))
        }
    }

    pub fn is_expired(&self) -> bool {
        match self.at {
            Some(at) => Instant::now() >= at,
            None => false,
        }
    }

    /// Time left, `None` when unbounded
    pub fn remaining(&self) -> Option<Duration> {
        self.at
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    pub fn is_bounded(&self) -> bool {
        self.at.is_some()
    }

    /// Whichever of the two expires first
    pub fn earliest(self, other: Deadline) -> Deadline {
        match (self.at, other.at) {
            (Some(a), Some(b)) => Deadline { at: Some(a.min(b)) },
            (Some(_), None) => self,
            (None, _) => other,
        }
    }
}

impl Default for Deadline {
    fn default() -> Self {
        Self::never()
    }
}

/// Shared cancellation flag, cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_never_does_not_expire() {
        let d = Deadline::never();
        assert!(!d.is_expired());
        assert_eq!(d.remaining(), None);
        assert_eq!(Deadline::from_millis(0), Deadline::never());
    }

    #[test]
    fn test_zero_budget_expires_immediately() {
        let d = Deadline::after(Duration::ZERO);
        assert!(d.is_expired());
        assert_eq!(d.remaining(), Some(Duration::ZERO));
    }

    #[test]
    fn test_earliest_picks_tighter_bound() {
        let tight = Deadline::after(Duration::ZERO);
        let loose = Deadline::after(Duration::from_secs(3600));
        assert!(tight.earliest(loose).is_expired());
        assert!(loose.earliest(tight).is_expired());
        assert!(Deadline::never().earliest(tight).is_expired());
        assert!(!Deadline::never().earliest(Deadline::never()).is_bounded());
    }

    #[test]
    fn test_cancellation_is_shared_between_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
