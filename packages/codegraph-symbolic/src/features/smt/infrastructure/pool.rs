//! Solver pool
//!
//! Backends are checked out for the duration of one `explore()` call and
//! returned by the lease's `Drop`, including on early return and unwinding.

use super::solvers::{IntervalSolver, SolverBackend};
use crate::features::smt::domain::SolverError;
use crate::shared::{CancellationToken, Deadline};
use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How often a blocked checkout re-reads its cancellation token
const CANCEL_POLL: Duration = Duration::from_millis(25);

type Factory = Box<dyn Fn() -> Box<dyn SolverBackend> + Send + Sync>;

pub struct SolverPool {
    idle: Mutex<Vec<Box<dyn SolverBackend>>>,
    available: Condvar,
    capacity: usize,
    factory: Factory,
}

impl fmt::Debug for SolverPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolverPool")
            .field("capacity", &self.capacity)
            .field("idle", &self.idle.lock().len())
            .finish()
    }
}

impl SolverPool {
    /// Pool of `size` interval solvers
    pub fn new(size: usize) -> Self {
        Self::with_factory(size, || Box::new(IntervalSolver::new()))
    }

    pub fn with_factory<F>(size: usize, factory: F) -> Self
    where
        F: Fn() -> Box<dyn SolverBackend> + Send + Sync + 'static,
    {
        let idle = (0..size).map(|_| factory()).collect();
        Self {
            idle: Mutex::new(idle),
            available: Condvar::new(),
            capacity: size,
            factory: Box::new(factory),
        }
    }

    /// A pool with no backends: every checkout fails
    pub fn unavailable() -> Self {
        Self::new(0)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn idle_count(&self) -> usize {
        self.idle.lock().len()
    }

    /// Wait up to `wait` for a free backend
    pub fn checkout(self: &Arc<Self>, wait: Duration) -> Result<SolverLease, SolverError> {
        if self.capacity == 0 {
            return Err(SolverError::Unavailable(
                "solver pool has no backends".to_string(),
            ));
        }
        let deadline = Instant::now() + wait;
        let mut idle = self.idle.lock();
        loop {
            if let Some(backend) = idle.pop() {
                return Ok(SolverLease {
                    backend: Some(backend),
                    pool: Arc::clone(self),
                });
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(SolverError::Unavailable(format!(
                    "no solver became free within {}ms",
                    wait.as_millis()
                )));
            }
            self.available.wait_for(&mut idle, deadline - now);
        }
    }

    /// Wait for a free backend until `deadline` passes or `cancel` fires.
    ///
    /// Contention is not unavailability: a busy pool only fails the checkout
    /// with `Timeout` or `Cancelled`, never `Unavailable`.
    pub fn checkout_until(
        self: &Arc<Self>,
        deadline: &Deadline,
        cancel: &CancellationToken,
    ) -> Result<SolverLease, SolverError> {
        if self.capacity == 0 {
            return Err(SolverError::Unavailable(
                "solver pool has no backends".to_string(),
            ));
        }
        let started = Instant::now();
        let mut idle = self.idle.lock();
        loop {
            if let Some(backend) = idle.pop() {
                return Ok(SolverLease {
                    backend: Some(backend),
                    pool: Arc::clone(self),
                });
            }
            if cancel.is_cancelled() {
                return Err(SolverError::Cancelled);
            }
            let slice = match deadline.remaining() {
                Some(left) if left.is_zero() => {
                    return Err(SolverError::Timeout {
                        elapsed_ms: started.elapsed().as_millis() as u64,
                    })
                }
                Some(left) => left.min(CANCEL_POLL),
                None => CANCEL_POLL,
            };
            self.available.wait_for(&mut idle, slice);
        }
    }

    fn checkin(&self, backend: Box<dyn SolverBackend>) {
        self.idle.lock().push(backend);
        self.available.notify_one();
    }
}

/// Exclusive use of one pooled backend
pub struct SolverLease {
    backend: Option<Box<dyn SolverBackend>>,
    pool: Arc<SolverPool>,
}

impl fmt::Debug for SolverLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolverLease")
            .field("backend", &self.backend.as_ref().map(|b| b.name()))
            .finish()
    }
}

impl SolverLease {
    pub fn backend_mut(&mut self) -> Option<&mut (dyn SolverBackend + 'static)> {
        self.backend.as_deref_mut()
    }

    pub fn name(&self) -> &'static str {
        self.backend.as_ref().map_or("none", |b| b.name())
    }

    /// Swap in a fresh backend after a crash left the current one suspect
    pub fn reset(&mut self) {
        self.backend = Some((self.pool.factory)());
    }
}

impl Drop for SolverLease {
    fn drop(&mut self) {
        if let Some(backend) = self.backend.take() {
            self.pool.checkin(backend);
        }
    }
}
