//! SMT infrastructure: translation, backends, pooling, caching, adapter

mod adapter;
mod cache;
mod pool;
pub mod solvers;
mod translate;

pub use adapter::{AdapterStats, SolverAdapter};
pub use cache::{CacheHit, CacheKey, SolveCache};
pub use pool::{SolverLease, SolverPool};
pub use solvers::{IntervalSolver, SolverBackend};
pub use translate::{translate, Membership, Translation};
