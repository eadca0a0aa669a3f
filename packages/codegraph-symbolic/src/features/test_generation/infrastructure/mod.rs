//! Test generation infrastructure

mod boundary;
mod coercion;
mod equivalence;
mod render;
mod synthesizer;

pub use boundary::{BoundaryPlanner, BoundaryValue};
pub use coercion::{coerce, coerce_native};
pub use equivalence::{Counterexample, EquivalenceChecker, EquivalenceReport};
pub use synthesizer::{inputs_for, TestSynthesizer};
