//! Test generation domain

mod requested;
mod test_case;

pub use requested::{Coerced, RequestedType, ValueCoercionWarning};
pub use test_case::{
    ExpectedBehavior, SkipStats, SynthesisWarning, TestCase, TestInput, TestSuite,
};
