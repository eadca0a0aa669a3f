//! Feature slices
//!
//! Each slice follows the same hexagonal split: `domain` holds plain data,
//! `ports`/`application` hold traits and use cases, `infrastructure` holds
//! the implementations.

pub mod parsing;
pub mod smt;
pub mod symbolic;
pub mod test_generation;
