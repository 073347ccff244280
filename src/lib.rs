//! N-Queens Search Library
//!
//! Enumerates every placement of N non-attacking queens by brute force: each
//! index in `0..N!` is decoded into a permutation of columns and checked for
//! diagonal conflicts. The index space is split statically across worker
//! ranks, and a coordinator rank collects every rank's results in rank order.

pub mod board;
pub mod channel;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod partition;
pub mod permutation;
pub mod persistence;
pub mod solver;
pub mod validator;

pub use config::SearchConfig;
pub use coordinator::{run_search, RunReport};
pub use error::{QueensError, Result};
