//! # Dagforge Execution
//!
//! `Execution` — the mutable per-run record tracked by the scheduler — and
//! its status machine. Enforces the disjointness of `node_results` and
//! `node_errors`, and the `completed ⇔ all nodes resolved` invariant, at
//! the point of mutation, so no caller can construct a state that
//! violates either.

pub mod error;
pub mod state;
pub mod status;
pub mod transition;

pub use error::ExecutionError;
pub use state::Execution;
pub use status::ExecutionStatus;
pub use transition::{can_transition, validate_transition};
