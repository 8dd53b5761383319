//! # Dagforge Registry
//!
//! The node-type registry: maps a `type` string to a node factory and its
//! static metadata. Decouples the scheduler from what nodes actually do —
//! it treats `execute` as an opaque, timed, asynchronous computation.

pub mod error;
pub mod factory;
pub mod metadata;
pub mod registry;

pub use error::RegistryError;
pub use factory::{NodeError, NodeFactory, NodeInstance};
pub use metadata::{InputCount, NodeMetadata};
pub use registry::NodeRegistry;
