//! `nodes` crate: the node catalogue shared by validation and simulation.
//!
//! Node types form a closed set known at build time. Each one resolves to a
//! [`NodeDefinition`] carrying its category, output shape and the
//! configuration it needs before a workflow may go live.

pub mod error;
pub mod kind;
pub mod registry;

pub use error::NodeError;
pub use kind::{Category, Handle, NodeKind, OutputShape};
pub use registry::{catalog, required_fields, resolve, NodeDefinition, RequiredField};
