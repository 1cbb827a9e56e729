//! Registry-level error type.

use thiserror::Error;

/// Errors returned by registry lookups.
///
/// A lookup miss is a data error in the workflow document, never a crash:
/// callers surface it as a validation error on the offending node.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NodeError {
    /// The `type` string does not name any node in the catalogue.
    #[error("unknown node type '{0}'")]
    UnknownType(String),

    /// The `category` string is not one of the five known categories.
    #[error("unknown node category '{0}'")]
    UnknownCategory(String),
}
