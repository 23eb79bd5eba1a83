//! Route registration errors
//!
//! Every variant is a setup-time configuration error. Lookups never fail:
//! "not found" and "method not allowed" are ordinary [`crate::Lookup`] results.

use thiserror::Error;

/// Router configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    /// Route path is empty
    #[error("route path cannot be empty")]
    EmptyPath,

    /// Route path does not start with '/'
    #[error("route path must start with '/': {0}")]
    MissingLeadingSlash(String),

    /// A path segment holds more than one ':'
    #[error("only one ':' is allowed in a route path segment: {0}")]
    MultipleParamsInSegment(String),

    /// More than one '*' in the whole path
    #[error("only one '*' is allowed in a route path: {0}")]
    MultipleWildcards(String),

    /// '*' is not the final character
    #[error("'*' can only appear at the end of a route path: {0}")]
    WildcardNotLast(String),

    /// ':' and '*' share the final segment
    #[error("':' and '*' cannot appear in the same route path segment: {0}")]
    ParamBesideWildcard(String),

    /// Two parameters with the same name
    #[error("duplicate parameter name '{name}' in route path: {path}")]
    DuplicateParamName { name: String, path: String },

    /// Same method and (name-erased) path registered twice
    #[error("route already exists: {method} {path}")]
    DuplicateRoute { method: String, path: String },

    /// No handler supplied for the route
    #[error("route handler cannot be missing: {0}")]
    MissingHandler(String),

    /// Method name is not alphanumeric
    #[error("invalid method name: {0:?}")]
    InvalidMethod(String),
}
