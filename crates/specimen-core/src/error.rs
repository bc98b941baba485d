//! Error types for specimen resolution
//!
//! Provides the error taxonomy shared by every builder:
//! - Unresolved requests (every builder declined)
//! - Recursive requests caught by a recursion guard
//! - Failures raised by user constructors and factories
//! - Typed exits that do not match the produced value
//! - Argument validation for public entry points

use std::fmt;

/// Result alias used throughout the builder graph
pub type SpecimenResult<T> = Result<T, SpecimenError>;

/// Main specimen error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpecimenError {
    /// No builder in the graph could satisfy the request
    #[error("unable to create a specimen for {request}; request path: {}", ResolutionPath(path))]
    Unresolved {
        /// The request that reached the terminator
        request: String,
        /// Requests in flight when resolution failed, outermost first
        path: Vec<String>,
    },

    /// The request re-entered a recursion guard before completing
    #[error("recursion detected while creating {request}; request path: {}", ResolutionPath(path))]
    Recursion {
        /// The recursive request
        request: String,
        /// Requests in flight including the recursive one, outermost first
        path: Vec<String>,
    },

    /// User code invoked during construction reported a failure
    #[error("construction of {type_name} failed: {message}")]
    Construction {
        /// Type being constructed
        type_name: String,
        /// Failure reported by the constructor or factory
        message: String,
    },

    /// Produced value does not have the requested type
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Requested type
        expected: String,
        /// What the graph produced
        actual: String,
    },

    /// A null specimen reached a slot that cannot hold it
    #[error("null specimen cannot be used as {type_name}")]
    NullValue {
        /// Non-nullable target type
        type_name: String,
    },

    /// The request was explicitly omitted
    #[error("specimen for {type_name} was omitted")]
    Omitted {
        /// Requested type
        type_name: String,
    },

    /// A generated number does not fit the requested numeric type
    #[error("value {value} does not fit in {type_name}")]
    Overflow {
        /// Numeric target type
        type_name: String,
        /// Offending value
        value: String,
    },

    /// A named member does not exist on the shape
    #[error("{type_name} has no writable member named {member}")]
    UnknownMember {
        /// Owning type
        type_name: String,
        /// Missing member
        member: String,
    },

    /// Public entry point received an invalid argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Graph structure does not contain the expected markers
    #[error("invalid graph: {0}")]
    InvalidGraph(String),
}

impl SpecimenError {
    /// Create construction error
    #[inline]
    pub fn construction(type_name: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Construction {
            type_name: type_name.into(),
            message: message.to_string(),
        }
    }

    /// Create invalid argument error
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Check if every builder declined the request
    #[inline]
    #[must_use]
    pub fn is_unresolved(&self) -> bool {
        matches!(self, Self::Unresolved { .. })
    }

    /// Check if a recursion guard raised this error
    #[inline]
    #[must_use]
    pub fn is_recursion(&self) -> bool {
        matches!(self, Self::Recursion { .. })
    }

    /// Request path carried by resolution failures
    #[must_use]
    pub fn path(&self) -> &[String] {
        match self {
            Self::Unresolved { path, .. } | Self::Recursion { path, .. } => path,
            _ => &[],
        }
    }
}

struct ResolutionPath<'a>(&'a [String]);

impl fmt::Display for ResolutionPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "<empty>");
        }
        write!(f, "{}", self.0.join(" -> "))
    }
}
