//! Request specifications
//!
//! Predicates over requests used by filtering builders and postprocessors.

use crate::request::Request;
use crate::shape::{Shaped, TypeKey};
use std::fmt;
use std::sync::Arc;

/// Predicate over requests
pub trait RequestSpecification: Send + Sync + fmt::Debug {
    /// Check if `request` satisfies this specification
    fn is_satisfied_by(&self, request: &Request) -> bool;
}

/// Matches every request
#[derive(Debug, Clone, Copy, Default)]
pub struct TrueRequestSpecification;

impl RequestSpecification for TrueRequestSpecification {
    fn is_satisfied_by(&self, _: &Request) -> bool {
        true
    }
}

/// Matches every request that names a type
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyTypeSpecification;

impl RequestSpecification for AnyTypeSpecification {
    fn is_satisfied_by(&self, request: &Request) -> bool {
        matches!(request, Request::Type(_))
    }
}

/// Matches `Type(T)` and seeded requests wrapping `Type(T)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExactTypeSpecification {
    key: TypeKey,
}

impl ExactTypeSpecification {
    /// Match requests for `key`
    #[inline]
    #[must_use]
    pub fn new(key: TypeKey) -> Self {
        Self { key }
    }

    /// Match requests for `T`
    #[inline]
    #[must_use]
    pub fn of<T: Shaped>() -> Self {
        Self::new(TypeKey::of::<T>())
    }

    /// Target type
    #[inline]
    #[must_use]
    pub fn key(&self) -> TypeKey {
        self.key
    }
}

impl RequestSpecification for ExactTypeSpecification {
    fn is_satisfied_by(&self, request: &Request) -> bool {
        match request {
            Request::Type(key) => *key == self.key,
            Request::Seeded(seeded) => seeded.request.as_type() == Some(self.key),
            _ => false,
        }
    }
}

/// Matches when every inner specification matches
#[derive(Debug, Clone)]
pub struct AndRequestSpecification(pub Vec<Arc<dyn RequestSpecification>>);

impl RequestSpecification for AndRequestSpecification {
    fn is_satisfied_by(&self, request: &Request) -> bool {
        self.0.iter().all(|s| s.is_satisfied_by(request))
    }
}

/// Matches when any inner specification matches
#[derive(Debug, Clone)]
pub struct OrRequestSpecification(pub Vec<Arc<dyn RequestSpecification>>);

impl RequestSpecification for OrRequestSpecification {
    fn is_satisfied_by(&self, request: &Request) -> bool {
        self.0.iter().any(|s| s.is_satisfied_by(request))
    }
}

/// Negates an inner specification
#[derive(Debug, Clone)]
pub struct InverseRequestSpecification(pub Arc<dyn RequestSpecification>);

impl RequestSpecification for InverseRequestSpecification {
    fn is_satisfied_by(&self, request: &Request) -> bool {
        !self.0.is_satisfied_by(request)
    }
}

/// Closure-backed specification
pub struct PredicateSpecification<F> {
    predicate: F,
}

impl<F> PredicateSpecification<F>
where
    F: Fn(&Request) -> bool + Send + Sync,
{
    /// Wrap a predicate
    #[inline]
    pub fn new(predicate: F) -> Self {
        Self { predicate }
    }
}

impl<F> fmt::Debug for PredicateSpecification<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PredicateSpecification")
    }
}

impl<F> RequestSpecification for PredicateSpecification<F>
where
    F: Fn(&Request) -> bool + Send + Sync,
{
    fn is_satisfied_by(&self, request: &Request) -> bool {
        (self.predicate)(request)
    }
}
