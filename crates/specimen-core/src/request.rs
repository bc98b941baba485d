//! Request model
//!
//! A [`Request`] describes what to create. Requests are immutable values;
//! equality matters for recursion detection and for generators that keep
//! per-request state.

use crate::error::{SpecimenError, SpecimenResult};
use crate::shape::{Shaped, TypeKey};
use std::fmt;

/// Description of what to create
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Request {
    /// A value of a type
    Type(TypeKey),
    /// A request paired with a seed value
    Seeded(SeededRequest),
    /// A number within inclusive bounds
    RangedNumber(RangedNumberRequest),
    /// A string with bounded length
    ConstrainedString(ConstrainedStringRequest),
    /// A string matching a regular expression
    RegularExpression(RegularExpressionRequest),
    /// Many specimens; the count is decided by the graph
    Multiple(MultipleRequest),
    /// Exactly `count` specimens
    FiniteSequence(FiniteSequenceRequest),
    /// A constructor parameter
    Parameter(ParameterRequest),
    /// A writable property
    Property(PropertyRequest),
}

impl Request {
    /// Request for a value of `T`
    #[inline]
    #[must_use]
    pub fn of<T: Shaped>() -> Self {
        Self::Type(TypeKey::of::<T>())
    }

    /// Type this request ultimately resolves to, when known
    #[must_use]
    pub fn type_key(&self) -> Option<TypeKey> {
        match self {
            Self::Type(key) => Some(*key),
            Self::Seeded(r) => r.request.type_key(),
            Self::RangedNumber(r) => Some(r.key),
            Self::Parameter(r) => Some(r.key),
            Self::Property(r) => Some(r.key),
            Self::ConstrainedString(_) | Self::RegularExpression(_) => {
                Some(TypeKey::of::<String>())
            }
            Self::Multiple(_) | Self::FiniteSequence(_) => None,
        }
    }

    /// Plain type request payload
    #[inline]
    #[must_use]
    pub fn as_type(&self) -> Option<TypeKey> {
        match self {
            Self::Type(key) => Some(*key),
            _ => None,
        }
    }

    /// Check if this is a plain request for `T`
    #[inline]
    #[must_use]
    pub fn is_type<T: 'static>(&self) -> bool {
        self.as_type().is_some_and(|key| key.is::<T>())
    }
}

impl From<TypeKey> for Request {
    fn from(key: TypeKey) -> Self {
        Self::Type(key)
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(key) => write!(f, "{key}"),
            Self::Seeded(r) => write!(f, "{} (seed: {})", r.request, r.seed),
            Self::RangedNumber(r) => write!(f, "{} in [{}, {}]", r.key, r.min, r.max),
            Self::ConstrainedString(r) => write!(
                f,
                "String of length [{}, {}]",
                r.min_length, r.max_length
            ),
            Self::RegularExpression(r) => write!(f, "String matching /{}/", r.pattern),
            Self::Multiple(r) => write!(f, "many {}", r.request),
            Self::FiniteSequence(r) => write!(f, "{} x {}", r.count, r.request),
            Self::Parameter(r) => write!(f, "{}({}: {})", r.owner, r.name, r.key),
            Self::Property(r) => write!(f, "{}.{}: {}", r.owner, r.name, r.key),
        }
    }
}

/// Seed value paired with a request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Seed {
    /// Text seed, typically a member name
    Text(String),
    /// Integer seed
    Integer(i128),
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Integer(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for Seed {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Seed {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i128> for Seed {
    fn from(i: i128) -> Self {
        Self::Integer(i)
    }
}

/// Request paired with a seed
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeededRequest {
    /// Inner request
    pub request: Box<Request>,
    /// Seed value
    pub seed: Seed,
}

impl SeededRequest {
    /// Create seeded request
    #[inline]
    #[must_use]
    pub fn new(request: impl Into<Request>, seed: impl Into<Seed>) -> Self {
        Self {
            request: Box::new(request.into()),
            seed: seed.into(),
        }
    }
}

/// Number of a numeric type within `[min, max]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RangedNumberRequest {
    /// Numeric target type
    pub key: TypeKey,
    /// Inclusive lower bound
    pub min: i128,
    /// Inclusive upper bound
    pub max: i128,
}

impl RangedNumberRequest {
    /// Create ranged request
    ///
    /// # Errors
    /// `InvalidArgument` unless `key` is numeric, `min < max` and both
    /// bounds fit the numeric type
    pub fn new(key: TypeKey, min: i128, max: i128) -> SpecimenResult<Self> {
        let Some(kind) = key.shape().numeric() else {
            return Err(SpecimenError::invalid_argument(format!(
                "{key} is not a numeric type"
            )));
        };
        if min >= max {
            return Err(SpecimenError::invalid_argument(format!(
                "minimum {min} must be lower than maximum {max}"
            )));
        }
        if min < kind.min_integral() || max > kind.max_integral() {
            return Err(SpecimenError::invalid_argument(format!(
                "range [{min}, {max}] does not fit in {}",
                kind.name()
            )));
        }
        Ok(Self { key, min, max })
    }

    /// Typed constructor
    ///
    /// # Errors
    /// See [`RangedNumberRequest::new`]
    pub fn of<T: Shaped>(min: i128, max: i128) -> SpecimenResult<Self> {
        Self::new(TypeKey::of::<T>(), min, max)
    }
}

/// String with length in `[min_length, max_length]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConstrainedStringRequest {
    /// Inclusive minimum length
    pub min_length: usize,
    /// Inclusive maximum length
    pub max_length: usize,
}

impl ConstrainedStringRequest {
    /// Create constrained string request
    ///
    /// # Errors
    /// `InvalidArgument` when `min_length > max_length` or `max_length == 0`
    pub fn new(min_length: usize, max_length: usize) -> SpecimenResult<Self> {
        if max_length == 0 {
            return Err(SpecimenError::invalid_argument(
                "maximum length must be positive",
            ));
        }
        if min_length > max_length {
            return Err(SpecimenError::invalid_argument(format!(
                "minimum length {min_length} exceeds maximum length {max_length}"
            )));
        }
        Ok(Self {
            min_length,
            max_length,
        })
    }
}

/// String matching a pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegularExpressionRequest {
    /// Regular expression source
    pub pattern: String,
}

impl RegularExpressionRequest {
    /// Create regular expression request
    ///
    /// # Errors
    /// `InvalidArgument` for an empty pattern or one that does not compile
    pub fn new(pattern: impl Into<String>) -> SpecimenResult<Self> {
        let pattern = pattern.into();
        if pattern.is_empty() {
            return Err(SpecimenError::invalid_argument("pattern must not be empty"));
        }
        if let Err(e) = regex::Regex::new(&pattern) {
            return Err(SpecimenError::invalid_argument(format!(
                "invalid pattern /{pattern}/: {e}"
            )));
        }
        Ok(Self { pattern })
    }
}

/// Many specimens of an inner request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MultipleRequest {
    /// Inner request
    pub request: Box<Request>,
}

impl MultipleRequest {
    /// Create multiple request
    #[inline]
    #[must_use]
    pub fn new(request: impl Into<Request>) -> Self {
        Self {
            request: Box::new(request.into()),
        }
    }
}

/// Exactly `count` specimens of an inner request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FiniteSequenceRequest {
    /// Inner request
    pub request: Box<Request>,
    /// Number of specimens
    pub count: usize,
}

impl FiniteSequenceRequest {
    /// Create finite sequence request
    #[inline]
    #[must_use]
    pub fn new(request: impl Into<Request>, count: usize) -> Self {
        Self {
            request: Box::new(request.into()),
            count,
        }
    }
}

/// Constructor parameter of an owner type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParameterRequest {
    /// Type declaring the constructor
    pub owner: TypeKey,
    /// Parameter name
    pub name: &'static str,
    /// Zero-based position
    pub position: usize,
    /// Parameter type
    pub key: TypeKey,
}

/// Writable property of an owner type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertyRequest {
    /// Type declaring the property
    pub owner: TypeKey,
    /// Property name
    pub name: &'static str,
    /// Property type
    pub key: TypeKey,
}
