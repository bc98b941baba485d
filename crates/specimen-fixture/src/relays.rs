//! Relays: builders that translate one request into another
//!
//! A relay never produces a value on its own. It rewrites the request it
//! recognises and resolves the rewritten request through the context, so
//! every nested request re-enters the graph root.

use specimen_core::{
    FiniteSequenceRequest, MultipleRequest, Request, SeededRequest, Shape, Specimen,
    SpecimenBuilder, SpecimenContext, SpecimenError, SpecimenResult, SpecimenSequence, TypeKey,
    Value,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Shared, live-updatable item count for "many" requests
#[derive(Debug, Clone)]
pub struct RepeatCount(Arc<AtomicUsize>);

impl RepeatCount {
    /// Create with `count` items
    ///
    /// # Errors
    /// `InvalidArgument` for zero
    pub fn new(count: usize) -> SpecimenResult<Self> {
        validate_count(count)?;
        Ok(Self(Arc::new(AtomicUsize::new(count))))
    }

    /// Current count
    #[inline]
    #[must_use]
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    /// Change the count for every holder of this handle
    ///
    /// # Errors
    /// `InvalidArgument` for zero
    pub fn set(&self, count: usize) -> SpecimenResult<()> {
        validate_count(count)?;
        self.0.store(count, Ordering::SeqCst);
        Ok(())
    }
}

impl Default for RepeatCount {
    fn default() -> Self {
        Self(Arc::new(AtomicUsize::new(3)))
    }
}

fn validate_count(count: usize) -> SpecimenResult<()> {
    if count == 0 {
        return Err(SpecimenError::invalid_argument(
            "repeat count must be at least 1",
        ));
    }
    Ok(())
}

/// Constructor parameter → request for its type seeded with its name
#[derive(Debug, Clone, Copy, Default)]
pub struct ParameterRequestRelay;

impl SpecimenBuilder for ParameterRequestRelay {
    fn create(&self, request: &Request, context: &mut SpecimenContext) -> SpecimenResult<Specimen> {
        let Request::Parameter(parameter) = request else {
            return Ok(Specimen::NoSpecimen);
        };
        context.resolve(&Request::Seeded(SeededRequest::new(
            parameter.key,
            parameter.name,
        )))
    }
}

/// Writable property → request for its type seeded with its name
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertyRequestRelay;

impl SpecimenBuilder for PropertyRequestRelay {
    fn create(&self, request: &Request, context: &mut SpecimenContext) -> SpecimenResult<Specimen> {
        let Request::Property(property) = request else {
            return Ok(Specimen::NoSpecimen);
        };
        context.resolve(&Request::Seeded(SeededRequest::new(
            property.key,
            property.name,
        )))
    }
}

/// Seeded request → its inner request
#[derive(Debug, Clone, Copy, Default)]
pub struct SeedIgnoringRelay;

impl SpecimenBuilder for SeedIgnoringRelay {
    fn create(&self, request: &Request, context: &mut SpecimenContext) -> SpecimenResult<Specimen> {
        let Request::Seeded(seeded) = request else {
            return Ok(Specimen::NoSpecimen);
        };
        context.resolve(&seeded.request)
    }
}

/// "Many" → finite sequence of the current repeat count
#[derive(Debug, Clone, Default)]
pub struct MultipleRelay {
    count: RepeatCount,
}

impl MultipleRelay {
    /// Relay reading `count` on every request
    #[inline]
    #[must_use]
    pub fn new(count: RepeatCount) -> Self {
        Self { count }
    }
}

impl SpecimenBuilder for MultipleRelay {
    fn create(&self, request: &Request, context: &mut SpecimenContext) -> SpecimenResult<Specimen> {
        let Request::Multiple(multiple) = request else {
            return Ok(Specimen::NoSpecimen);
        };
        context.resolve(&Request::FiniteSequence(FiniteSequenceRequest::new(
            (*multiple.request).clone(),
            self.count.get(),
        )))
    }
}

/// Finite sequence → that many resolutions of the inner request
///
/// Items resolving to null or omit are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct FiniteSequenceRelay;

impl SpecimenBuilder for FiniteSequenceRelay {
    fn create(&self, request: &Request, context: &mut SpecimenContext) -> SpecimenResult<Specimen> {
        let Request::FiniteSequence(sequence) = request else {
            return Ok(Specimen::NoSpecimen);
        };
        let mut items = Vec::with_capacity(sequence.count);
        for _ in 0..sequence.count {
            if let Specimen::Value(item) = context.resolve(&sequence.request)? {
                items.push(item);
            }
        }
        Ok(Specimen::value(SpecimenSequence(items)))
    }
}

/// `Option<T>` → `Some(T)`; null and omitted inner values become `None`
#[derive(Debug, Clone, Copy, Default)]
pub struct OptionRelay;

impl SpecimenBuilder for OptionRelay {
    fn create(&self, request: &Request, context: &mut SpecimenContext) -> SpecimenResult<Specimen> {
        let Some(Shape::Option(wrapper)) = request.as_type().map(|key| key.shape()) else {
            return Ok(Specimen::NoSpecimen);
        };
        match context.resolve(&Request::Type(wrapper.inner()))? {
            Specimen::Value(inner) => wrapper.wrap(Some(inner)).map(Specimen::Value),
            Specimen::Null | Specimen::Omit => wrapper.wrap(None).map(Specimen::Value),
            Specimen::NoSpecimen => Ok(Specimen::NoSpecimen),
        }
    }
}

/// `Box<T>`, `Arc<T>` → `T`, boxed; null and omit pass through
#[derive(Debug, Clone, Copy, Default)]
pub struct BoxRelay;

impl SpecimenBuilder for BoxRelay {
    fn create(&self, request: &Request, context: &mut SpecimenContext) -> SpecimenResult<Specimen> {
        let Some(Shape::Boxed(wrapper)) = request.as_type().map(|key| key.shape()) else {
            return Ok(Specimen::NoSpecimen);
        };
        match context.resolve(&Request::Type(wrapper.inner()))? {
            Specimen::Value(inner) => wrapper.wrap(Some(inner)).map(Specimen::Value),
            other => Ok(other),
        }
    }
}

fn resolve_many(key: TypeKey, context: &mut SpecimenContext) -> SpecimenResult<Option<Vec<Value>>> {
    let many = Request::Multiple(MultipleRequest::new(key));
    match context.resolve(&many)? {
        Specimen::Value(value) => Ok(Some(
            specimen_core::downcast_value::<SpecimenSequence>(value)?.0,
        )),
        _ => Ok(None),
    }
}

/// Collections → "many" of the element type, collected
#[derive(Debug, Clone, Copy, Default)]
pub struct SequenceRelay;

impl SpecimenBuilder for SequenceRelay {
    fn create(&self, request: &Request, context: &mut SpecimenContext) -> SpecimenResult<Specimen> {
        let Some(Shape::Sequence(sequence)) = request.as_type().map(|key| key.shape()) else {
            return Ok(Specimen::NoSpecimen);
        };
        match resolve_many(sequence.element(), context)? {
            Some(items) => sequence.collect(items).map(Specimen::Value),
            None => Ok(Specimen::NoSpecimen),
        }
    }
}

/// Maps → "many" keys zipped with "many" values, collected
#[derive(Debug, Clone, Copy, Default)]
pub struct MapRelay;

impl SpecimenBuilder for MapRelay {
    fn create(&self, request: &Request, context: &mut SpecimenContext) -> SpecimenResult<Specimen> {
        let Some(Shape::Map(map)) = request.as_type().map(|key| key.shape()) else {
            return Ok(Specimen::NoSpecimen);
        };
        let Some(keys) = resolve_many(map.key(), context)? else {
            return Ok(Specimen::NoSpecimen);
        };
        let Some(values) = resolve_many(map.value(), context)? else {
            return Ok(Specimen::NoSpecimen);
        };
        map.collect(keys.into_iter().zip(values).collect())
            .map(Specimen::Value)
    }
}
