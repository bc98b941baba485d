//! Type shapes
//!
//! Rust has no runtime reflection, so every type a fixture can create
//! describes itself through [`Shaped`]. The returned [`Shape`] tells the
//! engine whether the type is a primitive, an enum with declared variants,
//! a struct with constructors and writable properties, a wrapper, or a
//! collection.
//!
//! # Example
//!
//! ```rust
//! use specimen_core::{Constructor, Parameter, Property, Shape, Shaped, StructShape};
//!
//! #[derive(Debug)]
//! struct Person {
//!     name: String,
//!     age: u32,
//! }
//!
//! impl Shaped for Person {
//!     fn shape() -> Shape {
//!         Shape::Struct(
//!             StructShape::new()
//!                 .constructor(Constructor::new(
//!                     vec![Parameter::new::<String>("name")],
//!                     |args| Ok(Person { name: args.take()?, age: 0 }),
//!                 ))
//!                 .property(Property::new("age", |p: &mut Person, age: u32| p.age = age)),
//!         )
//!     }
//! }
//! ```

use crate::error::{SpecimenError, SpecimenResult};
use std::any::{Any, TypeId};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Type-erased produced value
pub type Value = Box<dyn Any + Send>;

/// Self-description implemented by every type a fixture can create
pub trait Shaped: Any + Send + Sized {
    /// Describe how values of this type are built
    fn shape() -> Shape;
}

/// Type descriptor carried by requests
///
/// Equality and hashing use the [`TypeId`] only; the name and shape
/// function are informational.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
    shape: fn() -> Shape,
}

impl TypeKey {
    /// Descriptor for `T`
    #[inline]
    #[must_use]
    pub fn of<T: Shaped>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            shape: T::shape,
        }
    }

    /// Underlying type id
    #[inline]
    #[must_use]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without module paths (`Option<Box<Node>>`)
    #[must_use]
    pub fn short_name(&self) -> String {
        short_type_name(self.name)
    }

    /// Shape of the described type
    #[inline]
    #[must_use]
    pub fn shape(&self) -> Shape {
        (self.shape)()
    }

    /// Check if this key describes `T`
    #[inline]
    #[must_use]
    pub fn is<T: 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.short_name())
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_name())
    }
}

/// Strip module paths from a fully qualified type name
#[must_use]
pub fn short_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut segment = String::new();
    let mut chars = full.chars().peekable();
    while let Some(c) = chars.next() {
        if c == ':' && chars.peek() == Some(&':') {
            chars.next();
            segment.clear();
        } else if c.is_alphanumeric() || c == '_' {
            segment.push(c);
        } else {
            out.push_str(&segment);
            segment.clear();
            out.push(c);
        }
    }
    out.push_str(&segment);
    out
}

/// Move a type-erased value back into `T`
///
/// # Errors
/// `TypeMismatch` when the value holds another type
pub fn downcast_value<T: Any>(value: Value) -> SpecimenResult<T> {
    value
        .downcast::<T>()
        .map(|boxed| *boxed)
        .map_err(|_| SpecimenError::TypeMismatch {
            expected: short_type_name(std::any::type_name::<T>()),
            actual: "a value of another type".to_string(),
        })
}

/// How a type is built
#[derive(Clone)]
pub enum Shape {
    /// Leaf value produced by a generator
    Primitive(Primitive),
    /// Enum with declared variants
    Enum(EnumShape),
    /// Struct with constructors and writable properties
    Struct(StructShape),
    /// `Option<T>`: null and omitted specimens become `None`
    Option(WrapperShape),
    /// `Box<T>`, `Arc<T>`: single owned inner value
    Boxed(WrapperShape),
    /// Homogeneous collection
    Sequence(SequenceShape),
    /// Key/value collection
    Map(MapShape),
    /// Nothing is known; only customizations can create it
    Opaque,
}

impl Shape {
    /// Short kind name for diagnostics
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Primitive(_) => "primitive",
            Self::Enum(_) => "enum",
            Self::Struct(_) => "struct",
            Self::Option(_) => "option",
            Self::Boxed(_) => "boxed",
            Self::Sequence(_) => "sequence",
            Self::Map(_) => "map",
            Self::Opaque => "opaque",
        }
    }

    /// Numeric kind if this is a numeric primitive
    #[inline]
    #[must_use]
    pub fn numeric(&self) -> Option<NumericKind> {
        match self {
            Self::Primitive(Primitive::Number(kind)) => Some(*kind),
            _ => None,
        }
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(p) => write!(f, "Primitive({p:?})"),
            Self::Enum(e) => write!(f, "Enum({:?})", e.variants),
            Self::Struct(s) => write!(
                f,
                "Struct(constructors: {}, properties: {})",
                s.constructors.len(),
                s.properties.len()
            ),
            Self::Option(w) => write!(f, "Option({})", w.inner),
            Self::Boxed(w) => write!(f, "Boxed({})", w.inner),
            Self::Sequence(s) => write!(f, "Sequence({})", s.element),
            Self::Map(m) => write!(f, "Map({}, {})", m.key, m.value),
            Self::Opaque => f.write_str("Opaque"),
        }
    }
}

/// Leaf value kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// `()`
    Unit,
    /// `bool`
    Bool,
    /// `char`
    Char,
    /// `String`
    String,
    /// `uuid::Uuid`
    Uuid,
    /// `chrono::DateTime<Utc>`
    DateTime,
    /// `chrono::NaiveDate`
    Date,
    /// `std::time::Duration`
    Duration,
    /// Any numeric type
    Number(NumericKind),
}

/// Numeric primitive kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum NumericKind {
    I8,
    I16,
    I32,
    I64,
    I128,
    Isize,
    U8,
    U16,
    U32,
    U64,
    U128,
    Usize,
    F32,
    F64,
}

macro_rules! numeric_kinds {
    ($( $kind:ident => $ty:ident ),* $(,)?) => {
        impl NumericKind {
            /// Rust type name
            #[must_use]
            pub fn name(self) -> &'static str {
                match self {
                    $( Self::$kind => stringify!($ty), )*
                }
            }

            /// Convert `value` into a boxed value of this kind
            ///
            /// # Errors
            /// `Overflow` when the value does not fit
            pub fn to_value(self, value: i128) -> SpecimenResult<Value> {
                match self {
                    $( Self::$kind => numeric_kinds!(@convert $kind, $ty, value), )*
                }
            }
        }

        $(
            impl Shaped for $ty {
                fn shape() -> Shape {
                    Shape::Primitive(Primitive::Number(NumericKind::$kind))
                }
            }
        )*
    };
    (@convert $kind:ident, f32, $value:ident) => {{
        #[allow(clippy::cast_precision_loss)]
        let v = $value as f32;
        Ok(Box::new(v) as Value)
    }};
    (@convert $kind:ident, f64, $value:ident) => {{
        #[allow(clippy::cast_precision_loss)]
        let v = $value as f64;
        Ok(Box::new(v) as Value)
    }};
    (@convert $kind:ident, $ty:ident, $value:ident) => {
        $ty::try_from($value)
            .map(|v| Box::new(v) as Value)
            .map_err(|_| SpecimenError::Overflow {
                type_name: NumericKind::$kind.name().to_string(),
                value: $value.to_string(),
            })
    };
}

numeric_kinds! {
    I8 => i8,
    I16 => i16,
    I32 => i32,
    I64 => i64,
    I128 => i128,
    Isize => isize,
    U8 => u8,
    U16 => u16,
    U32 => u32,
    U64 => u64,
    U128 => u128,
    Usize => usize,
    F32 => f32,
    F64 => f64,
}

impl NumericKind {
    /// Every numeric kind
    pub const ALL: [NumericKind; 14] = [
        Self::I8,
        Self::I16,
        Self::I32,
        Self::I64,
        Self::I128,
        Self::Isize,
        Self::U8,
        Self::U16,
        Self::U32,
        Self::U64,
        Self::U128,
        Self::Usize,
        Self::F32,
        Self::F64,
    ];

    /// Largest integral value representable by this kind, capped at `i128::MAX`
    #[must_use]
    pub fn max_integral(self) -> i128 {
        match self {
            Self::I8 => i128::from(i8::MAX),
            Self::I16 => i128::from(i16::MAX),
            Self::I32 => i128::from(i32::MAX),
            Self::I64 => i128::from(i64::MAX),
            Self::Isize => isize::MAX as i128,
            Self::U8 => i128::from(u8::MAX),
            Self::U16 => i128::from(u16::MAX),
            Self::U32 => i128::from(u32::MAX),
            Self::U64 => i128::from(u64::MAX),
            Self::Usize => usize::MAX as i128,
            Self::I128 | Self::U128 | Self::F32 | Self::F64 => i128::MAX,
        }
    }

    /// Smallest integral value representable by this kind, capped at `i128::MIN`
    #[must_use]
    pub fn min_integral(self) -> i128 {
        match self {
            Self::I8 => i128::from(i8::MIN),
            Self::I16 => i128::from(i16::MIN),
            Self::I32 => i128::from(i32::MIN),
            Self::I64 => i128::from(i64::MIN),
            Self::Isize => isize::MIN as i128,
            Self::U8 | Self::U16 | Self::U32 | Self::U64 | Self::U128 | Self::Usize => 0,
            Self::I128 | Self::F32 | Self::F64 => i128::MIN,
        }
    }

    /// Largest integer below which every integer is exactly representable
    ///
    /// Floats lose distinct integers past their mantissa width.
    #[must_use]
    pub fn max_exact(self) -> i128 {
        match self {
            Self::F32 => 1 << f32::MANTISSA_DIGITS,
            Self::F64 => 1 << f64::MANTISSA_DIGITS,
            other => other.max_integral(),
        }
    }

    /// Check if values are integers
    #[inline]
    #[must_use]
    pub fn is_integral(self) -> bool {
        !matches!(self, Self::F32 | Self::F64)
    }
}

/// Enum with declared variants
#[derive(Clone)]
pub struct EnumShape {
    variants: Vec<&'static str>,
    make: Arc<dyn Fn(usize) -> Option<Value> + Send + Sync>,
}

impl EnumShape {
    /// Create from `(name, value)` pairs in declaration order
    #[must_use]
    pub fn new<T>(variants: Vec<(&'static str, T)>) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        let names = variants.iter().map(|(name, _)| *name).collect();
        let values: Vec<T> = variants.into_iter().map(|(_, value)| value).collect();
        Self {
            variants: names,
            make: Arc::new(move |index| {
                values
                    .get(index)
                    .map(|value| Box::new(value.clone()) as Value)
            }),
        }
    }

    /// Declared variant names
    #[inline]
    #[must_use]
    pub fn variants(&self) -> &[&'static str] {
        &self.variants
    }

    /// Number of declared variants
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.variants.len()
    }

    /// Check if the enum declares no variants
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// Produce the variant at `index`
    #[must_use]
    pub fn variant(&self, index: usize) -> Option<Value> {
        (self.make)(index)
    }

    /// Index of the variant called `name`
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.variants.iter().position(|v| *v == name)
    }
}

/// Struct with constructors and writable properties
#[derive(Clone, Default)]
pub struct StructShape {
    constructors: Vec<Constructor>,
    properties: Vec<Property>,
}

impl StructShape {
    /// Create empty struct shape
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a constructor
    #[must_use]
    pub fn constructor(mut self, constructor: Constructor) -> Self {
        self.constructors.push(constructor);
        self
    }

    /// Add a writable property
    #[must_use]
    pub fn property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }

    /// Declared constructors
    #[inline]
    #[must_use]
    pub fn constructors(&self) -> &[Constructor] {
        &self.constructors
    }

    /// Declared writable properties
    #[inline]
    #[must_use]
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// Property called `name`
    #[must_use]
    pub fn property_named(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// Constructor parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Parameter {
    name: &'static str,
    key: TypeKey,
}

impl Parameter {
    /// Parameter called `name` of type `T`
    #[inline]
    #[must_use]
    pub fn new<T: Shaped>(name: &'static str) -> Self {
        Self {
            name,
            key: TypeKey::of::<T>(),
        }
    }

    /// Parameter name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Parameter type
    #[inline]
    #[must_use]
    pub fn key(&self) -> TypeKey {
        self.key
    }
}

type InvokeFn = dyn Fn(&mut Arguments) -> SpecimenResult<Value> + Send + Sync;

/// Constructor: ordered parameters plus the function that consumes them
#[derive(Clone)]
pub struct Constructor {
    parameters: Vec<Parameter>,
    invoke: Arc<InvokeFn>,
}

impl Constructor {
    /// Create from parameters and a body that takes them in order
    pub fn new<T, F>(parameters: Vec<Parameter>, body: F) -> Self
    where
        T: Any + Send,
        F: Fn(&mut Arguments) -> SpecimenResult<T> + Send + Sync + 'static,
    {
        Self {
            parameters,
            invoke: Arc::new(move |args| body(args).map(|v| Box::new(v) as Value)),
        }
    }

    /// Declared parameters
    #[inline]
    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Number of parameters
    #[inline]
    #[must_use]
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    /// Invoke with resolved arguments (`None` is a null specimen)
    ///
    /// # Errors
    /// Whatever the body reports, or `InvalidArgument` on an arity mismatch
    pub fn invoke(&self, values: Vec<Option<Value>>) -> SpecimenResult<Value> {
        if values.len() != self.parameters.len() {
            return Err(SpecimenError::invalid_argument(format!(
                "constructor takes {} arguments, {} supplied",
                self.parameters.len(),
                values.len()
            )));
        }
        let mut args = Arguments {
            parameters: self.parameters.clone(),
            values: values.into_iter(),
            position: 0,
        };
        (self.invoke)(&mut args)
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

/// Resolved constructor arguments, consumed in declaration order
pub struct Arguments {
    parameters: Vec<Parameter>,
    values: std::vec::IntoIter<Option<Value>>,
    position: usize,
}

impl Arguments {
    /// Take the next argument as `T`
    ///
    /// # Errors
    /// `NullValue` for a null specimen, `TypeMismatch` for a foreign value,
    /// `InvalidArgument` when all arguments were consumed
    pub fn take<T: Any>(&mut self) -> SpecimenResult<T> {
        match self.take_nullable()? {
            Some(value) => Ok(value),
            None => Err(SpecimenError::NullValue {
                type_name: short_type_name(std::any::type_name::<T>()),
            }),
        }
    }

    /// Take the next argument, mapping a null specimen to `None`
    ///
    /// # Errors
    /// `TypeMismatch` for a foreign value, `InvalidArgument` when exhausted
    pub fn take_nullable<T: Any>(&mut self) -> SpecimenResult<Option<T>> {
        let position = self.position;
        let slot = self.values.next().ok_or_else(|| {
            SpecimenError::invalid_argument(format!("no argument at position {position}"))
        })?;
        self.position += 1;
        match slot {
            None => Ok(None),
            Some(value) => downcast_value(value).map(Some).map_err(|err| match err {
                SpecimenError::TypeMismatch { expected, .. } => SpecimenError::TypeMismatch {
                    expected,
                    actual: format!(
                        "argument {}",
                        self.parameters.get(position).map_or("?", |p| p.name)
                    ),
                },
                other => other,
            }),
        }
    }

    /// Arguments not yet taken
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

type SetFn = dyn Fn(&mut (dyn Any + Send), Value) -> SpecimenResult<()> + Send + Sync;

/// Writable member assigned by auto-properties
#[derive(Clone)]
pub struct Property {
    name: &'static str,
    key: TypeKey,
    set: Arc<SetFn>,
}

impl Property {
    /// Property called `name` on `O` holding a `T`
    pub fn new<O, T, F>(name: &'static str, setter: F) -> Self
    where
        O: Any + Send,
        T: Shaped,
        F: Fn(&mut O, T) + Send + Sync + 'static,
    {
        Self {
            name,
            key: TypeKey::of::<T>(),
            set: Arc::new(move |target, value| {
                let owner = target.downcast_mut::<O>().ok_or_else(|| {
                    SpecimenError::TypeMismatch {
                        expected: short_type_name(std::any::type_name::<O>()),
                        actual: format!("owner of property {name}"),
                    }
                })?;
                setter(owner, downcast_value::<T>(value)?);
                Ok(())
            }),
        }
    }

    /// Property name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Property type
    #[inline]
    #[must_use]
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Assign `value` on `target`
    ///
    /// # Errors
    /// `TypeMismatch` when either side has the wrong type
    pub fn assign(&self, target: &mut (dyn Any + Send), value: Value) -> SpecimenResult<()> {
        (self.set)(target, value)
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

/// Single-inner-type wrapper
#[derive(Clone, Copy)]
pub struct WrapperShape {
    inner: TypeKey,
    wrap: fn(Option<Value>) -> SpecimenResult<Value>,
}

impl WrapperShape {
    /// Create wrapper shape
    #[inline]
    #[must_use]
    pub fn new(inner: TypeKey, wrap: fn(Option<Value>) -> SpecimenResult<Value>) -> Self {
        Self { inner, wrap }
    }

    /// Wrapped type
    #[inline]
    #[must_use]
    pub fn inner(&self) -> TypeKey {
        self.inner
    }

    /// Wrap an inner value (`None` for an absent one)
    ///
    /// # Errors
    /// `NullValue` when the wrapper cannot represent absence
    pub fn wrap(&self, inner: Option<Value>) -> SpecimenResult<Value> {
        (self.wrap)(inner)
    }
}

/// Homogeneous collection
#[derive(Clone, Copy)]
pub struct SequenceShape {
    element: TypeKey,
    collect: fn(Vec<Value>) -> SpecimenResult<Value>,
}

impl SequenceShape {
    /// Create sequence shape
    #[inline]
    #[must_use]
    pub fn new(element: TypeKey, collect: fn(Vec<Value>) -> SpecimenResult<Value>) -> Self {
        Self { element, collect }
    }

    /// Element type
    #[inline]
    #[must_use]
    pub fn element(&self) -> TypeKey {
        self.element
    }

    /// Collect elements into the collection
    ///
    /// # Errors
    /// `TypeMismatch` when an element has the wrong type
    pub fn collect(&self, items: Vec<Value>) -> SpecimenResult<Value> {
        (self.collect)(items)
    }
}

/// Key/value collection
#[derive(Clone, Copy)]
pub struct MapShape {
    key: TypeKey,
    value: TypeKey,
    collect: fn(Vec<(Value, Value)>) -> SpecimenResult<Value>,
}

impl MapShape {
    /// Create map shape
    #[inline]
    #[must_use]
    pub fn new(
        key: TypeKey,
        value: TypeKey,
        collect: fn(Vec<(Value, Value)>) -> SpecimenResult<Value>,
    ) -> Self {
        Self {
            key,
            value,
            collect,
        }
    }

    /// Key type
    #[inline]
    #[must_use]
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Value type
    #[inline]
    #[must_use]
    pub fn value(&self) -> TypeKey {
        self.value
    }

    /// Collect entries into the map
    ///
    /// # Errors
    /// `TypeMismatch` when an entry has the wrong type
    pub fn collect(&self, entries: Vec<(Value, Value)>) -> SpecimenResult<Value> {
        (self.collect)(entries)
    }
}

// Standard library shapes

macro_rules! primitive_shape {
    ($( $ty:ty => $prim:ident ),* $(,)?) => {
        $(
            impl Shaped for $ty {
                fn shape() -> Shape {
                    Shape::Primitive(Primitive::$prim)
                }
            }
        )*
    };
}

primitive_shape! {
    () => Unit,
    bool => Bool,
    char => Char,
    String => String,
    uuid::Uuid => Uuid,
    chrono::DateTime<chrono::Utc> => DateTime,
    chrono::NaiveDate => Date,
    std::time::Duration => Duration,
}

fn wrap_option<T: Shaped>(inner: Option<Value>) -> SpecimenResult<Value> {
    let value: Option<T> = inner.map(downcast_value::<T>).transpose()?;
    Ok(Box::new(value))
}

fn wrap_box<T: Shaped>(inner: Option<Value>) -> SpecimenResult<Value> {
    let value = inner.ok_or_else(|| SpecimenError::NullValue {
        type_name: short_type_name(std::any::type_name::<Box<T>>()),
    })?;
    Ok(Box::new(Box::new(downcast_value::<T>(value)?)))
}

fn wrap_arc<T: Shaped + Sync>(inner: Option<Value>) -> SpecimenResult<Value> {
    let value = inner.ok_or_else(|| SpecimenError::NullValue {
        type_name: short_type_name(std::any::type_name::<Arc<T>>()),
    })?;
    Ok(Box::new(Arc::new(downcast_value::<T>(value)?)))
}

impl<T: Shaped> Shaped for Option<T> {
    fn shape() -> Shape {
        Shape::Option(WrapperShape::new(TypeKey::of::<T>(), wrap_option::<T>))
    }
}

impl<T: Shaped> Shaped for Box<T> {
    fn shape() -> Shape {
        Shape::Boxed(WrapperShape::new(TypeKey::of::<T>(), wrap_box::<T>))
    }
}

impl<T: Shaped + Sync> Shaped for Arc<T> {
    fn shape() -> Shape {
        Shape::Boxed(WrapperShape::new(TypeKey::of::<T>(), wrap_arc::<T>))
    }
}

fn collect_into<C, T>(items: Vec<Value>) -> SpecimenResult<Value>
where
    C: FromIterator<T> + Send + 'static,
    T: Shaped,
{
    let collection = items
        .into_iter()
        .map(downcast_value::<T>)
        .collect::<SpecimenResult<C>>()?;
    Ok(Box::new(collection))
}

fn collect_map<M, K, V>(entries: Vec<(Value, Value)>) -> SpecimenResult<Value>
where
    M: FromIterator<(K, V)> + Send + 'static,
    K: Shaped,
    V: Shaped,
{
    let map = entries
        .into_iter()
        .map(|(k, v)| Ok((downcast_value::<K>(k)?, downcast_value::<V>(v)?)))
        .collect::<SpecimenResult<M>>()?;
    Ok(Box::new(map))
}

impl<T: Shaped> Shaped for Vec<T> {
    fn shape() -> Shape {
        Shape::Sequence(SequenceShape::new(
            TypeKey::of::<T>(),
            collect_into::<Vec<T>, T>,
        ))
    }
}

impl<T: Shaped> Shaped for VecDeque<T> {
    fn shape() -> Shape {
        Shape::Sequence(SequenceShape::new(
            TypeKey::of::<T>(),
            collect_into::<VecDeque<T>, T>,
        ))
    }
}

impl<T: Shaped + Eq + Hash> Shaped for HashSet<T> {
    fn shape() -> Shape {
        Shape::Sequence(SequenceShape::new(
            TypeKey::of::<T>(),
            collect_into::<HashSet<T>, T>,
        ))
    }
}

impl<T: Shaped + Ord> Shaped for BTreeSet<T> {
    fn shape() -> Shape {
        Shape::Sequence(SequenceShape::new(
            TypeKey::of::<T>(),
            collect_into::<BTreeSet<T>, T>,
        ))
    }
}

impl<K: Shaped + Eq + Hash, V: Shaped> Shaped for HashMap<K, V> {
    fn shape() -> Shape {
        Shape::Map(MapShape::new(
            TypeKey::of::<K>(),
            TypeKey::of::<V>(),
            collect_map::<HashMap<K, V>, K, V>,
        ))
    }
}

impl<K: Shaped + Ord, V: Shaped> Shaped for BTreeMap<K, V> {
    fn shape() -> Shape {
        Shape::Map(MapShape::new(
            TypeKey::of::<K>(),
            TypeKey::of::<V>(),
            collect_map::<BTreeMap<K, V>, K, V>,
        ))
    }
}

impl<A: Shaped, B: Shaped> Shaped for (A, B) {
    fn shape() -> Shape {
        Shape::Struct(StructShape::new().constructor(Constructor::new(
            vec![Parameter::new::<A>("0"), Parameter::new::<B>("1")],
            |args| Ok((args.take::<A>()?, args.take::<B>()?)),
        )))
    }
}

impl<A: Shaped, B: Shaped, C: Shaped> Shaped for (A, B, C) {
    fn shape() -> Shape {
        Shape::Struct(StructShape::new().constructor(Constructor::new(
            vec![
                Parameter::new::<A>("0"),
                Parameter::new::<B>("1"),
                Parameter::new::<C>("2"),
            ],
            |args| Ok((args.take::<A>()?, args.take::<B>()?, args.take::<C>()?)),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Clone, PartialEq)]
    enum Light {
        Red,
        Green,
    }

    impl Shaped for Light {
        fn shape() -> Shape {
            Shape::Enum(EnumShape::new(vec![("Red", Light::Red), ("Green", Light::Green)]))
        }
    }

    #[derive(Debug, Default)]
    struct Pair {
        left: i32,
        label: String,
    }

    impl Shaped for Pair {
        fn shape() -> Shape {
            Shape::Struct(
                StructShape::new()
                    .constructor(Constructor::new(
                        vec![Parameter::new::<i32>("left")],
                        |args| {
                            Ok(Pair {
                                left: args.take()?,
                                label: String::new(),
                            })
                        },
                    ))
                    .property(Property::new("label", |p: &mut Pair, v: String| p.label = v)),
            )
        }
    }

    #[test]
    fn short_names_strip_module_paths() {
        assert_eq!(
            short_type_name("core::option::Option<alloc::boxed::Box<my_crate::model::Node>>"),
            "Option<Box<Node>>"
        );
        assert_eq!(TypeKey::of::<String>().short_name(), "String");
        assert_eq!(
            TypeKey::of::<HashMap<String, i32>>().short_name(),
            "HashMap<String, i32>"
        );
    }

    #[test]
    fn type_key_equality_uses_type_id() {
        assert_eq!(TypeKey::of::<u8>(), TypeKey::of::<u8>());
        assert_ne!(TypeKey::of::<u8>(), TypeKey::of::<i8>());
        assert!(TypeKey::of::<Pair>().is::<Pair>());
    }

    #[test]
    fn numeric_conversion_checks_range() {
        let v = NumericKind::U8.to_value(200).unwrap();
        assert_eq!(downcast_value::<u8>(v).unwrap(), 200);

        let err = NumericKind::U8.to_value(256).unwrap_err();
        assert!(matches!(err, SpecimenError::Overflow { .. }));

        let f = NumericKind::F64.to_value(7).unwrap();
        assert_eq!(downcast_value::<f64>(f).unwrap(), 7.0);
    }

    #[test]
    fn max_integral_per_kind() {
        assert_eq!(NumericKind::I8.max_integral(), 127);
        assert_eq!(NumericKind::U16.max_integral(), 65_535);
        assert_eq!(NumericKind::F32.max_integral(), i128::MAX);
        assert!(!NumericKind::F32.is_integral());
    }

    #[test]
    fn integral_bounds_per_kind() {
        assert_eq!(NumericKind::I8.min_integral(), -128);
        assert_eq!(NumericKind::U64.min_integral(), 0);
        assert_eq!(NumericKind::F32.max_exact(), 16_777_216);
        assert_eq!(NumericKind::F64.max_exact(), 9_007_199_254_740_992);
        assert_eq!(NumericKind::U16.max_exact(), 65_535);
    }

    #[test]
    fn enum_shape_produces_variants() {
        let Shape::Enum(shape) = Light::shape() else {
            panic!("expected enum shape");
        };
        assert_eq!(shape.variants(), &["Red", "Green"]);
        assert_eq!(shape.position("Green"), Some(1));
        let v = shape.variant(1).unwrap();
        assert_eq!(downcast_value::<Light>(v).unwrap(), Light::Green);
        assert!(shape.variant(2).is_none());
    }

    #[test]
    fn constructor_takes_arguments_in_order() {
        let Shape::Struct(shape) = Pair::shape() else {
            panic!("expected struct shape");
        };
        let ctor = &shape.constructors()[0];
        assert_eq!(ctor.arity(), 1);

        let pair = ctor.invoke(vec![Some(Box::new(5_i32))]).unwrap();
        assert_eq!(downcast_value::<Pair>(pair).unwrap().left, 5);
    }

    #[test]
    fn constructor_rejects_null_and_foreign_arguments() {
        let Shape::Struct(shape) = Pair::shape() else {
            panic!("expected struct shape");
        };
        let ctor = &shape.constructors()[0];

        let err = ctor.invoke(vec![None]).unwrap_err();
        assert!(matches!(err, SpecimenError::NullValue { .. }));

        let err = ctor.invoke(vec![Some(Box::new("x".to_string()))]).unwrap_err();
        assert!(matches!(err, SpecimenError::TypeMismatch { .. }));

        let err = ctor.invoke(vec![]).unwrap_err();
        assert!(matches!(err, SpecimenError::InvalidArgument(_)));
    }

    #[test]
    fn property_assigns_through_erased_owner() {
        let Shape::Struct(shape) = Pair::shape() else {
            panic!("expected struct shape");
        };
        let mut target: Value = Box::new(Pair::default());
        let label = shape.property_named("label").unwrap();
        label
            .assign(target.as_mut(), Box::new("hello".to_string()))
            .unwrap();
        assert_eq!(downcast_value::<Pair>(target).unwrap().label, "hello");
    }

    #[test]
    fn option_wrapper_maps_absence_to_none() {
        let Shape::Option(shape) = Option::<u8>::shape() else {
            panic!("expected option shape");
        };
        let none = shape.wrap(None).unwrap();
        assert_eq!(downcast_value::<Option<u8>>(none).unwrap(), None);
        let some = shape.wrap(Some(Box::new(3_u8))).unwrap();
        assert_eq!(downcast_value::<Option<u8>>(some).unwrap(), Some(3));
    }

    #[test]
    fn box_wrapper_rejects_absence() {
        let Shape::Boxed(shape) = Box::<u8>::shape() else {
            panic!("expected boxed shape");
        };
        assert!(matches!(
            shape.wrap(None).unwrap_err(),
            SpecimenError::NullValue { .. }
        ));
    }

    #[test]
    fn sequence_and_map_collect() {
        let Shape::Sequence(seq) = Vec::<u8>::shape() else {
            panic!("expected sequence shape");
        };
        let v = seq.collect(vec![Box::new(1_u8), Box::new(2_u8)]).unwrap();
        assert_eq!(downcast_value::<Vec<u8>>(v).unwrap(), vec![1, 2]);

        let Shape::Map(map) = BTreeMap::<u8, bool>::shape() else {
            panic!("expected map shape");
        };
        let m = map
            .collect(vec![(Box::new(1_u8) as Value, Box::new(true) as Value)])
            .unwrap();
        let m = downcast_value::<BTreeMap<u8, bool>>(m).unwrap();
        assert_eq!(m.get(&1), Some(&true));
    }

    #[test]
    fn tuples_are_positional_structs() {
        let Shape::Struct(shape) = <(u8, bool)>::shape() else {
            panic!("expected struct shape");
        };
        let ctor = &shape.constructors()[0];
        assert_eq!(ctor.parameters()[1].name(), "1");
        let t = ctor
            .invoke(vec![Some(Box::new(9_u8)), Some(Box::new(false))])
            .unwrap();
        assert_eq!(downcast_value::<(u8, bool)>(t).unwrap(), (9, false));
    }
}
