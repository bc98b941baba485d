//! Testing utilities for the specimen workspace
//!
//! Sample model types describing themselves through [`Shaped`], covering
//! enums, constructor-only structs, property-bag structs, recursive types
//! and failing constructors.

#![allow(missing_docs)]

use chrono::{DateTime, Utc};
use specimen_core::{
    Constructor, EnumShape, Parameter, Property, Shape, Shaped, SpecimenError, StructShape,
};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Red,
    Green,
    Blue,
}

impl Shaped for Color {
    fn shape() -> Shape {
        Shape::Enum(EnumShape::new(vec![
            ("Red", Color::Red),
            ("Green", Color::Green),
            ("Blue", Color::Blue),
        ]))
    }
}

/// Property bag: parameterless constructor, every field writable
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Person {
    pub name: String,
    pub age: u32,
    pub email: String,
    pub favorite: Option<Color>,
}

impl Shaped for Person {
    fn shape() -> Shape {
        Shape::Struct(
            StructShape::new()
                .constructor(Constructor::new(vec![], |_| Ok(Person::default())))
                .property(Property::new("name", |p: &mut Person, v: String| p.name = v))
                .property(Property::new("age", |p: &mut Person, v: u32| p.age = v))
                .property(Property::new("email", |p: &mut Person, v: String| p.email = v))
                .property(Property::new("favorite", |p: &mut Person, v: Option<Color>| {
                    p.favorite = v;
                })),
        )
    }
}

/// Constructor arguments plus one writable property
#[derive(Debug, Clone, PartialEq)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub zip: u32,
}

impl Shaped for Address {
    fn shape() -> Shape {
        Shape::Struct(
            StructShape::new()
                .constructor(Constructor::new(
                    vec![
                        Parameter::new::<String>("street"),
                        Parameter::new::<String>("city"),
                    ],
                    |args| {
                        Ok(Address {
                            street: args.take()?,
                            city: args.take()?,
                            zip: 0,
                        })
                    },
                ))
                .property(Property::new("zip", |a: &mut Address, v: u32| a.zip = v)),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderLine {
    pub sku: String,
    pub quantity: u16,
}

impl Shaped for OrderLine {
    fn shape() -> Shape {
        Shape::Struct(StructShape::new().constructor(Constructor::new(
            vec![Parameter::new::<String>("sku"), Parameter::new::<u16>("quantity")],
            |args| {
                Ok(OrderLine {
                    sku: args.take()?,
                    quantity: args.take()?,
                })
            },
        )))
    }
}

/// Nested graph: constructor objects plus collection and date properties
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: Uuid,
    pub customer: Person,
    pub shipping: Address,
    pub lines: Vec<OrderLine>,
    pub placed: Option<DateTime<Utc>>,
}

impl Shaped for Order {
    fn shape() -> Shape {
        Shape::Struct(
            StructShape::new()
                .constructor(Constructor::new(
                    vec![
                        Parameter::new::<Uuid>("id"),
                        Parameter::new::<Person>("customer"),
                        Parameter::new::<Address>("shipping"),
                    ],
                    |args| {
                        Ok(Order {
                            id: args.take()?,
                            customer: args.take()?,
                            shipping: args.take()?,
                            lines: Vec::new(),
                            placed: None,
                        })
                    },
                ))
                .property(Property::new("lines", |o: &mut Order, v: Vec<OrderLine>| {
                    o.lines = v;
                }))
                .property(Property::new("placed", |o: &mut Order, v: DateTime<Utc>| {
                    o.placed = Some(v);
                })),
        )
    }
}

/// Two constructors of different arity
#[derive(Debug, Clone, PartialEq)]
pub struct Rectangle {
    pub width: u32,
    pub height: u32,
}

impl Shaped for Rectangle {
    fn shape() -> Shape {
        Shape::Struct(
            StructShape::new()
                .constructor(Constructor::new(
                    vec![Parameter::new::<u32>("width"), Parameter::new::<u32>("height")],
                    |args| {
                        Ok(Rectangle {
                            width: args.take()?,
                            height: args.take()?,
                        })
                    },
                ))
                .constructor(Constructor::new(
                    vec![Parameter::new::<u32>("side")],
                    |args| {
                        let side = args.take()?;
                        Ok(Rectangle {
                            width: side,
                            height: side,
                        })
                    },
                )),
        )
    }
}

/// Recursive through an optional property
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeNode {
    pub value: i32,
    pub parent: Option<Box<TreeNode>>,
}

impl Shaped for TreeNode {
    fn shape() -> Shape {
        Shape::Struct(
            StructShape::new()
                .constructor(Constructor::new(vec![], |_| Ok(TreeNode::default())))
                .property(Property::new("value", |n: &mut TreeNode, v: i32| n.value = v))
                .property(Property::new(
                    "parent",
                    |n: &mut TreeNode, v: Option<Box<TreeNode>>| n.parent = v,
                )),
        )
    }
}

/// Only constructor requires another `SelfRef`
#[derive(Debug)]
pub struct SelfRef {
    pub next: Box<SelfRef>,
}

impl Shaped for SelfRef {
    fn shape() -> Shape {
        Shape::Struct(StructShape::new().constructor(Constructor::new(
            vec![Parameter::new::<Box<SelfRef>>("next")],
            |args| Ok(SelfRef { next: args.take()? }),
        )))
    }
}

/// Nothing is known about it; only customizations can create one
#[derive(Debug, Clone, PartialEq)]
pub struct Secret(pub String);

impl Shaped for Secret {
    fn shape() -> Shape {
        Shape::Opaque
    }
}

/// Constructor always fails
#[derive(Debug)]
pub struct Explosive;

impl Shaped for Explosive {
    fn shape() -> Shape {
        Shape::Struct(StructShape::new().constructor(Constructor::new(
            vec![],
            |_| -> Result<Explosive, SpecimenError> {
                Err(SpecimenError::construction("Explosive", "fuse lit"))
            },
        )))
    }
}
