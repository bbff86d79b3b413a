//! Payload values carried on data pins and stored on the blackboard.
//!
//! Each [`Value`] reports the [`PinType`] it satisfies; pin compatibility is
//! decided on declared types at `connect` time and re-checked when a node
//! fires an output value.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Declared type of a pin.
///
/// `Signal` pins carry no payload (pure execution flow). `Any` accepts every
/// value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinType {
    Signal,
    Any,
    Bool,
    Int,
    Float,
    Name,
    String,
    Enum,
    Vector,
    Rotator,
}

impl PinType {
    /// Whether a connection between pins of these declared types is allowed.
    ///
    /// Signal-only pins connect to anything (the payload, if any, is dropped or
    /// absent); `Any` connects to anything; otherwise the types must match.
    pub fn is_compatible_with(self, other: PinType) -> bool {
        self == other
            || matches!(self, PinType::Signal | PinType::Any)
            || matches!(other, PinType::Signal | PinType::Any)
    }

    /// Whether a concrete value may be carried on a pin of this type.
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            PinType::Signal | PinType::Any => true,
            ty => ty == value.pin_type(),
        }
    }
}

impl fmt::Display for PinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PinType::Signal => "signal",
            PinType::Any => "any",
            PinType::Bool => "bool",
            PinType::Int => "int",
            PinType::Float => "float",
            PinType::Name => "name",
            PinType::String => "string",
            PinType::Enum => "enum",
            PinType::Vector => "vector",
            PinType::Rotator => "rotator",
        };
        f.write_str(s)
    }
}

/// A typed payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Bool(bool),
    Int(i32),
    Float(f32),
    Name(String),
    String(String),
    /// Enum entries are stored by index; arithmetic compares use the index.
    Enum(u8),
    Vector { x: f32, y: f32, z: f32 },
    Rotator { pitch: f32, yaw: f32, roll: f32 },
}

impl Value {
    pub fn pin_type(&self) -> PinType {
        match self {
            Value::Bool(_) => PinType::Bool,
            Value::Int(_) => PinType::Int,
            Value::Float(_) => PinType::Float,
            Value::Name(_) => PinType::Name,
            Value::String(_) => PinType::String,
            Value::Enum(_) => PinType::Enum,
            Value::Vector { .. } => PinType::Vector,
            Value::Rotator { .. } => PinType::Rotator,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer and float views used by arithmetic comparisons.
    ///
    /// Floats floor to their integer view; ints and enums widen to float.
    /// Returns `None` for types that do not support arithmetic.
    pub fn numeric(&self) -> Option<(i32, f32)> {
        match self {
            Value::Int(i) => Some((*i, *i as f32)),
            Value::Float(f) => Some((f.floor() as i32, *f)),
            Value::Enum(e) => Some((i32::from(*e), f32::from(*e))),
            _ => None,
        }
    }

    /// Equality used by blackboard comparisons: floats (and float
    /// components) compare nearly-equal.
    pub fn nearly_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Float(a), Value::Float(b)) => nearly_equal(*a, *b),
            (
                Value::Vector { x, y, z },
                Value::Vector {
                    x: ox,
                    y: oy,
                    z: oz,
                },
            ) => nearly_equal(*x, *ox) && nearly_equal(*y, *oy) && nearly_equal(*z, *oz),
            (
                Value::Rotator { pitch, yaw, roll },
                Value::Rotator {
                    pitch: op,
                    yaw: oy,
                    roll: or,
                },
            ) => nearly_equal(*pitch, *op) && nearly_equal(*yaw, *oy) && nearly_equal(*roll, *or),
            (a, b) => a == b,
        }
    }
}

const NEARLY_EQUAL_TOLERANCE: f32 = 1.0e-8;

fn nearly_equal(a: f32, b: f32) -> bool {
    (a - b).abs() <= NEARLY_EQUAL_TOLERANCE
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Name(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Enum(e) => write!(f, "enum({})", e),
            Value::Vector { x, y, z } => write!(f, "({}, {}, {})", x, y, z),
            Value::Rotator { pitch, yaw, roll } => {
                write!(f, "(p={}, y={}, r={})", pitch, yaw, roll)
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}
