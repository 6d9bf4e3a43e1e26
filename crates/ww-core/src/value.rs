//! Payloads flowing along ports.

use crate::array::{Array, ArrayData};
use crate::error::{WwError, WwResult};
use crate::numeric::same_float;

/// An immutable value carried by a slot or tube.
///
/// Zero-dimensional arrays never appear as `Value::Array`: converting an
/// [`Array`] into a `Value` unwraps them into the matching scalar variant, so
/// scalars that go through array arithmetic come back as scalars.
#[derive(Debug, Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Array(Array),
    /// Structured composite, e.g. the parts produced by a split.
    List(Vec<Value>),
}

impl Value {
    /// Short name of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::None => "none",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Array(_) => "array",
            Value::List(_) => "list",
        }
    }

    /// View the value as an array; scalars become zero-dimensional arrays.
    pub fn to_array(&self) -> WwResult<Array> {
        match self {
            Value::Bool(v) => Ok(Array::scalar(ArrayData::Bool(vec![*v]))),
            Value::Int(v) => Ok(Array::scalar(ArrayData::Int(vec![*v]))),
            Value::Float(v) => Ok(Array::scalar(ArrayData::Float(vec![*v]))),
            Value::Str(v) => Ok(Array::scalar(ArrayData::Str(vec![v.clone()]))),
            Value::Array(a) => Ok(a.clone()),
            other => Err(WwError::value(format!(
                "expected an array or scalar, got {}",
                other.kind()
            ))),
        }
    }

    pub fn as_bool(&self) -> WwResult<bool> {
        match self {
            Value::Bool(v) => Ok(*v),
            other => Err(WwError::value(format!("expected bool, got {}", other.kind()))),
        }
    }

    pub fn as_int(&self) -> WwResult<i64> {
        match self {
            Value::Int(v) => Ok(*v),
            other => Err(WwError::value(format!("expected int, got {}", other.kind()))),
        }
    }

    pub fn as_list(&self) -> WwResult<&[Value]> {
        match self {
            Value::List(v) => Ok(v),
            other => Err(WwError::value(format!("expected list, got {}", other.kind()))),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => same_float(*a, *b),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            _ => false,
        }
    }
}

impl From<Array> for Value {
    fn from(array: Array) -> Self {
        if array.ndim() > 0 {
            return Value::Array(array);
        }
        match array.into_data() {
            ArrayData::Bool(mut v) => v.pop().map_or(Value::None, Value::Bool),
            ArrayData::Int(mut v) => v.pop().map_or(Value::None, Value::Int),
            ArrayData::Float(mut v) => v.pop().map_or(Value::None, Value::Float),
            ArrayData::Str(mut v) => v.pop().map_or(Value::None, Value::Str),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Vec<i64>> for Value {
    fn from(v: Vec<i64>) -> Self {
        Value::Array(Array::ints(v))
    }
}

impl From<Vec<i32>> for Value {
    fn from(v: Vec<i32>) -> Self {
        Value::Array(Array::ints(v.into_iter().map(i64::from).collect()))
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Value::Array(Array::floats(v))
    }
}

impl From<Vec<bool>> for Value {
    fn from(v: Vec<bool>) -> Self {
        Value::Array(Array::bools(v))
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

/// Build-time state of a funnel: a concrete value, or deferred to pour time.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Fill {
    Value(Value),
    /// The empty sentinel: the value will be supplied when pouring.
    #[default]
    Empty,
}

impl Fill {
    pub fn value(&self) -> Option<&Value> {
        match self {
            Fill::Value(v) => Some(v),
            Fill::Empty => None,
        }
    }
}

impl From<Value> for Fill {
    fn from(v: Value) -> Self {
        Fill::Value(v)
    }
}
