//! Literal values in definition and I/O files.
//!
//! Nested sequences become arrays: they must be rectangular and hold one
//! element kind (integers mixed with floats become floats). `{ list: [...] }`
//! is a composite such as the parts of a split.
//!
//! Plain sequences cannot say what an empty array holds, nor carry NaN or
//! infinities through JSON. Such values are written in the explicit form
//! `{ dtype: float, shape: [0, 3], data: [] }`, with row-major `data` and
//! non-finite floats spelled `"nan"`, `"inf"` and `"-inf"`.

use serde::{Deserialize, Serialize};
use ww_core::{Array, ArrayData, DType, Value, WwError, WwResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ValueDef {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Seq(Vec<ValueDef>),
    List {
        list: Vec<ValueDef>,
    },
    Typed {
        dtype: ElementType,
        shape: Vec<usize>,
        data: Vec<ValueDef>,
    },
}

/// Element type named in the explicit array form.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ElementType {
    Bool,
    Int,
    Float,
    Str,
}

impl From<DType> for ElementType {
    fn from(dtype: DType) -> Self {
        match dtype {
            DType::Bool => ElementType::Bool,
            DType::Int => ElementType::Int,
            DType::Float => ElementType::Float,
            DType::Str => ElementType::Str,
        }
    }
}

impl From<ElementType> for DType {
    fn from(dtype: ElementType) -> Self {
        match dtype {
            ElementType::Bool => DType::Bool,
            ElementType::Int => DType::Int,
            ElementType::Float => DType::Float,
            ElementType::Str => DType::Str,
        }
    }
}

impl ValueDef {
    pub fn to_value(&self) -> WwResult<Value> {
        Ok(match self {
            ValueDef::None => Value::None,
            ValueDef::Bool(b) => Value::Bool(*b),
            ValueDef::Int(i) => Value::Int(*i),
            ValueDef::Float(x) => Value::Float(*x),
            ValueDef::Str(s) => Value::Str(s.clone()),
            ValueDef::Seq(_) => {
                let mut shape = Vec::new();
                let mut leaves = Vec::new();
                collect(self, 0, &mut shape, &mut leaves)?;
                Value::Array(Array::new(shape, leaf_data(leaves)?)?)
            }
            ValueDef::List { list } => {
                Value::List(list.iter().map(ValueDef::to_value).collect::<WwResult<_>>()?)
            }
            ValueDef::Typed { dtype, shape, data } => {
                let leaves: Vec<&ValueDef> = data.iter().collect();
                let data = typed_data((*dtype).into(), &leaves)?;
                Value::from(Array::new(shape.clone(), data)?)
            }
        })
    }

    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::None => ValueDef::None,
            Value::Bool(b) => ValueDef::Bool(*b),
            Value::Int(i) => ValueDef::Int(*i),
            Value::Float(x) if !x.is_finite() => ValueDef::Typed {
                dtype: ElementType::Float,
                shape: Vec::new(),
                data: vec![float_def(*x)],
            },
            Value::Float(x) => ValueDef::Float(*x),
            Value::Str(s) => ValueDef::Str(s.clone()),
            Value::Array(array) if needs_explicit_form(array) => ValueDef::Typed {
                dtype: array.dtype().into(),
                shape: array.shape().to_vec(),
                data: leaves(array),
            },
            Value::Array(array) => nest(array.shape(), leaves(array)),
            Value::List(items) => ValueDef::List {
                list: items.iter().map(ValueDef::from_value).collect(),
            },
        }
    }
}

fn needs_explicit_form(array: &Array) -> bool {
    match array.data() {
        _ if array.is_empty() => true,
        ArrayData::Float(v) => v.iter().any(|x| !x.is_finite()),
        _ => false,
    }
}

fn leaves(array: &Array) -> Vec<ValueDef> {
    match array.data() {
        ArrayData::Bool(v) => v.iter().map(|&b| ValueDef::Bool(b)).collect(),
        ArrayData::Int(v) => v.iter().map(|&i| ValueDef::Int(i)).collect(),
        ArrayData::Float(v) => v.iter().map(|&x| float_def(x)).collect(),
        ArrayData::Str(v) => v.iter().cloned().map(ValueDef::Str).collect(),
    }
}

fn float_def(x: f64) -> ValueDef {
    if x.is_finite() {
        ValueDef::Float(x)
    } else if x.is_nan() {
        ValueDef::Str("nan".to_string())
    } else if x > 0.0 {
        ValueDef::Str("inf".to_string())
    } else {
        ValueDef::Str("-inf".to_string())
    }
}

fn float_leaf(leaf: &ValueDef) -> WwResult<f64> {
    match leaf {
        ValueDef::Float(x) => Ok(*x),
        ValueDef::Int(i) => Ok(*i as f64),
        ValueDef::Str(s) => match s.as_str() {
            "nan" => Ok(f64::NAN),
            "inf" => Ok(f64::INFINITY),
            "-inf" => Ok(f64::NEG_INFINITY),
            _ => Err(WwError::value(format!("{:?} is not a float", s))),
        },
        _ => Err(WwError::value("float array holds a non-numeric element")),
    }
}

impl From<&Value> for ValueDef {
    fn from(value: &Value) -> Self {
        ValueDef::from_value(value)
    }
}

fn collect<'a>(
    def: &'a ValueDef,
    depth: usize,
    shape: &mut Vec<usize>,
    leaves: &mut Vec<&'a ValueDef>,
) -> WwResult<()> {
    let ragged = || WwError::value("array literal is not rectangular");
    match def {
        ValueDef::Seq(items) => {
            match shape.get(depth) {
                Some(&n) if n != items.len() => return Err(ragged()),
                Some(_) => {}
                // the first sequence seen at this depth fixes its length
                None if depth == shape.len() && leaves.is_empty() => shape.push(items.len()),
                None => return Err(ragged()),
            }
            for item in items {
                collect(item, depth + 1, shape, leaves)?;
            }
            Ok(())
        }
        ValueDef::List { .. } | ValueDef::None => {
            Err(WwError::value("arrays hold only booleans, numbers or strings"))
        }
        _ if depth == shape.len() => {
            leaves.push(def);
            Ok(())
        }
        _ => Err(ragged()),
    }
}

fn leaf_data(leaves: Vec<&ValueDef>) -> WwResult<ArrayData> {
    let mixed = || WwError::value("array literal mixes element kinds");
    let dtype = leaves.iter().try_fold(None, |dtype, leaf| {
        let kind = match leaf {
            ValueDef::Bool(_) => DType::Bool,
            ValueDef::Int(_) => DType::Int,
            ValueDef::Float(_) => DType::Float,
            _ => DType::Str,
        };
        match (dtype, kind) {
            (None, k) => Ok(Some(k)),
            (Some(d), k) if d == k => Ok(Some(d)),
            (Some(DType::Int), DType::Float) | (Some(DType::Float), DType::Int) => {
                Ok(Some(DType::Float))
            }
            _ => Err(mixed()),
        }
    })?;

    typed_data(dtype.unwrap_or(DType::Int), &leaves)
}

fn typed_data(dtype: DType, leaves: &[&ValueDef]) -> WwResult<ArrayData> {
    let mixed = || WwError::value(format!("{} array holds an element of another kind", dtype));
    Ok(match dtype {
        DType::Bool => ArrayData::Bool(
            leaves
                .iter()
                .map(|l| match l {
                    ValueDef::Bool(b) => Ok(*b),
                    _ => Err(mixed()),
                })
                .collect::<WwResult<_>>()?,
        ),
        DType::Int => ArrayData::Int(
            leaves
                .iter()
                .map(|l| match l {
                    ValueDef::Int(i) => Ok(*i),
                    _ => Err(mixed()),
                })
                .collect::<WwResult<_>>()?,
        ),
        DType::Float => ArrayData::Float(
            leaves
                .iter()
                .map(|l| float_leaf(l))
                .collect::<WwResult<_>>()?,
        ),
        DType::Str => ArrayData::Str(
            leaves
                .iter()
                .map(|l| match l {
                    ValueDef::Str(s) => Ok(s.clone()),
                    _ => Err(mixed()),
                })
                .collect::<WwResult<_>>()?,
        ),
    })
}

/// Rebuild nested sequences from row-major leaves.
fn nest(shape: &[usize], leaves: Vec<ValueDef>) -> ValueDef {
    match shape {
        [] => leaves.into_iter().next().unwrap_or(ValueDef::None),
        [_] => ValueDef::Seq(leaves),
        [n, rest @ ..] => {
            let stride: usize = rest.iter().product();
            let mut leaves = leaves.into_iter();
            ValueDef::Seq(
                (0..*n)
                    .map(|_| nest(rest, leaves.by_ref().take(stride).collect()))
                    .collect(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> ValueDef {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn scalars_and_null() {
        assert_eq!(parse("3").to_value().unwrap(), Value::Int(3));
        assert_eq!(parse("2.5").to_value().unwrap(), Value::Float(2.5));
        assert_eq!(parse("true").to_value().unwrap(), Value::Bool(true));
        assert_eq!(parse("~").to_value().unwrap(), Value::None);
        assert_eq!(parse("abc").to_value().unwrap(), Value::from("abc"));
    }

    #[test]
    fn nested_sequences_become_arrays() {
        let value = parse("[[1, 2, 3], [4, 5, 6]]").to_value().unwrap();
        let Value::Array(array) = &value else {
            panic!("expected an array, got {value:?}");
        };
        assert_eq!(array.shape(), &[2, 3]);
        assert_eq!(array.data(), &ArrayData::Int(vec![1, 2, 3, 4, 5, 6]));
        assert_eq!(ValueDef::from_value(&value), parse("[[1, 2, 3], [4, 5, 6]]"));

        assert_eq!(
            parse("[1, 2.5]").to_value().unwrap(),
            Value::from(vec![1.0, 2.5])
        );
        assert_eq!(parse("[]").to_value().unwrap(), Value::from(Vec::<i64>::new()));
    }

    #[test]
    fn bad_arrays_rejected() {
        assert!(parse("[[1, 2], [3]]").to_value().is_err());
        assert!(parse("[[1, 2], 3]").to_value().is_err());
        assert!(parse("[1, [2, 3]]").to_value().is_err());
        assert!(parse("[1, true]").to_value().is_err());
        assert!(parse("[1, ~]").to_value().is_err());
    }

    #[test]
    fn empty_arrays_keep_dtype_and_shape() {
        let values = [
            Value::Array(Array::empty(DType::Float)),
            Value::Array(Array::empty(DType::Str)),
            Value::Array(Array::new(vec![0, 3], ArrayData::Float(Vec::new())).unwrap()),
            Value::Array(Array::new(vec![2, 0], ArrayData::Int(Vec::new())).unwrap()),
        ];
        for value in values {
            let def = ValueDef::from_value(&value);
            assert!(matches!(def, ValueDef::Typed { .. }), "{def:?}");
            assert_eq!(def.to_value().unwrap(), value);

            let json = serde_json::to_string(&def).unwrap();
            let back: ValueDef = serde_json::from_str(&json).unwrap();
            assert_eq!(back.to_value().unwrap(), value, "{json}");
        }
        let def = parse("{ dtype: float, shape: [0, 3], data: [] }");
        let Value::Array(array) = def.to_value().unwrap() else {
            panic!("expected an array");
        };
        assert_eq!(array.shape(), &[0, 3]);
        assert_eq!(array.dtype(), DType::Float);
    }

    #[test]
    fn non_finite_floats_survive_json() {
        let values = [
            Value::from(vec![1.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY]),
            Value::Float(f64::NAN),
            Value::Float(f64::NEG_INFINITY),
            Value::List(vec![Value::Float(f64::INFINITY), Value::from(vec![2.5])]),
        ];
        for value in values {
            let json = serde_json::to_string(&ValueDef::from_value(&value)).unwrap();
            assert!(!json.contains("null"), "{json}");
            let back: ValueDef = serde_json::from_str(&json).unwrap();
            assert_eq!(back.to_value().unwrap(), value, "{json}");
        }
        // finite float arrays keep the plain form
        assert_eq!(
            ValueDef::from_value(&Value::from(vec![1.0, 2.5])),
            parse("[1.0, 2.5]")
        );
    }

    #[test]
    fn explicit_form_is_checked() {
        assert!(parse("{ dtype: int, shape: [2], data: [1] }").to_value().is_err());
        assert!(parse("{ dtype: int, shape: [1], data: [nan] }").to_value().is_err());
        assert!(parse("{ dtype: float, shape: [1], data: [nope] }").to_value().is_err());
        assert_eq!(
            parse("{ dtype: float, shape: [2], data: [1, inf] }").to_value().unwrap(),
            Value::from(vec![1.0, f64::INFINITY])
        );
    }

    #[test]
    fn lists_are_composites() {
        let value = parse("{ list: [[1, 2], 3] }").to_value().unwrap();
        assert_eq!(
            value,
            Value::List(vec![Value::from(vec![1, 2]), Value::Int(3)])
        );
        assert_eq!(ValueDef::from_value(&value), parse("{ list: [[1, 2], 3] }"));
    }
}
