//! Reductions (`Max`, `Min`) over one or more axes.
//!
//! A reduction throws away almost everything, so the input passes through
//! untouched and the inverse simply hands it back.

use ww_core::{Array, Value, WwError, WwResult};

use crate::traits::{PortValues, Signature, TankOp, input};

/// Resolve an `axis` value against `array`: `None` means every axis, an
/// `Int` one axis, a `List` of `Int` several. Negative axes count from the end.
pub(crate) fn reduction_axes(axis: &Value, array: &Array) -> WwResult<Vec<usize>> {
    let mut axes = match axis {
        Value::None => (0..array.ndim()).collect(),
        Value::Int(i) => vec![array.normalize_axis(*i)?],
        Value::List(items) => items
            .iter()
            .map(|item| array.normalize_axis(item.as_int()?))
            .collect::<WwResult<Vec<_>>>()?,
        other => {
            return Err(WwError::value(format!(
                "axis must be none, an int or a list of ints, got {}",
                other.kind()
            )));
        }
    };
    let count = axes.len();
    axes.sort_unstable();
    axes.dedup();
    if axes.len() != count {
        return Err(WwError::value("repeated axis in reduction"));
    }
    Ok(axes)
}

fn nan_max(x: f64, y: f64) -> f64 {
    if x.is_nan() || y.is_nan() { f64::NAN } else { x.max(y) }
}

fn nan_min(x: f64, y: f64) -> f64 {
    if x.is_nan() || y.is_nan() { f64::NAN } else { x.min(y) }
}

#[derive(Debug, Clone)]
struct Reduction {
    sig: Signature,
    int_op: fn(i64, i64) -> i64,
    float_op: fn(f64, f64) -> f64,
}

impl Reduction {
    fn new(type_name: &str, int_op: fn(i64, i64) -> i64, float_op: fn(f64, f64) -> f64) -> Self {
        Self {
            sig: Signature::new(type_name, &["a", "axis"], &["target", "a", "axis"]),
            int_op,
            float_op,
        }
    }

    fn pour(&self, slots: &PortValues) -> WwResult<PortValues> {
        let a = input(slots, "a")?;
        let axis = input(slots, "axis")?;
        let array = a.to_array()?;
        let axes = reduction_axes(axis, &array)?;
        let target = array.reduce_axes(&axes, self.int_op, self.float_op)?;
        Ok(PortValues::from([
            ("target".to_string(), target.into()),
            ("a".to_string(), a.clone()),
            ("axis".to_string(), axis.clone()),
        ]))
    }

    fn pump(&self, tubes: &PortValues) -> WwResult<PortValues> {
        input(tubes, "target")?;
        Ok(PortValues::from([
            ("a".to_string(), input(tubes, "a")?.clone()),
            ("axis".to_string(), input(tubes, "axis")?.clone()),
        ]))
    }
}

/// Maximum over `axis`. NaN propagates.
#[derive(Debug, Clone)]
pub struct Max(Reduction);

impl Default for Max {
    fn default() -> Self {
        Self(Reduction::new("Max", i64::max, nan_max))
    }
}

impl TankOp for Max {
    fn signature(&self) -> &Signature {
        &self.0.sig
    }

    fn pour(&self, slots: &PortValues) -> WwResult<PortValues> {
        self.0.pour(slots)
    }

    fn pump(&self, tubes: &PortValues) -> WwResult<PortValues> {
        self.0.pump(tubes)
    }
}

/// Minimum over `axis`. NaN propagates.
#[derive(Debug, Clone)]
pub struct Min(Reduction);

impl Default for Min {
    fn default() -> Self {
        Self(Reduction::new("Min", i64::min, nan_min))
    }
}

impl TankOp for Min {
    fn signature(&self) -> &Signature {
        &self.0.sig
    }

    fn pour(&self, slots: &PortValues) -> WwResult<PortValues> {
        self.0.pour(slots)
    }

    fn pump(&self, tubes: &PortValues) -> WwResult<PortValues> {
        self.0.pump(tubes)
    }
}
