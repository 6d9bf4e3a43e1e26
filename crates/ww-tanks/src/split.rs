//! Splitting an array into parts along one axis.

use ww_core::{Array, ArrayData, Value, WwError, WwResult};

use crate::traits::{PortValues, Signature, TankOp, input};

/// Read split points from an int array, an int or a list of ints.
pub(crate) fn split_points(indices: &Value) -> WwResult<Vec<usize>> {
    let raw: Vec<i64> = match indices {
        Value::Int(i) => vec![*i],
        Value::Array(a) => match a.data() {
            ArrayData::Int(v) if a.ndim() == 1 => v.clone(),
            _ => {
                return Err(WwError::value(format!(
                    "split indices must be a one-dimensional int array, got {} with shape {:?}",
                    a.dtype(),
                    a.shape()
                )));
            }
        },
        Value::List(items) => items.iter().map(Value::as_int).collect::<WwResult<_>>()?,
        other => {
            return Err(WwError::value(format!(
                "split indices must be ints, got {}",
                other.kind()
            )));
        }
    };
    raw.into_iter()
        .map(|i| {
            usize::try_from(i)
                .map_err(|_| WwError::value(format!("split index {} is negative", i)))
        })
        .collect()
}

/// Resolve a single `axis` value against `array`.
pub(crate) fn single_axis(axis: &Value, array: &Array) -> WwResult<usize> {
    array.normalize_axis(axis.as_int()?)
}

/// Splits `a` along `axis` at `indices` into a list of arrays.
///
/// The inverse concatenates the parts back together.
#[derive(Debug, Clone)]
pub struct Split {
    sig: Signature,
}

impl Default for Split {
    fn default() -> Self {
        Self {
            sig: Signature::new("Split", &["a", "indices", "axis"], &["target", "indices", "axis"]),
        }
    }
}

impl TankOp for Split {
    fn signature(&self) -> &Signature {
        &self.sig
    }

    fn pour(&self, slots: &PortValues) -> WwResult<PortValues> {
        let a = input(slots, "a")?.to_array()?;
        let indices = input(slots, "indices")?;
        let axis = input(slots, "axis")?;
        let parts = a.split(&split_points(indices)?, single_axis(axis, &a)?)?;
        Ok(PortValues::from([
            (
                "target".to_string(),
                Value::List(parts.into_iter().map(Value::Array).collect()),
            ),
            ("indices".to_string(), indices.clone()),
            ("axis".to_string(), axis.clone()),
        ]))
    }

    fn pump(&self, tubes: &PortValues) -> WwResult<PortValues> {
        let parts = input(tubes, "target")?
            .as_list()?
            .iter()
            .map(Value::to_array)
            .collect::<WwResult<Vec<_>>>()?;
        let axis = input(tubes, "axis")?;
        let first = parts
            .first()
            .ok_or_else(|| WwError::value("split produced no parts"))?;
        let a = Array::concat(&parts, single_axis(axis, first)?)?;
        Ok(PortValues::from([
            ("a".to_string(), a.into()),
            ("indices".to_string(), input(tubes, "indices")?.clone()),
            ("axis".to_string(), axis.clone()),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slots(a: Value, indices: Value, axis: i64) -> PortValues {
        PortValues::from([
            ("a".to_string(), a),
            ("indices".to_string(), indices),
            ("axis".to_string(), Value::Int(axis)),
        ])
    }

    #[test]
    fn split_vector() {
        let op = Split::default();
        let slots = slots(Value::from(vec![1, 2, 3, 4, 5]), Value::from(vec![1, 3]), 0);
        let tubes = op.pour(&slots).unwrap();
        assert_eq!(
            tubes["target"],
            Value::List(vec![
                Value::from(vec![1]),
                Value::from(vec![2, 3]),
                Value::from(vec![4, 5]),
            ])
        );
        assert_eq!(op.pump(&tubes).unwrap(), slots);
    }

    #[test]
    fn split_columns_of_grid() {
        let op = Split::default();
        let grid = Array::floats((0..8).map(f64::from).collect())
            .reshape(vec![2, 4])
            .unwrap();
        let slots = slots(grid.into(), Value::List(vec![Value::Int(2)]), -1);
        let tubes = op.pour(&slots).unwrap();
        let parts = tubes["target"].as_list().unwrap();
        let left = Array::floats(vec![0.0, 1.0, 4.0, 5.0]).reshape(vec![2, 2]).unwrap();
        assert_eq!(parts[0], Value::Array(left));
        assert_eq!(op.pump(&tubes).unwrap(), slots);
    }

    #[test]
    fn empty_parts_survive() {
        let op = Split::default();
        let slots = slots(Value::from(vec![1, 2]), Value::from(vec![0, 2]), 0);
        let tubes = op.pour(&slots).unwrap();
        assert_eq!(tubes["target"].as_list().unwrap().len(), 3);
        assert_eq!(op.pump(&tubes).unwrap(), slots);
    }

    #[test]
    fn bad_indices_rejected() {
        let op = Split::default();
        assert!(op.pour(&slots(Value::from(vec![1, 2]), Value::from(vec![3]), 0)).is_err());
        assert!(op.pour(&slots(Value::from(vec![1, 2]), Value::Int(-1), 0)).is_err());
        assert!(op.pour(&slots(Value::from(vec![1, 2]), Value::from(vec![1.0]), 0)).is_err());
        assert!(op.pour(&slots(Value::from(vec![1, 2]), Value::Int(1), 1)).is_err());
    }
}
