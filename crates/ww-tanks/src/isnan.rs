//! NaN detection.

use ww_core::{Array, ArrayData, WwError, WwResult};

use crate::traits::{PortValues, Signature, TankOp, input};

/// Boolean mask of the NaN elements of `a`. Int and bool arrays hold no
/// NaNs and give an all-false mask; strings are rejected.
#[derive(Debug, Clone)]
pub struct IsNan {
    sig: Signature,
}

impl Default for IsNan {
    fn default() -> Self {
        Self {
            sig: Signature::new("IsNan", &["a"], &["target", "a"]),
        }
    }
}

impl TankOp for IsNan {
    fn signature(&self) -> &Signature {
        &self.sig
    }

    fn pour(&self, slots: &PortValues) -> WwResult<PortValues> {
        let a = input(slots, "a")?;
        let array = a.to_array()?;
        let mask = match array.data() {
            ArrayData::Float(v) => v.iter().map(|x| x.is_nan()).collect(),
            ArrayData::Int(_) | ArrayData::Bool(_) => vec![false; array.len()],
            ArrayData::Str(_) => {
                return Err(WwError::value("cannot look for NaN in a str array"));
            }
        };
        let mask = Array::new(array.shape().to_vec(), ArrayData::Bool(mask))?;
        Ok(PortValues::from([
            ("target".to_string(), mask.into()),
            ("a".to_string(), a.clone()),
        ]))
    }

    fn pump(&self, tubes: &PortValues) -> WwResult<PortValues> {
        input(tubes, "target")?;
        Ok(PortValues::from([("a".to_string(), input(tubes, "a")?.clone())]))
    }
}
