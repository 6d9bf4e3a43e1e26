//! Masked replacement.

use ww_core::{Array, ArrayData, Value, WwError, WwResult};

use crate::arith::positions;
use crate::traits::{PortValues, Signature, TankOp, input};

/// Replaces the elements of `a` where `mask` is true with `replace_with`.
///
/// `mask` (bool) and `replace_with` (same dtype as `a`) broadcast to the
/// shape of `a`. The overwritten elements are kept in `replaced_vals`, in
/// flat row-major order.
#[derive(Debug, Clone)]
pub struct Replace {
    sig: Signature,
}

impl Default for Replace {
    fn default() -> Self {
        Self {
            sig: Signature::new(
                "Replace",
                &["a", "mask", "replace_with"],
                &["target", "mask", "replaced_vals", "replace_with"],
            ),
        }
    }
}

/// Flat positions selected by `mask` once broadcast to `shape`.
fn masked_positions(mask: &Value, shape: &[usize]) -> WwResult<Vec<usize>> {
    let mask = mask.to_array()?.broadcast_to(shape)?;
    match mask.data() {
        ArrayData::Bool(v) => Ok(positions(v, |&m| m)),
        other => Err(WwError::value(format!(
            "mask must be bool, got {}",
            other.dtype()
        ))),
    }
}

impl TankOp for Replace {
    fn signature(&self) -> &Signature {
        &self.sig
    }

    fn pour(&self, slots: &PortValues) -> WwResult<PortValues> {
        let a = input(slots, "a")?.to_array()?;
        let mask = input(slots, "mask")?;
        let replace_with = input(slots, "replace_with")?;

        let fill = replace_with.to_array()?;
        if fill.dtype() != a.dtype() {
            return Err(WwError::value(format!(
                "cannot replace {} elements with {}",
                a.dtype(),
                fill.dtype()
            )));
        }
        let fill = fill.broadcast_to(a.shape())?;
        let idx = masked_positions(mask, a.shape())?;
        let replaced = a.gather(&idx);
        let target = a.scatter(&idx, &fill.gather(&idx))?;

        Ok(PortValues::from([
            ("target".to_string(), target.into()),
            ("mask".to_string(), mask.clone()),
            ("replaced_vals".to_string(), Value::Array(replaced)),
            ("replace_with".to_string(), replace_with.clone()),
        ]))
    }

    fn pump(&self, tubes: &PortValues) -> WwResult<PortValues> {
        let target = input(tubes, "target")?.to_array()?;
        let mask = input(tubes, "mask")?;
        let replaced = input(tubes, "replaced_vals")?.to_array()?;
        let idx = masked_positions(mask, target.shape())?;
        let a: Array = target.scatter(&idx, &replaced)?;
        Ok(PortValues::from([
            ("a".to_string(), a.into()),
            ("mask".to_string(), mask.clone()),
            ("replace_with".to_string(), input(tubes, "replace_with")?.clone()),
        ]))
    }
}
