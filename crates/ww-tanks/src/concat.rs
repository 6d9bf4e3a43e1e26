//! Concatenation of a list of arrays along one axis.

use ww_core::{Array, Value, WwError, WwResult};

use crate::split::{single_axis, split_points};
use crate::traits::{PortValues, Signature, TankOp, input};

/// Joins the arrays in `a` along `axis`; `indices` records where each part
/// started so the inverse can split them apart again.
#[derive(Debug, Clone)]
pub struct Concat {
    sig: Signature,
}

impl Default for Concat {
    fn default() -> Self {
        Self {
            sig: Signature::new("Concat", &["a", "axis"], &["target", "indices", "axis"]),
        }
    }
}

impl TankOp for Concat {
    fn signature(&self) -> &Signature {
        &self.sig
    }

    fn pour(&self, slots: &PortValues) -> WwResult<PortValues> {
        let parts = input(slots, "a")?
            .as_list()?
            .iter()
            .map(Value::to_array)
            .collect::<WwResult<Vec<_>>>()?;
        let axis = input(slots, "axis")?;
        let first = parts
            .first()
            .ok_or_else(|| WwError::value("cannot concatenate an empty list"))?;
        let resolved = single_axis(axis, first)?;
        let target = Array::concat(&parts, resolved)?;

        // Running offsets of every part but the first.
        let mut points = Vec::with_capacity(parts.len().saturating_sub(1));
        let mut offset = 0;
        for part in &parts[..parts.len() - 1] {
            offset += part.shape()[resolved];
            let point = i64::try_from(offset)
                .map_err(|_| WwError::value("concatenated axis is too long"))?;
            points.push(point);
        }

        Ok(PortValues::from([
            ("target".to_string(), target.into()),
            ("indices".to_string(), Value::from(points)),
            ("axis".to_string(), axis.clone()),
        ]))
    }

    fn pump(&self, tubes: &PortValues) -> WwResult<PortValues> {
        let target = input(tubes, "target")?.to_array()?;
        let axis = input(tubes, "axis")?;
        let points = split_points(input(tubes, "indices")?)?;
        let parts = target.split(&points, single_axis(axis, &target)?)?;
        Ok(PortValues::from([
            (
                "a".to_string(),
                Value::List(parts.into_iter().map(Value::Array).collect()),
            ),
            ("axis".to_string(), axis.clone()),
        ]))
    }
}
