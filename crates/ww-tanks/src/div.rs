//! Division with remainder.

use ww_core::{Array, ArrayData, Value, WwError, WwResult, floor_div};

use crate::arith::{check_numeric, zero_positions};
use crate::traits::{PortValues, Signature, TankOp, input};

/// `target = a / b`, keeping what is needed to rebuild `a` exactly.
///
/// `b` must broadcast into the shape of `a` and is passed through. Integers
/// use floor division with `remainder = a - target * b`. Floats store the
/// fused multiply-add residual, so `target * b + remainder` rounds back to
/// `a`; where the quotient or divisor is not finite the residual is `a`
/// itself. Where `b` is zero the quotient and remainder are zero and the
/// elements of `a` go to `missing_vals`.
#[derive(Debug, Clone)]
pub struct Div {
    sig: Signature,
}

impl Default for Div {
    fn default() -> Self {
        Self {
            sig: Signature::new(
                "Div",
                &["a", "b"],
                &["target", "b", "remainder", "missing_vals"],
            ),
        }
    }
}

fn int_quotient(a: i64, b: i64) -> WwResult<(i64, i64)> {
    if b == 0 {
        return Ok((0, 0));
    }
    let overflow = || WwError::value(format!("integer division of {} by {} overflows", a, b));
    let q = floor_div(a, b).ok_or_else(overflow)?;
    let r = q
        .checked_mul(b)
        .and_then(|qb| a.checked_sub(qb))
        .ok_or_else(overflow)?;
    Ok((q, r))
}

fn float_quotient(a: f64, b: f64) -> (f64, f64) {
    if b == 0.0 {
        return (0.0, 0.0);
    }
    let q = a / b;
    if !q.is_finite() || !b.is_finite() {
        return (q, a);
    }
    (q, (-q).mul_add(b, a))
}

fn float_dividend(q: f64, b: f64, r: f64) -> f64 {
    if !q.is_finite() || !b.is_finite() {
        return r;
    }
    q.mul_add(b, r)
}

impl TankOp for Div {
    fn signature(&self) -> &Signature {
        &self.sig
    }

    fn pour(&self, slots: &PortValues) -> WwResult<PortValues> {
        let a = input(slots, "a")?.to_array()?;
        let b = input(slots, "b")?;
        let divisor = b.to_array()?;
        check_numeric(&a, &divisor)?;
        let wide = divisor.broadcast_to(a.shape())?;

        let (target, remainder) = match (a.data(), wide.data()) {
            (ArrayData::Int(x), ArrayData::Int(y)) => {
                let pairs = x
                    .iter()
                    .zip(y)
                    .map(|(&i, &j)| int_quotient(i, j))
                    .collect::<WwResult<Vec<_>>>()?;
                let (q, r) = pairs.into_iter().unzip();
                (ArrayData::Int(q), ArrayData::Int(r))
            }
            (ArrayData::Float(x), ArrayData::Float(y)) => {
                let (q, r) = x
                    .iter()
                    .zip(y)
                    .map(|(&i, &j)| float_quotient(i, j))
                    .unzip();
                (ArrayData::Float(q), ArrayData::Float(r))
            }
            _ => return Err(WwError::Invariant { what: "operands checked numeric" }),
        };
        let missing = a.gather(&zero_positions(&wide));

        Ok(PortValues::from([
            ("target".to_string(), Array::new(a.shape().to_vec(), target)?.into()),
            ("b".to_string(), b.clone()),
            ("remainder".to_string(), Array::new(a.shape().to_vec(), remainder)?.into()),
            ("missing_vals".to_string(), Value::Array(missing)),
        ]))
    }

    fn pump(&self, tubes: &PortValues) -> WwResult<PortValues> {
        let target = input(tubes, "target")?.to_array()?;
        let b = input(tubes, "b")?;
        let remainder = input(tubes, "remainder")?.to_array()?;
        let missing = input(tubes, "missing_vals")?.to_array()?;
        let divisor = b.to_array()?;
        check_numeric(&target, &divisor)?;
        check_numeric(&target, &remainder)?;
        if remainder.shape() != target.shape() {
            return Err(WwError::value(format!(
                "remainder shape {:?} does not match target shape {:?}",
                remainder.shape(),
                target.shape()
            )));
        }
        let wide = divisor.broadcast_to(target.shape())?;

        let dividend = match (target.data(), wide.data(), remainder.data()) {
            (ArrayData::Int(q), ArrayData::Int(d), ArrayData::Int(r)) => {
                let values = q
                    .iter()
                    .zip(d)
                    .zip(r)
                    .map(|((&q, &d), &r)| {
                        q.checked_mul(d)
                            .and_then(|qd| qd.checked_add(r))
                            .ok_or_else(|| {
                                WwError::value(format!(
                                    "{} * {} + {} overflows",
                                    q, d, r
                                ))
                            })
                    })
                    .collect::<WwResult<Vec<_>>>()?;
                ArrayData::Int(values)
            }
            (ArrayData::Float(q), ArrayData::Float(d), ArrayData::Float(r)) => ArrayData::Float(
                q.iter()
                    .zip(d)
                    .zip(r)
                    .map(|((&q, &d), &r)| float_dividend(q, d, r))
                    .collect(),
            ),
            _ => return Err(WwError::Invariant { what: "operands checked numeric" }),
        };
        let a = Array::new(target.shape().to_vec(), dividend)?
            .scatter(&zero_positions(&wide), &missing)?;

        Ok(PortValues::from([
            ("a".to_string(), a.into()),
            ("b".to_string(), b.clone()),
        ]))
    }
}
