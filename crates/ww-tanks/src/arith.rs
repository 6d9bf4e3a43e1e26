//! Binary arithmetic tanks: `Add`, `Sub` and `Mul`.
//!
//! The operand with fewer elements (`b` on a tie) is the "smaller" one. It
//! is broadcast to the larger operand's shape and stored verbatim in
//! `smaller_size_array`; the larger operand is recomputed from `target` on
//! the way back. The broadcast result must have exactly the larger
//! operand's shape, otherwise the larger operand could not be recovered.
//!
//! Integer arithmetic is checked and always invertible. Float arithmetic
//! rounds, so `pour` runs the inverse on its own result and rejects inputs
//! whose larger operand would not come back bit for bit (NaN matches NaN).

use ww_core::{Array, ArrayData, DType, Value, WwError, WwResult, same_float};

use crate::traits::{PortValues, Signature, TankOp, input};

/// Both operands as arrays, the smaller one also broadcast to the result shape.
pub(crate) struct Aligned {
    pub larger: Array,
    pub smaller: Array,
    pub smaller_wide: Array,
    pub a_is_smaller: bool,
}

impl Aligned {
    pub fn new(a: &Value, b: &Value) -> WwResult<Self> {
        let a = a.to_array()?;
        let b = b.to_array()?;
        check_numeric(&a, &b)?;
        let a_is_smaller = a.len() < b.len();
        let (larger, smaller) = if a_is_smaller { (b, a) } else { (a, b) };
        let smaller_wide = smaller.broadcast_to(larger.shape())?;
        Ok(Self {
            larger,
            smaller,
            smaller_wide,
            a_is_smaller,
        })
    }

    /// Broadcast operands in `(a, b)` order.
    pub fn pair(&self) -> (&Array, &Array) {
        if self.a_is_smaller {
            (&self.smaller_wide, &self.larger)
        } else {
            (&self.larger, &self.smaller_wide)
        }
    }
}

pub(crate) fn check_numeric(a: &Array, b: &Array) -> WwResult<()> {
    match (a.dtype(), b.dtype()) {
        (DType::Int, DType::Int) | (DType::Float, DType::Float) => Ok(()),
        (x, y) => Err(WwError::value(format!(
            "expected int or float operands of the same dtype, got {} and {}",
            x, y
        ))),
    }
}

/// Elementwise combination of two same-shaped numeric arrays.
///
/// `int_op` returns `None` on overflow or when the result is not exact.
pub(crate) fn zip_with(
    x: &Array,
    y: &Array,
    what: &str,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> WwResult<Array> {
    if x.shape() != y.shape() {
        return Err(WwError::value(format!(
            "{}: shapes {:?} and {:?} differ",
            what,
            x.shape(),
            y.shape()
        )));
    }
    let data = match (x.data(), y.data()) {
        (ArrayData::Int(p), ArrayData::Int(q)) => {
            let out = p
                .iter()
                .zip(q)
                .map(|(&i, &j)| {
                    int_op(i, j).ok_or_else(|| {
                        WwError::value(format!("integer {} of {} and {} is not representable", what, i, j))
                    })
                })
                .collect::<WwResult<Vec<_>>>()?;
            ArrayData::Int(out)
        }
        (ArrayData::Float(p), ArrayData::Float(q)) => {
            ArrayData::Float(p.iter().zip(q).map(|(&i, &j)| float_op(i, j)).collect())
        }
        _ => {
            return Err(WwError::value(format!(
                "{}: expected int or float operands of the same dtype, got {} and {}",
                what,
                x.dtype(),
                y.dtype()
            )));
        }
    };
    Array::new(x.shape().to_vec(), data)
}

/// Flat positions of zero elements.
pub(crate) fn zero_positions(x: &Array) -> Vec<usize> {
    match x.data() {
        ArrayData::Int(v) => positions(v, |&e| e == 0),
        ArrayData::Float(v) => positions(v, |&e| e == 0.0),
        _ => Vec::new(),
    }
}

pub(crate) fn positions<T>(values: &[T], pred: impl Fn(&T) -> bool) -> Vec<usize> {
    values
        .iter()
        .enumerate()
        .filter(|(_, e)| pred(e))
        .map(|(i, _)| i)
        .collect()
}

/// Slot values from the recovered larger operand and the stored smaller one.
fn operands(a_is_smaller: bool, larger: Array, smaller: Array) -> PortValues {
    let (a, b) = if a_is_smaller {
        (smaller, larger)
    } else {
        (larger, smaller)
    };
    PortValues::from([("a".to_string(), a.into()), ("b".to_string(), b.into())])
}

struct SideInfo {
    target: Array,
    smaller: Array,
    smaller_wide: Array,
    a_is_smaller: bool,
}

impl SideInfo {
    fn read(tubes: &PortValues) -> WwResult<Self> {
        let target = input(tubes, "target")?.to_array()?;
        let smaller = input(tubes, "smaller_size_array")?.to_array()?;
        let a_is_smaller = input(tubes, "a_is_smaller")?.as_bool()?;
        check_numeric(&target, &smaller)?;
        let smaller_wide = smaller.broadcast_to(target.shape())?;
        Ok(Self {
            target,
            smaller,
            smaller_wide,
            a_is_smaller,
        })
    }
}

/// Fails when the inverse of a float operation does not reproduce the
/// larger operand.
fn check_recoverable(
    aligned: &Aligned,
    what: &str,
    recover: impl FnOnce() -> WwResult<Array>,
) -> WwResult<()> {
    if aligned.larger.dtype() != DType::Float {
        return Ok(());
    }
    let recovered = recover()?;
    let lost = match (aligned.larger.data(), recovered.data()) {
        (ArrayData::Float(want), ArrayData::Float(got)) => want
            .iter()
            .zip(got)
            .enumerate()
            .find(|(_, (w, g))| !same_float(**w, **g))
            .map(|(i, (w, g))| (i, *w, *g)),
        _ => None,
    };
    match lost {
        Some((i, want, got)) => Err(WwError::value(format!(
            "float {} is not reversible: element {} of the larger operand is {} but {} comes back",
            what, i, want, got
        ))),
        None => Ok(()),
    }
}

fn side_tubes(target: Array, aligned: Aligned) -> PortValues {
    PortValues::from([
        ("target".to_string(), target.into()),
        ("smaller_size_array".to_string(), aligned.smaller.into()),
        ("a_is_smaller".to_string(), Value::Bool(aligned.a_is_smaller)),
    ])
}

/// `target = a + b`.
#[derive(Debug, Clone)]
pub struct Add {
    sig: Signature,
}

impl Default for Add {
    fn default() -> Self {
        Self {
            sig: Signature::new(
                "Add",
                &["a", "b"],
                &["target", "smaller_size_array", "a_is_smaller"],
            ),
        }
    }
}

impl TankOp for Add {
    fn signature(&self) -> &Signature {
        &self.sig
    }

    fn pour(&self, slots: &PortValues) -> WwResult<PortValues> {
        let aligned = Aligned::new(input(slots, "a")?, input(slots, "b")?)?;
        let (a, b) = aligned.pair();
        let target = zip_with(a, b, "addition", i64::checked_add, |x, y| x + y)?;
        check_recoverable(&aligned, "addition", || {
            add_inverse(&target, &aligned.smaller_wide)
        })?;
        Ok(side_tubes(target, aligned))
    }

    fn pump(&self, tubes: &PortValues) -> WwResult<PortValues> {
        let side = SideInfo::read(tubes)?;
        let larger = add_inverse(&side.target, &side.smaller_wide)?;
        Ok(operands(side.a_is_smaller, larger, side.smaller))
    }
}

fn add_inverse(target: &Array, smaller_wide: &Array) -> WwResult<Array> {
    zip_with(target, smaller_wide, "subtraction", i64::checked_sub, |x, y| x - y)
}

/// `target = a - b`.
#[derive(Debug, Clone)]
pub struct Sub {
    sig: Signature,
}

impl Default for Sub {
    fn default() -> Self {
        Self {
            sig: Signature::new(
                "Sub",
                &["a", "b"],
                &["target", "smaller_size_array", "a_is_smaller"],
            ),
        }
    }
}

impl TankOp for Sub {
    fn signature(&self) -> &Signature {
        &self.sig
    }

    fn pour(&self, slots: &PortValues) -> WwResult<PortValues> {
        let aligned = Aligned::new(input(slots, "a")?, input(slots, "b")?)?;
        let (a, b) = aligned.pair();
        let target = zip_with(a, b, "subtraction", i64::checked_sub, |x, y| x - y)?;
        check_recoverable(&aligned, "subtraction", || {
            sub_inverse(&target, &aligned.smaller_wide, aligned.a_is_smaller)
        })?;
        Ok(side_tubes(target, aligned))
    }

    fn pump(&self, tubes: &PortValues) -> WwResult<PortValues> {
        let side = SideInfo::read(tubes)?;
        let larger = sub_inverse(&side.target, &side.smaller_wide, side.a_is_smaller)?;
        Ok(operands(side.a_is_smaller, larger, side.smaller))
    }
}

fn sub_inverse(target: &Array, smaller_wide: &Array, a_is_smaller: bool) -> WwResult<Array> {
    if a_is_smaller {
        // b = a - target
        zip_with(smaller_wide, target, "subtraction", i64::checked_sub, |x, y| x - y)
    } else {
        // a = target + b
        zip_with(target, smaller_wide, "addition", i64::checked_add, |x, y| x + y)
    }
}

/// `target = a * b`.
///
/// Where the broadcast smaller operand is zero the larger operand's element
/// is lost from `target`; those elements are kept in `missing_vals`, in flat
/// row-major order.
#[derive(Debug, Clone)]
pub struct Mul {
    sig: Signature,
}

impl Default for Mul {
    fn default() -> Self {
        Self {
            sig: Signature::new(
                "Mul",
                &["a", "b"],
                &["target", "smaller_size_array", "a_is_smaller", "missing_vals"],
            ),
        }
    }
}

impl TankOp for Mul {
    fn signature(&self) -> &Signature {
        &self.sig
    }

    fn pour(&self, slots: &PortValues) -> WwResult<PortValues> {
        let aligned = Aligned::new(input(slots, "a")?, input(slots, "b")?)?;
        let (a, b) = aligned.pair();
        let target = zip_with(a, b, "multiplication", i64::checked_mul, |x, y| x * y)?;
        let missing = aligned
            .larger
            .gather(&zero_positions(&aligned.smaller_wide));
        check_recoverable(&aligned, "multiplication", || {
            mul_inverse(&target, &aligned.smaller_wide, &missing)
        })?;
        let mut tubes = side_tubes(target, aligned);
        tubes.insert("missing_vals".to_string(), Value::Array(missing));
        Ok(tubes)
    }

    fn pump(&self, tubes: &PortValues) -> WwResult<PortValues> {
        let side = SideInfo::read(tubes)?;
        let missing = input(tubes, "missing_vals")?.to_array()?;
        let larger = mul_inverse(&side.target, &side.smaller_wide, &missing)?;
        Ok(operands(side.a_is_smaller, larger, side.smaller))
    }
}

/// Quotient of `target` by the smaller operand, with the elements hidden by
/// zeros put back from `missing`.
fn mul_inverse(target: &Array, smaller_wide: &Array, missing: &Array) -> WwResult<Array> {
    let quotient = zip_with(
        target,
        smaller_wide,
        "division",
        |x, y| match y {
            0 => Some(0),
            _ if x.checked_rem(y)? != 0 => None,
            _ => x.checked_div(y),
        },
        |x, y| if y == 0.0 { 0.0 } else { x / y },
    )?;
    quotient.scatter(&zero_positions(smaller_wide), missing)
}
