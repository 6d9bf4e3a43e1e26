/// Floating point type used throughout system
pub type Real = f64;

/// Exact float equality that treats every NaN as equal to every other NaN.
///
/// Reversible pipelines routinely carry NaNs through (masks of missing
/// values), so plain IEEE equality would make `pump(pour(x)) == x` fail on
/// inputs that were recovered perfectly.
pub fn same_float(a: Real, b: Real) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

/// Floor division for integers, matching the sign convention of `//`.
///
/// Returns `None` on division by zero or overflow.
pub fn floor_div(a: i64, b: i64) -> Option<i64> {
    let q = a.checked_div(b)?;
    if a % b != 0 && ((a < 0) != (b < 0)) {
        q.checked_sub(1)
    } else {
        Some(q)
    }
}
