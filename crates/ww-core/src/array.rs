//! A small n-dimensional, row-major array.
//!
//! This is deliberately not a numeric library: it carries exactly what the
//! built-in tanks need to be exactly invertible (broadcasting, gathering,
//! scattering, splitting and concatenating along an axis, reductions).

use core::fmt;

use crate::error::{WwError, WwResult};
use crate::numeric::same_float;

/// Element type of an [`Array`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    Bool,
    Int,
    Float,
    Str,
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DType::Bool => "bool",
            DType::Int => "int",
            DType::Float => "float",
            DType::Str => "str",
        };
        f.write_str(name)
    }
}

/// Flat, homogeneous element storage.
#[derive(Debug, Clone)]
pub enum ArrayData {
    Bool(Vec<bool>),
    Int(Vec<i64>),
    Float(Vec<f64>),
    Str(Vec<String>),
}

impl ArrayData {
    /// Zero-length storage of the given dtype.
    pub fn empty(dtype: DType) -> Self {
        match dtype {
            DType::Bool => ArrayData::Bool(Vec::new()),
            DType::Int => ArrayData::Int(Vec::new()),
            DType::Float => ArrayData::Float(Vec::new()),
            DType::Str => ArrayData::Str(Vec::new()),
        }
    }

    pub fn dtype(&self) -> DType {
        match self {
            ArrayData::Bool(_) => DType::Bool,
            ArrayData::Int(_) => DType::Int,
            ArrayData::Float(_) => DType::Float,
            ArrayData::Str(_) => DType::Str,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ArrayData::Bool(v) => v.len(),
            ArrayData::Int(v) => v.len(),
            ArrayData::Float(v) => v.len(),
            ArrayData::Str(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Gather the elements at the given flat positions, in order.
    ///
    /// Positions must be in bounds; callers compute them from shapes.
    pub fn select(&self, idx: &[usize]) -> ArrayData {
        match self {
            ArrayData::Bool(v) => ArrayData::Bool(idx.iter().map(|&i| v[i]).collect()),
            ArrayData::Int(v) => ArrayData::Int(idx.iter().map(|&i| v[i]).collect()),
            ArrayData::Float(v) => ArrayData::Float(idx.iter().map(|&i| v[i]).collect()),
            ArrayData::Str(v) => ArrayData::Str(idx.iter().map(|&i| v[i].clone()).collect()),
        }
    }

    fn extend_from(&mut self, other: &ArrayData) -> WwResult<()> {
        match (self, other) {
            (ArrayData::Bool(a), ArrayData::Bool(b)) => a.extend_from_slice(b),
            (ArrayData::Int(a), ArrayData::Int(b)) => a.extend_from_slice(b),
            (ArrayData::Float(a), ArrayData::Float(b)) => a.extend_from_slice(b),
            (ArrayData::Str(a), ArrayData::Str(b)) => a.extend_from_slice(b),
            (a, b) => {
                return Err(WwError::value(format!(
                    "cannot combine {} and {} elements",
                    a.dtype(),
                    b.dtype()
                )));
            }
        }
        Ok(())
    }

    fn scatter(&mut self, idx: &[usize], values: &ArrayData) -> WwResult<()> {
        if idx.len() != values.len() {
            return Err(WwError::value(format!(
                "expected {} values to scatter, got {}",
                idx.len(),
                values.len()
            )));
        }
        match (self, values) {
            (ArrayData::Bool(a), ArrayData::Bool(b)) => {
                idx.iter().zip(b).for_each(|(&i, &x)| a[i] = x)
            }
            (ArrayData::Int(a), ArrayData::Int(b)) => {
                idx.iter().zip(b).for_each(|(&i, &x)| a[i] = x)
            }
            (ArrayData::Float(a), ArrayData::Float(b)) => {
                idx.iter().zip(b).for_each(|(&i, &x)| a[i] = x)
            }
            (ArrayData::Str(a), ArrayData::Str(b)) => {
                idx.iter().zip(b).for_each(|(&i, x)| a[i] = x.clone())
            }
            (a, b) => {
                return Err(WwError::value(format!(
                    "cannot write {} values into a {} array",
                    b.dtype(),
                    a.dtype()
                )));
            }
        }
        Ok(())
    }
}

impl PartialEq for ArrayData {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ArrayData::Bool(a), ArrayData::Bool(b)) => a == b,
            (ArrayData::Int(a), ArrayData::Int(b)) => a == b,
            (ArrayData::Float(a), ArrayData::Float(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(&x, &y)| same_float(x, y))
            }
            (ArrayData::Str(a), ArrayData::Str(b)) => a == b,
            _ => false,
        }
    }
}

/// Row-major n-dimensional array. A zero-dimensional array holds one element.
#[derive(Debug, Clone, PartialEq)]
pub struct Array {
    shape: Vec<usize>,
    data: ArrayData,
}

impl Array {
    /// Create an array, checking that the shape matches the element count.
    pub fn new(shape: Vec<usize>, data: ArrayData) -> WwResult<Self> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(WwError::value(format!(
                "shape {:?} needs {} elements, got {}",
                shape,
                expected,
                data.len()
            )));
        }
        Ok(Self { shape, data })
    }

    /// One-dimensional integer array.
    pub fn ints(values: Vec<i64>) -> Self {
        Self {
            shape: vec![values.len()],
            data: ArrayData::Int(values),
        }
    }

    /// One-dimensional float array.
    pub fn floats(values: Vec<f64>) -> Self {
        Self {
            shape: vec![values.len()],
            data: ArrayData::Float(values),
        }
    }

    /// One-dimensional boolean array.
    pub fn bools(values: Vec<bool>) -> Self {
        Self {
            shape: vec![values.len()],
            data: ArrayData::Bool(values),
        }
    }

    /// One-dimensional string array.
    pub fn strs(values: Vec<String>) -> Self {
        Self {
            shape: vec![values.len()],
            data: ArrayData::Str(values),
        }
    }

    /// Zero-length one-dimensional array of the given dtype.
    pub fn empty(dtype: DType) -> Self {
        Self {
            shape: vec![0],
            data: ArrayData::empty(dtype),
        }
    }

    /// Zero-dimensional array wrapping a single element.
    pub(crate) fn scalar(data: ArrayData) -> Self {
        Self {
            shape: Vec::new(),
            data,
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn dtype(&self) -> DType {
        self.data.dtype()
    }

    pub fn data(&self) -> &ArrayData {
        &self.data
    }

    pub fn into_data(self) -> ArrayData {
        self.data
    }

    /// Reinterpret the elements under a new shape with the same element count.
    pub fn reshape(self, shape: Vec<usize>) -> WwResult<Self> {
        Self::new(shape, self.data)
    }

    /// Elements at the given flat positions, as a one-dimensional array.
    pub fn gather(&self, idx: &[usize]) -> Array {
        Array::new_1d(self.data.select(idx))
    }

    /// Copy of `self` with the flat positions `idx` overwritten by `values`.
    pub fn scatter(&self, idx: &[usize], values: &Array) -> WwResult<Array> {
        if let Some(&bad) = idx.iter().find(|&&i| i >= self.len()) {
            return Err(WwError::value(format!(
                "scatter position {} out of bounds for {} elements",
                bad,
                self.len()
            )));
        }
        let mut data = self.data.clone();
        data.scatter(idx, &values.data)?;
        Ok(Array {
            shape: self.shape.clone(),
            data,
        })
    }

    /// Materialize `self` broadcast to `shape` (numpy rules, right-aligned).
    pub fn broadcast_to(&self, shape: &[usize]) -> WwResult<Array> {
        if self.shape == shape {
            return Ok(self.clone());
        }
        let incompatible = || {
            WwError::value(format!(
                "cannot broadcast shape {:?} to {:?}",
                self.shape, shape
            ))
        };
        if self.ndim() > shape.len() {
            return Err(incompatible());
        }
        let offset = shape.len() - self.ndim();
        for (i, &d) in self.shape.iter().enumerate() {
            if d != 1 && d != shape[offset + i] {
                return Err(incompatible());
            }
        }

        let in_strides = strides(&self.shape);
        let total: usize = shape.iter().product();
        let mut idx = Vec::with_capacity(total);
        let mut counter = vec![0usize; shape.len()];
        for _ in 0..total {
            let flat: usize = self
                .shape
                .iter()
                .enumerate()
                .filter(|&(_, &d)| d != 1)
                .map(|(i, _)| counter[offset + i] * in_strides[i])
                .sum();
            idx.push(flat);
            advance(&mut counter, shape);
        }
        Ok(Array {
            shape: shape.to_vec(),
            data: self.data.select(&idx),
        })
    }

    /// Split along `axis` at the given (non-decreasing) points.
    ///
    /// `points = [2, 5]` on an axis of length 7 yields parts of length 2, 3, 2.
    pub fn split(&self, points: &[usize], axis: usize) -> WwResult<Vec<Array>> {
        let n = self.axis_len(axis)?;
        let mut bounds = Vec::with_capacity(points.len() + 2);
        bounds.push(0);
        for &p in points {
            let last = bounds.last().copied().unwrap_or(0);
            if p < last || p > n {
                return Err(WwError::value(format!(
                    "split points {:?} must be non-decreasing and at most {}",
                    points, n
                )));
            }
            bounds.push(p);
        }
        bounds.push(n);

        let (outer, inner) = self.outer_inner(axis);
        let parts = bounds
            .windows(2)
            .map(|w| {
                let (start, end) = (w[0], w[1]);
                let mut idx = Vec::with_capacity(outer * (end - start) * inner);
                for o in 0..outer {
                    for k in start..end {
                        let base = o * n * inner + k * inner;
                        idx.extend(base..base + inner);
                    }
                }
                let mut shape = self.shape.clone();
                shape[axis] = end - start;
                Array {
                    shape,
                    data: self.data.select(&idx),
                }
            })
            .collect();
        Ok(parts)
    }

    /// Concatenate arrays along `axis`. Shapes must agree on every other axis.
    pub fn concat(parts: &[Array], axis: usize) -> WwResult<Array> {
        let first = parts
            .first()
            .ok_or_else(|| WwError::value("cannot concatenate zero arrays"))?;
        first.axis_len(axis)?;
        for part in &parts[1..] {
            let same_rest = part.ndim() == first.ndim()
                && part
                    .shape
                    .iter()
                    .zip(&first.shape)
                    .enumerate()
                    .all(|(i, (a, b))| i == axis || a == b);
            if !same_rest {
                return Err(WwError::value(format!(
                    "cannot concatenate shapes {:?} and {:?} along axis {}",
                    first.shape, part.shape, axis
                )));
            }
        }

        let mut combined = ArrayData::empty(first.dtype());
        let mut offsets = Vec::with_capacity(parts.len());
        for part in parts {
            offsets.push(combined.len());
            combined.extend_from(&part.data)?;
        }

        let (outer, inner) = first.outer_inner(axis);
        let mut idx = Vec::with_capacity(combined.len());
        for o in 0..outer {
            for (part, &offset) in parts.iter().zip(&offsets) {
                let len = part.shape[axis];
                for k in 0..len {
                    let base = offset + o * len * inner + k * inner;
                    idx.extend(base..base + inner);
                }
            }
        }

        let mut shape = first.shape.clone();
        shape[axis] = parts.iter().map(|p| p.shape[axis]).sum();
        Ok(Array {
            shape,
            data: combined.select(&idx),
        })
    }

    /// Fold the elements over `axes` (sorted, unique), dropping those axes.
    ///
    /// Only numeric arrays can be reduced. Reducing over a zero-length axis
    /// is an error since there is no identity element to fall back on.
    pub fn reduce_axes(
        &self,
        axes: &[usize],
        int_op: fn(i64, i64) -> i64,
        float_op: fn(f64, f64) -> f64,
    ) -> WwResult<Array> {
        for &axis in axes {
            if self.axis_len(axis)? == 0 {
                return Err(WwError::value("cannot reduce over a zero-length axis"));
            }
        }
        let out_shape: Vec<usize> = self
            .shape
            .iter()
            .enumerate()
            .filter(|(i, _)| !axes.contains(i))
            .map(|(_, &d)| d)
            .collect();
        let out_strides = strides(&out_shape);

        // Map every input position to its output position.
        let mut targets = Vec::with_capacity(self.len());
        let mut counter = vec![0usize; self.ndim()];
        for _ in 0..self.len() {
            let mut flat = 0;
            let mut j = 0;
            for (i, &c) in counter.iter().enumerate() {
                if !axes.contains(&i) {
                    flat += c * out_strides[j];
                    j += 1;
                }
            }
            targets.push(flat);
            advance(&mut counter, &self.shape);
        }

        let out_len: usize = out_shape.iter().product();
        let data = match &self.data {
            ArrayData::Int(v) => ArrayData::Int(fold(v, &targets, out_len, int_op)),
            ArrayData::Float(v) => ArrayData::Float(fold(v, &targets, out_len, float_op)),
            other => {
                return Err(WwError::value(format!(
                    "cannot reduce a {} array",
                    other.dtype()
                )));
            }
        };
        Array::new(out_shape, data)
    }

    /// Resolve a possibly negative axis against this array's rank.
    pub fn normalize_axis(&self, axis: i64) -> WwResult<usize> {
        let ndim = self.ndim() as i64;
        let resolved = if axis < 0 { axis + ndim } else { axis };
        if resolved < 0 || resolved >= ndim {
            return Err(WwError::value(format!(
                "axis {} out of range for a {}-dimensional array",
                axis, ndim
            )));
        }
        Ok(resolved as usize)
    }

    fn new_1d(data: ArrayData) -> Array {
        Array {
            shape: vec![data.len()],
            data,
        }
    }

    fn axis_len(&self, axis: usize) -> WwResult<usize> {
        self.shape.get(axis).copied().ok_or_else(|| {
            WwError::value(format!(
                "axis {} out of range for a {}-dimensional array",
                axis,
                self.ndim()
            ))
        })
    }

    fn outer_inner(&self, axis: usize) -> (usize, usize) {
        let outer = self.shape[..axis].iter().product();
        let inner = self.shape[axis + 1..].iter().product();
        (outer, inner)
    }
}

/// Broadcast two shapes together (numpy rules). `None` if incompatible.
pub fn broadcast_shape(a: &[usize], b: &[usize]) -> Option<Vec<usize>> {
    let ndim = a.len().max(b.len());
    let mut out = vec![0; ndim];
    for i in 0..ndim {
        let da = if i < ndim - a.len() { 1 } else { a[i - (ndim - a.len())] };
        let db = if i < ndim - b.len() { 1 } else { b[i - (ndim - b.len())] };
        out[i] = match (da, db) {
            (x, y) if x == y => x,
            (1, y) => y,
            (x, 1) => x,
            _ => return None,
        };
    }
    Some(out)
}

fn strides(shape: &[usize]) -> Vec<usize> {
    let mut out = vec![1; shape.len()];
    for i in (0..shape.len().saturating_sub(1)).rev() {
        out[i] = out[i + 1] * shape[i + 1];
    }
    out
}

/// Row-major increment of a multi-index.
fn advance(counter: &mut [usize], shape: &[usize]) {
    for k in (0..shape.len()).rev() {
        counter[k] += 1;
        if counter[k] < shape[k] {
            return;
        }
        counter[k] = 0;
    }
}

fn fold<T: Copy>(values: &[T], targets: &[usize], out_len: usize, op: fn(T, T) -> T) -> Vec<T> {
    let mut acc: Vec<Option<T>> = vec![None; out_len];
    for (&v, &t) in values.iter().zip(targets) {
        acc[t] = Some(match acc[t] {
            Some(a) => op(a, v),
            None => v,
        });
    }
    acc.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Array {
        // [[0, 1, 2], [3, 4, 5]]
        Array::ints((0..6).collect()).reshape(vec![2, 3]).unwrap()
    }

    #[test]
    fn new_checks_element_count() {
        assert!(Array::new(vec![2, 2], ArrayData::Int(vec![1, 2, 3])).is_err());
        assert!(Array::new(vec![], ArrayData::Int(vec![7])).is_ok());
    }

    #[test]
    fn broadcast_shapes() {
        assert_eq!(broadcast_shape(&[3], &[]), Some(vec![3]));
        assert_eq!(broadcast_shape(&[2, 3], &[3]), Some(vec![2, 3]));
        assert_eq!(broadcast_shape(&[2, 1], &[1, 4]), Some(vec![2, 4]));
        assert_eq!(broadcast_shape(&[2], &[3]), None);
    }

    #[test]
    fn broadcast_row_over_grid() {
        let row = Array::ints(vec![10, 20, 30]);
        let b = row.broadcast_to(&[2, 3]).unwrap();
        assert_eq!(b.shape(), &[2, 3]);
        assert_eq!(b.data(), &ArrayData::Int(vec![10, 20, 30, 10, 20, 30]));

        let col = Array::ints(vec![1, 2]).reshape(vec![2, 1]).unwrap();
        let b = col.broadcast_to(&[2, 3]).unwrap();
        assert_eq!(b.data(), &ArrayData::Int(vec![1, 1, 1, 2, 2, 2]));

        assert!(Array::ints(vec![1, 2]).broadcast_to(&[3]).is_err());
    }

    #[test]
    fn split_and_concat_along_axes() {
        let g = grid();
        let cols = g.split(&[1], 1).unwrap();
        assert_eq!(cols.len(), 2);
        assert_eq!(cols[0].shape(), &[2, 1]);
        assert_eq!(cols[0].data(), &ArrayData::Int(vec![0, 3]));
        assert_eq!(cols[1].data(), &ArrayData::Int(vec![1, 2, 4, 5]));
        assert_eq!(Array::concat(&cols, 1).unwrap(), g);

        let rows = g.split(&[1], 0).unwrap();
        assert_eq!(rows[1].data(), &ArrayData::Int(vec![3, 4, 5]));
        assert_eq!(Array::concat(&rows, 0).unwrap(), g);
    }

    #[test]
    fn split_rejects_bad_points() {
        let g = grid();
        assert!(g.split(&[2, 1], 1).is_err());
        assert!(g.split(&[4], 1).is_err());
        assert!(g.split(&[1], 2).is_err());
    }

    #[test]
    fn concat_rejects_mismatched_parts() {
        let a = Array::ints(vec![1, 2]);
        let b = Array::floats(vec![1.0]);
        assert!(Array::concat(&[a.clone(), b], 0).is_err());
        assert!(Array::concat(&[a, grid()], 0).is_err());
        assert!(Array::concat(&[], 0).is_err());
    }

    #[test]
    fn reduce_over_axes() {
        let g = grid();
        let r = g.reduce_axes(&[1], i64::max, f64::max).unwrap();
        assert_eq!(r, Array::ints(vec![2, 5]));
        let r = g.reduce_axes(&[0], i64::min, f64::min).unwrap();
        assert_eq!(r, Array::ints(vec![0, 1, 2]));
        let r = g.reduce_axes(&[0, 1], i64::max, f64::max).unwrap();
        assert_eq!(r.shape(), &[] as &[usize]);
        assert_eq!(r.data(), &ArrayData::Int(vec![5]));
    }

    #[test]
    fn scatter_and_gather() {
        let a = Array::ints(vec![1, 2, 3, 4]);
        assert_eq!(a.gather(&[3, 0]), Array::ints(vec![4, 1]));
        let b = a.scatter(&[1, 2], &Array::ints(vec![9, 8])).unwrap();
        assert_eq!(b, Array::ints(vec![1, 9, 8, 4]));
        assert!(a.scatter(&[9], &Array::ints(vec![0])).is_err());
        assert!(a.scatter(&[0], &Array::floats(vec![0.0])).is_err());
    }

    #[test]
    fn float_equality_is_nan_aware() {
        let a = Array::floats(vec![1.0, f64::NAN]);
        assert_eq!(a, a.clone());
        assert_ne!(a, Array::floats(vec![1.0, 2.0]));
    }

    #[test]
    fn normalize_negative_axis() {
        let g = grid();
        assert_eq!(g.normalize_axis(-1).unwrap(), 1);
        assert_eq!(g.normalize_axis(0).unwrap(), 0);
        assert!(g.normalize_axis(2).is_err());
        assert!(g.normalize_axis(-3).is_err());
    }
}
