//! Dense tensors of ring elements
//!
//! A [`RingTensor`] is a batch of elements of `Z_m[X]/(X^n + 1)` with a
//! compile-time representation marker: [`Coeff`] for coefficient form,
//! [`Eval`] for the evaluation (NTT) form. The batch shape does not count
//! the ring degree; storage is a flat row-major `Vec<u64>` with the ring
//! coefficients innermost. Tensors are immutable once materialized —
//! every operation produces a new tensor.
//!
//! Pointwise multiplication is only defined in the evaluation domain;
//! norms and the bit-monomial matrix-vector product only in the
//! coefficient domain. The type system enforces both.

use std::marker::PhantomData;
use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

use crate::{error::HeError, ring::Modulus};

// ---------------------------
// | Shapes & representation |
// ---------------------------

/// The batch shape of a tensor (the ring degree is tracked separately)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shape(Vec<usize>);

impl Shape {
    /// Create a shape from its dimensions
    pub fn new(dims: Vec<usize>) -> Self {
        Self(dims)
    }

    /// The scalar shape
    pub fn scalar() -> Self {
        Self(vec![])
    }

    /// The dimensions
    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    /// The number of elements
    pub fn size(&self) -> usize {
        self.0.iter().product()
    }

    /// The last dimension, or 1 for a scalar shape
    pub fn last_dim(&self) -> usize {
        self.0.last().copied().unwrap_or(1)
    }

    /// A copy of this shape with the last dimension replaced
    pub fn replace_last(&self, dim: usize) -> Self {
        let mut dims = self.0.clone();
        match dims.last_mut() {
            Some(last) => *last = dim,
            None => dims.push(dim),
        }
        Self(dims)
    }

    /// A copy of this shape with `dim` inserted before the last axis
    pub fn insert_before_last(&self, dim: usize) -> Self {
        let mut dims = self.0.clone();
        let at = dims.len().saturating_sub(1);
        dims.insert(at, dim);
        Self(dims)
    }
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::Coeff {}
    impl Sealed for super::Eval {}
}

/// Marker trait for the two ring-element representations
pub trait Representation: sealed::Sealed + Clone + Copy + Send + Sync + 'static {}

/// Coefficient representation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Coeff {}
impl Representation for Coeff {}

/// Evaluation (NTT) representation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Eval {}
impl Representation for Eval {}

// --------------
// | RingTensor |
// --------------

/// A dense batch of ring elements in representation `D`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct RingTensor<D: Representation> {
    /// The batch shape
    shape: Shape,
    /// The ring degree
    degree: usize,
    /// The coefficient modulus
    modulus: Modulus,
    /// Flat storage, ring coefficients innermost
    data: Vec<u64>,
    /// Representation marker
    _rep: PhantomData<D>,
}

impl<D: Representation> RingTensor<D> {
    /// Build a tensor from its raw parts
    pub fn from_raw(shape: Shape, degree: usize, modulus: Modulus, data: Vec<u64>) -> Self {
        assert_eq!(data.len(), shape.size() * degree, "data length must match shape");
        Self { shape, degree, modulus, data, _rep: PhantomData }
    }

    /// The all-zero tensor
    pub fn zeros(shape: Shape, degree: usize, modulus: Modulus) -> Self {
        let len = shape.size() * degree;
        Self { shape, degree, modulus, data: vec![0; len], _rep: PhantomData }
    }

    /// The batch shape
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// The ring degree
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// The coefficient modulus
    pub fn modulus(&self) -> Modulus {
        self.modulus
    }

    /// The flat storage
    pub fn data(&self) -> &[u64] {
        &self.data
    }

    /// Mutable flat storage
    pub fn data_mut(&mut self) -> &mut [u64] {
        &mut self.data
    }

    /// Whether every coefficient is zero
    pub fn is_zero(&self) -> bool {
        self.data.iter().all(|&x| x == 0)
    }

    /// Multiply every element by a scalar residue
    pub fn scalar_mul(&self, scalar: u64) -> Self {
        let m = self.modulus;
        let data = self.data.iter().map(|&x| m.mul(x, scalar)).collect();
        Self::from_raw(self.shape.clone(), self.degree, m, data)
    }

    /// Pointwise multiply by a single ring element, broadcast over the
    /// batch
    ///
    /// Meaningful in the evaluation domain where the pointwise product is
    /// the ring product; exposed for both representations because the
    /// slot-wise product is what both callers want.
    pub fn mul_elem(&self, elem: &RingTensor<D>) -> Self {
        assert_eq!(elem.shape.size(), 1, "broadcast element must be a single ring element");
        assert_eq!(elem.degree, self.degree);
        assert_eq!(elem.modulus, self.modulus);

        let m = self.modulus;
        let e = &elem.data;
        let data = self
            .data
            .chunks(self.degree)
            .flat_map(|poly| poly.iter().zip(e.iter()).map(|(&x, &y)| m.mul(x, y)))
            .collect();
        Self::from_raw(self.shape.clone(), self.degree, m, data)
    }

    /// Sum all elements of the batch into a single ring element
    pub fn sum_elements(&self) -> Self {
        let m = self.modulus;
        let mut acc = vec![0u64; self.degree];
        for poly in self.data.chunks(self.degree) {
            for (a, &x) in acc.iter_mut().zip(poly.iter()) {
                *a = m.add(*a, x);
            }
        }
        Self::from_raw(Shape::scalar(), self.degree, m, acc)
    }

    /// Reinterpret the batch under a new shape of the same size
    pub fn reshape(self, shape: Shape) -> Self {
        assert_eq!(shape.size(), self.shape.size(), "reshape must preserve the element count");
        Self { shape, ..self }
    }

    /// Serialize the coefficients little-endian
    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.data.len() * 8);
        for &w in &self.data {
            out.extend_from_slice(&w.to_le_bytes());
        }
        out
    }

    /// Rebuild a tensor from little-endian bytes and known metadata
    pub fn from_le_bytes(
        shape: Shape,
        degree: usize,
        modulus: Modulus,
        bytes: &[u8],
    ) -> Option<Self> {
        if bytes.len() != shape.size() * degree * 8 {
            return None;
        }
        let data = bytes
            .chunks_exact(8)
            .map(|c| u64::from_le_bytes(c.try_into().expect("chunk of 8 bytes")))
            .collect();
        Some(Self::from_raw(shape, degree, modulus, data))
    }
}

impl RingTensor<Eval> {
    /// The tensor whose every element is the constant polynomial `value`
    ///
    /// A constant polynomial evaluates to the same value at every root,
    /// so in the evaluation domain every slot carries `value`.
    pub fn constant(shape: Shape, degree: usize, modulus: Modulus, value: u64) -> Self {
        let v = modulus.reduce(value);
        let len = shape.size() * degree;
        Self::from_raw(shape, degree, modulus, vec![v; len])
    }
}

impl RingTensor<Coeff> {
    /// Lift residues into a larger modulus, unchanged
    pub fn lift(&self, to: Modulus) -> Self {
        debug_assert!(self.modulus.value() < to.value());
        Self::from_raw(self.shape.clone(), self.degree, to, self.data.clone())
    }

    /// Centered reduction into a smaller modulus
    ///
    /// Each coefficient is lifted to its signed representative in
    /// `(-m/2, m/2]`; a representative of magnitude `>= m/4` means the
    /// noise left the decryption window and is reported as
    /// [`HeError::DecryptOutOfRange`].
    pub fn centered_reduce(&self, to: Modulus) -> Result<Self, HeError> {
        let from = self.modulus;
        let window = from.value() as i128 / 4;

        let mut data = Vec::with_capacity(self.data.len());
        for &x in &self.data {
            let lifted = from.lift_centered(x);
            if lifted.abs() >= window {
                return Err(HeError::DecryptOutOfRange);
            }
            data.push(to.reduce_signed(lifted));
        }
        Ok(Self::from_raw(self.shape.clone(), self.degree, to, data))
    }

    /// The infinity norm: the largest magnitude of a centered
    /// representative
    pub fn inf_norm(&self) -> u64 {
        self.data.iter().map(|&x| self.modulus.lift_centered(x).unsigned_abs() as u64).max().unwrap_or(0)
    }
}

// --------------
// | Arithmetic |
// --------------

fn zip_with<D: Representation>(
    lhs: &RingTensor<D>,
    rhs: &RingTensor<D>,
    f: impl Fn(&Modulus, u64, u64) -> u64,
) -> RingTensor<D> {
    assert_eq!(lhs.shape, rhs.shape, "tensor shapes must match");
    assert_eq!(lhs.degree, rhs.degree);
    assert_eq!(lhs.modulus, rhs.modulus, "tensor moduli must match");

    let m = lhs.modulus;
    let data = lhs.data.iter().zip(rhs.data.iter()).map(|(&a, &b)| f(&m, a, b)).collect();
    RingTensor::from_raw(lhs.shape.clone(), lhs.degree, m, data)
}

impl<D: Representation> Add for &RingTensor<D> {
    type Output = RingTensor<D>;

    fn add(self, rhs: Self) -> Self::Output {
        zip_with(self, rhs, |m, a, b| m.add(a, b))
    }
}

impl<D: Representation> Sub for &RingTensor<D> {
    type Output = RingTensor<D>;

    fn sub(self, rhs: Self) -> Self::Output {
        zip_with(self, rhs, |m, a, b| m.sub(a, b))
    }
}

impl<D: Representation> Neg for &RingTensor<D> {
    type Output = RingTensor<D>;

    fn neg(self) -> Self::Output {
        let m = self.modulus;
        let data = self.data.iter().map(|&x| m.neg(x)).collect();
        RingTensor::from_raw(self.shape.clone(), self.degree, m, data)
    }
}

/// Pointwise product, only defined in the evaluation domain
impl Mul for &RingTensor<Eval> {
    type Output = RingTensor<Eval>;

    fn mul(self, rhs: Self) -> Self::Output {
        zip_with(self, rhs, |m, a, b| m.mul(a, b))
    }
}

// ---------------------------
// | Bit-monomial matrix ops |
// ---------------------------

/// A sparse matrix whose entries are monomials `X^k` or absent
///
/// Shape is `(.., rows, cols)`; an entry of `None` acts as zero. Used as
/// the challenge matrix of the plaintext proof.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonomialMatrix {
    /// The matrix shape, `(.., rows, cols)`
    shape: Shape,
    /// Row-major entries; `Some(k)` is the monomial `X^k`
    entries: Vec<Option<u32>>,
}

impl MonomialMatrix {
    /// Build a matrix from its entries
    pub fn from_entries(shape: Shape, entries: Vec<Option<u32>>) -> Self {
        assert_eq!(entries.len(), shape.size());
        assert!(shape.dims().len() >= 2, "monomial matrix needs (.., rows, cols)");
        Self { shape, entries }
    }

    /// The matrix shape
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Matrix-vector product over the trailing axes
    ///
    /// `self` has shape `(.., rows, cols)` and `x` shape `(.., cols)`;
    /// the result has shape `(.., rows)`. Multiplying by `X^k` is a
    /// negacyclic rotation: coefficient `i` moves to `(i + k) mod n` and
    /// picks up a sign for every wrap around `X^n = -1`.
    pub fn matvec(&self, x: &RingTensor<Coeff>) -> RingTensor<Coeff> {
        let dims = self.shape.dims();
        let (rows, cols) = (dims[dims.len() - 2], dims[dims.len() - 1]);
        assert_eq!(x.shape().last_dim(), cols, "matrix cols must match vector length");
        let batch = x.shape().size() / cols.max(1);
        assert_eq!(self.shape.size(), batch * rows * cols, "batch shapes must match");

        let n = x.degree();
        let m = x.modulus();
        let out_shape = x.shape().replace_last(rows);
        let mut out = vec![0u64; batch * rows * n];

        for b in 0..batch {
            for r in 0..rows {
                let acc = &mut out[(b * rows + r) * n..(b * rows + r + 1) * n];
                for c in 0..cols {
                    let Some(k) = self.entries[(b * rows + r) * cols + c] else {
                        continue;
                    };
                    let k = k as usize;
                    debug_assert!(k < n);
                    let poly = &x.data()[(b * cols + c) * n..(b * cols + c + 1) * n];
                    for (i, &v) in poly.iter().enumerate() {
                        let (j, wrapped) =
                            if i + k < n { (i + k, false) } else { (i + k - n, true) };
                        acc[j] = if wrapped { m.sub(acc[j], v) } else { m.add(acc[j], v) };
                    }
                }
            }
        }

        RingTensor::from_raw(out_shape, n, m, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coeff(shape: Vec<usize>, degree: usize, q: u64, data: Vec<u64>) -> RingTensor<Coeff> {
        RingTensor::from_raw(Shape::new(shape), degree, Modulus::new(q), data)
    }

    #[test]
    fn test_add_sub_roundtrip() {
        let a = coeff(vec![2], 2, 17, vec![1, 2, 3, 4]);
        let b = coeff(vec![2], 2, 17, vec![16, 16, 5, 0]);
        let sum = &a + &b;
        assert_eq!(sum.data(), &[0, 1, 8, 4]);
        assert_eq!(&sum - &b, a);
    }

    #[test]
    fn test_constant_eval() {
        let t = RingTensor::<Eval>::constant(Shape::new(vec![3]), 4, Modulus::new(17), 20);
        assert!(t.data().iter().all(|&x| x == 3));
    }

    #[test]
    fn test_sum_elements() {
        let a = coeff(vec![2], 2, 17, vec![1, 2, 3, 4]);
        let s = a.sum_elements();
        assert_eq!(s.shape().size(), 1);
        assert_eq!(s.data(), &[4, 6]);
    }

    #[test]
    fn test_inf_norm_uses_centered_lift() {
        let a = coeff(vec![1], 4, 17, vec![0, 1, 16, 8]);
        // 16 lifts to -1, 8 stays 8
        assert_eq!(a.inf_norm(), 8);
    }

    #[test]
    fn test_centered_reduce_window() {
        let q = Modulus::new(998244353);
        let p = Modulus::new(17);
        let within = RingTensor::<Coeff>::from_raw(
            Shape::new(vec![1]),
            2,
            q,
            vec![35, 998244353 - 35],
        );
        let reduced = within.centered_reduce(p).unwrap();
        assert_eq!(reduced.data(), &[1, 16]);

        let outside =
            RingTensor::<Coeff>::from_raw(Shape::new(vec![1]), 2, q, vec![998244353 / 2, 0]);
        assert_eq!(outside.centered_reduce(p), Err(HeError::DecryptOutOfRange));
    }

    #[test]
    fn test_monomial_matvec_rotation() {
        // W = [X^1, absent] applied to (f0, f1) gives X * f0
        let w = MonomialMatrix::from_entries(Shape::new(vec![1, 2]), vec![Some(1), None]);
        let x = coeff(vec![2], 4, 17, vec![1, 2, 3, 4, 9, 9, 9, 9]);
        let y = w.matvec(&x);
        assert_eq!(y.shape().dims(), &[1]);
        // X * (1 + 2X + 3X^2 + 4X^3) = -4 + X + 2X^2 + 3X^3
        assert_eq!(y.data(), &[13, 1, 2, 3]);
    }

    #[test]
    fn test_reshape_preserves_data() {
        let a = coeff(vec![2, 2], 2, 17, vec![1, 2, 3, 4, 5, 6, 7, 8]);
        let b = a.clone().reshape(Shape::new(vec![4]));
        assert_eq!(b.shape().dims(), &[4]);
        assert_eq!(b.data(), a.data());
    }

    #[test]
    fn test_byte_roundtrip() {
        let a = coeff(vec![2], 2, 17, vec![1, 2, 3, 4]);
        let bytes = a.to_le_bytes();
        let back =
            RingTensor::<Coeff>::from_le_bytes(Shape::new(vec![2]), 2, Modulus::new(17), &bytes)
                .unwrap();
        assert_eq!(back, a);
    }
}
