//! Symbolic algebra used by the pipeline.
//!
//! The compiler, solver and analysis stages are generic over [`Scalar`]; the
//! linearization stage additionally needs [`Differentiable`]. The production
//! engine is [`RationalFunction`]: exact rational functions in the circuit's
//! symbols, kept in canonical form so that equal expressions print equally.

pub mod matrix;
pub mod poly;
pub mod rational;

#[cfg(test)]
pub(crate) mod sampled;

use std::fmt;

use num_rational::BigRational;

pub use matrix::{Matrix, Singular};
pub use poly::{Monomial, Poly};
pub use rational::RationalFunction;

/// Field operations over symbolic expressions.
pub trait Scalar: Clone + PartialEq + fmt::Debug + fmt::Display {
    fn zero() -> Self;
    fn one() -> Self;
    fn constant(value: BigRational) -> Self;
    fn symbol(name: &str) -> Self;

    fn is_zero(&self) -> bool;

    fn add(&self, rhs: &Self) -> Self;
    fn sub(&self, rhs: &Self) -> Self {
        self.add(&rhs.neg())
    }
    fn mul(&self, rhs: &Self) -> Self;
    fn neg(&self) -> Self;

    /// Multiplicative inverse, `None` for zero.
    fn inv(&self) -> Option<Self>;

    fn div(&self, rhs: &Self) -> Option<Self> {
        rhs.inv().map(|r| self.mul(&r))
    }

    /// Rough size of the expression, used to pick elimination pivots.
    fn weight(&self) -> usize {
        1
    }
}

/// Calculus on top of [`Scalar`].
pub trait Differentiable: Scalar {
    fn derivative(&self, symbol: &str) -> Self;

    /// Replace `symbol` by `value`. `None` when the result would divide by zero.
    fn substitute(&self, symbol: &str, value: &Self) -> Option<Self>;

    /// Canonical form. Must be idempotent.
    fn simplify(&self) -> Self;
}
