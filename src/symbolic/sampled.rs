//! Numeric stand-in engine for tests.
//!
//! Every symbol evaluates to a fixed rational derived from its name, so the
//! generic pipeline stages can be checked without going through polynomial
//! arithmetic.

use std::fmt;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Zero};

use super::Scalar;

#[derive(Debug, Clone, PartialEq)]
pub struct Sampled(pub BigRational);

impl Sampled {
    /// Deterministic value in `[2, 90] / [1, 7]` for a symbol name (FNV-1a).
    pub fn sample(name: &str) -> BigRational {
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in name.bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        let numer = BigInt::from(hash % 89 + 2);
        let denom = BigInt::from((hash / 89) % 7 + 1);
        BigRational::new(numer, denom)
    }

    pub fn of(name: &str) -> Self {
        Self(Self::sample(name))
    }
}

impl fmt::Display for Sampled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Scalar for Sampled {
    fn zero() -> Self {
        Self(BigRational::zero())
    }

    fn one() -> Self {
        Self(BigRational::one())
    }

    fn constant(value: BigRational) -> Self {
        Self(value)
    }

    fn symbol(name: &str) -> Self {
        Self::of(name)
    }

    fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    fn add(&self, rhs: &Self) -> Self {
        Self(&self.0 + &rhs.0)
    }

    fn mul(&self, rhs: &Self) -> Self {
        Self(&self.0 * &rhs.0)
    }

    fn neg(&self) -> Self {
        Self(-&self.0)
    }

    fn inv(&self) -> Option<Self> {
        (!self.0.is_zero()).then(|| Self(self.0.recip()))
    }
}
