//! Canonical rational functions over [`Poly`].

use std::fmt;

use num_rational::BigRational;
use num_traits::One;

use super::poly::Poly;
use super::{Differentiable, Scalar};

/// `num / den` with `gcd(num, den) = 1` and a monic denominator.
///
/// Every constructor goes through [`RationalFunction::reduced`] or
/// [`RationalFunction::normalized`], so equal functions are structurally
/// equal and `Display` output is deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RationalFunction {
    num: Poly,
    den: Poly,
}

impl RationalFunction {
    pub fn from_poly(poly: Poly) -> Self {
        Self {
            num: poly,
            den: Poly::one(),
        }
    }

    pub fn numerator(&self) -> &Poly {
        &self.num
    }

    pub fn denominator(&self) -> &Poly {
        &self.den
    }

    pub fn pow(&self, exp: u32) -> Self {
        // powers of coprime polynomials stay coprime
        Self::normalized(self.num.pow(exp), self.den.pow(exp))
    }

    pub fn evaluate<F>(&self, lookup: &F) -> Option<f64>
    where
        F: Fn(&str) -> Option<f64>,
    {
        let den = self.den.evaluate(lookup)?;
        if den == 0.0 {
            return None;
        }
        Some(self.num.evaluate(lookup)? / den)
    }

    /// Cancel common factors, then normalize.
    fn reduced(num: Poly, den: Poly) -> Self {
        if num.is_zero() {
            return Self::from_poly(Poly::zero());
        }
        let g = num.gcd(&den);
        if g.is_one() {
            return Self::normalized(num, den);
        }
        Self::normalized(num.div_rem(&g).0, den.div_rem(&g).0)
    }

    /// Make the denominator monic. Caller guarantees `num` and `den` are coprime.
    fn normalized(num: Poly, den: Poly) -> Self {
        match den.leading_term().map(|(_, c)| c.clone()) {
            Some(lead) if !lead.is_one() => {
                let factor = lead.recip();
                Self {
                    num: num.scale(&factor),
                    den: den.scale(&factor),
                }
            }
            _ => Self { num, den },
        }
    }
}

/// Substitute `value` for `var` in a polynomial via its coefficient expansion.
fn substitute_poly(poly: &Poly, var: &str, value: &RationalFunction) -> RationalFunction {
    let mut acc = RationalFunction::zero();
    for (exp, coeff) in poly.coefficients_in(var) {
        let term = RationalFunction::from_poly(coeff).mul(&value.pow(exp));
        acc = acc.add(&term);
    }
    acc
}

impl Scalar for RationalFunction {
    fn zero() -> Self {
        Self::from_poly(Poly::zero())
    }

    fn one() -> Self {
        Self::from_poly(Poly::one())
    }

    fn constant(value: BigRational) -> Self {
        Self::from_poly(Poly::constant(value))
    }

    fn symbol(name: &str) -> Self {
        Self::from_poly(Poly::var(name))
    }

    fn is_zero(&self) -> bool {
        self.num.is_zero()
    }

    fn add(&self, rhs: &Self) -> Self {
        if self.is_zero() {
            return rhs.clone();
        }
        if rhs.is_zero() {
            return self.clone();
        }
        if self.den == rhs.den {
            return Self::reduced(&self.num + &rhs.num, self.den.clone());
        }
        let num = &(&self.num * &rhs.den) + &(&rhs.num * &self.den);
        Self::reduced(num, &self.den * &rhs.den)
    }

    fn sub(&self, rhs: &Self) -> Self {
        self.add(&rhs.neg())
    }

    fn mul(&self, rhs: &Self) -> Self {
        if self.is_zero() || rhs.is_zero() {
            return Self::zero();
        }
        // cross-cancel so the product is already in lowest terms
        let g1 = self.num.gcd(&rhs.den);
        let g2 = rhs.num.gcd(&self.den);
        let (a, d) = if g1.is_one() {
            (self.num.clone(), rhs.den.clone())
        } else {
            (self.num.div_rem(&g1).0, rhs.den.div_rem(&g1).0)
        };
        let (c, b) = if g2.is_one() {
            (rhs.num.clone(), self.den.clone())
        } else {
            (rhs.num.div_rem(&g2).0, self.den.div_rem(&g2).0)
        };
        Self::normalized(&a * &c, &b * &d)
    }

    fn neg(&self) -> Self {
        Self {
            num: -&self.num,
            den: self.den.clone(),
        }
    }

    fn inv(&self) -> Option<Self> {
        if self.is_zero() {
            return None;
        }
        Some(Self::normalized(self.den.clone(), self.num.clone()))
    }

    fn weight(&self) -> usize {
        self.num.len() + self.den.len()
    }
}

impl Differentiable for RationalFunction {
    fn derivative(&self, var: &str) -> Self {
        let dn = self.num.derivative(var);
        let dd = self.den.derivative(var);
        if dd.is_zero() {
            return Self::reduced(dn, self.den.clone());
        }
        let num = &(&dn * &self.den) - &(&self.num * &dd);
        Self::reduced(num, &self.den * &self.den)
    }

    fn substitute(&self, var: &str, value: &Self) -> Option<Self> {
        if self.num.degree_in(var) == 0 && self.den.degree_in(var) == 0 {
            return Some(self.clone());
        }
        let num = substitute_poly(&self.num, var, value);
        let den = substitute_poly(&self.den, var, value);
        num.div(&den)
    }

    fn simplify(&self) -> Self {
        Self::reduced(self.num.clone(), self.den.clone())
    }
}

impl fmt::Display for RationalFunction {
    /// `R1`, `-1/(C1*R1)`, `(R1 + R2)/L1`, `x/(2*y)`. A fractional
    /// coefficient on a single-term numerator moves into the denominator.
    /// Denominators are parenthesised unless they are a bare power or a
    /// constant.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scale = match self.num.leading_term() {
            Some((_, c)) if self.num.len() == 1 && !c.denom().is_one() => {
                Some(BigRational::from_integer(c.denom().clone()))
            }
            _ => None,
        };
        let (num, den) = match scale {
            Some(q) => (self.num.scale(&q), self.den.scale(&q)),
            None => (self.num.clone(), self.den.clone()),
        };

        if den.is_one() {
            return write!(f, "{}", num);
        }
        if num.len() > 1 {
            write!(f, "({})", num)?;
        } else {
            write!(f, "{}", num)?;
        }
        let bare = den.len() == 1
            && den
                .leading_term()
                .is_some_and(|(m, c)| m.is_one() || (c.is_one() && m.factors().len() == 1));
        if bare {
            write!(f, "/{}", den)
        } else {
            write!(f, "/({})", den)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;

    fn sym(name: &str) -> RationalFunction {
        RationalFunction::symbol(name)
    }

    fn int(n: i64) -> RationalFunction {
        RationalFunction::constant(BigRational::from_integer(BigInt::from(n)))
    }

    #[test]
    fn test_fractional_coefficient_moves_to_denominator() {
        let half_gm = int(2).mul(&sym("gm"));
        assert_eq!(int(1).div(&half_gm).unwrap().to_string(), "1/(2*gm)");
        assert_eq!(sym("x").div(&int(2)).unwrap().to_string(), "x/2");
        let r = int(-3).mul(&sym("x")).div(&int(2).mul(&sym("y").add(&int(1)))).unwrap();
        assert_eq!(r.to_string(), "-3*x/(2*y + 2)");
    }

    #[test]
    fn test_cancellation() {
        // (R1*R2) / R1 = R2
        let r = sym("R1").mul(&sym("R2")).div(&sym("R1")).unwrap();
        assert_eq!(r, sym("R2"));
        assert_eq!(r.denominator(), &Poly::one());
    }

    #[test]
    fn test_sum_of_fractions() {
        // 1/R1 + 1/R2 = (R1 + R2)/(R1*R2)
        let g = sym("R1").inv().unwrap().add(&sym("R2").inv().unwrap());
        assert_eq!(g.to_string(), "(R1 + R2)/(R1*R2)");
        // and back: 1/g = R1*R2/(R1 + R2)
        assert_eq!(g.inv().unwrap().to_string(), "R1*R2/(R1 + R2)");
    }

    #[test]
    fn test_denominator_is_monic() {
        let r = sym("x").div(&int(2).mul(&sym("y"))).unwrap();
        assert_eq!(r.denominator(), &Poly::var("y"));
        assert_eq!(r.to_string(), "x/(2*y)");
        let neg = int(1).div(&sym("y").neg()).unwrap();
        assert_eq!(neg.to_string(), "-1/y");
    }

    #[test]
    fn test_sub_to_zero() {
        let a = sym("a").div(&sym("b").add(&sym("c"))).unwrap();
        assert!(a.sub(&a).is_zero());
        assert!(int(0).inv().is_none());
        assert!(a.div(&int(0)).is_none());
    }

    #[test]
    fn test_display_negative_reciprocal() {
        let r = int(-1).div(&sym("C1").mul(&sym("R1"))).unwrap();
        assert_eq!(r.to_string(), "-1/(C1*R1)");
    }

    #[test]
    fn test_derivative_quotient_rule() {
        // d/dx (x / (x + a)) = a / (x + a)^2
        let x = sym("x");
        let f = x.div(&x.add(&sym("a"))).unwrap();
        let expected = sym("a").div(&x.add(&sym("a")).pow(2)).unwrap();
        assert_eq!(f.derivative("x"), expected);
        assert!(f.derivative("zz").is_zero());
    }

    #[test]
    fn test_substitute() {
        // (x + 1) / y with x = y - 1 gives 1
        let f = sym("x").add(&int(1)).div(&sym("y")).unwrap();
        let value = sym("y").sub(&int(1));
        assert_eq!(f.substitute("x", &value), Some(int(1)));
        // substituting into a denominator that becomes zero fails
        let g = int(1).div(&sym("x")).unwrap();
        assert_eq!(g.substitute("x", &int(0)), None);
        assert_eq!(g.substitute("q", &int(0)), Some(g.clone()));
    }

    #[test]
    fn test_simplify_is_idempotent() {
        let f = sym("R1")
            .add(&sym("R2"))
            .mul(&sym("L1"))
            .div(&sym("R2").add(&sym("R1")))
            .unwrap();
        assert_eq!(f, sym("L1"));
        assert_eq!(f.simplify(), f.simplify().simplify());
    }

    #[test]
    fn test_evaluate() {
        let f = sym("a").div(&sym("b").add(&int(1))).unwrap();
        let value = f
            .evaluate(&|name: &str| match name {
                "a" => Some(3.0),
                "b" => Some(2.0),
                _ => None,
            })
            .unwrap();
        assert!((value - 1.0).abs() < 1e-12);
    }
}
