//! Sparse multivariate polynomials with exact rational coefficients.
//!
//! Terms live in a `BTreeMap` keyed by [`Monomial`] under lexicographic order
//! (alphabetically first variable most significant), so the last entry is
//! always the leading term. Zero coefficients are never stored, which makes
//! structural equality the same as polynomial equality.

use std::cmp::Ordering;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};

/// A power product such as `C1*R1^2`.
///
/// Stored as `(variable, exponent)` pairs sorted by variable name, with no
/// zero exponents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Monomial(Vec<(String, u32)>);

impl Monomial {
    pub fn one() -> Self {
        Self(Vec::new())
    }

    pub fn var(name: &str) -> Self {
        Self(vec![(name.to_string(), 1)])
    }

    pub fn var_pow(name: &str, exp: u32) -> Self {
        if exp == 0 {
            Self::one()
        } else {
            Self(vec![(name.to_string(), exp)])
        }
    }

    pub fn is_one(&self) -> bool {
        self.0.is_empty()
    }

    pub fn factors(&self) -> &[(String, u32)] {
        &self.0
    }

    pub fn degree_in(&self, name: &str) -> u32 {
        self.0
            .iter()
            .find(|(v, _)| v == name)
            .map(|(_, e)| *e)
            .unwrap_or(0)
    }

    /// Drop `name` from the product.
    pub fn without(&self, name: &str) -> Self {
        Self(self.0.iter().filter(|(v, _)| v != name).cloned().collect())
    }

    pub fn mul(&self, other: &Monomial) -> Monomial {
        let mut out = Vec::with_capacity(self.0.len() + other.0.len());
        let (mut i, mut j) = (0, 0);
        while i < self.0.len() && j < other.0.len() {
            let (a, ea) = &self.0[i];
            let (b, eb) = &other.0[j];
            match a.cmp(b) {
                Ordering::Less => {
                    out.push((a.clone(), *ea));
                    i += 1;
                }
                Ordering::Greater => {
                    out.push((b.clone(), *eb));
                    j += 1;
                }
                Ordering::Equal => {
                    out.push((a.clone(), ea + eb));
                    i += 1;
                    j += 1;
                }
            }
        }
        out.extend_from_slice(&self.0[i..]);
        out.extend_from_slice(&other.0[j..]);
        Monomial(out)
    }

    /// `self / other`, or `None` when `other` does not divide `self`.
    pub fn divide(&self, other: &Monomial) -> Option<Monomial> {
        let mut out = Vec::with_capacity(self.0.len());
        let mut j = 0;
        for (v, e) in &self.0 {
            match other.0.get(j) {
                Some((w, d)) if w == v => {
                    if d > e {
                        return None;
                    }
                    if e > d {
                        out.push((v.clone(), e - d));
                    }
                    j += 1;
                }
                // `other` carries a variable that `self` lacks
                Some((w, _)) if w < v => return None,
                _ => out.push((v.clone(), *e)),
            }
        }
        if j < other.0.len() {
            return None;
        }
        Some(Monomial(out))
    }

    pub fn gcd(&self, other: &Monomial) -> Monomial {
        Monomial(
            self.0
                .iter()
                .filter_map(|(v, e)| {
                    let d = other.degree_in(v);
                    (d > 0).then(|| (v.clone(), (*e).min(d)))
                })
                .collect(),
        )
    }

    /// Partial derivative of the bare power product: `(multiplier, monomial)`.
    fn differentiate(&self, name: &str) -> Option<(u32, Monomial)> {
        let exp = self.degree_in(name);
        if exp == 0 {
            return None;
        }
        let factors = self
            .0
            .iter()
            .filter_map(|(v, e)| {
                if v == name {
                    (exp > 1).then(|| (v.clone(), exp - 1))
                } else {
                    Some((v.clone(), *e))
                }
            })
            .collect();
        Some((exp, Monomial(factors)))
    }
}

impl Ord for Monomial {
    fn cmp(&self, other: &Self) -> Ordering {
        let mut a = self.0.iter();
        let mut b = other.0.iter();
        loop {
            match (a.next(), b.next()) {
                (None, None) => return Ordering::Equal,
                (Some(_), None) => return Ordering::Greater,
                (None, Some(_)) => return Ordering::Less,
                (Some((va, ea)), Some((vb, eb))) => match va.cmp(vb) {
                    // self carries the more significant variable
                    Ordering::Less => return Ordering::Greater,
                    Ordering::Greater => return Ordering::Less,
                    Ordering::Equal => match ea.cmp(eb) {
                        Ordering::Equal => continue,
                        unequal => return unequal,
                    },
                },
            }
        }
    }
}

impl PartialOrd for Monomial {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Monomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_one() {
            return write!(f, "1");
        }
        for (i, (v, e)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "*")?;
            }
            if *e == 1 {
                write!(f, "{}", v)?;
            } else {
                write!(f, "{}^{}", v, e)?;
            }
        }
        Ok(())
    }
}

/// Multivariate polynomial over the rationals.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Poly {
    terms: BTreeMap<Monomial, BigRational>,
}

impl Poly {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn one() -> Self {
        Self::constant(BigRational::one())
    }

    pub fn constant(value: BigRational) -> Self {
        Self::term(Monomial::one(), value)
    }

    pub fn var(name: &str) -> Self {
        Self::term(Monomial::var(name), BigRational::one())
    }

    pub fn term(mono: Monomial, coeff: BigRational) -> Self {
        let mut p = Self::zero();
        p.add_term(mono, coeff);
        p
    }

    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn is_one(&self) -> bool {
        self.as_constant().is_some_and(|c| c.is_one())
    }

    /// The value of a constant polynomial, `None` if any variable occurs.
    pub fn as_constant(&self) -> Option<BigRational> {
        match self.terms.len() {
            0 => Some(BigRational::zero()),
            1 => self
                .terms
                .iter()
                .next()
                .filter(|(m, _)| m.is_one())
                .map(|(_, c)| c.clone()),
            _ => None,
        }
    }

    /// Number of terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Terms in ascending monomial order.
    pub fn terms(&self) -> impl DoubleEndedIterator<Item = (&Monomial, &BigRational)> {
        self.terms.iter()
    }

    pub fn leading_term(&self) -> Option<(&Monomial, &BigRational)> {
        self.terms.iter().next_back()
    }

    pub fn variables(&self) -> BTreeSet<String> {
        self.terms
            .keys()
            .flat_map(|m| m.factors().iter().map(|(v, _)| v.clone()))
            .collect()
    }

    pub fn degree_in(&self, var: &str) -> u32 {
        self.terms.keys().map(|m| m.degree_in(var)).max().unwrap_or(0)
    }

    /// View as a univariate polynomial in `var`: exponent -> coefficient.
    pub fn coefficients_in(&self, var: &str) -> BTreeMap<u32, Poly> {
        let mut out: BTreeMap<u32, Poly> = BTreeMap::new();
        for (mono, coeff) in &self.terms {
            out.entry(mono.degree_in(var))
                .or_default()
                .add_term(mono.without(var), coeff.clone());
        }
        out
    }

    pub fn coeff_in(&self, var: &str, exp: u32) -> Poly {
        let mut out = Poly::zero();
        for (mono, coeff) in &self.terms {
            if mono.degree_in(var) == exp {
                out.add_term(mono.without(var), coeff.clone());
            }
        }
        out
    }

    pub fn scale(&self, factor: &BigRational) -> Poly {
        if factor.is_zero() {
            return Poly::zero();
        }
        Poly {
            terms: self
                .terms
                .iter()
                .map(|(m, c)| (m.clone(), c * factor))
                .collect(),
        }
    }

    /// Scale so the leading coefficient is one.
    pub fn monic(&self) -> Poly {
        match self.leading_term() {
            Some((_, lead)) if !lead.is_one() => self.scale(&lead.recip()),
            _ => self.clone(),
        }
    }

    pub fn pow(&self, exp: u32) -> Poly {
        let mut out = Poly::one();
        for _ in 0..exp {
            out = &out * self;
        }
        out
    }

    pub fn derivative(&self, var: &str) -> Poly {
        let mut out = Poly::zero();
        for (mono, coeff) in &self.terms {
            if let Some((mult, reduced)) = mono.differentiate(var) {
                out.add_term(reduced, coeff * BigRational::from_integer(BigInt::from(mult)));
            }
        }
        out
    }

    /// Multivariate division: `self = q * divisor + r` where no term of `r`
    /// is divisible by the leading monomial of `divisor`.
    pub fn div_rem(&self, divisor: &Poly) -> (Poly, Poly) {
        let Some((lead_mono, lead_coeff)) = divisor.leading_term() else {
            return (Poly::zero(), self.clone());
        };
        let mut quotient = Poly::zero();
        let mut remainder = Poly::zero();
        let mut rest = self.clone();
        while let Some((mono, coeff)) = rest.leading_term().map(|(m, c)| (m.clone(), c.clone())) {
            match mono.divide(lead_mono) {
                Some(q_mono) => {
                    let q = Poly::term(q_mono, &coeff / lead_coeff);
                    rest = &rest - &(&q * divisor);
                    quotient = &quotient + &q;
                }
                None => {
                    rest.terms.remove(&mono);
                    remainder.add_term(mono, coeff);
                }
            }
        }
        (quotient, remainder)
    }

    /// Monic greatest common divisor.
    ///
    /// Recursive primitive polynomial remainder sequence: pick the most
    /// significant variable, split off contents (gcd'd recursively in the
    /// remaining variables) and run the PRS on the primitive parts.
    pub fn gcd(&self, other: &Poly) -> Poly {
        if self.is_zero() {
            return other.monic();
        }
        if other.is_zero() {
            return self.monic();
        }
        if self.as_constant().is_some() || other.as_constant().is_some() {
            return Poly::one();
        }
        if self == other {
            return self.monic();
        }
        if self.len() == 1 {
            return self.monomial_gcd(other);
        }
        if other.len() == 1 {
            return other.monomial_gcd(self);
        }

        let vars_a = self.variables();
        let vars_b = other.variables();
        let Some(var) = vars_a.union(&vars_b).next().cloned() else {
            return Poly::one();
        };

        if self.degree_in(&var) == 0 {
            return self.gcd(&other.content_in(&var));
        }
        if other.degree_in(&var) == 0 {
            return self.content_in(&var).gcd(other);
        }

        let content_a = self.content_in(&var);
        let content_b = other.content_in(&var);
        let content = content_a.gcd(&content_b);
        let prim_a = self.div_rem(&content_a).0;
        let prim_b = other.div_rem(&content_b).0;
        let prim = primitive_prs(prim_a, prim_b, &var);
        (&content * &prim).monic()
    }

    /// gcd of a single-term polynomial with anything is a monomial.
    fn monomial_gcd(&self, other: &Poly) -> Poly {
        let Some((mono, _)) = self.leading_term() else {
            return other.monic();
        };
        let common = other
            .terms
            .keys()
            .fold(mono.clone(), |acc, m| acc.gcd(m));
        Poly::term(common, BigRational::one())
    }

    /// gcd of the coefficients when viewed as a polynomial in `var`.
    fn content_in(&self, var: &str) -> Poly {
        let mut g = Poly::zero();
        for coeff in self.coefficients_in(var).into_values() {
            g = g.gcd(&coeff);
            if g.is_one() {
                break;
            }
        }
        g
    }

    fn primitive_in(&self, var: &str) -> Poly {
        let content = self.content_in(var);
        if content.is_zero() || content.is_one() {
            return self.clone();
        }
        self.div_rem(&content).0
    }

    /// Pseudo-remainder of `self` by `divisor` in `var`.
    fn pseudo_rem(&self, divisor: &Poly, var: &str) -> Poly {
        let deg_d = divisor.degree_in(var);
        let lead_d = divisor.coeff_in(var, deg_d);
        let mut rem = self.clone();
        while !rem.is_zero() && rem.degree_in(var) >= deg_d {
            let deg_r = rem.degree_in(var);
            let lead_r = rem.coeff_in(var, deg_r);
            let shift = Poly::term(Monomial::var_pow(var, deg_r - deg_d), BigRational::one());
            rem = &(&rem * &lead_d) - &(&(&lead_r * &shift) * divisor);
        }
        rem
    }

    /// Numeric evaluation; `None` if a variable has no value.
    pub fn evaluate<F>(&self, lookup: &F) -> Option<f64>
    where
        F: Fn(&str) -> Option<f64>,
    {
        let mut total = 0.0;
        for (mono, coeff) in &self.terms {
            let mut term = coeff.to_f64()?;
            for (var, exp) in mono.factors() {
                term *= lookup(var)?.powi(*exp as i32);
            }
            total += term;
        }
        Some(total)
    }

    fn add_term(&mut self, mono: Monomial, coeff: BigRational) {
        if coeff.is_zero() {
            return;
        }
        match self.terms.entry(mono) {
            Entry::Vacant(slot) => {
                slot.insert(coeff);
            }
            Entry::Occupied(mut slot) => {
                *slot.get_mut() += coeff;
                if slot.get().is_zero() {
                    slot.remove();
                }
            }
        }
    }
}

fn primitive_prs(a: Poly, b: Poly, var: &str) -> Poly {
    let (mut f, mut g) = if a.degree_in(var) >= b.degree_in(var) {
        (a, b)
    } else {
        (b, a)
    };
    loop {
        let r = f.pseudo_rem(&g, var);
        if r.is_zero() {
            return g.primitive_in(var).monic();
        }
        if r.degree_in(var) == 0 {
            return Poly::one();
        }
        f = g;
        g = r.primitive_in(var);
    }
}

impl From<BigRational> for Poly {
    fn from(value: BigRational) -> Self {
        Poly::constant(value)
    }
}

impl Add<&Poly> for &Poly {
    type Output = Poly;

    fn add(self, rhs: &Poly) -> Poly {
        let mut out = self.clone();
        for (m, c) in &rhs.terms {
            out.add_term(m.clone(), c.clone());
        }
        out
    }
}

impl Sub<&Poly> for &Poly {
    type Output = Poly;

    fn sub(self, rhs: &Poly) -> Poly {
        let mut out = self.clone();
        for (m, c) in &rhs.terms {
            out.add_term(m.clone(), -c);
        }
        out
    }
}

impl Mul<&Poly> for &Poly {
    type Output = Poly;

    fn mul(self, rhs: &Poly) -> Poly {
        let mut out = Poly::zero();
        for (ma, ca) in &self.terms {
            for (mb, cb) in &rhs.terms {
                out.add_term(ma.mul(mb), ca * cb);
            }
        }
        out
    }
}

impl Neg for &Poly {
    type Output = Poly;

    fn neg(self) -> Poly {
        Poly {
            terms: self.terms.iter().map(|(m, c)| (m.clone(), -c)).collect(),
        }
    }
}

impl fmt::Display for Poly {
    /// Terms from leading to trailing, e.g. `C1*R1 - 2*R2 + 1`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "0");
        }
        for (i, (mono, coeff)) in self.terms.iter().rev().enumerate() {
            let magnitude = coeff.abs();
            match (i, coeff.is_negative()) {
                (0, true) => write!(f, "-")?,
                (0, false) => {}
                (_, true) => write!(f, " - ")?,
                (_, false) => write!(f, " + ")?,
            }
            if mono.is_one() {
                write!(f, "{}", magnitude)?;
            } else if magnitude.is_one() {
                write!(f, "{}", mono)?;
            } else {
                write!(f, "{}*{}", magnitude, mono)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(n: i64) -> BigRational {
        BigRational::from_integer(BigInt::from(n))
    }

    fn v(name: &str) -> Poly {
        Poly::var(name)
    }

    fn c(n: i64) -> Poly {
        Poly::constant(int(n))
    }

    #[test]
    fn test_monomial_lex_order() {
        let a = Monomial::var("a");
        let b2 = Monomial::var_pow("b", 2);
        let ab = a.mul(&Monomial::var("b"));
        assert!(a > b2);
        assert!(ab > a);
        assert!(Monomial::one() < b2);
    }

    #[test]
    fn test_monomial_divide() {
        let ab2 = Monomial::var("a").mul(&Monomial::var_pow("b", 2));
        let b = Monomial::var("b");
        assert_eq!(ab2.divide(&b), Some(Monomial::var("a").mul(&b)));
        assert_eq!(b.divide(&ab2), None);
        assert_eq!(Monomial::var("a").divide(&Monomial::var("c")), None);
    }

    #[test]
    fn test_add_cancels_to_zero() {
        let p = &v("R1") + &v("R2");
        let q = &p - &v("R2");
        assert_eq!(q, v("R1"));
        assert!((&q - &v("R1")).is_zero());
    }

    #[test]
    fn test_display_order_and_signs() {
        let p = &(&(&v("C1") * &v("R1")) - &(&c(2) * &v("R2"))) + &c(1);
        assert_eq!(p.to_string(), "C1*R1 - 2*R2 + 1");
        assert_eq!((-&v("x")).to_string(), "-x");
        assert_eq!(v("x").pow(3).to_string(), "x^3");
    }

    #[test]
    fn test_derivative() {
        // d/dx (3 x^2 y + x) = 6 x y + 1
        let x = v("x");
        let p = &(&(&c(3) * &x.pow(2)) * &v("y")) + &x;
        let expected = &(&(&c(6) * &x) * &v("y")) + &c(1);
        assert_eq!(p.derivative("x"), expected);
        assert!(p.derivative("z").is_zero());
    }

    #[test]
    fn test_div_rem() {
        let a = &v("a") + &v("b");
        let b = &v("a") - &v("b");
        let prod = &a * &b;
        assert_eq!(prod.div_rem(&a), (b, Poly::zero()));
        let (_, r) = (&prod + &c(1)).div_rem(&a);
        assert_eq!(r, c(1));
    }

    #[test]
    fn test_gcd_common_binomial() {
        let common = &v("R1") + &v("R2");
        let a = &common * &v("C1");
        let b = &common * &(&v("L1") + &c(3));
        assert_eq!(a.gcd(&b), common);
    }

    #[test]
    fn test_gcd_is_monic_and_drops_constants() {
        let a = &c(4) * &(&v("x") + &c(1));
        let b = &c(6) * &(&v("x") + &c(1));
        assert_eq!(a.gcd(&b), &v("x") + &c(1));
        assert_eq!(c(4).gcd(&v("x")), Poly::one());
    }

    #[test]
    fn test_gcd_coprime() {
        let a = &v("x") + &v("y");
        let b = &v("x") - &v("y");
        assert_eq!(a.gcd(&b), Poly::one());
    }

    #[test]
    fn test_gcd_monomials() {
        let a = &(&v("a") * &v("b")) * &v("b");
        let b = &(&v("b") * &v("c")) + &(&v("b") * &v("b"));
        assert_eq!(a.gcd(&b), v("b"));
    }

    #[test]
    fn test_gcd_multivariate_quadratic() {
        // (x + y)^2 and x^2 - y^2 share x + y
        let s = &v("x") + &v("y");
        let d = &v("x") - &v("y");
        let a = s.pow(2);
        let b = &s * &d;
        assert_eq!(a.gcd(&b), s);
    }

    #[test]
    fn test_evaluate() {
        let p = &(&v("a") * &v("b")) + &c(2);
        let value = p
            .evaluate(&|name: &str| match name {
                "a" => Some(3.0),
                "b" => Some(0.5),
                _ => None,
            })
            .unwrap();
        assert!((value - 3.5).abs() < 1e-12);
        assert_eq!(v("q").evaluate(&|_: &str| None), None);
    }
}
