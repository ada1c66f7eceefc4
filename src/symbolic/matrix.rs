//! Dense row-major matrices over a [`Scalar`].
//!
//! MNA systems for hand-sized netlists are a few dozen unknowns at most, and
//! every entry is a symbolic expression, so a dense layout with triplet
//! assembly is all that is needed.

use std::ops::{Index, IndexMut, Range};

use super::{Differentiable, Scalar};

/// Elimination hit a column with no usable pivot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Singular {
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Matrix<S> {
    rows: usize,
    cols: usize,
    data: Vec<S>,
}

impl<S: Scalar> Matrix<S> {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![S::zero(); rows * cols],
        }
    }

    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m[(i, i)] = S::one();
        }
        m
    }

    /// Build from `(row, col, value)` triplets. Duplicate entries are summed.
    pub fn from_triplets(rows: usize, cols: usize, triplets: &[(usize, usize, S)]) -> Self {
        let mut m = Self::zeros(rows, cols);
        for (r, c, v) in triplets {
            m.add_at(*r, *c, v);
        }
        m
    }

    /// Build from row vectors. All rows must have `cols` entries.
    pub fn from_rows(cols: usize, rows: Vec<Vec<S>>) -> Self {
        let n = rows.len();
        let data: Vec<S> = rows.into_iter().flatten().collect();
        assert_eq!(data.len(), n * cols, "ragged rows");
        Self {
            rows: n,
            cols,
            data,
        }
    }

    pub fn column(values: Vec<S>) -> Self {
        Self {
            rows: values.len(),
            cols: 1,
            data: values,
        }
    }

    pub fn nrows(&self) -> usize {
        self.rows
    }

    pub fn ncols(&self) -> usize {
        self.cols
    }

    pub fn row(&self, r: usize) -> &[S] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    pub fn add_at(&mut self, r: usize, c: usize, value: &S) {
        let sum = self[(r, c)].add(value);
        self[(r, c)] = sum;
    }

    pub fn is_zero(&self) -> bool {
        self.data.iter().all(S::is_zero)
    }

    pub fn column_is_zero(&self, c: usize) -> bool {
        (0..self.rows).all(|r| self[(r, c)].is_zero())
    }

    /// Entries in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &S> {
        self.data.iter()
    }

    pub fn map<T: Scalar>(&self, f: impl FnMut(&S) -> T) -> Matrix<T> {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(f).collect(),
        }
    }

    /// Assemble `[[tl, tr], [bl, br]]`.
    pub fn block(tl: &Self, tr: &Self, bl: &Self, br: &Self) -> Self {
        assert_eq!(tl.rows, tr.rows);
        assert_eq!(bl.rows, br.rows);
        assert_eq!(tl.cols, bl.cols);
        assert_eq!(tr.cols, br.cols);
        let cols = tl.cols + tr.cols;
        let mut m = Self::zeros(tl.rows + bl.rows, cols);
        for (part, r0, c0) in [(tl, 0, 0), (tr, 0, tl.cols), (bl, tl.rows, 0), (br, tl.rows, tl.cols)] {
            for r in 0..part.rows {
                for c in 0..part.cols {
                    m[(r0 + r, c0 + c)] = part[(r, c)].clone();
                }
            }
        }
        m
    }

    pub fn rows_range(&self, range: Range<usize>) -> Self {
        Self {
            rows: range.len(),
            cols: self.cols,
            data: self.data[range.start * self.cols..range.end * self.cols].to_vec(),
        }
    }

    pub fn mul(&self, rhs: &Self) -> Self {
        assert_eq!(self.cols, rhs.rows, "dimension mismatch in product");
        let mut out = Self::zeros(self.rows, rhs.cols);
        for i in 0..self.rows {
            for k in 0..self.cols {
                let a = &self[(i, k)];
                if a.is_zero() {
                    continue;
                }
                for j in 0..rhs.cols {
                    let b = &rhs[(k, j)];
                    if !b.is_zero() {
                        out.add_at(i, j, &a.mul(b));
                    }
                }
            }
        }
        out
    }

    pub fn add(&self, rhs: &Self) -> Self {
        self.zip_with(rhs, S::add)
    }

    pub fn sub(&self, rhs: &Self) -> Self {
        self.zip_with(rhs, S::sub)
    }

    pub fn scale(&self, factor: &S) -> Self {
        self.map(|v| v.mul(factor))
    }

    fn zip_with(&self, rhs: &Self, f: impl Fn(&S, &S) -> S) -> Self {
        assert_eq!((self.rows, self.cols), (rhs.rows, rhs.cols), "dimension mismatch");
        Self {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().zip(&rhs.data).map(|(a, b)| f(a, b)).collect(),
        }
    }

    pub fn inverse(&self) -> Result<Self, Singular> {
        self.solve(&Self::identity(self.rows))
    }

    /// Solve `self * X = rhs` by Gauss-Jordan elimination.
    ///
    /// The pivot in each column is the lightest non-zero candidate, which
    /// keeps intermediate expressions small and the result deterministic.
    pub fn solve(&self, rhs: &Self) -> Result<Self, Singular> {
        assert_eq!(self.rows, self.cols, "solve needs a square matrix");
        assert_eq!(rhs.rows, self.rows, "right-hand side has the wrong height");
        let n = self.rows;
        let mut a = self.clone();
        let mut b = rhs.clone();
        for col in 0..n {
            let pivot = (col..n)
                .filter(|&r| !a[(r, col)].is_zero())
                .min_by_key(|&r| a[(r, col)].weight())
                .ok_or(Singular { column: col })?;
            if pivot != col {
                a.swap_rows(pivot, col);
                b.swap_rows(pivot, col);
            }
            let scale = a[(col, col)].inv().ok_or(Singular { column: col })?;
            a.scale_row(col, &scale);
            b.scale_row(col, &scale);
            for r in 0..n {
                if r == col || a[(r, col)].is_zero() {
                    continue;
                }
                let factor = a[(r, col)].clone();
                a.sub_scaled_row(r, col, &factor);
                b.sub_scaled_row(r, col, &factor);
            }
        }
        Ok(b)
    }

    fn swap_rows(&mut self, i: usize, j: usize) {
        for c in 0..self.cols {
            self.data.swap(i * self.cols + c, j * self.cols + c);
        }
    }

    fn scale_row(&mut self, r: usize, factor: &S) {
        for c in 0..self.cols {
            if !self[(r, c)].is_zero() {
                let v = self[(r, c)].mul(factor);
                self[(r, c)] = v;
            }
        }
    }

    /// `row[target] -= factor * row[source]`
    fn sub_scaled_row(&mut self, target: usize, source: usize, factor: &S) {
        for c in 0..self.cols {
            if self[(source, c)].is_zero() {
                continue;
            }
            let v = self[(target, c)].sub(&factor.mul(&self[(source, c)]));
            self[(target, c)] = v;
        }
    }
}

impl<S: Differentiable> Matrix<S> {
    /// Jacobian of a column vector with respect to `symbols`.
    pub fn jacobian(&self, symbols: &[String]) -> Self {
        assert_eq!(self.cols, 1, "jacobian needs a column vector");
        let mut out = Self::zeros(self.rows, symbols.len());
        for r in 0..self.rows {
            for (c, sym) in symbols.iter().enumerate() {
                out[(r, c)] = self[(r, 0)].derivative(sym);
            }
        }
        out
    }

    /// Substitute every binding into every entry. `None` if any entry
    /// hits a zero denominator.
    pub fn substitute(&self, bindings: &[(String, S)]) -> Option<Self> {
        let mut data = Vec::with_capacity(self.data.len());
        for entry in &self.data {
            let mut value = entry.clone();
            for (sym, replacement) in bindings {
                value = value.substitute(sym, replacement)?;
            }
            data.push(value);
        }
        Some(Self {
            rows: self.rows,
            cols: self.cols,
            data,
        })
    }

    pub fn simplify(&self) -> Self {
        self.map(S::simplify)
    }
}

impl<S> Index<(usize, usize)> for Matrix<S> {
    type Output = S;

    fn index(&self, (r, c): (usize, usize)) -> &S {
        &self.data[r * self.cols + c]
    }
}

impl<S> IndexMut<(usize, usize)> for Matrix<S> {
    fn index_mut(&mut self, (r, c): (usize, usize)) -> &mut S {
        &mut self.data[r * self.cols + c]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::RationalFunction;
    use num_bigint::BigInt;
    use num_rational::BigRational;

    type R = RationalFunction;

    fn sym(name: &str) -> R {
        R::symbol(name)
    }

    fn int(n: i64) -> R {
        R::constant(BigRational::from_integer(BigInt::from(n)))
    }

    #[test]
    fn test_from_triplets_sums_duplicates() {
        let m = Matrix::from_triplets(2, 2, &[(0, 0, sym("a")), (0, 0, sym("b")), (1, 1, int(3))]);
        assert_eq!(m[(0, 0)], sym("a").add(&sym("b")));
        assert!(m[(0, 1)].is_zero());
        assert_eq!(m[(1, 1)], int(3));
    }

    #[test]
    fn test_inverse_2x2_symbolic() {
        // [[a, b], [c, d]]^-1 = 1/(ad - bc) [[d, -b], [-c, a]]
        let m = Matrix::from_rows(2, vec![vec![sym("a"), sym("b")], vec![sym("c"), sym("d")]]);
        let inv = m.inverse().unwrap();
        let det = sym("a").mul(&sym("d")).sub(&sym("b").mul(&sym("c")));
        assert_eq!(inv[(0, 0)], sym("d").div(&det).unwrap());
        assert_eq!(inv[(0, 1)], sym("b").neg().div(&det).unwrap());
        assert_eq!(m.mul(&inv), Matrix::identity(2));
    }

    #[test]
    fn test_inverse_needs_row_swap() {
        let m = Matrix::from_rows(2, vec![vec![int(0), int(1)], vec![int(1), int(0)]]);
        assert_eq!(m.inverse().unwrap(), m);
    }

    #[test]
    fn test_singular_reports_column() {
        let m = Matrix::from_rows(2, vec![vec![sym("a"), sym("a")], vec![sym("b"), sym("b")]]);
        assert_eq!(m.inverse(), Err(Singular { column: 1 }));
        let z: Matrix<R> = Matrix::zeros(3, 3);
        assert_eq!(z.inverse(), Err(Singular { column: 0 }));
    }

    #[test]
    fn test_empty_inverse() {
        let m: Matrix<R> = Matrix::zeros(0, 0);
        assert_eq!(m.inverse().unwrap().nrows(), 0);
    }

    #[test]
    fn test_block_and_rows_range() {
        let one: Matrix<R> = Matrix::identity(1);
        let col = Matrix::column(vec![sym("x")]);
        let row = Matrix::from_rows(1, vec![vec![sym("y")]]);
        let m = Matrix::block(&one, &col, &row, &Matrix::zeros(1, 1));
        assert_eq!(m.row(0), &[int(1), sym("x")]);
        assert_eq!(m.rows_range(1..2).row(0), &[sym("y"), int(0)]);
    }

    #[test]
    fn test_jacobian_and_substitute() {
        let f = Matrix::column(vec![sym("x").mul(&sym("k")), sym("x").add(&sym("y"))]);
        let vars = vec!["x".to_string(), "y".to_string()];
        let j = f.jacobian(&vars);
        assert_eq!(j.row(0), &[sym("k"), int(0)]);
        assert_eq!(j.row(1), &[int(1), int(1)]);
        let at = f.substitute(&[("x".to_string(), int(2))]).unwrap();
        assert_eq!(at[(0, 0)], int(2).mul(&sym("k")));
    }
}
