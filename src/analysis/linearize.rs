//! Linearization about the operating point.
//!
//! The operating point `X_OP` solves `F(X) = 0`. All supported devices are
//! linear in the states, so `F = J·X + F(0)` and the operating point is
//! `J·X_OP = -F(0)`; a Jacobian that still depends on the states means the
//! equations are not linear and is reported as having no unique solution.
//! The state-space matrices are then
//!
//! ```text
//! A = ∂F/∂X   B = ∂F/∂U   C = ∂G/∂X   D = ∂G/∂U   DC_OP = G(X_OP)
//! ```
//!
//! all evaluated at `X_OP` and simplified.

use crate::error::{Result, SymnaError};
use crate::symbolic::{Differentiable, Matrix};

use super::measure::OutputEquations;
use super::state::StateEquations;

/// Linear state-space model `dx/dt = A x + B u`, `y = C x + D u`.
#[derive(Debug, Clone, PartialEq)]
pub struct StateSpace<S> {
    pub a: Matrix<S>,
    pub b: Matrix<S>,
    pub c: Matrix<S>,
    pub d: Matrix<S>,
    /// Outputs at the operating point.
    pub dc_op: Matrix<S>,
    /// State values at the operating point.
    pub operating_point: Matrix<S>,
    pub states: Vec<String>,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

pub fn linearize<S: Differentiable>(
    states: StateEquations<S>,
    inputs: Vec<String>,
    outputs: OutputEquations<S>,
) -> Result<StateSpace<S>> {
    let _span = tracing::debug_span!("linearize", states = states.len()).entered();

    let x_op = operating_point(&states)?;
    let bindings: Vec<(String, S)> = states
        .symbols
        .iter()
        .enumerate()
        .map(|(i, sym)| (sym.clone(), x_op[(i, 0)].clone()))
        .collect();
    let at_op = |m: Matrix<S>| -> Result<Matrix<S>> {
        m.substitute(&bindings)
            .map(|m| m.simplify())
            .ok_or_else(|| {
                SymnaError::NoUniqueSolution("operating point makes a denominator vanish".into())
            })
    };

    let f = &states.derivatives;
    let g = &outputs.equations;
    let a = at_op(f.jacobian(&states.symbols))?;
    let b = at_op(f.jacobian(&inputs))?;
    let c = at_op(g.jacobian(&states.symbols))?;
    let d = at_op(g.jacobian(&inputs))?;
    let dc_op = at_op(g.clone())?;

    for (k, input) in inputs.iter().enumerate() {
        if b.column_is_zero(k) && d.column_is_zero(k) {
            tracing::warn!(%input, "no state or output equation depends on this input");
        }
    }

    Ok(StateSpace {
        a,
        b,
        c,
        d,
        dc_op,
        operating_point: x_op,
        states: states.symbols,
        inputs,
        outputs: outputs.labels,
    })
}

/// Solve `F(X) = 0` for the states.
fn operating_point<S: Differentiable>(states: &StateEquations<S>) -> Result<Matrix<S>> {
    let symbols = &states.symbols;
    let jacobian = states.derivatives.jacobian(symbols);

    for entry in jacobian.iter() {
        if let Some(sym) = symbols.iter().find(|s| !entry.derivative(s).is_zero()) {
            return Err(SymnaError::NoUniqueSolution(format!(
                "state equations are not linear in {}",
                sym
            )));
        }
    }

    let at_zero: Vec<(String, S)> = symbols.iter().map(|s| (s.clone(), S::zero())).collect();
    let offset = states.derivatives.substitute(&at_zero).ok_or_else(|| {
        SymnaError::NoUniqueSolution("state equations are undefined at zero".into())
    })?;
    let rhs = offset.map(|v| v.neg());

    let x_op = jacobian.solve(&rhs).map_err(|singular| {
        SymnaError::NoUniqueSolution(format!(
            "{} is not determined by the state equations",
            symbols[singular.column]
        ))
    })?;
    Ok(x_op.simplify())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::{RationalFunction, Scalar};

    type R = RationalFunction;

    fn sym(name: &str) -> R {
        R::symbol(name)
    }

    fn equations(symbols: &[&str], derivatives: Vec<R>) -> StateEquations<R> {
        StateEquations {
            symbols: symbols.iter().map(|s| s.to_string()).collect(),
            derivatives: Matrix::column(derivatives),
        }
    }

    fn outputs(labels: &[&str], rows: Vec<R>) -> OutputEquations<R> {
        OutputEquations {
            labels: labels.iter().map(|s| s.to_string()).collect(),
            equations: Matrix::column(rows),
        }
    }

    #[test]
    fn test_first_order_lag() {
        // dx/dt = (u - x)/tau, y = x
        let tau = sym("tau");
        let f = sym("u").sub(&sym("x")).div(&tau).unwrap();
        let ss = linearize(
            equations(&["x"], vec![f]),
            vec!["u".to_string()],
            outputs(&["y"], vec![sym("x")]),
        )
        .unwrap();
        assert_eq!(ss.a[(0, 0)], tau.inv().unwrap().neg());
        assert_eq!(ss.b[(0, 0)], tau.inv().unwrap());
        assert_eq!(ss.c[(0, 0)], R::one());
        assert!(ss.d[(0, 0)].is_zero());
        assert_eq!(ss.operating_point[(0, 0)], sym("u"));
        assert_eq!(ss.dc_op[(0, 0)], sym("u"));
    }

    #[test]
    fn test_no_states() {
        let ss = linearize(
            equations(&[], vec![]),
            vec!["I1".to_string()],
            outputs(&["VdR1"], vec![sym("I1").mul(&sym("R1"))]),
        )
        .unwrap();
        assert_eq!((ss.a.nrows(), ss.a.ncols()), (0, 0));
        assert_eq!((ss.b.nrows(), ss.b.ncols()), (0, 1));
        assert_eq!((ss.c.nrows(), ss.c.ncols()), (1, 0));
        assert_eq!(ss.d[(0, 0)], sym("R1"));
        assert_eq!(ss.dc_op[(0, 0)], sym("I1").mul(&sym("R1")));
    }

    #[test]
    fn test_undetermined_state() {
        // dx/dt = u regardless of x
        let err = linearize(
            equations(&["x"], vec![sym("u")]),
            vec!["u".to_string()],
            outputs(&[], vec![]),
        )
        .unwrap_err();
        assert!(matches!(err, SymnaError::NoUniqueSolution(ref m) if m.contains('x')));
    }

    #[test]
    fn test_nonlinear_state_equation() {
        let x = sym("x");
        let err = linearize(
            equations(&["x"], vec![x.mul(&x).sub(&sym("u"))]),
            vec!["u".to_string()],
            outputs(&[], vec![]),
        )
        .unwrap_err();
        assert!(matches!(err, SymnaError::NoUniqueSolution(_)));
    }

    #[test]
    fn test_coupled_states() {
        // dx/dt = y - x, dy/dt = u - y  =>  x = y = u
        let f1 = sym("y").sub(&sym("x"));
        let f2 = sym("u").sub(&sym("y"));
        let ss = linearize(
            equations(&["x", "y"], vec![f1, f2]),
            vec!["u".to_string()],
            outputs(&["x"], vec![sym("x")]),
        )
        .unwrap();
        assert_eq!(ss.operating_point, Matrix::column(vec![sym("u"), sym("u")]));
        assert_eq!(ss.a.row(0), &[R::one().neg(), R::one()]);
        assert_eq!(ss.b.row(1), &[R::one()]);
    }
}
