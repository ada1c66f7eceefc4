//! Transfer functions of a state-space model.

use crate::analysis::StateSpace;
use crate::error::{Result, SymnaError};
use crate::symbolic::{Matrix, Scalar};

/// `H(s) = C (sI - A)⁻¹ B + D`, one entry per (output, input) pair.
///
/// `variable` names the Laplace variable; it must not clash with a circuit
/// symbol.
pub fn transfer_function<S: Scalar>(model: &StateSpace<S>, variable: &str) -> Result<Matrix<S>> {
    let _span = tracing::debug_span!("transfer_function", variable).entered();

    let n = model.a.nrows();
    let s = S::symbol(variable);
    let resolvent = Matrix::identity(n)
        .scale(&s)
        .sub(&model.a)
        .inverse()
        .map_err(|_| SymnaError::SingularSystem(format!("{}I - A", variable)))?;

    Ok(model.c.mul(&resolvent).mul(&model.b).add(&model.d))
}

/// Single entry of [`transfer_function`] by position.
pub fn siso<S: Scalar>(model: &StateSpace<S>, variable: &str, output: usize, input: usize) -> Result<S> {
    let h = transfer_function(model, variable)?;
    if output >= h.nrows() || input >= h.ncols() {
        return Err(SymnaError::UndefinedReference(format!(
            "transfer function entry ({}, {})",
            output, input
        )));
    }
    Ok(h[(output, input)].clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::convert;
    use crate::symbolic::RationalFunction;

    #[test]
    fn test_rc_lowpass() {
        let model = convert("V1 in 0 VIN\nR1 in out R\nC1 out 0 C\n", &["VIN"], &["VdC1"]).unwrap();
        let h = siso(&model, "s", 0, 0).unwrap();
        assert_eq!(h.to_string(), "1/(C*R*s + 1)");
    }

    #[test]
    fn test_static_gain() {
        let model = convert("I1 0 a I\nR1 a 0 R\n", &["I"], &["VdR1"]).unwrap();
        let h = transfer_function(&model, "s").unwrap();
        assert_eq!(h[(0, 0)], RationalFunction::symbol("R"));
    }

    #[test]
    fn test_entry_out_of_range() {
        let model = convert("I1 0 a I\nR1 a 0 R\n", &["I"], &["VdR1"]).unwrap();
        assert!(matches!(
            siso(&model, "s", 1, 0),
            Err(SymnaError::UndefinedReference(_))
        ));
    }
}
