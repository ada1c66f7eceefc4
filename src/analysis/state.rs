//! State-variable selection.
//!
//! Every inductor contributes its current and every capacitor its voltage,
//! in netlist order. The derivatives come straight from the device laws:
//! `dI/dt = (V(n1) - V(n2)) / L` and `dV/dt = I / C`.

use crate::error::{Result, SymnaError};
use crate::ir::{self, DeviceKind};
use crate::solver::Solution;
use crate::symbolic::{Matrix, Scalar};
use crate::topology::{IndexedComponent, Topology};

/// The state vector `X` and its time derivative `F(X, U)`.
#[derive(Debug, Clone)]
pub struct StateEquations<S> {
    pub symbols: Vec<String>,
    pub derivatives: Matrix<S>,
}

impl<S> StateEquations<S> {
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

pub fn select<S: Scalar>(topology: &Topology<'_>, solution: &Solution<S>) -> Result<StateEquations<S>> {
    let mut symbols = Vec::new();
    let mut derivatives = Vec::new();

    for ic in &topology.components {
        let derivative = match ic.kind() {
            DeviceKind::Inductor => solution.across(ic.node(0), ic.node(1)),
            DeviceKind::Capacitor => solution.current(ic.e1()).clone(),
            _ => continue,
        };
        let symbol = ir::state_symbol(ic.name());
        let value = device_value::<S>(ic)?;
        let derivative = derivative
            .div(&value)
            .ok_or_else(|| SymnaError::ZeroValue(format!("{} has zero value", ic.name())))?;
        tracing::trace!(state = %symbol, derivative = %derivative, "state equation");
        symbols.push(symbol);
        derivatives.push(derivative);
    }

    Ok(StateEquations {
        symbols,
        derivatives: Matrix::column(derivatives),
    })
}

pub(crate) fn device_value<S: Scalar>(ic: &IndexedComponent<'_>) -> Result<S> {
    ic.component
        .value
        .lower()
        .ok_or_else(|| SymnaError::ZeroValue(format!("value of {} divides by zero", ic.name())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;
    use crate::parser::parse;
    use crate::solver::solve;
    use crate::symbolic::RationalFunction;

    #[test]
    fn test_states_follow_netlist_order() {
        let circuit = parse("V1 a 0 V\nL2 a b L2\nR1 b c R\nC1 c 0 C1\nL1 c 0 L1\n").unwrap();
        let topology = Topology::index(&circuit);
        let system = compile::<RationalFunction>(&topology).unwrap();
        let solution = solve(&system, &topology).unwrap();
        let states = select(&topology, &solution).unwrap();
        assert_eq!(states.symbols, vec!["x_L2", "x_C1", "x_L1"]);
        assert_eq!(states.derivatives.nrows(), 3);
    }

    #[test]
    fn test_rc_derivative() {
        let circuit = parse("V1 in 0 Vs\nR1 in out R\nC1 out 0 C\n").unwrap();
        let topology = Topology::index(&circuit);
        let system = compile::<RationalFunction>(&topology).unwrap();
        let solution = solve(&system, &topology).unwrap();
        let states = select(&topology, &solution).unwrap();
        // (Vs - x) / (R C)
        let sym = RationalFunction::symbol;
        let expected = sym("Vs")
            .sub(&sym("x_C1"))
            .div(&sym("R").mul(&sym("C")))
            .unwrap();
        assert_eq!(states.derivatives[(0, 0)], expected);
    }

    #[test]
    fn test_no_storage_elements() {
        let circuit = parse("I1 0 a I\nR1 a 0 R\n").unwrap();
        let topology = Topology::index(&circuit);
        let system = compile::<RationalFunction>(&topology).unwrap();
        let solution = solve(&system, &topology).unwrap();
        let states = select(&topology, &solution).unwrap();
        assert!(states.is_empty());
        assert_eq!(states.derivatives.nrows(), 0);
    }
}
