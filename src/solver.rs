//! Symbolic solution of the MNA system.
//!
//! Computes `x = Aug⁻¹ · Z` and splits it into node voltages and branch
//! currents. The voltage vector carries one extra trailing zero for ground so
//! that measurements can index any terminal uniformly.

use crate::compiler::MnaSystem;
use crate::error::{Result, SymnaError};
use crate::symbolic::{Matrix, Scalar};
use crate::topology::{Node, Topology};

/// Node voltages and branch currents, as functions of the circuit symbols
/// and the state symbols.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution<S> {
    /// `n_nodes + 1` entries; the last is ground.
    pub voltages: Vec<S>,
    pub currents: Vec<S>,
}

impl<S: Scalar> Solution<S> {
    pub fn voltage(&self, node: Node) -> &S {
        match node {
            Some(i) => &self.voltages[i],
            None => &self.voltages[self.voltages.len() - 1],
        }
    }

    /// `V(plus) - V(minus)`
    pub fn across(&self, plus: Node, minus: Node) -> S {
        self.voltage(plus).sub(self.voltage(minus))
    }

    pub fn current(&self, branch: usize) -> &S {
        &self.currents[branch]
    }
}

/// Solve the MNA system. Fails with `SingularSystem` naming the first
/// unknown that could not be determined.
pub fn solve<S: Scalar>(system: &MnaSystem<S>, topology: &Topology<'_>) -> Result<Solution<S>> {
    let _span = tracing::debug_span!("solve", size = system.size()).entered();

    let inverse = system.matrix.inverse().map_err(|singular| {
        let unknown = topology.unknown_label(singular.column);
        tracing::debug!(%unknown, "MNA matrix is singular");
        SymnaError::SingularSystem(unknown)
    })?;
    let x = inverse.mul(&system.excitation);

    Ok(split(&x, system.n_nodes))
}

/// Split `[V; J]` into its node and branch parts.
fn split<S: Scalar>(x: &Matrix<S>, n_nodes: usize) -> Solution<S> {
    let mut voltages: Vec<S> = x.rows_range(0..n_nodes).iter().cloned().collect();
    voltages.push(S::zero());
    let currents = x.rows_range(n_nodes..x.nrows()).iter().cloned().collect();
    Solution { voltages, currents }
}
