//! MNA (Modified Nodal Analysis) compiler.
//!
//! Converts an indexed circuit into the symbolic MNA system
//!
//! ```text
//! [ G  B ] [ V ]   [ I ]
//! [ C  D ] [ J ] = [ E ]
//! ```
//!
//! with one row/column per non-ground node (V) and per branch current (J).
//! Ground rows and columns are never stamped.
//!
//! # Stamps
//!
//! n1..n4 are the device terminals, e1/e2 its branch currents, `val` its value.
//!
//! - **Resistor**: G(n1,n1) += 1/val, G(n2,n2) += 1/val, G(n1,n2) -= 1/val, G(n2,n1) -= 1/val
//! - **VCCS**: G(n1,n3) += val, G(n1,n4) -= val, G(n2,n3) -= val, G(n2,n4) += val
//! - **Current source**: I(n1) -= val, I(n2) += val
//! - **Inductor**: its state current is a known excitation, I(n1) -= x, I(n2) += x
//! - **Voltage source**: B(n1,e1) = 1, B(n2,e1) = -1, C(e1,n1) = 1, C(e1,n2) = -1, E(e1) = val
//! - **Capacitor**: incidence as a voltage source with E(e1) = x (its state voltage)
//! - **VCVS**: incidence as a voltage source, C(e1,n3) -= val, C(e1,n4) += val
//! - **CCCS**: B(n1,e1) = val, B(n2,e1) = -val, and a zero-volt sense source
//!   n3 -> n4 carrying e1
//! - **CCVS**: B(n1,e2) = 1, B(n2,e2) = -1, C(e1,n1) = 1, C(e1,n2) = -1,
//!   B(n3,e1) = 1, B(n4,e1) = -1, C(e2,n3) = 1, C(e2,n4) = -1, D(e1,e1) = -val
//! - **Transformer**: B(n1,e1) = 1, B(n2,e1) = -1, B(n3,e2) = 1, B(n4,e2) = -1,
//!   C(e2,n1) = -val, C(e2,n2) = val, C(e2,n3) = 1, C(e2,n4) = -1,
//!   D(e1,e1) = 1, D(e1,e2) = val

use crate::error::{Result, SymnaError};
use crate::ir::{self, DeviceKind};
use crate::symbolic::{Matrix, Scalar};
use crate::topology::{IndexedComponent, Node, Topology};

/// The compiled MNA system.
#[derive(Debug, Clone)]
pub struct MnaSystem<S> {
    /// Augmented matrix `[[G, B], [C, D]]`.
    pub matrix: Matrix<S>,
    /// Excitation column `[I; E]`.
    pub excitation: Matrix<S>,
    pub n_nodes: usize,
    pub n_branches: usize,
}

impl<S: Scalar> MnaSystem<S> {
    pub fn size(&self) -> usize {
        self.n_nodes + self.n_branches
    }
}

/// Accumulates stamps as triplets, one list per block of `Aug`.
struct Stamper<S> {
    g: Vec<(usize, usize, S)>,
    b: Vec<(usize, usize, S)>,
    c: Vec<(usize, usize, S)>,
    d: Vec<(usize, usize, S)>,
    excitation: Vec<(usize, usize, S)>,
    n_nodes: usize,
}

impl<S: Scalar> Stamper<S> {
    fn new(n_nodes: usize) -> Self {
        Self {
            g: Vec::new(),
            b: Vec::new(),
            c: Vec::new(),
            d: Vec::new(),
            excitation: Vec::new(),
            n_nodes,
        }
    }

    fn node_node(&mut self, row: Node, col: Node, value: S) {
        if let (Some(r), Some(c)) = (row, col) {
            self.g.push((r, c, value));
        }
    }

    fn node_branch(&mut self, row: Node, e: usize, value: S) {
        if let Some(r) = row {
            self.b.push((r, e, value));
        }
    }

    fn branch_node(&mut self, e: usize, col: Node, value: S) {
        if let Some(c) = col {
            self.c.push((e, c, value));
        }
    }

    fn branch_branch(&mut self, row: usize, col: usize, value: S) {
        self.d.push((row, col, value));
    }

    /// I part of the excitation.
    fn node_source(&mut self, row: Node, value: S) {
        if let Some(r) = row {
            self.excitation.push((r, 0, value));
        }
    }

    /// E part of the excitation.
    fn branch_source(&mut self, e: usize, value: S) {
        self.excitation.push((self.n_nodes + e, 0, value));
    }

    /// `[[G, B], [C, D]]`
    fn augmented(&self, n_branches: usize) -> Matrix<S> {
        let (n, m) = (self.n_nodes, n_branches);
        Matrix::block(
            &Matrix::from_triplets(n, n, &self.g),
            &Matrix::from_triplets(n, m, &self.b),
            &Matrix::from_triplets(m, n, &self.c),
            &Matrix::from_triplets(m, m, &self.d),
        )
    }

    /// Conductance-style pattern between (a, b) rows and (c, d) columns.
    fn transconductance(&mut self, a: Node, b: Node, c: Node, d: Node, value: &S) {
        self.node_node(a, c, value.clone());
        self.node_node(a, d, value.neg());
        self.node_node(b, c, value.neg());
        self.node_node(b, d, value.clone());
    }

    /// Branch current `e` enters the network at `plus` and leaves at `minus`.
    fn incidence(&mut self, plus: Node, minus: Node, e: usize) {
        self.node_branch(plus, e, S::one());
        self.node_branch(minus, e, S::one().neg());
    }

    /// Branch equation row `e` reads `V(plus) - V(minus)`.
    fn voltage_row(&mut self, e: usize, plus: Node, minus: Node) {
        self.branch_node(e, plus, S::one());
        self.branch_node(e, minus, S::one().neg());
    }

    /// A voltage-source-like element: incidence plus branch equation.
    fn source_branch(&mut self, plus: Node, minus: Node, e: usize) {
        self.incidence(plus, minus, e);
        self.voltage_row(e, plus, minus);
    }
}

/// Compile an indexed circuit into an MNA system.
pub fn compile<S: Scalar>(topology: &Topology<'_>) -> Result<MnaSystem<S>> {
    let _span = tracing::debug_span!("stamp").entered();

    let n_nodes = topology.n_nodes();
    let n_branches = topology.n_branches;
    let size = n_nodes + n_branches;
    let mut stamper = Stamper::new(n_nodes);

    for ic in &topology.components {
        stamp(&mut stamper, ic)?;
    }

    tracing::debug!(
        size,
        g = stamper.g.len(),
        b = stamper.b.len(),
        c = stamper.c.len(),
        d = stamper.d.len(),
        "assembled MNA system"
    );

    Ok(MnaSystem {
        matrix: stamper.augmented(n_branches),
        excitation: Matrix::from_triplets(size, 1, &stamper.excitation),
        n_nodes,
        n_branches,
    })
}

fn stamp<S: Scalar>(st: &mut Stamper<S>, ic: &IndexedComponent<'_>) -> Result<()> {
    let component = ic.component;
    let value: S = component
        .value
        .lower()
        .ok_or_else(|| {
            SymnaError::ZeroValue(format!(
                "value of {} (line {}) divides by zero",
                component.name, component.line
            ))
        })?;
    let n = |i: usize| ic.nodes.get(i).copied().flatten();

    match ic.kind() {
        DeviceKind::Resistor => {
            let g = value
                .inv()
                .ok_or_else(|| {
                    SymnaError::ZeroValue(format!(
                        "resistor {} (line {}) has zero resistance",
                        component.name, component.line
                    ))
                })?;
            st.transconductance(n(0), n(1), n(0), n(1), &g);
        }
        DeviceKind::Vccs => {
            st.transconductance(n(0), n(1), n(2), n(3), &value);
        }
        DeviceKind::CurrentSource => {
            st.node_source(n(0), value.neg());
            st.node_source(n(1), value);
        }
        DeviceKind::Inductor => {
            let x = state_value::<S>(ic);
            st.node_source(n(0), x.neg());
            st.node_source(n(1), x);
        }
        DeviceKind::VoltageSource => {
            let e1 = ic.e1();
            st.source_branch(n(0), n(1), e1);
            st.branch_source(e1, value);
        }
        DeviceKind::Capacitor => {
            let e1 = ic.e1();
            st.source_branch(n(0), n(1), e1);
            st.branch_source(e1, state_value::<S>(ic));
        }
        DeviceKind::Vcvs => {
            let e1 = ic.e1();
            st.source_branch(n(0), n(1), e1);
            st.branch_node(e1, n(2), value.neg());
            st.branch_node(e1, n(3), value);
        }
        DeviceKind::Cccs => {
            let e1 = ic.e1();
            st.node_branch(n(0), e1, value.clone());
            st.node_branch(n(1), e1, value.neg());
            st.source_branch(n(2), n(3), e1);
        }
        DeviceKind::Ccvs => {
            let (e1, e2) = (ic.e1(), ic.e2());
            stamp_ccvs(st, [n(0), n(1), n(2), n(3)], e1, e2, value);
        }
        DeviceKind::Transformer => {
            let (e1, e2) = (ic.e1(), ic.e2());
            st.incidence(n(0), n(1), e1);
            st.incidence(n(2), n(3), e2);
            st.branch_node(e2, n(0), value.neg());
            st.branch_node(e2, n(1), value.clone());
            st.voltage_row(e2, n(2), n(3));
            st.branch_branch(e1, e1, S::one());
            st.branch_branch(e1, e2, value);
        }
    }
    Ok(())
}

/// CCVS: e2 carries the output current n1 -> n2, e1 the sensed current
/// n3 -> n4. Row e1 enforces `V(n1) - V(n2) - val * J(e1) = 0`, row e2
/// shorts the sense port.
fn stamp_ccvs<S: Scalar>(st: &mut Stamper<S>, nodes: [Node; 4], e1: usize, e2: usize, value: S) {
    let [n1, n2, n3, n4] = nodes;
    st.incidence(n1, n2, e2);
    st.voltage_row(e1, n1, n2);
    st.incidence(n3, n4, e1);
    st.voltage_row(e2, n3, n4);
    st.branch_branch(e1, e1, value.neg());
}

fn state_value<S: Scalar>(ic: &IndexedComponent<'_>) -> S {
    S::symbol(&ir::state_symbol(ic.name()))
}
