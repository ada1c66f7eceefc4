//! Symbolic conversion of circuit netlists into linear state-space models.
//!
//! The pipeline mirrors a numeric SPICE front end: a netlist is parsed into
//! a [`ir::Circuit`], indexed into a [`topology::Topology`], stamped into a
//! modified nodal analysis system and solved, except that every value stays
//! a rational function of the circuit's symbols.

pub mod analysis;
pub mod compiler;
pub mod error;
pub mod ir;
pub mod output;
pub mod parser;
pub mod solver;
pub mod stats;
pub mod symbolic;
pub mod topology;
pub mod transfer;

pub use analysis::{convert, convert_with, StateSpace};
pub use error::{Result, SymnaError};
pub use symbolic::{Differentiable, Matrix, RationalFunction, Scalar};
