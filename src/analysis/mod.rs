//! Netlist to state-space conversion.
//!
//! Orchestrates the pipeline: parse, index, stamp, solve, then derive the
//! state equations, output equations and their linearization.

pub mod inputs;
pub mod linearize;
pub mod measure;
pub mod state;

use std::time::Instant;

use crate::compiler;
use crate::error::Result;
use crate::parser;
use crate::solver;
use crate::stats::Stats;
use crate::symbolic::{Differentiable, RationalFunction};
use crate::topology::Topology;

pub use linearize::StateSpace;
pub use measure::{MeasureKind, Measurement};

/// Convert a netlist into a symbolic state-space model.
///
/// `inputs` are symbol names forming `U`; `outputs` are measurement
/// specifiers such as `VnN1`, `VdR1` or `IdL1` forming `G`.
pub fn convert<I, O>(netlist: &str, inputs: &[I], outputs: &[O]) -> Result<StateSpace<RationalFunction>>
where
    I: AsRef<str>,
    O: AsRef<str>,
{
    convert_with(netlist, inputs, outputs, None)
}

/// [`convert`] over any symbolic engine, optionally recording phase timings.
pub fn convert_with<S, I, O>(
    netlist: &str,
    inputs: &[I],
    outputs: &[O],
    mut stats: Option<&mut Stats>,
) -> Result<StateSpace<S>>
where
    S: Differentiable,
    I: AsRef<str>,
    O: AsRef<str>,
{
    let _span = tracing::info_span!("convert").entered();

    let start = Instant::now();
    let circuit = parser::parse(netlist)?;
    let input_symbols = inputs::build(inputs)?;
    record(&mut stats, "Parse", start);

    let start = Instant::now();
    let topology = Topology::index(&circuit);
    let system = compiler::compile::<S>(&topology)?;
    record(&mut stats, "MNA assembly", start);

    let start = Instant::now();
    let solution = solver::solve(&system, &topology)?;
    record(&mut stats, "Symbolic solve", start);
    count_elimination(&mut stats);

    let start = Instant::now();
    let states = state::select(&topology, &solution)?;
    let output_equations = measure::build_outputs(&topology, &solution, outputs)?;
    tracing::debug!(
        states = states.len(),
        inputs = input_symbols.len(),
        outputs = output_equations.labels.len(),
        "built state and output equations"
    );

    if let Some(s) = stats.as_deref_mut() {
        s.devices = circuit.len();
        s.nodes = system.n_nodes;
        s.branches = system.n_branches;
        s.states = states.len();
        s.inputs = input_symbols.len();
        s.outputs = output_equations.labels.len();
    }

    let model = linearize::linearize(states, input_symbols, output_equations)?;
    record(&mut stats, "Linearize", start);
    count_elimination(&mut stats);

    tracing::info!(
        states = model.states.len(),
        inputs = model.inputs.len(),
        outputs = model.outputs.len(),
        "conversion complete"
    );
    Ok(model)
}

fn record(stats: &mut Option<&mut Stats>, phase: &'static str, start: Instant) {
    if let Some(s) = stats.as_deref_mut() {
        s.add_phase(phase, start.elapsed());
    }
}

/// One symbolic elimination ran: the MNA inverse or the operating-point solve.
fn count_elimination(stats: &mut Option<&mut Stats>) {
    if let Some(s) = stats.as_deref_mut() {
        s.eliminations += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::sampled::Sampled;
    use crate::symbolic::Scalar;

    #[test]
    fn test_convert_records_stats() {
        let mut stats = Stats::new();
        let netlist = "V1 in 0 VIN\nR1 in out R1\nC1 out 0 C1\n";
        let ss: StateSpace<RationalFunction> =
            convert_with(netlist, &["VIN"], &["VdC1"], Some(&mut stats)).unwrap();
        assert_eq!(ss.states, vec!["x_C1"]);
        assert_eq!(stats.phases().len(), 4);
        assert_eq!((stats.nodes, stats.branches, stats.states), (2, 2, 1));
        assert_eq!(stats.eliminations, 2);
    }

    #[test]
    fn test_failed_solve_counts_no_linearization() {
        let mut stats = Stats::new();
        let netlist = "V1 a 0 Va\nV2 a 0 Vb\nR1 a 0 R\n";
        let result: Result<StateSpace<RationalFunction>> =
            convert_with(netlist, &["Va"], &["Vna"], Some(&mut stats));
        assert!(result.is_err());
        assert_eq!(stats.eliminations, 0);
        assert_eq!(stats.phases().len(), 2);
    }

    #[test]
    fn test_parse_errors_propagate() {
        let err = convert("R1 a\n", &["U"], &["VnA"]).unwrap_err();
        assert!(matches!(err, crate::error::SymnaError::Parse(_)));
    }

    #[test]
    fn test_bad_input_name_is_rejected() {
        let err = convert("R1 a 0 R\n", &["1x"], &["Vna"]).unwrap_err();
        assert!(matches!(err, crate::error::SymnaError::Parse(_)));
    }

    #[test]
    fn test_string_vectors_are_accepted() {
        let inputs = vec!["I1".to_string()];
        let outputs = vec!["Vna".to_string()];
        let ss = convert("I1 0 a I1\nR1 a 0 R\n", &inputs, &outputs).unwrap();
        assert_eq!(ss.d[(0, 0)], RationalFunction::symbol("R"));
    }

    #[test]
    fn test_sampled_engine_runs_the_pipeline() {
        // the stand-in has no calculus, so check compile + solve only
        let circuit = parser::parse("V1 a 0 Vs\nR1 a b R1\nR2 b 0 R2\n").unwrap();
        let topology = Topology::index(&circuit);
        let system = compiler::compile::<Sampled>(&topology).unwrap();
        let solution = solver::solve(&system, &topology).unwrap();
        let (vs, r1, r2) = (Sampled::of("Vs"), Sampled::of("R1"), Sampled::of("R2"));
        let expected = vs.mul(&r2).div(&r1.add(&r2)).unwrap();
        assert_eq!(solution.voltage(Some(1)), &expected);
    }
}
