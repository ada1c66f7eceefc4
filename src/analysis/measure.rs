//! Output equations.
//!
//! An output specifier is a two-letter measurement code followed by a target:
//!
//! | code | meaning                  | target |
//! |------|--------------------------|--------|
//! | `Vn` | node voltage             | node   |
//! | `Vd` | voltage across a device  | device |
//! | `Id` | current through a device | device |
//! | `Vc` | controlling-port voltage | E, F, G or H device |
//! | `Ic` | controlling-port current | E, F, G or H device |
//!
//! Measurements on ideal transformers are not implemented: they produce a
//! warning and a zero row instead of an error.

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SymnaError};
use crate::ir::{self, DeviceKind};
use crate::solver::Solution;
use crate::symbolic::{Matrix, Scalar};
use crate::topology::{IndexedComponent, Topology};

use super::state::device_value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasureKind {
    NodeVoltage,
    DeviceVoltage,
    DeviceCurrent,
    ControlVoltage,
    ControlCurrent,
}

impl MeasureKind {
    pub fn code(self) -> &'static str {
        match self {
            Self::NodeVoltage => "Vn",
            Self::DeviceVoltage => "Vd",
            Self::DeviceCurrent => "Id",
            Self::ControlVoltage => "Vc",
            Self::ControlCurrent => "Ic",
        }
    }

    fn from_code(code: &str) -> Option<Self> {
        [
            Self::NodeVoltage,
            Self::DeviceVoltage,
            Self::DeviceCurrent,
            Self::ControlVoltage,
            Self::ControlCurrent,
        ]
        .into_iter()
        .find(|k| k.code() == code)
    }
}

/// A parsed output specifier such as `VdR1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Measurement {
    pub kind: MeasureKind,
    pub target: String,
}

impl FromStr for Measurement {
    type Err = SymnaError;

    fn from_str(spec: &str) -> Result<Self> {
        let spec = spec.trim();
        let (code, target) = match (spec.get(..2), spec.get(2..)) {
            (Some(code), Some(target)) if !target.is_empty() => (code, target),
            _ => {
                return Err(SymnaError::Parse(format!(
                    "output '{}' needs a measurement code and a target",
                    spec
                )))
            }
        };
        let kind = MeasureKind::from_code(code).ok_or_else(|| SymnaError::UnsupportedMeasurement {
            kind: code.to_string(),
            device: target.to_string(),
        })?;
        Ok(Self {
            kind,
            target: target.to_string(),
        })
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.code(), self.target)
    }
}

/// The output vector `G(X, U)` with one label per row.
#[derive(Debug, Clone)]
pub struct OutputEquations<S> {
    pub labels: Vec<String>,
    pub equations: Matrix<S>,
}

pub fn build_outputs<S: Scalar, O: AsRef<str>>(
    topology: &Topology<'_>,
    solution: &Solution<S>,
    specs: &[O],
) -> Result<OutputEquations<S>> {
    let mut labels = Vec::with_capacity(specs.len());
    let mut rows = Vec::with_capacity(specs.len());

    for spec in specs {
        let measurement: Measurement = spec.as_ref().parse()?;
        rows.push(measure(&measurement, topology, solution)?);
        labels.push(measurement.to_string());
    }

    Ok(OutputEquations {
        labels,
        equations: Matrix::column(rows),
    })
}

fn measure<S: Scalar>(m: &Measurement, topology: &Topology<'_>, solution: &Solution<S>) -> Result<S> {
    let ic = match m.kind {
        MeasureKind::NodeVoltage => {
            let node = topology
                .nodes
                .get(&m.target)
                .ok_or_else(|| SymnaError::UndefinedReference(format!("node {}", m.target)))?;
            return Ok(solution.voltage(node).clone());
        }
        _ => topology
            .component(&m.target)
            .ok_or_else(|| SymnaError::UndefinedReference(format!("device {}", m.target)))?,
    };

    if ic.kind() == DeviceKind::Transformer {
        tracing::warn!(output = %m, "measurements on ideal transformers are not implemented, using 0");
        return Ok(S::zero());
    }

    match m.kind {
        MeasureKind::DeviceVoltage => device_voltage(ic, solution),
        MeasureKind::DeviceCurrent => device_current(ic, solution),
        kind if ic.kind().is_controlled() => Ok(control_port(kind, ic, solution)),
        kind => Err(SymnaError::UnsupportedMeasurement {
            kind: kind.code().to_string(),
            device: ic.name().to_string(),
        }),
    }
}

fn branch<S: Scalar>(solution: &Solution<S>, e: usize) -> S {
    solution.current(e).clone()
}

fn device_voltage<S: Scalar>(ic: &IndexedComponent<'_>, solution: &Solution<S>) -> Result<S> {
    match ic.kind() {
        DeviceKind::Capacitor => Ok(state(ic)),
        DeviceKind::VoltageSource => device_value(ic),
        _ => Ok(solution.across(ic.node(0), ic.node(1))),
    }
}

fn device_current<S: Scalar>(ic: &IndexedComponent<'_>, solution: &Solution<S>) -> Result<S> {
    Ok(match ic.kind() {
        DeviceKind::Inductor => state(ic),
        DeviceKind::Capacitor | DeviceKind::VoltageSource | DeviceKind::Vcvs => {
            branch(solution, ic.e1())
        }
        DeviceKind::Ccvs => branch(solution, ic.e2()),
        DeviceKind::Cccs => branch(solution, ic.e1()).mul(&device_value(ic)?),
        DeviceKind::CurrentSource => device_value(ic)?,
        DeviceKind::Resistor => {
            let v = solution.across(ic.node(0), ic.node(1));
            v.div(&device_value(ic)?).ok_or_else(|| {
                SymnaError::ZeroValue(format!("resistor {} has zero resistance", ic.name()))
            })?
        }
        DeviceKind::Vccs => solution
            .across(ic.node(2), ic.node(3))
            .mul(&device_value(ic)?),
        DeviceKind::Transformer => S::zero(),
    })
}

fn control_port<S: Scalar>(kind: MeasureKind, ic: &IndexedComponent<'_>, solution: &Solution<S>) -> S {
    let current_controlled = matches!(ic.kind(), DeviceKind::Cccs | DeviceKind::Ccvs);
    match (kind, current_controlled) {
        // a current-sensing port is a short, a voltage-sensing port is open
        (MeasureKind::ControlVoltage, true) | (MeasureKind::ControlCurrent, false) => S::zero(),
        (MeasureKind::ControlVoltage, false) => solution.across(ic.node(2), ic.node(3)),
        _ => branch(solution, ic.e1()),
    }
}

fn state<S: Scalar>(ic: &IndexedComponent<'_>) -> S {
    S::symbol(&ir::state_symbol(ic.name()))
}
