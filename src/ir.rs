//! Circuit intermediate representation.
//!
//! The parser produces a `Circuit` of components in netlist order. Device
//! values stay as `ValueExpr` trees until the compiler lowers them into the
//! symbolic engine it is instantiated with.

use std::collections::HashMap;
use std::fmt;

use num_rational::BigRational;

use crate::symbolic::Scalar;

/// Node identifier in the netlist (e.g. "0", "GND", "N1", "out").
/// Ground is "0" or any capitalisation of "GND".
pub type NodeId = String;

/// Device family, selected by the first letter of the device name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    Resistor,
    /// Voltage-controlled current source (G).
    Vccs,
    CurrentSource,
    Inductor,
    VoltageSource,
    Capacitor,
    /// Voltage-controlled voltage source (E).
    Vcvs,
    /// Current-controlled current source (F).
    Cccs,
    /// Current-controlled voltage source (H).
    Ccvs,
    /// Ideal transformer (T).
    Transformer,
}

impl DeviceKind {
    pub fn from_prefix(c: char) -> Option<Self> {
        Some(match c.to_ascii_uppercase() {
            'R' => Self::Resistor,
            'G' => Self::Vccs,
            'I' => Self::CurrentSource,
            'L' => Self::Inductor,
            'V' => Self::VoltageSource,
            'C' => Self::Capacitor,
            'E' => Self::Vcvs,
            'F' => Self::Cccs,
            'H' => Self::Ccvs,
            'T' => Self::Transformer,
            _ => return None,
        })
    }

    pub fn terminal_count(self) -> usize {
        match self {
            Self::Resistor
            | Self::CurrentSource
            | Self::Inductor
            | Self::VoltageSource
            | Self::Capacitor => 2,
            Self::Vccs | Self::Vcvs | Self::Cccs | Self::Ccvs | Self::Transformer => 4,
        }
    }

    /// Number of extra MNA unknowns (branch currents) the device owns.
    pub fn branch_count(self) -> usize {
        match self {
            Self::VoltageSource | Self::Capacitor | Self::Vcvs | Self::Cccs => 1,
            Self::Ccvs | Self::Transformer => 2,
            Self::Resistor | Self::Vccs | Self::CurrentSource | Self::Inductor => 0,
        }
    }

    /// Controlled sources, which have a controlling port on terminals 3-4.
    pub fn is_controlled(self) -> bool {
        matches!(self, Self::Vcvs | Self::Vccs | Self::Cccs | Self::Ccvs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// Device value as written in the netlist.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueExpr {
    Number(BigRational),
    Symbol(String),
    Neg(Box<ValueExpr>),
    Binary {
        op: BinaryOp,
        lhs: Box<ValueExpr>,
        rhs: Box<ValueExpr>,
    },
}

impl ValueExpr {
    pub fn binary(op: BinaryOp, lhs: ValueExpr, rhs: ValueExpr) -> Self {
        Self::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Lower into a symbolic engine. `None` if the expression divides by zero.
    pub fn lower<S: Scalar>(&self) -> Option<S> {
        match self {
            Self::Number(n) => Some(S::constant(n.clone())),
            Self::Symbol(name) => Some(S::symbol(name)),
            Self::Neg(inner) => inner.lower::<S>().map(|v| v.neg()),
            Self::Binary { op, lhs, rhs } => {
                let a = lhs.lower::<S>()?;
                let b = rhs.lower::<S>()?;
                match op {
                    BinaryOp::Add => Some(a.add(&b)),
                    BinaryOp::Sub => Some(a.sub(&b)),
                    BinaryOp::Mul => Some(a.mul(&b)),
                    BinaryOp::Div => a.div(&b),
                }
            }
        }
    }
}

impl fmt::Display for ValueExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Symbol(s) => write!(f, "{}", s),
            Self::Neg(inner) => write!(f, "-({})", inner),
            Self::Binary { op, lhs, rhs } => {
                let sym = match op {
                    BinaryOp::Add => "+",
                    BinaryOp::Sub => "-",
                    BinaryOp::Mul => "*",
                    BinaryOp::Div => "/",
                };
                write!(f, "({} {} {})", lhs, sym, rhs)
            }
        }
    }
}

/// A device line from the netlist.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub name: String,
    pub kind: DeviceKind,
    /// Two or four node names, in netlist order.
    pub nodes: Vec<NodeId>,
    pub value: ValueExpr,
    /// 1-based netlist line, for diagnostics.
    pub line: usize,
}

/// State symbol carried by the inductor or capacitor named `device`.
pub fn state_symbol(device: &str) -> String {
    format!("x_{}", device)
}

/// A parsed circuit: components in netlist order, with unique names.
#[derive(Debug, Clone, Default)]
pub struct Circuit {
    pub components: Vec<Component>,
    index: HashMap<String, usize>,
}

impl Circuit {
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Append a component. Names must be unique; the parser checks first.
    pub(crate) fn push(&mut self, component: Component) {
        self.index
            .insert(component.name.clone(), self.components.len());
        self.components.push(component);
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}
