//! Node and branch numbering.
//!
//! One pass over the circuit in netlist order assigns every non-ground node
//! a matrix index (first encounter wins) and gives each device its branch
//! current unknowns. Ground ("0" or any capitalisation of "GND") is the
//! reference and never gets an index.

use std::collections::HashMap;

use crate::ir::{Circuit, Component, DeviceKind};

/// Matrix index of a node; `None` for ground.
pub type Node = Option<usize>;

/// Returns true if the node identifier represents ground.
pub fn is_ground(node: &str) -> bool {
    node == "0" || node.eq_ignore_ascii_case("GND")
}

/// Node name lookup. Ground spellings that appear in the netlist are
/// recorded too, mapped to `None`.
#[derive(Debug, Clone, Default)]
pub struct NodeMap {
    indices: HashMap<String, Node>,
    names: Vec<String>,
}

impl NodeMap {
    fn register(&mut self, name: &str) -> Node {
        if let Some(&node) = self.indices.get(name) {
            return node;
        }
        let node = if is_ground(name) {
            None
        } else {
            self.names.push(name.to_string());
            Some(self.names.len() - 1)
        };
        self.indices.insert(name.to_string(), node);
        node
    }

    /// `None` if the name never appears in the netlist.
    pub fn get(&self, name: &str) -> Option<Node> {
        self.indices.get(name).copied()
    }

    /// Non-ground node names in index order.
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// A component with its terminals and branch currents resolved to indices.
///
/// Only [`Topology::index`] builds these, so `branches` always holds exactly
/// `kind().branch_count()` entries.
#[derive(Debug, Clone)]
pub struct IndexedComponent<'c> {
    pub component: &'c Component,
    pub nodes: Vec<Node>,
    branches: Vec<usize>,
}

impl IndexedComponent<'_> {
    pub fn name(&self) -> &str {
        &self.component.name
    }

    pub fn kind(&self) -> DeviceKind {
        self.component.kind
    }

    pub fn node(&self, terminal: usize) -> Node {
        self.nodes[terminal]
    }

    /// Branch indices (0-based within the branch block).
    pub fn branches(&self) -> &[usize] {
        &self.branches
    }

    /// First branch current (V, C, E, F: the device current; H, T: the
    /// controlling or primary current).
    ///
    /// # Panics
    ///
    /// If the device kind owns no branch current.
    pub fn e1(&self) -> usize {
        self.branches[0]
    }

    /// Second branch current (H: output current, T: secondary current).
    ///
    /// # Panics
    ///
    /// If the device kind owns fewer than two branch currents.
    pub fn e2(&self) -> usize {
        self.branches[1]
    }
}

#[derive(Debug, Clone)]
pub struct Topology<'c> {
    pub components: Vec<IndexedComponent<'c>>,
    pub nodes: NodeMap,
    pub n_branches: usize,
    by_name: HashMap<&'c str, usize>,
}

impl<'c> Topology<'c> {
    pub fn index(circuit: &'c Circuit) -> Self {
        let _span = tracing::debug_span!("index").entered();
        let mut nodes = NodeMap::default();
        let mut n_branches = 0;
        let mut components = Vec::with_capacity(circuit.len());
        let mut by_name = HashMap::with_capacity(circuit.len());

        for component in &circuit.components {
            let count = component.kind.branch_count();
            let branches = (n_branches..n_branches + count).collect();
            n_branches += count;
            let terminals = component.nodes.iter().map(|n| nodes.register(n)).collect();
            by_name.insert(component.name.as_str(), components.len());
            components.push(IndexedComponent {
                component,
                nodes: terminals,
                branches,
            });
        }

        tracing::debug!(
            nodes = nodes.names.len(),
            branches = n_branches,
            "indexed circuit topology"
        );

        Self {
            components,
            nodes,
            n_branches,
            by_name,
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.names.len()
    }

    /// Size of the MNA system.
    pub fn size(&self) -> usize {
        self.n_nodes() + self.n_branches
    }

    pub fn component(&self, name: &str) -> Option<&IndexedComponent<'c>> {
        self.by_name.get(name).map(|&i| &self.components[i])
    }

    /// Human-readable name of an MNA unknown, e.g. `V(N1)` or `I(V1)`.
    pub fn unknown_label(&self, index: usize) -> String {
        if let Some(name) = self.nodes.names.get(index) {
            return format!("V({})", name);
        }
        let branch = index - self.n_nodes();
        for ic in &self.components {
            if let Some(pos) = ic.branches.iter().position(|&b| b == branch) {
                return match (ic.kind(), pos) {
                    (DeviceKind::Ccvs, 0) => format!("I({}:control)", ic.name()),
                    (DeviceKind::Transformer, 0) => format!("I({}:primary)", ic.name()),
                    (DeviceKind::Transformer, _) => format!("I({}:secondary)", ic.name()),
                    _ => format!("I({})", ic.name()),
                };
            }
        }
        format!("x{}", index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn test_ground_aliases() {
        assert!(is_ground("0"));
        assert!(is_ground("gnd"));
        assert!(is_ground("GnD"));
        assert!(!is_ground("00"));
        assert!(!is_ground("N0"));
    }

    #[test]
    fn test_first_encounter_order() {
        let circuit = parse("R1 B A R1\nR2 A gnd R2\nR3 C 0 R3\n").unwrap();
        let t = Topology::index(&circuit);
        assert_eq!(t.nodes.names(), &["B", "A", "C"]);
        assert_eq!(t.nodes.get("A"), Some(Some(1)));
        assert_eq!(t.nodes.get("gnd"), Some(None));
        assert_eq!(t.nodes.get("GND"), None);
        assert_eq!(t.nodes.get("X"), None);
    }

    #[test]
    fn test_branch_numbering() {
        let netlist = "V1 a 0 V\nR1 a b R\nH1 b 0 c 0 H\nC1 c 0 C\nT1 c 0 d 0 n\nL1 d 0 L\n";
        let circuit = parse(netlist).unwrap();
        let t = Topology::index(&circuit);
        assert_eq!(t.n_nodes(), 4);
        assert_eq!(t.n_branches, 6);
        assert_eq!(t.size(), 10);
        assert_eq!(t.component("V1").unwrap().branches(), &[0]);
        assert!(t.component("R1").unwrap().branches().is_empty());
        let h = t.component("H1").unwrap();
        assert_eq!((h.e1(), h.e2()), (1, 2));
        assert_eq!(t.component("C1").unwrap().e1(), 3);
        assert_eq!(t.component("T1").unwrap().branches(), &[4, 5]);
        assert!(t.component("L1").unwrap().branches().is_empty());
    }

    #[test]
    fn test_unknown_labels() {
        let circuit = parse("V1 a 0 V\nH1 b 0 a 0 H\n").unwrap();
        let t = Topology::index(&circuit);
        assert_eq!(t.unknown_label(0), "V(a)");
        assert_eq!(t.unknown_label(2), "I(V1)");
        assert_eq!(t.unknown_label(3), "I(H1:control)");
        assert_eq!(t.unknown_label(4), "I(H1)");
    }
}
