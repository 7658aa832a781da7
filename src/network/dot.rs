//! Export networks to the Graphviz dot format using [`LogicNetwork::to_dot`].
//!
//! ```rust
//! use qpebble::function::TruthTable;
//! use qpebble::network::dot::GraphvizStyle;
//! use qpebble::network::{LogicNetwork, NetEdge, NetNode};
//!
//! let mut net = LogicNetwork::new();
//! let i1 = net.add_node(NetNode::Input(1)).unwrap();
//! let i2 = net.add_node(NetNode::Input(2)).unwrap();
//! net.new_gate(
//!     3,
//!     vec![NetEdge::new(i1, false), NetEdge::new(i2, false)],
//!     TruthTable::conjunction(2),
//! )
//! .unwrap();
//! net.add_output(3, false).unwrap();
//! println!("{}", net.to_dot(GraphvizStyle::default()));
//! ```
//!
//! You can then render the graph using the DOT engine.

use std::fmt::Display;

use crate::function::TruthTable;

use super::{LogicNetwork, NetNode};

// Defining default global style.
const DEFAULT_RANKDIR: &str = "BT";

// Defining default style for nodes.
const DEFAULT_CONSTANT_NODE_FORMAT: &str = "[shape=point, label=\"GND\", width=1.5]";
const DEFAULT_INPUT_NODE_FORMAT: &str = "[shape=box]";
const DEFAULT_AND_NODE_FORMAT: &str = "[shape=circle, label=\"∧\"]";
const DEFAULT_XOR_NODE_FORMAT: &str = "[shape=circle, label=\"⊕\"]";
const DEFAULT_GATE_NODE_FORMAT: &str = "[shape=circle]";
/// See https://stackoverflow.com/questions/50822798/how-to-use-graphviz-to-draw-a-node-pointed-by-an-arrow.
const DEFAULT_OUTPUT_NODE_FORMAT: &str = "[shape=none, height=.0, width=.0]";

// Defining default style for edges.
const DEFAULT_EDGE_ALL_FORMAT: &str = "[arrowsize=0.3]";
const DEFAULT_EDGE_COMPLEMENT_FORMAT: &str = "[headlabel=\"●\", labelangle=.0, labeldistance=1.5]";

/// String containing a graphviz node or edge style (you must manually include
/// square brackets).
#[derive(Debug, Clone)]
pub struct GraphvizItemStyle(String);

impl Display for GraphvizItemStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parameters for Graphviz rendering.
///
/// ### Nodes
/// - constant, input, output (by default, an invisible node just to get an arrow)
/// - `and` / `xor` gates are recognized from their truth table, any other gate
///   uses the generic gate style and is labelled with its id.
///
/// ### Edges
/// All edges implement the `edge_all` style; complemented edges additionally
/// get the `edge_complement` style.
pub struct GraphvizStyle {
    pub rankdir: String,
    pub constant: GraphvizItemStyle,
    pub input: GraphvizItemStyle,
    pub and: GraphvizItemStyle,
    pub xor: GraphvizItemStyle,
    pub gate: GraphvizItemStyle,
    pub output: GraphvizItemStyle,
    pub edge_all: GraphvizItemStyle,
    pub edge_complement: GraphvizItemStyle,
}

impl Default for GraphvizStyle {
    fn default() -> Self {
        GraphvizStyle {
            rankdir: DEFAULT_RANKDIR.to_string(),
            constant: GraphvizItemStyle(DEFAULT_CONSTANT_NODE_FORMAT.to_string()),
            input: GraphvizItemStyle(DEFAULT_INPUT_NODE_FORMAT.to_string()),
            and: GraphvizItemStyle(DEFAULT_AND_NODE_FORMAT.to_string()),
            xor: GraphvizItemStyle(DEFAULT_XOR_NODE_FORMAT.to_string()),
            gate: GraphvizItemStyle(DEFAULT_GATE_NODE_FORMAT.to_string()),
            output: GraphvizItemStyle(DEFAULT_OUTPUT_NODE_FORMAT.to_string()),
            edge_all: GraphvizItemStyle(DEFAULT_EDGE_ALL_FORMAT.to_string()),
            edge_complement: GraphvizItemStyle(DEFAULT_EDGE_COMPLEMENT_FORMAT.to_string()),
        }
    }
}

impl LogicNetwork {
    /// Render the network in the Graphviz dot format.
    ///
    /// Nodes come out in the topological order the scheduler sees, fanins
    /// before the gates reading them (a network that fails its own sort
    /// renders as an empty graph).
    pub fn to_dot(&self, style: GraphvizStyle) -> String {
        let order = self.get_topological_sort().unwrap_or_default();

        let mut lines = Vec::new();
        lines.push("digraph {".to_string());
        lines.push(format!("  rankdir={};", style.rankdir));

        // Nodes
        for node in &order {
            let id = node.borrow().get_id();
            match &*node.borrow() {
                NetNode::Constant => lines.push(format!("  {} {}", id, style.constant)),
                NetNode::Input(_) => lines.push(format!("  {} {}", id, style.input)),
                NetNode::Gate {
                    fanins, function, ..
                } => {
                    let arity = fanins.len();
                    if *function == TruthTable::conjunction(arity) {
                        lines.push(format!("  {} {}", id, style.and));
                    } else if *function == TruthTable::parity(arity) {
                        lines.push(format!("  {} {}", id, style.xor));
                    } else {
                        lines.push(format!("  {} {}", id, style.gate));
                    }
                }
            }
        }

        // Edges
        for node in &order {
            let id = node.borrow().get_id();
            for fanin in node.borrow().get_fanins() {
                let mut attrs = format!("{}", style.edge_all);
                if fanin.get_complement() {
                    attrs = format!("{}{}", attrs, style.edge_complement);
                }
                lines.push(format!("  {} -> {} {}", fanin.get_node_id(), id, attrs));
            }
        }

        // Outputs as invisible extra nodes
        for (k, output) in self.get_outputs().iter().enumerate() {
            lines.push(format!("  o{} {}", k, style.output));
            let mut attrs = format!("{}", style.edge_all);
            if output.get_complement() {
                attrs = format!("{}{}", attrs, style.edge_complement);
            }
            lines.push(format!("  {} -> o{} {}", output.get_node_id(), k, attrs));
        }

        lines.push("}".to_string());
        lines.join("\n")
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::network::NetEdge;

    #[test]
    fn to_dot_test() {
        let mut net = LogicNetwork::new();
        let i1 = net.add_node(NetNode::Input(1)).unwrap();
        let i2 = net.add_node(NetNode::Input(2)).unwrap();
        net.new_gate(
            3,
            vec![NetEdge::new(i1, false), NetEdge::new(i2, true)],
            TruthTable::parity(2),
        )
        .unwrap();
        net.add_output(3, false).unwrap();

        let dot = net.to_dot(GraphvizStyle::default());
        assert!(dot.starts_with("digraph {"));
        assert!(dot.ends_with("}"));
        assert!(dot.contains("⊕")); // xor gate recognized
        assert!(dot.contains("1 -> 3"));
        assert!(dot.contains("2 -> 3"));
        assert!(dot.contains("headlabel")); // complemented fanin marked
        assert!(dot.contains("3 -> o0"));
    }
}
