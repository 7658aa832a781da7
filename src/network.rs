//! Module defining the [`Network`] capability trait consumed by the
//! scheduler, and the concrete [`LogicNetwork`] builder implementing it
//! (as well as [`NetNode`], [`NetEdge`] and some other relevant structs).
//!
//! The scheduling core never touches a network type directly: it is generic
//! over [`Network`], a read-only view of a combinational DAG. Anything that
//! can enumerate its gates topologically, iterate fanins and outputs, and
//! report gate functions and fanout sizes can be scheduled. [`LogicNetwork`]
//! is the crate's own implementation, built node by node by the caller
//! (typically from an AIG/AAG reader living outside this crate).

pub mod dot;
pub mod edge;
pub mod error;
pub mod node;

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::rc::Rc;

pub use edge::NetEdge;
pub use error::{NetworkError, Result};
pub(crate) use node::NetNodeWeak;
pub use node::{NetNode, NetNodeRef, NodeId};

use crate::function::TruthTable;

/// Read-only view of a combinational DAG, as required by the scheduler.
///
/// Gates are totally ordered by a topological index in `[0, num_gates())`,
/// children before parents, and the indices are stable for the life of a
/// solve. Primary inputs and constants carry no index: they are always
/// available and never scheduled.
pub trait Network {
    /// Handle on a node of the network.
    type Node: Copy + Eq + Hash;
    /// A possibly complemented reference to a node.
    type Signal: Copy;

    /// Number of gates (inputs and constants not included).
    fn num_gates(&self) -> usize;

    /// Visit every gate in topological order (children before parents),
    /// together with its index.
    fn foreach_gate(&self, f: impl FnMut(Self::Node, usize));

    /// Visit the fanin signals of a node, in order.
    fn foreach_fanin(&self, node: Self::Node, f: impl FnMut(Self::Signal));

    /// Visit the primary output signals.
    fn foreach_po(&self, f: impl FnMut(Self::Signal));

    /// The node a signal points at.
    fn get_node(&self, signal: Self::Signal) -> Self::Node;

    /// Is this node a primary input?
    fn is_pi(&self, node: Self::Node) -> bool;

    /// Is this node a constant?
    fn is_constant(&self, node: Self::Node) -> bool;

    /// The Boolean function of a gate, over its fanins (fanin 0 is
    /// variable 0). Must only be called on gates.
    fn node_function(&self, node: Self::Node) -> TruthTable;

    /// How many places read this node's value (fanouts, output references
    /// included).
    fn fanout_size(&self, node: Self::Node) -> usize;
}

/// A whole combinational logic network.
///
/// Nodes are kept alive artificially while the network is being built, so you
/// can create gates before deciding which ones the outputs use. Once you are
/// done building (ie, your network should now be in a relevant state), you can
/// call the [`.update()`] method to remove all unused nodes.
///
/// [`.update()`]: LogicNetwork::update
///
/// The use of [`Rc`] and [`NetNodeRef`] allows us not to worry about having to
/// drop manually nodes that are no longer used.
///
/// Contrary to an AIG, gates have an *ordered* fanin list of arbitrary arity
/// and carry their Boolean function as a [`TruthTable`] over those fanins.
#[derive(Debug, Clone)]
pub struct LogicNetwork {
    nodes: HashMap<NodeId, NetNodeWeak>,
    /// Inputs must be kept artificially alive as
    /// we don't want to remove them even if the outputs do not depend on them.
    inputs: HashMap<NodeId, NetNodeRef>,
    outputs: Vec<NetEdge>,
    keep_nodes_alive: Vec<NetNodeRef>,
    // Keep alive the constant node.
    _node_constant: NetNodeRef,
}

impl LogicNetwork {
    /// Create a brand new network (constant node [`NetNode::Constant`] included).
    pub fn new() -> Self {
        let node_constant = Rc::new(std::cell::RefCell::new(NetNode::Constant));
        let nodes = HashMap::from([(0, Rc::downgrade(&node_constant))]);
        LogicNetwork {
            nodes,
            inputs: HashMap::new(),
            outputs: Vec::new(),
            keep_nodes_alive: Vec::new(),
            _node_constant: node_constant,
        }
    }

    /// Retrieves a node from its id.
    pub fn get_node(&self, id: NodeId) -> Option<NetNodeRef> {
        self.nodes.get(&id)?.upgrade()
    }

    /// Call this function when you are done building.
    /// All nodes that are not part of the network anymore (ie not reachable
    /// from an output) will be deleted.
    pub fn update(&mut self) {
        // Stop keeping nodes artificially alive
        self.keep_nodes_alive.clear();

        // Removing no longer valid entries from the nodes
        self.nodes
            .retain(|_, weak_node| weak_node.upgrade().is_some());
    }

    /// Retrieves inputs reference.
    pub fn get_inputs(&self) -> Vec<NetNodeRef> {
        self.inputs.values().cloned().collect()
    }

    /// Retrieves inputs id.
    pub fn get_inputs_id(&self) -> HashSet<NodeId> {
        self.inputs.keys().copied().collect()
    }

    /// Retrieves outputs reference.
    pub fn get_outputs(&self) -> Vec<NetEdge> {
        self.outputs.clone()
    }

    fn topological_visit(
        &self,
        node: NetNodeRef,
        sort: &mut Vec<NetNodeRef>,
        seen: &mut HashSet<NodeId>,
        done: &mut HashSet<NodeId>,
    ) -> Result<()> {
        let mut stack: Vec<(NetNodeRef, bool)> = Vec::new();
        stack.push((node, false));

        while let Some((node, last_time)) = stack.pop() {
            let id = node.borrow().get_id();

            // Post order check
            if last_time {
                done.insert(id);
                seen.remove(&id);
                sort.push(node);
                continue;
            }

            if done.contains(&id) {
                continue;
            } else if seen.contains(&id) {
                return Err(NetworkError::InvalidState("found a cycle".to_string()));
            }

            seen.insert(id);
            stack.push((node.clone(), true));

            // Time to add the fanins
            for fanin in node.borrow().get_fanins() {
                if !done.contains(&fanin.get_node_id()) {
                    stack.push((fanin.get_node(), false));
                }
            }
        }

        Ok(())
    }

    /// Returns a topological sort of the nodes reachable from the outputs
    /// (fanins before the nodes using them), will error if a cycle is detected.
    pub fn get_topological_sort(&self) -> Result<Vec<NetNodeRef>> {
        let mut sort = Vec::new();
        let mut seen = HashSet::new();
        let mut done = HashSet::new();

        for output in &self.outputs {
            self.topological_visit(output.get_node(), &mut sort, &mut seen, &mut done)?;
        }
        Ok(sort)
    }

    /// The ids of the gates reachable from the outputs, in topological order.
    /// This is the gate indexation the scheduler works with: `gate_order()[i]`
    /// is the gate of index `i`.
    pub fn gate_order(&self) -> Result<Vec<NodeId>> {
        Ok(self
            .get_topological_sort()?
            .iter()
            .filter(|node| node.borrow().is_gate())
            .map(|node| node.borrow().get_id())
            .collect())
    }

    fn check_valid_node_to_add(&self, node: &NetNode) -> Result<()> {
        match node {
            NetNode::Constant => Ok(()),
            NetNode::Input(id) => {
                if *id == 0 {
                    Err(NetworkError::IdZeroButNotConstant)
                } else {
                    Ok(())
                }
            }
            NetNode::Gate {
                id,
                fanins,
                function,
                ..
            } => {
                if *id == 0 {
                    return Err(NetworkError::IdZeroButNotConstant);
                }
                if fanins.is_empty() {
                    return Err(NetworkError::NoFanin(*id));
                }
                if function.num_vars() != fanins.len() {
                    return Err(NetworkError::ArityMismatch {
                        id: *id,
                        fanins: fanins.len(),
                        vars: function.num_vars(),
                    });
                }
                for fanin in fanins {
                    let fanin_id = fanin.get_node_id();
                    if self.get_node(fanin_id).is_none() {
                        return Err(NetworkError::NodeDoesNotExist(fanin_id));
                    }
                }
                Ok(())
            }
        }
    }

    /// Create a new (or retrieve existing) node within the network.
    /// This will fail if a different node with the same id already exists,
    /// or if a node uses id 0 (reserved for [`NetNode::Constant`]), or if a
    /// gate refers to unknown fanins or carries a function whose arity does
    /// not match its fanin count.
    pub fn add_node(&mut self, node: NetNode) -> Result<NetNodeRef> {
        self.check_valid_node_to_add(&node)?;

        let id = node.get_id();
        match self.get_node(id) {
            // No node with this id, let's create a new one
            None => {
                let n = Rc::new(std::cell::RefCell::new(node));
                // If the node is an input, we must keep it alive in the map;
                // if it is a gate, its fanins must learn about their new fanout.
                match &*n.borrow() {
                    NetNode::Input(_) => {
                        self.inputs.insert(id, n.clone());
                    }
                    NetNode::Gate { fanins, .. } => {
                        for fanin in fanins {
                            fanin
                                .get_node()
                                .borrow_mut()
                                .add_fanout(id, Rc::downgrade(&n));
                        }
                    }
                    NetNode::Constant => (),
                }
                self.nodes.insert(id, Rc::downgrade(&n));
                self.keep_nodes_alive.push(n.clone());
                Ok(n)
            }
            // A node was found, maybe it is just the one we're trying to create
            Some(n) => {
                if *n.borrow() == node {
                    Ok(n)
                } else {
                    Err(NetworkError::DuplicateId(id))
                }
            }
        }
    }

    /// Create a new gate (or retrieve it if the exact same gate already exists).
    pub fn new_gate(
        &mut self,
        id: NodeId,
        fanins: Vec<NetEdge>,
        function: TruthTable,
    ) -> Result<NetNodeRef> {
        // Bypass the constructor panic on id=0, add_node reports a proper error.
        let candidate = NetNode::Gate {
            id,
            fanins,
            function,
            fanouts: HashMap::new(),
        };
        self.add_node(candidate)
    }

    /// Mark an existing node as a primary output.
    pub fn add_output(&mut self, id: NodeId, complement: bool) -> Result<()> {
        let node = self
            .get_node(id)
            .ok_or(NetworkError::NodeDoesNotExist(id))?;
        self.outputs.push(NetEdge::new(node, complement));
        Ok(())
    }

    /// Checking if the network structure is correct.
    /// This function was written for debug purposes, as the library is supposed
    /// to maintain integrity of the network at any moment.
    pub fn check_integrity(&self) -> Result<()> {
        // Checking that all nodes have relevant id
        // and perform some individual integrity checks
        for (&id, weak_node) in &self.nodes {
            if let Some(node) = weak_node.upgrade() {
                if node.borrow().get_id() != id {
                    return Err(NetworkError::InvalidState(
                        "incoherent node id".to_string(),
                    ));
                }
                self.check_node_integrity(node)?;
            }
        }

        // Checking that all outputs are registered as nodes
        for output in &self.outputs {
            let output_id = output.get_node_id();
            if self.get_node(output_id).is_none() {
                return Err(NetworkError::InvalidState(format!(
                    "output ({}, {}) refers to node {} which is not in the network",
                    output_id,
                    output.get_complement(),
                    output_id
                )));
            }
        }

        // Checks for acyclicity
        self.get_topological_sort()?;

        Ok(())
    }

    /// Check the integrity for an individual node, that is:
    /// - check that only [`NetNode::Constant`] has id 0
    /// - check that fanins ([`NetEdge`]) of gates are valid too
    ///   (ie they refer to a known node for this network).
    fn check_node_integrity(&self, node: NetNodeRef) -> Result<()> {
        match &*node.borrow() {
            NetNode::Constant => {
                if node.borrow().get_id() != 0 {
                    return Err(NetworkError::InvalidState(
                        "invalid constant node".to_string(),
                    ));
                }
            }
            NetNode::Input(id) => {
                if *id == 0 {
                    return Err(NetworkError::IdZeroButNotConstant);
                }
            }
            NetNode::Gate {
                id,
                fanins,
                function,
                ..
            } => {
                if *id == 0 {
                    return Err(NetworkError::IdZeroButNotConstant);
                }
                if function.num_vars() != fanins.len() {
                    return Err(NetworkError::ArityMismatch {
                        id: *id,
                        fanins: fanins.len(),
                        vars: function.num_vars(),
                    });
                }
                for fanin in fanins {
                    self.check_edge_integrity(fanin)?;
                }
            }
        }
        Ok(())
    }

    fn check_edge_integrity(&self, fanin: &NetEdge) -> Result<()> {
        let id = fanin.get_node_id();
        self.get_node(id).ok_or(NetworkError::InvalidState(format!(
            "edge pointing at node {} which is not in the network anymore",
            id
        )))?;
        Ok(())
    }
}

impl Default for LogicNetwork {
    fn default() -> Self {
        LogicNetwork::new()
    }
}

impl Network for LogicNetwork {
    type Node = NodeId;
    type Signal = (NodeId, bool);

    fn num_gates(&self) -> usize {
        self.gate_order().map(|order| order.len()).unwrap_or(0)
    }

    fn foreach_gate(&self, mut f: impl FnMut(NodeId, usize)) {
        if let Ok(order) = self.gate_order() {
            for (index, id) in order.into_iter().enumerate() {
                f(id, index);
            }
        }
    }

    fn foreach_fanin(&self, node: NodeId, mut f: impl FnMut((NodeId, bool))) {
        let node = self.get_node(node).expect("fanin of unknown node");
        for fanin in node.borrow().get_fanins() {
            f((fanin.get_node_id(), fanin.get_complement()));
        }
    }

    fn foreach_po(&self, mut f: impl FnMut((NodeId, bool))) {
        for output in &self.outputs {
            f((output.get_node_id(), output.get_complement()));
        }
    }

    fn get_node(&self, signal: (NodeId, bool)) -> NodeId {
        signal.0
    }

    fn is_pi(&self, node: NodeId) -> bool {
        self.inputs.contains_key(&node)
    }

    fn is_constant(&self, node: NodeId) -> bool {
        node == 0
    }

    fn node_function(&self, node: NodeId) -> TruthTable {
        self.get_node(node)
            .and_then(|n| n.borrow().get_function())
            .expect("node_function called on a non-gate")
    }

    /// Fanout references tracked on gates, plus one per output reference.
    /// An output gate can therefore never look single-fanout, even if only
    /// one gate reads it.
    fn fanout_size(&self, node: NodeId) -> usize {
        let po_refs = self
            .outputs
            .iter()
            .filter(|output| output.get_node_id() == node)
            .count();
        match self.get_node(node) {
            Some(n) => n.borrow().gate_fanout_count() + po_refs,
            None => po_refs,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn edge(net: &LogicNetwork, id: NodeId) -> NetEdge {
        NetEdge::new(net.get_node(id).unwrap(), false)
    }

    #[test]
    fn add_node_test() {
        let mut net = LogicNetwork::new();

        // Adding legit nodes
        let nf = NetNode::Constant;
        let rnf = net.add_node(nf.clone()).unwrap();
        assert_eq!(*rnf.borrow(), nf);
        let i1 = NetNode::Input(1);
        let ri1 = net.add_node(i1.clone()).unwrap();
        assert_eq!(*ri1.borrow(), i1);
        let g2 = NetNode::gate(
            2,
            vec![NetEdge::new(rnf.clone(), false), NetEdge::new(ri1.clone(), false)],
            TruthTable::conjunction(2),
        );
        let rg2 = net.add_node(g2.clone()).unwrap();
        assert_eq!(*rg2.borrow(), g2);

        // Now, trying to add some illegal nodes
        assert!(net.add_node(NetNode::Input(2)).is_err());
        assert!(
            net.new_gate(
                1,
                vec![NetEdge::new(rnf.clone(), false)],
                TruthTable::conjunction(1)
            )
            .is_err()
        );

        // Trying to re-add existing nodes (legal)
        assert_eq!(*net.add_node(nf.clone()).unwrap().borrow(), nf);
        assert_eq!(*net.add_node(i1.clone()).unwrap().borrow(), i1);
        assert_eq!(*net.add_node(g2.clone()).unwrap().borrow(), g2);
    }

    #[test]
    fn add_node_test_invalid_id0() {
        let mut net = LogicNetwork::new();
        assert!(net.add_node(NetNode::Input(0)).is_err());
        let i1 = net.add_node(NetNode::Input(1)).unwrap();
        assert!(
            net.new_gate(
                0,
                vec![NetEdge::new(i1.clone(), false)],
                TruthTable::conjunction(1)
            )
            .is_err()
        );
    }

    #[test]
    fn add_node_test_invalid_gate() {
        let mut net = LogicNetwork::new();
        let i1 = net.add_node(NetNode::Input(1)).unwrap();

        // Unknown fanin
        let fake = Rc::new(std::cell::RefCell::new(NetNode::Input(7)));
        assert!(
            net.new_gate(
                2,
                vec![NetEdge::new(fake, false)],
                TruthTable::conjunction(1)
            )
            .is_err()
        );

        // Arity mismatch between fanins and function
        assert!(
            net.new_gate(
                2,
                vec![NetEdge::new(i1.clone(), false)],
                TruthTable::conjunction(2)
            )
            .is_err()
        );

        // No fanin at all
        assert!(net.new_gate(2, vec![], TruthTable::constant(0, true)).is_err());
    }

    #[test]
    fn node_lifetime() {
        let mut net = LogicNetwork::new();
        net.add_node(NetNode::Input(1)).unwrap();
        net.add_node(NetNode::Input(2)).unwrap();
        net.add_node(NetNode::Input(3)).unwrap();
        // G4 reads I1, I2 and G5 reads I2, I3. Only G5 is an output:
        // after update, G4 should be cleared (but I1 is kept alive).
        net.new_gate(
            4,
            vec![edge(&net, 1), edge(&net, 2)],
            TruthTable::conjunction(2),
        )
        .unwrap();
        net.new_gate(
            5,
            vec![edge(&net, 2), edge(&net, 3)],
            TruthTable::conjunction(2),
        )
        .unwrap();
        net.add_output(5, false).unwrap();
        net.update();
        assert!(net.get_node(0).is_some()); // the constant does not get deleted
        assert!(net.get_node(1).is_some()); // inputs do not get deleted
        assert!(net.get_node(2).is_some());
        assert!(net.get_node(3).is_some());
        assert!(net.get_node(4).is_none());
        assert!(net.get_node(5).is_some());
        assert!(net.check_integrity().is_ok());
    }

    /// A three-gate AND chain: g4 = i1 & i2, g5 = g4 & i3, g6 = g5 & i4, output g6.
    fn and_chain() -> LogicNetwork {
        let mut net = LogicNetwork::new();
        for id in 1..=4 {
            net.add_node(NetNode::Input(id)).unwrap();
        }
        net.new_gate(
            5,
            vec![edge(&net, 1), edge(&net, 2)],
            TruthTable::conjunction(2),
        )
        .unwrap();
        net.new_gate(
            6,
            vec![edge(&net, 5), edge(&net, 3)],
            TruthTable::conjunction(2),
        )
        .unwrap();
        net.new_gate(
            7,
            vec![edge(&net, 6), edge(&net, 4)],
            TruthTable::conjunction(2),
        )
        .unwrap();
        net.add_output(7, false).unwrap();
        net.update();
        net
    }

    #[test]
    fn gate_order_test() {
        let net = and_chain();
        assert_eq!(net.num_gates(), 3);
        assert_eq!(net.gate_order().unwrap(), vec![5, 6, 7]);

        // foreach_gate agrees with gate_order
        let mut seen = Vec::new();
        net.foreach_gate(|id, index| seen.push((id, index)));
        assert_eq!(seen, vec![(5, 0), (6, 1), (7, 2)]);
    }

    #[test]
    fn topological_order_children_first() {
        let net = and_chain();
        let order = net.gate_order().unwrap();
        let position = |id: NodeId| order.iter().position(|&x| x == id).unwrap();
        net.foreach_gate(|id, _| {
            net.foreach_fanin(id, |(child, _)| {
                if !net.is_pi(child) && !net.is_constant(child) {
                    assert!(position(child) < position(id));
                }
            });
        });
    }

    #[test]
    fn fanout_size_test() {
        let net = and_chain();
        // Each chain gate feeds exactly one gate, the last one feeds the output.
        assert_eq!(net.fanout_size(5), 1);
        assert_eq!(net.fanout_size(6), 1);
        assert_eq!(net.fanout_size(7), 1); // single output reference

        // An output that is also read by a gate counts both references.
        let mut net = LogicNetwork::new();
        net.add_node(NetNode::Input(1)).unwrap();
        net.new_gate(2, vec![edge(&net, 1)], TruthTable::conjunction(1))
            .unwrap();
        net.new_gate(3, vec![edge(&net, 2)], TruthTable::conjunction(1))
            .unwrap();
        net.add_output(2, false).unwrap();
        net.add_output(3, false).unwrap();
        net.update();
        assert_eq!(net.fanout_size(2), 2);
        assert_eq!(net.fanout_size(3), 1);
    }

    #[test]
    fn signals_test() {
        let mut net = LogicNetwork::new();
        net.add_node(NetNode::Input(1)).unwrap();
        net.new_gate(
            2,
            vec![!edge(&net, 1)],
            TruthTable::conjunction(1),
        )
        .unwrap();
        net.add_output(2, true).unwrap();

        let mut fanins = Vec::new();
        net.foreach_fanin(2, |signal| fanins.push(signal));
        assert_eq!(fanins, vec![(1, true)]);

        let mut pos = Vec::new();
        net.foreach_po(|signal| pos.push(signal));
        assert_eq!(pos, vec![(2, true)]);
        assert_eq!(Network::get_node(&net, (2, true)), 2);

        assert!(net.is_pi(1));
        assert!(!net.is_pi(2));
        assert!(net.is_constant(0));
        assert!(!net.is_constant(1));
    }

    #[test]
    fn cycle_detection() {
        // Cycles cannot be built through the public API (fanins must exist
        // before their parents), so integrity checking is exercised on a DAG.
        let net = and_chain();
        assert!(net.check_integrity().is_ok());
        assert!(net.get_topological_sort().is_ok());
    }
}
