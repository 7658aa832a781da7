//! Define [`NetNode`] and its commonly used alias [`NetNodeRef`].
//!
//! In a [`LogicNetwork`], nodes are wrapped by [`Rc<RefCell<NetNode>>`], so in
//! practice you often deal with [`NetNodeRef`] (alias for the previous type)
//! instead. For internal use, you can also use `NetNodeWeak` sometimes.
//!
//! [`LogicNetwork`]: super::LogicNetwork

use std::{
    cell::RefCell,
    collections::HashMap,
    rc::{Rc, Weak},
};

use crate::function::TruthTable;

use super::NetEdge;

/// A node id.
///
/// The constant node [`NetNode::Constant`] has id 0 by convention. Also, id must be unique.
pub type NodeId = u64;

/// A node of a logic network.
///
/// Each node has an id. By convention, id for the constant node is 0. The id must be unique.
///
/// Internal note: gates carry their fanouts with them. Make sure to update this correctly.
#[derive(Debug, Clone)]
pub enum NetNode {
    /// The constant low/false signal.
    Constant,
    /// A primary input.
    Input(NodeId),
    /// A gate with an ordered fanin list and its Boolean function over those
    /// fanins (fanin 0 is variable 0 of the truth table, and so on).
    Gate {
        id: NodeId,
        fanins: Vec<NetEdge>,
        function: TruthTable,
        fanouts: HashMap<NodeId, NetNodeWeak>,
    },
}

/// A wrapper for network nodes to allow multiple references to it.
pub type NetNodeRef = Rc<RefCell<NetNode>>;

/// A non-counting reference to a network node - used internally.
pub(crate) type NetNodeWeak = Weak<RefCell<NetNode>>;

impl PartialEq for NetNode {
    /// Equalities for [`NetNode::Constant`] and [`NetNode::Input`] are straightforward.
    /// For [`NetNode::Gate`]:
    /// - fanins are ordered (they are the variables of the function), so the
    ///   order is relevant, contrary to what an AIG would do
    /// - [`NetNode::Gate::fanouts`] is not taken into account.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (NetNode::Constant, NetNode::Constant) => true,
            (NetNode::Input(id1), NetNode::Input(id2)) => id1 == id2,
            (
                NetNode::Gate {
                    id: id1,
                    fanins: fanins1,
                    function: function1,
                    ..
                },
                NetNode::Gate {
                    id: id2,
                    fanins: fanins2,
                    function: function2,
                    ..
                },
            ) => id1 == id2 && fanins1 == fanins2 && function1 == function2,
            (_, _) => false,
        }
    }
}

impl Eq for NetNode {}

impl NetNode {
    /// Returns a new gate (initialize empty fanouts).
    pub fn gate(id: NodeId, fanins: Vec<NetEdge>, function: TruthTable) -> Self {
        if id == 0 {
            panic!(
                "Hey, you are trying to create a gate with id=0. \
                Id=0 is reserved for the constant node NetNode::Constant."
            )
        }
        NetNode::Gate {
            id,
            fanins,
            function,
            fanouts: HashMap::new(),
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, NetNode::Constant)
    }

    pub fn is_input(&self) -> bool {
        matches!(self, NetNode::Input(_))
    }

    pub fn is_gate(&self) -> bool {
        matches!(self, NetNode::Gate { .. })
    }

    pub fn get_id(&self) -> NodeId {
        match *self {
            NetNode::Constant => 0,
            NetNode::Input(id) => id,
            NetNode::Gate { id, .. } => id,
        }
    }

    pub fn get_fanins(&self) -> Vec<NetEdge> {
        match self {
            NetNode::Gate { fanins, .. } => fanins.clone(),
            _ => vec![],
        }
    }

    /// Returns the gate function if the node is a gate, else returns [`None`].
    pub fn get_function(&self) -> Option<TruthTable> {
        match self {
            NetNode::Gate { function, .. } => Some(function.clone()),
            _ => None,
        }
    }

    /// Number of gates using this node as a fanin (output references not included).
    pub(super) fn gate_fanout_count(&self) -> usize {
        match self {
            NetNode::Gate { fanouts, .. } => {
                fanouts.values().filter(|weak| weak.upgrade().is_some()).count()
            }
            _ => 0,
        }
    }

    /// The core problem is that in practice, the `fanout` is mutably owned by
    /// the caller. Taking an `NetNodeRef` as an argument and computing the
    /// `NodeId` by borrowing doesn't work: we are not allowed to borrow! So we
    /// need to supply the id of the fanout to store and be able to identify
    /// the fanout, without borrowing the `NetNodeRef`.
    pub(super) fn add_fanout(&mut self, fanout_id: NodeId, fanout: NetNodeWeak) {
        match self {
            NetNode::Gate { fanouts, .. } => {
                fanouts.insert(fanout_id, fanout);
            }
            _ => (),
        }
    }
}
