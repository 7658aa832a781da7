//! Define [`NetEdge`], one fanin connection of a gate.

use std::ops::Not;

use super::{NetNodeRef, NodeId};

/// One fanin of a gate (or one primary output of the network).
///
/// An edge names the node whose value flows in, and whether that value is
/// inverted on the way. Gate fanins are ordered: the edge at position `k` of
/// a gate's fanin list feeds variable `k` of the gate's truth table, so the
/// inversion is *not* folded into the function.
///
/// ```rust
/// use qpebble::network::{LogicNetwork, NetEdge, NetNode};
///
/// let mut net = LogicNetwork::new();
/// let ground = net.add_node(NetNode::Constant).unwrap();
/// let plain = NetEdge::new(ground.clone(), false);
/// let inverted = NetEdge::new(ground, true);
/// assert_ne!(plain, inverted);
/// assert_eq!(plain, !inverted);
/// ```
#[derive(Clone, Debug, Eq)]
pub struct NetEdge {
    /// Shared handle on the feeding node; many gates (and the output list)
    /// may point at the same node.
    pub(super) node: NetNodeRef,
    /// Invert the value on this connection.
    pub(super) complement: bool,
}

impl NetEdge {
    pub fn new(node: NetNodeRef, complement: bool) -> Self {
        NetEdge { node, complement }
    }

    pub fn get_node(&self) -> NetNodeRef {
        self.node.clone()
    }

    /// Id of the feeding node, without handing out the handle.
    pub fn get_node_id(&self) -> NodeId {
        self.node.borrow().get_id()
    }

    pub fn get_complement(&self) -> bool {
        self.complement
    }
}

/// Negating an edge toggles the inversion and nothing else.
impl Not for NetEdge {
    type Output = Self;

    fn not(mut self) -> Self::Output {
        self.complement = !self.complement;
        self
    }
}

/// Edge identity is the feeding node's id plus the inversion; which handle
/// points at the node does not matter, so edges of two structurally equal
/// networks compare equal.
impl PartialEq for NetEdge {
    fn eq(&self, other: &Self) -> bool {
        self.complement == other.complement
            && self.node.borrow().get_id() == other.node.borrow().get_id()
    }
}
