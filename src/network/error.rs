use thiserror::Error;

use super::NodeId;

/// The result of a network operation.
pub type Result<T> = std::result::Result<T, NetworkError>;

/// Error returned when a network operation failed.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// A different node with the given id already exists.
    #[error("a different node with id={0} already exists")]
    DuplicateId(NodeId),

    /// The id 0 is reserved for the constant node only.
    #[error("id=0 is for the constant node only")]
    IdZeroButNotConstant,

    /// The node with given id does not exist.
    #[error("node with id={0} does not exist")]
    NodeDoesNotExist(NodeId),

    /// A gate function does not range over as many variables as the gate has fanins.
    #[error("gate {id} has {fanins} fanins but its function ranges over {vars} variables")]
    ArityMismatch { id: NodeId, fanins: usize, vars: usize },

    /// A gate must have at least one fanin.
    #[error("gate {0} has no fanin")]
    NoFanin(NodeId),

    /// The network has reached an invalid state. This should never happen.
    /// For example, when tracking the nodes internally with the hashmap nodes,
    /// node `nodes[id]` should have id `id`. If this error is raised, my code is garbage.
    #[error("the network has reached an invalid state - this should not happen - error: {0}")]
    InvalidState(String),
}
