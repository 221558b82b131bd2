/// Identifier for a node in a [`crate::graph::Graph`].
///
/// This is an index into `Graph::nodes` and into the layout's point
/// buffers. Identifiers are never reused: a graph only ever appends.
pub type NodeId = usize;

/// The three neighbor slots every graph node carries.
pub type Neighbors = [NodeId; 3];

/// An undirected edge as `(low, high)` node ids.
pub type Link = (NodeId, NodeId);
