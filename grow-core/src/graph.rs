use serde::Serialize;

use crate::types::{Link, Neighbors, NodeId};

/// Neighbor triples of the 10-node seed graph.
pub const SEED_NEIGHBORS: [Neighbors; 10] = [
    [9, 1, 2],
    [0, 2, 4],
    [1, 3, 0],
    [2, 4, 6],
    [3, 5, 1],
    [4, 6, 8],
    [5, 7, 3],
    [6, 8, 9],
    [7, 9, 5],
    [8, 0, 7],
];

/// Initial states of the seed graph.
pub const SEED_STATES: [u8; 10] = [0, 0, 0, 1, 0, 1, 0, 1, 1, 1];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    pub neighbors: Neighbors,
    pub state: u8,
    /// Generation in which the node was created or last divided.
    pub born: u32,
}

/// A trivalent graph stored as an arena of neighbor triples.
///
/// Every node always has exactly three neighbor slots. Edges are
/// symmetric: if `b` lists `a` once, `a` lists `b` once.
#[derive(Clone, Debug, Serialize)]
pub struct Graph {
    pub nodes: Vec<GraphNode>,
    generation: u32,
}

impl Graph {
    /// The fixed seed graph at generation 0.
    pub fn seed() -> Self {
        let nodes = SEED_NEIGHBORS
            .iter()
            .zip(SEED_STATES)
            .map(|(&neighbors, state)| GraphNode {
                neighbors,
                state,
                born: 0,
            })
            .collect();

        Self {
            nodes,
            generation: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of completed growth cycles.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub(crate) fn advance_generation(&mut self) {
        self.generation += 1;
    }

    /// Generations elapsed since `id` was last touched by a division.
    pub fn age(&self, id: NodeId) -> u32 {
        self.generation - self.nodes[id].born
    }

    /// The lookup case of a node: neighbor state sum plus `4 * own state`.
    pub fn case_of(&self, id: NodeId) -> usize {
        let node = &self.nodes[id];
        let around: usize = node
            .neighbors
            .iter()
            .map(|&j| self.nodes[j].state as usize)
            .sum();
        around + node.state as usize * 4
    }

    /// Replaces the first occurrence of `old_peer` in `source`'s neighbor
    /// slots with `new_peer`.
    pub fn reconnect(&mut self, source: NodeId, old_peer: NodeId, new_peer: NodeId) {
        let slots = &mut self.nodes[source].neighbors;
        if let Some(slot) = slots.iter_mut().find(|s| **s == old_peer) {
            *slot = new_peer;
        } else {
            debug_assert!(false, "node {source} has no edge to {old_peer}");
        }
    }

    /// Splits node `id` into a triangle of three nodes.
    ///
    /// `id -> (a, b, c)` becomes `id -> (a, j, k)`, `j -> (id, b, k)` and
    /// `k -> (id, j, c)`, with `b` and `c` rewired to `j` and `k`. The new
    /// nodes copy `id`'s state and all three are stamped with the current
    /// generation. Returns `(j, k)`.
    pub fn divide(&mut self, id: NodeId) -> (NodeId, NodeId) {
        let [a, b, c] = self.nodes[id].neighbors;
        let j = self.nodes.len();
        let k = j + 1;
        let state = self.nodes[id].state;
        let born = self.generation;

        self.nodes[id].neighbors = [a, j, k];
        self.nodes[id].born = born;
        self.nodes.push(GraphNode {
            neighbors: [id, b, k],
            state,
            born,
        });
        self.nodes.push(GraphNode {
            neighbors: [id, j, c],
            state,
            born,
        });

        self.reconnect(b, id, j);
        self.reconnect(c, id, k);
        (j, k)
    }

    /// Undirected edge list, one entry per neighbor slot with `i < j`.
    pub fn links(&self) -> Vec<Link> {
        let mut links = Vec::with_capacity(self.nodes.len() * 3 / 2);
        self.links_into(&mut links);
        links
    }

    /// Like [`Graph::links`] but reuses `out`.
    pub fn links_into(&self, out: &mut Vec<Link>) {
        out.clear();
        for (i, node) in self.nodes.iter().enumerate() {
            for &j in &node.neighbors {
                if i < j {
                    out.push((i, j));
                }
            }
        }
    }

    /// Checks that every edge is mirrored with the same multiplicity.
    pub fn is_consistent(&self) -> bool {
        self.nodes.iter().enumerate().all(|(i, node)| {
            node.neighbors.iter().all(|&j| {
                j < self.nodes.len() && {
                    let forward = node.neighbors.iter().filter(|&&x| x == j).count();
                    let back = self.nodes[j].neighbors.iter().filter(|&&x| x == i).count();
                    forward == back
                }
            })
        })
    }
}
