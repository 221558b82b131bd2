//! Linearized octree over Morton-sorted points.
//!
//! Nodes are stored in pre-order. Each node covers the contiguous range
//! `[start, end)` of sorted points and records `next`, the index of the
//! first node after its subtree. A traversal can therefore skip a subtree
//! by jumping to `next`, or descend by moving to `index + 1`, without a
//! stack. A node is a leaf iff `next == index + 1`.

use glam::Vec3;
use tracing::trace;

use crate::morton::{MORTON_BITS, MortonOrder};

pub const DEFAULT_LEAF_SIZE: usize = 16;
pub const DEFAULT_MAX_LEVEL: u32 = 10;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OctreeNode {
    pub level: u32,
    pub start: usize,
    pub end: usize,
    /// Lower corner of the cell.
    pub pos: Vec3,
    /// `None` for the root.
    pub parent: Option<usize>,
    pub next: usize,
    /// Centroid of the contained points.
    pub center: Vec3,
    /// Number of contained points.
    pub mass: f32,
    /// Cell side: tree extent / 2^level.
    pub width: f32,
}

impl OctreeNode {
    #[inline]
    pub fn is_leaf(&self, own_index: usize) -> bool {
        self.next == own_index + 1
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// An octree rebuilt from scratch for one force evaluation.
#[derive(Clone, Debug)]
pub struct Octree {
    pub nodes: Vec<OctreeNode>,
    pub order: MortonOrder,
    leaf_size: usize,
    max_level: u32,
}

impl Octree {
    /// Sorts `points`, partitions them and computes node aggregates.
    ///
    /// An empty point set produces a tree with no nodes. `max_level` is
    /// clamped to the Morton code depth.
    pub fn build(points: &[Vec3], leaf_size: usize, max_level: u32) -> Self {
        let order = MortonOrder::build(points);
        let mut tree = Self {
            nodes: Vec::with_capacity(points.len() / leaf_size.max(1) * 2 + 1),
            order,
            leaf_size: leaf_size.max(1),
            max_level: max_level.min(MORTON_BITS),
        };

        if !tree.order.is_empty() {
            let root_pos = tree.order.lo;
            tree.build_node(0, 0, tree.order.len(), root_pos, None);
            tree.accumulate();
        }

        trace!(
            points = tree.order.len(),
            nodes = tree.nodes.len(),
            extent = tree.order.extent,
            "octree built"
        );
        tree
    }

    /// Appends the node for `[start, end)` and, unless it is a leaf, its
    /// children. Returns the node's index.
    fn build_node(
        &mut self,
        level: u32,
        start: usize,
        end: usize,
        pos: Vec3,
        parent: Option<usize>,
    ) -> usize {
        let own = self.nodes.len();
        self.nodes.push(OctreeNode {
            level,
            start,
            end,
            pos,
            parent,
            next: own + 1,
            center: Vec3::ZERO,
            mass: 0.0,
            width: 0.0,
        });

        if end - start <= self.leaf_size || level >= self.max_level {
            return own;
        }

        // Codes are globally sorted, so counting octant digits is enough
        // to split the range.
        let shift = 3 * (MORTON_BITS - level - 1);
        let mut count = [0usize; 8];
        for &code in &self.order.codes[start..end] {
            count[((code >> shift) & 0x7) as usize] += 1;
        }

        let half = self.order.extent / (1u32 << (level + 1)) as f32;
        let mut child_start = start;
        for (octant, &n) in count.iter().enumerate() {
            if n > 0 {
                let offset = Vec3::new(
                    (octant & 1) as f32,
                    ((octant >> 1) & 1) as f32,
                    ((octant >> 2) & 1) as f32,
                ) * half;
                self.build_node(level + 1, child_start, child_start + n, pos + offset, Some(own));
            }
            child_start += n;
        }

        self.nodes[own].next = self.nodes.len();
        own
    }

    /// Fills `center`, `mass` and `width` bottom-up.
    fn accumulate(&mut self) {
        let mut sums = vec![Vec3::ZERO; self.nodes.len()];
        let mut counts = vec![0usize; self.nodes.len()];

        // Children always follow their parent in pre-order.
        for i in (0..self.nodes.len()).rev() {
            let node = self.nodes[i];
            if node.is_leaf(i) {
                sums[i] = self.order.points[node.start..node.end].iter().copied().sum();
                counts[i] = node.len();
            }
            if let Some(p) = node.parent {
                let (s, n) = (sums[i], counts[i]);
                sums[p] += s;
                counts[p] += n;
            }
        }

        let extent = self.order.extent;
        for (i, node) in self.nodes.iter_mut().enumerate() {
            node.mass = counts[i] as f32;
            node.center = sums[i] / counts[i].max(1) as f32;
            node.width = extent / (1u32 << node.level) as f32;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Side of the root cell.
    pub fn extent(&self) -> f32 {
        self.order.extent
    }

    /// Center of the root cell.
    pub fn center(&self) -> Vec3 {
        self.order.lo + Vec3::splat(self.order.extent * 0.5)
    }

    /// Points in sorted order.
    pub fn points(&self) -> &[Vec3] {
        &self.order.points
    }

    /// Original index of each sorted point.
    pub fn indices(&self) -> &[u32] {
        &self.order.indices
    }
}
