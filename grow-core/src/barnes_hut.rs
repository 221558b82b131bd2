//! Barnes-Hut approximation of all-pairs repulsion over an [`Octree`].
//!
//! Each point walks the flat node array with a single cursor. A node whose
//! cell is small relative to its distance (`width² < θ² · l2`) is taken as
//! one body at its centroid and its subtree is skipped via `next`. Other
//! internal nodes are entered at `index + 1`; other leaves are summed point
//! by point. Any interaction farther than the cutoff contributes nothing.
//!
//! The interaction law is `mass / (1 + l2) * d`, with `d` the vector from
//! the point to the source. Callers scale the result by a signed strength.

use glam::Vec3;

use crate::{force_buffer::ForceBuffer, octree::Octree};

/// Accuracy and range of one force pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ManyBody {
    /// Squared opening ratio.
    pub theta2: f32,
    /// Squared cutoff distance.
    pub cutoff2: f32,
}

impl ManyBody {
    pub fn new(theta: f32, cutoff: f32) -> Self {
        Self {
            theta2: theta * theta,
            cutoff2: cutoff * cutoff,
        }
    }
}

impl Default for ManyBody {
    fn default() -> Self {
        Self::new(0.9, 2000.0)
    }
}

/// Softened attraction of `mass` at `source` on a point at `p`.
#[inline]
pub fn pair_force(p: Vec3, source: Vec3, mass: f32) -> Vec3 {
    let d = source - p;
    d * (mass / (1.0 + d.length_squared()))
}

/// Unscaled force on a point at `p` from every point in `tree`.
pub fn force_at(tree: &Octree, p: Vec3, params: ManyBody) -> Vec3 {
    let nodes = &tree.nodes;
    let points = tree.points();
    let mut f = Vec3::ZERO;

    let mut i = 0;
    while i < nodes.len() {
        let node = &nodes[i];
        let l2 = node.center.distance_squared(p);

        if node.width * node.width < params.theta2 * l2 {
            if l2 < params.cutoff2 {
                f += pair_force(p, node.center, node.mass);
            }
            i = node.next;
        } else if node.is_leaf(i) {
            for &q in &points[node.start..node.end] {
                if q.distance_squared(p) < params.cutoff2 {
                    f += pair_force(p, q, 1.0);
                }
            }
            i = node.next;
        } else {
            i += 1;
        }
    }
    f
}

/// Fills `out` with the force on every point, indexed by original point id.
pub fn accumulate_forces(tree: &Octree, params: ManyBody, out: &mut ForceBuffer) {
    out.ensure_len(tree.points().len());
    if tree.is_empty() {
        return;
    }

    #[cfg(feature = "parallel")]
    let forces: Vec<Vec3> = {
        use rayon::prelude::*;
        tree.points()
            .par_iter()
            .map(|&p| force_at(tree, p, params))
            .collect()
    };

    #[cfg(not(feature = "parallel"))]
    let forces: Vec<Vec3> = tree
        .points()
        .iter()
        .map(|&p| force_at(tree, p, params))
        .collect();

    for (&id, f) in tree.indices().iter().zip(forces) {
        out.add(id as usize, f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    fn brute_force(points: &[Vec3], cutoff: f32) -> Vec<Vec3> {
        points
            .iter()
            .map(|&p| {
                points
                    .iter()
                    .filter(|q| q.distance_squared(p) < cutoff * cutoff)
                    .map(|&q| pair_force(p, q, 1.0))
                    .sum::<Vec3>()
            })
            .collect()
    }

    fn cloud(n: usize, seed: u64) -> Vec<Vec3> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| {
                Vec3::new(
                    rng.random_range(-200.0..200.0),
                    rng.random_range(-200.0..200.0),
                    rng.random_range(-200.0..200.0),
                )
            })
            .collect()
    }

    #[test]
    fn two_points_match_direct_law() {
        let pts = [Vec3::new(0.0, 0.0, 0.0), Vec3::new(3.0, 4.0, 0.0)];
        let tree = Octree::build(&pts, 16, 10);
        let mut out = ForceBuffer::default();
        accumulate_forces(&tree, ManyBody::default(), &mut out);

        let expected = Vec3::new(3.0, 4.0, 0.0) / 26.0;
        assert!((out.get(0) - expected).length() < 1e-6);
        assert!((out.get(1) + expected).length() < 1e-6);
    }

    #[test]
    fn pair_beyond_cutoff_contributes_nothing() {
        let pts = [Vec3::ZERO, Vec3::new(100.0, 0.0, 0.0)];
        let tree = Octree::build(&pts, 16, 10);
        let mut out = ForceBuffer::default();
        accumulate_forces(&tree, ManyBody::new(0.9, 50.0), &mut out);
        assert_eq!(out.get(0), Vec3::ZERO);
        assert_eq!(out.get(1), Vec3::ZERO);
    }

    #[test]
    fn accepted_cluster_beyond_cutoff_is_dropped() {
        // A tight far cluster is accepted as one body but lies outside the cutoff.
        let mut pts: Vec<Vec3> = (0..40)
            .map(|i| Vec3::new(1000.0 + (i % 5) as f32 * 0.1, (i / 5) as f32 * 0.1, 0.0))
            .collect();
        pts.push(Vec3::ZERO);
        let probe = pts.len() - 1;

        let tree = Octree::build(&pts, 4, 10);
        let mut out = ForceBuffer::default();
        accumulate_forces(&tree, ManyBody::new(0.9, 500.0), &mut out);
        assert_eq!(out.get(probe), Vec3::ZERO);

        accumulate_forces(&tree, ManyBody::new(0.9, 5000.0), &mut out);
        assert!(out.get(probe).x > 0.0);
    }

    #[test]
    fn zero_theta_is_exact() {
        let pts = cloud(300, 9);
        let tree = Octree::build(&pts, 8, 10);
        let mut out = ForceBuffer::default();
        accumulate_forces(&tree, ManyBody::new(0.0, 150.0), &mut out);

        for (got, want) in out.as_slice().iter().zip(brute_force(&pts, 150.0)) {
            assert!((*got - want).length() < 1e-4 * (1.0 + want.length()));
        }
    }

    #[test]
    fn default_theta_is_close_to_brute_force() {
        let pts = cloud(1500, 10);
        let tree = Octree::build(&pts, 16, 10);
        let mut out = ForceBuffer::default();
        accumulate_forces(&tree, ManyBody::default(), &mut out);

        let exact = brute_force(&pts, 2000.0);
        let err: f32 = out
            .as_slice()
            .iter()
            .zip(&exact)
            .map(|(a, b)| (*a - *b).length())
            .sum();
        let scale: f32 = exact.iter().map(|f| f.length()).sum();
        assert!(err / scale < 0.25, "relative error {}", err / scale);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn parallel_pass_matches_per_point_traversal() {
        let pts = cloud(2000, 12);
        let tree = Octree::build(&pts, 16, 10);
        let params = ManyBody::default();
        let mut out = ForceBuffer::default();
        accumulate_forces(&tree, params, &mut out);

        for (k, &id) in tree.indices().iter().enumerate() {
            let expected = force_at(&tree, tree.points()[k], params);
            assert_eq!(out.get(id as usize), expected, "point {id}");
        }
    }

    #[test]
    fn empty_tree_yields_empty_buffer() {
        let tree = Octree::build(&[], 16, 10);
        let mut out = ForceBuffer::with_len(4);
        accumulate_forces(&tree, ManyBody::default(), &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn coincident_points_feel_no_force() {
        let pts = vec![Vec3::splat(2.0); 20];
        let tree = Octree::build(&pts, 16, 10);
        let mut out = ForceBuffer::default();
        accumulate_forces(&tree, ManyBody::default(), &mut out);
        assert!(out.as_slice().iter().all(|f| f.length() < 1e-6));
    }
}
