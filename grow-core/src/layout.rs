//! Incremental force-directed embedding of a growing graph.
//!
//! A tick first places any nodes the graph gained since the previous tick,
//! then runs a number of sub-steps. Each sub-step is:
//! 1. `link_iterations` rounds of [`relax_links`],
//! 2. one Barnes-Hut pass over a freshly built [`Octree`], scaled by the
//!    charge strength and added to velocities,
//! 3. integration: `pos += vel; vel *= 1 - decay`.

use glam::Vec3;
use rand::{Rng, rngs::StdRng};

use crate::{
    barnes_hut::{ManyBody, accumulate_forces},
    config::{Dim, LayoutConfig},
    error::ConfigError,
    force_buffer::ForceBuffer,
    graph::Graph,
    link::relax_links,
    octree::Octree,
    types::{Link, NodeId},
};

/// Point positions and velocities, index-aligned with graph nodes.
#[derive(Debug)]
pub struct Layout<R: Rng = StdRng> {
    cfg: LayoutConfig,
    pos: Vec<Vec3>,
    vel: Vec<Vec3>,
    forces: ForceBuffer,
    links: Vec<Link>,
    center: Vec3,
    extent: f32,
    rng: R,
}

impl<R: Rng> Layout<R> {
    pub fn new(cfg: LayoutConfig, rng: R) -> Self {
        Self {
            cfg,
            pos: Vec::new(),
            vel: Vec::new(),
            forces: ForceBuffer::default(),
            links: Vec::new(),
            center: Vec3::ZERO,
            extent: 0.0,
            rng,
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.cfg
    }

    /// Replaces the parameters. Positions are only touched when the new
    /// dimensionality is 2-D, which flattens them like [`Layout::set_dim`].
    pub fn set_config(&mut self, cfg: LayoutConfig) -> Result<(), ConfigError> {
        cfg.validate()?;
        self.cfg = cfg;
        if !cfg.dim.is_3d() {
            self.flatten();
        }
        Ok(())
    }

    /// Switches dimensionality. Going to 2-D flattens the embedding onto z = 0.
    pub fn set_dim(&mut self, dim: Dim) {
        self.cfg.dim = dim;
        if !dim.is_3d() {
            self.flatten();
        }
    }

    fn flatten(&mut self) {
        for (p, v) in self.pos.iter_mut().zip(&mut self.vel) {
            p.z = 0.0;
            v.z = 0.0;
        }
    }

    /// Number of placed points.
    pub fn len(&self) -> usize {
        self.pos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pos.is_empty()
    }

    /// Positions indexed by node id.
    pub fn positions(&self) -> &[Vec3] {
        &self.pos
    }

    pub fn velocities(&self) -> &[Vec3] {
        &self.vel
    }

    pub fn position(&self, id: NodeId) -> Vec3 {
        self.pos[id]
    }

    /// Center of the bounding cube from the last force pass.
    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Side of the bounding cube from the last force pass.
    pub fn extent(&self) -> f32 {
        self.extent
    }

    /// Drops every point, e.g. after the graph was reset.
    pub fn clear(&mut self) {
        self.pos.clear();
        self.vel.clear();
        self.forces.clear();
        self.links.clear();
        self.center = Vec3::ZERO;
        self.extent = 0.0;
    }

    fn jitter(&mut self) -> Vec3 {
        let r = self.cfg.seed_radius.abs();
        let mut j = Vec3::new(
            self.rng.random_range(-r..=r),
            self.rng.random_range(-r..=r),
            0.0,
        );
        if self.cfg.dim.is_3d() {
            j.z = self.rng.random_range(-r..=r);
        }
        j
    }

    /// Places every graph node that has no point yet.
    ///
    /// A new point sits at the mean of its already-placed neighbors plus a
    /// small jitter, or inside the jitter box when no neighbor is placed.
    /// Neighbors created in the same batch are ignored.
    pub fn seed_new_points(&mut self, graph: &Graph) {
        let placed = self.pos.len();
        for id in placed..graph.len() {
            let mut p = self.jitter();
            let mut n = 0;
            for &j in &graph.nodes[id].neighbors {
                if j < placed {
                    p += self.pos[j];
                    n += 1;
                }
            }
            if n > 1 {
                p /= n as f32;
            }
            self.pos.push(p);
            self.vel.push(Vec3::ZERO);
        }
    }

    /// Seeds new points, then runs `step_n` sub-steps.
    pub fn tick(&mut self, graph: &Graph, step_n: usize) {
        self.seed_new_points(graph);
        graph.links_into(&mut self.links);
        for _ in 0..step_n {
            self.step();
        }
    }

    fn step(&mut self) {
        let cfg = self.cfg;
        for _ in 0..cfg.link_iterations {
            relax_links(
                &self.links,
                &self.pos,
                &mut self.vel,
                cfg.link_distance,
                cfg.link_strength,
            );
        }

        self.charge();
        self.integrate();
    }

    fn charge(&mut self) {
        let tree = Octree::build(&self.pos, self.cfg.leaf_size, self.cfg.max_level);
        self.center = tree.center();
        self.extent = tree.extent();

        let params = ManyBody::new(self.cfg.theta, self.cfg.charge_cutoff);
        accumulate_forces(&tree, params, &mut self.forces);
        self.forces.apply_to(&mut self.vel, self.cfg.charge_strength);
    }

    fn integrate(&mut self) {
        let keep = 1.0 - self.cfg.velocity_decay;
        let flat = !self.cfg.dim.is_3d();
        for (p, v) in self.pos.iter_mut().zip(&mut self.vel) {
            if flat {
                v.z = 0.0;
            }
            *p += *v;
            *v *= keep;
        }
    }
}
