//! The growth engine: a graph plus the two-phase rewrite state machine.

use std::ops::Range;

use rand::{Rng, rngs::StdRng};
use tracing::warn;

use crate::{
    config::GrowthConfig,
    error::GrowthError,
    graph::Graph,
    phases,
    rule::Rule,
    types::NodeId,
};

/// Which half of a growth cycle the next [`GrowthEngine::grow`] runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Recompute states and division flags.
    Update,
    /// Split flagged nodes.
    Divide,
}

/// What one call to [`GrowthEngine::grow`] did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrowStep {
    /// The phase that just ran.
    pub phase: Phase,
    /// Nodes flagged for division (update) or divided (divide).
    pub dividing: usize,
    /// Ids of nodes appended by this call. Empty after an update phase.
    pub new_nodes: Range<NodeId>,
}

/// Owns the graph topology and applies the rewrite rule.
///
/// The random generator is only consulted for state mutation, so runs
/// with `flip_prob == 0` are fully deterministic.
#[derive(Debug)]
pub struct GrowthEngine<R: Rng = StdRng> {
    graph: Graph,
    cfg: GrowthConfig,
    phase: Phase,
    cases: Vec<u8>,
    dividing: Vec<bool>,
    rng: R,
}

impl<R: Rng> GrowthEngine<R> {
    /// Starts from the seed graph.
    pub fn new(cfg: GrowthConfig, rng: R) -> Self {
        Self {
            graph: Graph::seed(),
            cfg,
            phase: Phase::Update,
            cases: Vec::new(),
            dividing: Vec::new(),
            rng,
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn config(&self) -> &GrowthConfig {
        &self.cfg
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn rule(&self) -> Rule {
        self.cfg.rule
    }

    /// Takes effect from the next update phase.
    pub fn set_flip_prob(&mut self, p: f64) {
        self.cfg.flip_prob = p;
    }

    /// Discards all growth and returns to the seed graph.
    pub fn reset(&mut self) {
        self.graph = Graph::seed();
        self.phase = Phase::Update;
        self.cases.clear();
        self.dividing.clear();
    }

    /// Swaps in a new configuration and restarts from the seed graph.
    pub fn reset_with(&mut self, cfg: GrowthConfig) {
        self.cfg = cfg;
        self.reset();
    }

    /// Replaces the generator, e.g. to reseed after a reset.
    pub fn set_rng(&mut self, rng: R) {
        self.rng = rng;
    }

    /// Runs the next phase.
    ///
    /// A division phase that would exceed `capacity` is rejected whole: the
    /// graph and phase are left untouched so the caller can retry after
    /// raising the capacity.
    pub fn grow(&mut self) -> Result<GrowStep, GrowthError> {
        match self.phase {
            Phase::Update => {
                let flagged = phases::state_phase(
                    &mut self.graph,
                    self.cfg.rule,
                    self.cfg.flip_prob,
                    &mut self.cases,
                    &mut self.dividing,
                    &mut self.rng,
                );
                self.phase = Phase::Divide;
                let end = self.graph.len();
                Ok(GrowStep {
                    phase: Phase::Update,
                    dividing: flagged,
                    new_nodes: end..end,
                })
            }
            Phase::Divide => {
                let flagged = self.dividing.iter().filter(|&&d| d).count();
                let requested = self.graph.len() + 2 * flagged;
                if requested > self.cfg.capacity {
                    warn!(requested, capacity = self.cfg.capacity, "division rejected");
                    return Err(GrowthError::CapacityExceeded {
                        requested,
                        capacity: self.cfg.capacity,
                    });
                }

                let start = self.graph.len();
                self.graph.advance_generation();
                phases::division_phase(&mut self.graph, &mut self.dividing);
                self.phase = Phase::Update;
                Ok(GrowStep {
                    phase: Phase::Divide,
                    dividing: flagged,
                    new_nodes: start..self.graph.len(),
                })
            }
        }
    }

    /// Runs both phases of one generation.
    pub fn grow_cycle(&mut self) -> Result<Range<NodeId>, GrowthError> {
        if self.phase == Phase::Update {
            self.grow()?;
        }
        Ok(self.grow()?.new_nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn engine(rule: u32, flip_prob: f64, seed: u64) -> GrowthEngine {
        let cfg = GrowthConfig {
            rule: Rule(rule),
            flip_prob,
            ..GrowthConfig::default()
        };
        GrowthEngine::new(cfg, StdRng::seed_from_u64(seed))
    }

    #[test]
    fn quartatic_first_cycle_matches_golden_topology() {
        let mut e = engine(0x886, 0.0, 0);

        let step = e.grow().unwrap();
        assert_eq!(step.phase, Phase::Update);
        assert_eq!(step.dividing, 1);
        assert!(step.new_nodes.is_empty());
        assert_eq!(e.graph().generation(), 0);

        let step = e.grow().unwrap();
        assert_eq!(step.phase, Phase::Divide);
        assert_eq!(step.new_nodes, 10..12);

        let g = e.graph();
        let adjacency: Vec<[usize; 3]> = g.nodes.iter().map(|n| n.neighbors).collect();
        assert_eq!(
            adjacency,
            vec![
                [9, 1, 2],
                [0, 2, 4],
                [1, 3, 0],
                [2, 4, 11],
                [3, 5, 1],
                [4, 6, 8],
                [5, 10, 11],
                [10, 8, 9],
                [7, 9, 5],
                [8, 0, 7],
                [6, 7, 11],
                [6, 10, 3],
            ]
        );
        let states: Vec<u8> = g.nodes.iter().map(|n| n.state).collect();
        assert_eq!(states, vec![1, 0, 1, 0, 1, 0, 0, 0, 1, 0, 0, 0]);
        let gens: Vec<u32> = g.nodes.iter().map(|n| n.born).collect();
        assert_eq!(gens, vec![0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 1, 1]);
        assert_eq!(g.generation(), 1);

        // Second cycle divides node 1 only.
        assert_eq!(e.grow_cycle().unwrap(), 12..14);
    }

    #[test]
    fn trivalency_and_symmetry_hold_over_many_generations() {
        for &rule in &[0x886, 0x8bc, 0x21f2, 0x56cc] {
            let mut e = engine(rule, 1e-3, 3);
            for _ in 0..40 {
                if e.graph().len() > 4000 {
                    break;
                }
                e.grow_cycle().unwrap();
                assert!(e.graph().is_consistent(), "rule {rule:#x}");
            }
        }
    }

    #[test]
    fn generation_advances_once_per_cycle() {
        let mut e = engine(0x8bc, 0.0, 0);
        for expected in 1..=12 {
            e.grow_cycle().unwrap();
            assert_eq!(e.graph().generation(), expected);
        }
    }

    #[test]
    fn identical_seeds_reproduce_runs() {
        let mut a = engine(0x4621, 0.0, 11);
        let mut b = engine(0x4621, 0.0, 99);
        for _ in 0..15 {
            a.grow_cycle().unwrap();
            b.grow_cycle().unwrap();
        }
        assert_eq!(a.graph().nodes, b.graph().nodes);

        let mut c = engine(0x4621, 5e-2, 5);
        let mut d = engine(0x4621, 5e-2, 5);
        for _ in 0..15 {
            c.grow_cycle().unwrap();
            d.grow_cycle().unwrap();
        }
        assert_eq!(c.graph().nodes, d.graph().nodes);
    }

    #[test]
    fn capacity_rejects_division_without_mutation() {
        let cfg = GrowthConfig {
            rule: Rule(0x886),
            flip_prob: 0.0,
            capacity: 11,
        };
        let mut e = GrowthEngine::new(cfg, StdRng::seed_from_u64(0));
        e.grow().unwrap();
        let before = e.graph().nodes.clone();

        let err = e.grow().unwrap_err();
        assert_eq!(
            err,
            GrowthError::CapacityExceeded {
                requested: 12,
                capacity: 11
            }
        );
        assert_eq!(e.graph().nodes, before);
        assert_eq!(e.graph().generation(), 0);
        assert_eq!(e.phase(), Phase::Divide);
    }

    #[test]
    fn reset_returns_to_seed() {
        let mut e = engine(0x886, 0.0, 0);
        for _ in 0..5 {
            e.grow_cycle().unwrap();
        }
        e.reset();
        assert_eq!(e.graph().len(), 10);
        assert_eq!(e.graph().generation(), 0);
        assert_eq!(e.phase(), Phase::Update);
    }
}
