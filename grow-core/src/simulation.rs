//! Per-frame driver gluing growth, layout and the autopilot together.

use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::{debug, info, warn};

use crate::{
    autopilot::{Autopilot, Verdict},
    config::{DriverConfig, GrowthConfig, SimConfig},
    error::ConfigError,
    growth::{GrowStep, GrowthEngine},
    layout::Layout,
    rule::{self, RulePick},
};

/// Outcome of one [`Simulation::frame`].
#[derive(Clone, Debug, PartialEq)]
pub struct FrameReport {
    /// The growth step, if growth ran this frame.
    pub grow: Option<GrowStep>,
    /// Set when the autopilot switched to a new rule.
    pub new_rule: Option<RulePick>,
}

/// One growing graph and its embedding.
///
/// All randomness derives from one master generator seeded at
/// construction, so a seed fully determines a run.
#[derive(Debug)]
pub struct Simulation {
    pub engine: GrowthEngine,
    pub layout: Layout,
    pub autopilot: Autopilot,
    cfg: SimConfig,
    master: StdRng,
}

impl Simulation {
    pub fn new(cfg: SimConfig, seed: u64) -> Result<Self, ConfigError> {
        cfg.validate()?;
        let mut master = StdRng::seed_from_u64(seed);
        let engine = GrowthEngine::new(cfg.growth, child_rng(&mut master));
        let layout = Layout::new(cfg.layout, child_rng(&mut master));
        Ok(Self {
            engine,
            layout,
            autopilot: Autopilot::new(),
            cfg,
            master,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.cfg
    }

    /// Driver parameters take effect on the next frame. Growth and layout
    /// parameters go through [`Simulation::set_flip_prob`],
    /// [`Simulation::reset_with_growth`] and [`Layout::set_config`].
    pub fn driver_mut(&mut self) -> &mut DriverConfig {
        &mut self.cfg.driver
    }

    /// Changes the mutation probability without restarting.
    pub fn set_flip_prob(&mut self, p: f64) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&p) {
            return Err(ConfigError::InvalidProbability(p));
        }
        self.engine.set_flip_prob(p);
        self.cfg.growth.flip_prob = p;
        Ok(())
    }

    /// Restarts from the seed graph with fresh generators, keeping config.
    pub fn reset(&mut self) {
        self.cfg.growth.flip_prob = self.engine.config().flip_prob;
        self.cfg.layout = *self.layout.config();
        self.engine.reset_with(self.cfg.growth);
        self.engine.set_rng(child_rng(&mut self.master));
        self.layout = Layout::new(self.cfg.layout, child_rng(&mut self.master));
        self.autopilot.restart();
    }

    /// Restarts with a different rule and mutation probability.
    pub fn reset_with_growth(&mut self, growth: GrowthConfig) -> Result<(), ConfigError> {
        growth.validate()?;
        self.cfg.growth = growth;
        self.engine.set_flip_prob(growth.flip_prob);
        self.reset();
        Ok(())
    }

    /// Picks a rule with [`rule::pick_random`] and restarts.
    pub fn next_random_rule(&mut self) -> RulePick {
        let pick = rule::pick_random(&mut self.master);
        self.cfg.growth.rule = pick.rule;
        self.cfg.growth.flip_prob = pick.flip_prob;
        self.engine.set_flip_prob(pick.flip_prob);
        self.reset();
        info!(rule = %pick.rule, flip_prob = pick.flip_prob, preset = ?pick.preset, "new rule");
        pick
    }

    /// Grows if below the limit, lets the autopilot judge the frame when
    /// enabled, then ticks the layout.
    pub fn frame(&mut self) -> FrameReport {
        let growing = self.engine.graph().len() <= self.cfg.driver.growth_limit;
        let mut grow = None;
        if growing {
            match self.engine.grow() {
                Ok(step) => grow = Some(step),
                Err(e) => warn!(error = %e, "growth halted"),
            }
        }

        let mut new_rule = None;
        if self.cfg.driver.autonomous {
            let graph = self.engine.graph();
            let verdict = self.autopilot.observe(
                growing,
                graph.len(),
                graph.generation(),
                self.engine.config().flip_prob,
            );
            match verdict {
                Verdict::Continue => {}
                Verdict::Escalate(p) => {
                    self.engine.set_flip_prob(p);
                    self.cfg.growth.flip_prob = p;
                }
                Verdict::NextRule => new_rule = Some(self.next_random_rule()),
            }
        }

        self.layout.tick(self.engine.graph(), self.cfg.driver.tick_steps);
        debug!(
            nodes = self.engine.graph().len(),
            generation = self.engine.graph().generation(),
            extent = self.layout.extent(),
            "frame"
        );
        FrameReport { grow, new_rule }
    }
}

fn child_rng(master: &mut StdRng) -> StdRng {
    StdRng::seed_from_u64(master.random())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Rule;

    fn sim(autonomous: bool, growth_limit: usize) -> Simulation {
        let cfg = SimConfig {
            driver: DriverConfig {
                tick_steps: 1,
                growth_limit,
                autonomous,
            },
            ..SimConfig::default()
        };
        Simulation::new(cfg, 5).unwrap()
    }

    #[test]
    fn frames_keep_graph_and_layout_aligned() {
        let mut s = sim(false, 10_000);
        for _ in 0..40 {
            s.frame();
            assert_eq!(s.layout.len(), s.engine.graph().len());
        }
        assert_eq!(s.engine.graph().generation(), 20);
    }

    #[test]
    fn growth_stops_past_limit() {
        let mut s = sim(false, 11);
        for _ in 0..20 {
            s.frame();
        }
        // One division takes the seed graph to 12 nodes, past the limit.
        assert_eq!(s.engine.graph().len(), 12);
        let report = s.frame();
        assert!(report.grow.is_none());
    }

    #[test]
    fn reset_restores_seed_and_keeps_rule() {
        let mut s = sim(false, 10_000);
        s.reset_with_growth(GrowthConfig {
            rule: Rule(0x8bc),
            ..GrowthConfig::default()
        })
        .unwrap();
        for _ in 0..10 {
            s.frame();
        }
        s.reset();
        assert_eq!(s.engine.graph().len(), 10);
        assert_eq!(s.engine.rule(), Rule(0x8bc));
        assert!(s.layout.is_empty());
    }

    #[test]
    fn driver_edits_apply_on_next_frame() {
        let mut s = sim(false, 10_000);
        s.driver_mut().growth_limit = 11;
        for _ in 0..10 {
            s.frame();
        }
        assert_eq!(s.engine.graph().len(), 12);
        assert_eq!(s.config().driver.growth_limit, 11);
    }

    #[test]
    fn flip_prob_changes_survive_reset() {
        let mut s = sim(false, 10_000);
        s.set_flip_prob(1e-3).unwrap();
        assert_eq!(s.engine.config().flip_prob, 1e-3);
        assert!(s.set_flip_prob(1.5).is_err());

        s.reset();
        assert_eq!(s.engine.config().flip_prob, 1e-3);
        assert_eq!(s.config().growth.flip_prob, 1e-3);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut cfg = SimConfig::default();
        cfg.growth.flip_prob = 2.0;
        assert!(Simulation::new(cfg, 0).is_err());
    }

    #[test]
    fn same_seed_same_run() {
        let mut a = sim(true, 300);
        let mut b = sim(true, 300);
        for _ in 0..60 {
            assert_eq!(a.frame(), b.frame());
        }
        assert_eq!(a.engine.graph().nodes, b.engine.graph().nodes);
        assert_eq!(a.layout.positions(), b.layout.positions());
    }

    #[test]
    fn autopilot_moves_on_after_explosion() {
        let mut s = sim(true, 20);
        let mut switched = false;
        for _ in 0..400 {
            if s.frame().new_rule.is_some() {
                switched = true;
                break;
            }
        }
        assert!(switched);
        assert!(s.engine.graph().len() <= 12);
    }
}
