//! Unattended rule cycling.
//!
//! The autopilot watches one run frame by frame and decides when the run
//! has stopped being interesting: growth stalled for too long, or the
//! graph hit the growth limit. Stalls first get escalating mutation to
//! shake the graph out of a fixed point.

use tracing::info;

/// Stall frames before mutation escalation starts.
pub const STALL_ESCALATE_AFTER: u32 = 50;
/// Escalation happens every this many stall frames.
pub const STALL_ESCALATE_EVERY: u32 = 20;
/// Stall frames before giving up on the rule.
pub const STALL_GIVE_UP_AFTER: u32 = 200;
/// A run that reaches the growth limit before this generation exploded.
pub const EXPLOSION_GENERATION: u32 = 30;
/// Frames an explosive run is shown at the limit.
pub const EXPLOSION_HOLD: u32 = 10;
/// Frames a well-grown run is shown at the limit.
pub const SATURATED_HOLD: u32 = 200;
/// Upper bound for escalated mutation.
pub const MAX_FLIP_PROB: f64 = 0.5;

/// What the driver should do after a frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Verdict {
    Continue,
    /// Raise the mutation probability to this value.
    Escalate(f64),
    /// Pick a new rule and restart.
    NextRule,
}

#[derive(Clone, Debug, Default)]
pub struct Autopilot {
    prev_node_count: usize,
    stall_frames: u32,
    limit_frames: u32,
    consecutive_explosions: u32,
}

impl Autopilot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stall_frames(&self) -> u32 {
        self.stall_frames
    }

    pub fn consecutive_explosions(&self) -> u32 {
        self.consecutive_explosions
    }

    /// Forgets the current run. Explosion history is kept across runs.
    pub fn restart(&mut self) {
        self.prev_node_count = 0;
        self.stall_frames = 0;
        self.limit_frames = 0;
    }

    /// Judges one frame.
    ///
    /// An explosion is counted once per run, on the first frame at the
    /// limit, not once per frame spent there.
    ///
    /// ### Parameters
    /// - `growing` - Whether the graph was below the growth limit and grew.
    /// - `node_count` - Graph size after this frame.
    /// - `generation` - Completed growth cycles.
    /// - `flip_prob` - Current mutation probability.
    pub fn observe(
        &mut self,
        growing: bool,
        node_count: usize,
        generation: u32,
        flip_prob: f64,
    ) -> Verdict {
        if growing {
            self.limit_frames = 0;
            let verdict = self.observe_growth(node_count, flip_prob);
            self.prev_node_count = node_count;
            return verdict;
        }

        self.limit_frames += 1;
        if generation < EXPLOSION_GENERATION {
            if self.limit_frames == 1 {
                self.consecutive_explosions += 1;
            }
            if self.consecutive_explosions > 1 || self.limit_frames > EXPLOSION_HOLD {
                info!(generation, explosions = self.consecutive_explosions, "explosive rule, moving on");
                return Verdict::NextRule;
            }
        } else {
            self.consecutive_explosions = 0;
            if self.limit_frames > SATURATED_HOLD {
                info!(generation, "run saturated, moving on");
                return Verdict::NextRule;
            }
        }
        Verdict::Continue
    }

    fn observe_growth(&mut self, node_count: usize, flip_prob: f64) -> Verdict {
        if node_count != self.prev_node_count {
            self.stall_frames = 0;
            return Verdict::Continue;
        }

        self.stall_frames += 1;
        if self.stall_frames > STALL_GIVE_UP_AFTER {
            info!(stall_frames = self.stall_frames, "growth stalled, moving on");
            self.consecutive_explosions = 0;
            return Verdict::NextRule;
        }
        if self.stall_frames > STALL_ESCALATE_AFTER
            && self.stall_frames % STALL_ESCALATE_EVERY == 0
        {
            let next = if flip_prob == 0.0 {
                1e-4
            } else {
                (flip_prob * 10.0).min(MAX_FLIP_PROB)
            };
            info!(flip_prob = next, "escalating mutation");
            return Verdict::Escalate(next);
        }
        Verdict::Continue
    }
}
