use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::rule::Rule;

/// Default hard cap on graph size, matching the point buffer size.
pub const DEFAULT_CAPACITY: usize = 1 << 16;

/// Growth engine parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthConfig {
    pub rule: Rule,
    /// Per-node probability of flipping the freshly computed state.
    pub flip_prob: f64,
    /// Largest node count a division phase may produce.
    pub capacity: usize,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            rule: Rule::default(),
            flip_prob: 0.0,
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl GrowthConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.flip_prob) {
            return Err(ConfigError::InvalidProbability(self.flip_prob));
        }
        Ok(())
    }
}

/// Embedding dimensionality.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Dim {
    #[default]
    Two,
    Three,
}

impl Dim {
    pub fn is_3d(self) -> bool {
        matches!(self, Dim::Three)
    }
}

impl TryFrom<u8> for Dim {
    type Error = ConfigError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            2 => Ok(Dim::Two),
            3 => Ok(Dim::Three),
            other => Err(ConfigError::InvalidDim(other)),
        }
    }
}

impl From<Dim> for u8 {
    fn from(d: Dim) -> u8 {
        match d {
            Dim::Two => 2,
            Dim::Three => 3,
        }
    }
}

/// Force layout parameters. Every field may change between ticks.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub dim: Dim,
    /// Rest length of a graph edge.
    pub link_distance: f32,
    pub link_strength: f32,
    /// Link relaxation passes per sub-step.
    pub link_iterations: usize,
    /// Signed many-body strength; negative repels.
    pub charge_strength: f32,
    /// Interactions farther than this are dropped.
    pub charge_cutoff: f32,
    pub velocity_decay: f32,
    /// Barnes-Hut opening ratio.
    pub theta: f32,
    pub leaf_size: usize,
    pub max_level: u32,
    /// Half-width of the jitter box used when seeding new points.
    pub seed_radius: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            dim: Dim::Two,
            link_distance: 25.0,
            link_strength: 0.5,
            link_iterations: 2,
            charge_strength: -3.0,
            charge_cutoff: 2000.0,
            velocity_decay: 0.1,
            theta: 0.9,
            leaf_size: crate::octree::DEFAULT_LEAF_SIZE,
            max_level: crate::octree::DEFAULT_MAX_LEVEL,
            seed_radius: 0.5,
        }
    }
}

impl LayoutConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.leaf_size == 0 {
            return Err(ConfigError::InvalidLeafSize);
        }
        if self.max_level == 0 || self.max_level > crate::morton::MORTON_BITS {
            return Err(ConfigError::InvalidMaxLevel(self.max_level));
        }
        if !(0.0..=1.0).contains(&self.velocity_decay) {
            return Err(ConfigError::InvalidDecay(self.velocity_decay));
        }
        Ok(())
    }
}

/// Per-frame driver parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Layout sub-steps per frame.
    pub tick_steps: usize,
    /// Growth stops once the graph is larger than this.
    pub growth_limit: usize,
    /// Let the autopilot pick new rules when a run stalls or saturates.
    pub autonomous: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            tick_steps: 2,
            growth_limit: 10_000,
            autonomous: false,
        }
    }
}

/// Everything a [`crate::simulation::Simulation`] needs, as loaded from a
/// config file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub growth: GrowthConfig,
    pub layout: LayoutConfig,
    pub driver: DriverConfig,
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.growth.validate()?;
        self.layout.validate()
    }
}
