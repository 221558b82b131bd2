//! Error types for the growth engine and configuration loading.

use thiserror::Error;

/// Errors raised while growing a graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GrowthError {
    /// A division phase would push the node count past the configured capacity.
    #[error("division needs {requested} nodes but capacity is {capacity}")]
    CapacityExceeded { requested: usize, capacity: usize },
}

/// Errors raised while validating or parsing configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Layout dimensionality must be 2 or 3.
    #[error("dimensionality must be 2 or 3, got {0}")]
    InvalidDim(u8),

    /// Octree leaves must hold at least one point.
    #[error("octree leaf size must be at least 1")]
    InvalidLeafSize,

    /// The octree depth bound must fit the 10-bit Morton quantization.
    #[error("octree max level must be in 1..=10, got {0}")]
    InvalidMaxLevel(u32),

    /// Velocity decay is a fraction.
    #[error("velocity decay must be in [0, 1], got {0}")]
    InvalidDecay(f32),

    /// Mutation probability is a probability.
    #[error("probability must be in [0, 1], got {0}")]
    InvalidProbability(f64),

    /// A rule string that is neither decimal nor `0x`-prefixed hex.
    #[error("invalid rule: {0}")]
    InvalidRule(String),
}
