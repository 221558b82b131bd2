//! Growing trivalent graphs and their live force-directed embedding.
//!
//! Main components:
//! - [`graph`] — the trivalent graph arena and the division rewrite.
//! - [`rule`] — packed state/division rules and the rule catalogue.
//! - [`phases`] — the state-update and division phases of a growth cycle.
//! - [`growth`] — the growth engine alternating those phases.
//! - [`morton`] — Morton codes and Z-order sorting of points.
//! - [`octree`] — linearized octree with skip pointers and aggregates.
//! - [`barnes_hut`] — approximate many-body repulsion over the octree.
//! - [`link`] — spring relaxation along graph edges.
//! - [`layout`] — the layout integrator owning positions and velocities.
//! - [`force_buffer`] — per-point force accumulation buffer.
//! - [`autopilot`] — unattended rule cycling.
//! - [`simulation`] — per-frame driver tying everything together.
//! - [`config`] — configuration for growth, layout and the driver.
//! - [`error`] — error types.
//! - [`types`] — shared type aliases and IDs.

pub mod autopilot;
pub mod barnes_hut;
pub mod config;
pub mod error;
pub mod force_buffer;
pub mod graph;
pub mod growth;
pub mod layout;
pub mod link;
pub mod morton;
pub mod octree;
pub mod phases;
pub mod rule;
pub mod simulation;
pub mod types;
