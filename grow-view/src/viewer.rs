//! Interactive viewer for a growing graph built with eframe/egui.
//!
//! This module defines [`Viewer`], which owns a [`Simulation`] and
//! implements [`eframe::App`] to render the embedding and control growth,
//! rule selection and layout parameters through an egui UI.

use eframe::App;
use glam::{Vec2, Vec3};
use grow_core::{
    config::{Dim, GrowthConfig, LayoutConfig},
    rule::{CURATED_RULES, FLIP_PROB_CHOICES, PRESETS, Rule},
    simulation::Simulation,
};
use tracing::{info, warn};

/// Margin added to the layout extent when fitting it to the view.
const FIT_MARGIN: f32 = 30.0;
/// Nodes younger than this many generations are drawn brighter.
const FRESH_AGE: u32 = 10;

/// Main application state for the interactive viewer.
///
/// The typical per-frame update is:
/// 1. Handle UI interactions / input.
/// 2. If `running` is `true` and enough time has passed, call [`Viewer::step_once`].
/// 3. Render edges and nodes, colored by state and age.
///
/// ### Fields
/// - `sim` - Graph, growth engine, layout and autopilot.
///
/// - `running` - Whether the simulation is currently auto-advancing.
/// - `zoom` - Extra zoom on top of fitting the layout to the view.
/// - `pan` - Screen-space pan offset in pixels.
/// - `show_nodes` - Whether node dots are drawn on top of the edges.
///
/// - `step_interval` - Target time between automatic frames (seconds).
/// - `last_step_time` - Time stamp of the last frame (egui time).
/// - `last_step_dt` - Actual time delta between the last two frames (for display only).
pub struct Viewer {
    sim: Simulation,

    running: bool,
    zoom: f32,
    pan: egui::Vec2,
    show_nodes: bool,

    step_interval: f64,
    last_step_time: f64,
    last_step_dt: f64,
}

impl Viewer {
    /// Creates a paused viewer around `sim` with an unzoomed camera.
    pub fn new(sim: Simulation) -> Self {
        Self {
            sim,
            running: false,
            zoom: 1.0,
            pan: egui::vec2(0.0, 0.0),
            show_nodes: true,
            step_interval: 0.0,
            last_step_time: 0.0,
            last_step_dt: 0.0,
        }
    }

    /// Restarts growth from the seed graph and stops auto-running.
    fn reset(&mut self) {
        self.sim.reset();
        self.running = false;
        self.pan = egui::vec2(0.0, 0.0);
    }

    /// Restarts with a new rule and mutation probability.
    fn restart_with(&mut self, rule: Rule, flip_prob: f64) {
        let growth = GrowthConfig {
            rule,
            flip_prob,
            ..self.sim.config().growth
        };
        match self.sim.reset_with_growth(growth) {
            Ok(()) => info!(%rule, flip_prob, "rule selected"),
            Err(e) => warn!(error = %e, "rule rejected"),
        }
    }

    /// Advances the simulation by one frame: a growth phase plus layout ticks.
    fn step_once(&mut self) {
        let report = self.sim.frame();
        if let Some(pick) = report.new_rule {
            info!(rule = %pick.rule, preset = ?pick.preset, "autopilot switched rule");
        }
    }

    /// Allowed growth limits. A division can triple the node count, so the
    /// limit stays a third below capacity to keep every frame growable.
    fn growth_limit_range(&self) -> std::ops::RangeInclusive<usize> {
        let capacity = self.sim.config().growth.capacity;
        let max = (capacity / 3).max(10);
        10..=max
    }

    /// World units to pixels, fitting the layout bounds into `rect`.
    fn scale(&self, rect: egui::Rect) -> f32 {
        let half = 0.5 * rect.width().min(rect.height());
        0.95 * half * self.zoom * 2.0 / (self.sim.layout.extent() + FIT_MARGIN)
    }

    /// Converts a world-space position to screen-space.
    ///
    /// The layout center maps to the middle of `rect` (plus `pan`). The
    /// y-axis is flipped so that positive y goes up; z is dropped.
    fn world_to_screen(&self, p: Vec3, rect: egui::Rect) -> egui::Pos2 {
        let center = rect.center();
        let s = self.scale(rect);
        let d = p - self.sim.layout.center();
        egui::pos2(
            center.x + d.x * s + self.pan.x,
            center.y - d.y * s + self.pan.y,
        )
    }

    /// Converts a screen-space position back to world-space (x and y).
    ///
    /// This is the inverse of [`Viewer::world_to_screen`] on the xy plane.
    fn screen_to_world(&self, p: egui::Pos2, rect: egui::Rect) -> Vec2 {
        let center = rect.center();
        let s = self.scale(rect);
        let c = self.sim.layout.center();
        let x = (p.x - center.x - self.pan.x) / s;
        let y = (center.y - p.y + self.pan.y) / s;
        Vec2::new(c.x + x, c.y + y)
    }

    /// Helper to draw a labeled `usize` [`egui::DragValue`].
    fn labeled_drag_usize(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut usize,
        range: std::ops::RangeInclusive<usize>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    /// Helper to draw a labeled `f32` [`egui::DragValue`].
    fn labeled_drag_f32(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut f32,
        range: std::ops::RangeInclusive<f32>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    /// Builds the top panel UI (run controls, stepping, zoom).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui
                    .button(if self.running { "⏸ Pause" } else { "▶ Run" })
                    .clicked()
                {
                    self.running = !self.running;
                }

                ui.add(
                    egui::DragValue::new(&mut self.step_interval)
                        .prefix("dt target = ")
                        .range(0.0..=1.0)
                        .speed(0.01),
                );

                if ui.button("Step").clicked() {
                    let now = ctx.input(|i| i.time);
                    if self.last_step_time > 0.0 {
                        self.last_step_dt = now - self.last_step_time;
                    }
                    self.step_once();
                    self.last_step_time = now;
                }

                if ui.button("Reset").clicked() {
                    self.reset();
                }

                if ui.button("🎲 Random rule").clicked() {
                    self.sim.next_random_rule();
                }

                ui.separator();
                ui.checkbox(&mut self.sim.driver_mut().autonomous, "Autonomous");
                ui.checkbox(&mut self.show_nodes, "Nodes");

                ui.separator();
                ui.add(egui::Slider::new(&mut self.zoom, 0.1..=10.0).text("Zoom"));
            });
        });
    }

    /// Builds the bottom status bar (timing, graph size, rule).
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("dt target = {:.3} s", self.step_interval));
                ui.label(format!("dt last = {:.3} s", self.last_step_dt));
                ui.separator();
                let graph = self.sim.engine.graph();
                ui.label(format!("nodes = {}", graph.len()));
                ui.label(format!("generation = {}", graph.generation()));
                ui.label(format!("extent = {:.1}", self.sim.layout.extent()));
                ui.separator();
                ui.label(format!(
                    "rule = {}  flip = {:e}",
                    self.sim.engine.rule(),
                    self.sim.engine.config().flip_prob
                ));
            });
        });
    }

    /// Builds the right-hand panel for rule selection and layout parameters.
    fn ui_config_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("config_panel")
            .resizable(true)
            .default_width(240.0)
            .show(ctx, |ui| {
                ui.heading("Rule");

                let current = self.sim.engine.rule();
                let flip_prob = self.sim.engine.config().flip_prob;
                let mut chosen: Option<(Rule, f64)> = None;

                egui::ComboBox::from_label("Curated")
                    .selected_text(current.to_string())
                    .show_ui(ui, |ui| {
                        for rule in CURATED_RULES {
                            if ui
                                .selectable_label(rule == current, rule.to_string())
                                .clicked()
                            {
                                chosen = Some((rule, flip_prob));
                            }
                        }
                    });

                egui::ComboBox::from_label("Preset")
                    .selected_text("choose…")
                    .show_ui(ui, |ui| {
                        for p in &PRESETS {
                            let label = format!("{} ({})", p.name, p.rule);
                            if ui.selectable_label(p.rule == current, label).clicked() {
                                chosen = Some((p.rule, p.flip_prob));
                            }
                        }
                    });

                let mut flip = flip_prob;
                egui::ComboBox::from_label("Flip prob")
                    .selected_text(format!("{flip:e}"))
                    .show_ui(ui, |ui| {
                        for p in FLIP_PROB_CHOICES {
                            ui.selectable_value(&mut flip, p, format!("{p:e}"));
                        }
                    });
                if flip != flip_prob
                    && let Err(e) = self.sim.set_flip_prob(flip)
                {
                    warn!(error = %e, "flip probability rejected");
                }

                if let Some((rule, p)) = chosen {
                    self.restart_with(rule, p);
                }

                ui.separator();
                ui.heading("Growth");
                let limits = self.growth_limit_range();
                Self::labeled_drag_usize(
                    ui,
                    "growth_limit:",
                    &mut self.sim.driver_mut().growth_limit,
                    limits,
                    50.0,
                );
                Self::labeled_drag_usize(
                    ui,
                    "tick_steps:",
                    &mut self.sim.driver_mut().tick_steps,
                    0..=20,
                    1.0,
                );

                ui.separator();
                ui.heading("Layout");
                let mut dim = self.sim.layout.config().dim;
                ui.horizontal(|ui| {
                    ui.radio_value(&mut dim, Dim::Two, "2D");
                    ui.radio_value(&mut dim, Dim::Three, "3D");
                });
                if dim != self.sim.layout.config().dim {
                    self.sim.layout.set_dim(dim);
                }

                let mut cfg = *self.sim.layout.config();
                Self::labeled_drag_f32(ui, "link_distance:", &mut cfg.link_distance, 1.0..=200.0, 0.5);
                Self::labeled_drag_f32(ui, "link_strength:", &mut cfg.link_strength, 0.0..=1.0, 0.01);
                Self::labeled_drag_usize(ui, "link_iterations:", &mut cfg.link_iterations, 0..=10, 1.0);
                Self::labeled_drag_f32(
                    ui,
                    "charge_strength:",
                    &mut cfg.charge_strength,
                    -50.0..=0.0,
                    0.1,
                );
                Self::labeled_drag_f32(
                    ui,
                    "charge_cutoff:",
                    &mut cfg.charge_cutoff,
                    10.0..=10_000.0,
                    10.0,
                );
                Self::labeled_drag_f32(ui, "velocity_decay:", &mut cfg.velocity_decay, 0.0..=1.0, 0.01);
                Self::labeled_drag_f32(ui, "theta:", &mut cfg.theta, 0.0..=2.0, 0.01);
                Self::labeled_drag_usize(ui, "leaf_size:", &mut cfg.leaf_size, 1..=128, 1.0);

                if cfg != *self.sim.layout.config()
                    && let Err(e) = self.sim.layout.set_config(cfg)
                {
                    warn!(error = %e, "layout parameters rejected");
                }

                ui.separator();
                if ui.button("Reset layout params").clicked() {
                    let defaults = LayoutConfig {
                        dim: self.sim.layout.config().dim,
                        ..LayoutConfig::default()
                    };
                    if let Err(e) = self.sim.layout.set_config(defaults) {
                        warn!(error = %e, "layout parameters rejected");
                    }
                }
            });
    }

    /// Builds the central panel where the graph is drawn and interacted with.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let response = ui.allocate_response(ui.available_size(), egui::Sense::click_and_drag());
            let rect = response.rect;
            let painter = ui.painter_at(rect);

            // Pan with drag.
            if response.dragged() {
                self.pan += response.drag_delta();
            }

            // Zoom around the mouse cursor.
            let scroll = ui.ctx().input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                let pointer_screen = response.hover_pos().unwrap_or(rect.center());
                let world_before = self.screen_to_world(pointer_screen, rect);

                let factor = (1.0 + scroll * 0.001).clamp(0.5, 2.0);
                self.zoom = (self.zoom * factor).clamp(0.1, 10.0);

                let screen_after = self.world_to_screen(world_before.extend(0.0), rect);
                self.pan += pointer_screen - screen_after;
            }

            let graph = self.sim.engine.graph();
            let pos = self.sim.layout.positions();
            // Points for nodes added this frame appear on the next layout tick.
            let placed = pos.len().min(graph.len());

            let screen: Vec<egui::Pos2> = pos[..placed]
                .iter()
                .map(|&p| self.world_to_screen(p, rect))
                .collect();

            let edge = egui::Stroke::new(1.0, egui::Color32::from_gray(140));
            for (a, b) in graph.links() {
                if a < placed && b < placed {
                    painter.line_segment([screen[a], screen[b]], edge);
                }
            }

            if self.show_nodes {
                let r = (1.5 * self.zoom).clamp(1.0, 4.0);
                for (id, &p) in screen.iter().enumerate() {
                    let color = node_color(graph.nodes[id].state, graph.age(id));
                    painter.circle_filled(p, r, color);
                }
            }

            // Auto-run simulation if requested.
            if self.running {
                let now = ctx.input(|i| i.time);
                let elapsed = now - self.last_step_time;
                if elapsed >= self.step_interval {
                    if self.last_step_time > 0.0 {
                        self.last_step_dt = elapsed;
                    }
                    self.step_once();
                    self.last_step_time = now;
                }

                ctx.request_repaint();
            }
        });
    }
}

/// Warm for state 1, cool for state 0, brighter for recently divided nodes.
fn node_color(state: u8, age: u32) -> egui::Color32 {
    let (r, g, b) = if state == 1 {
        (230.0, 140.0, 50.0)
    } else {
        (70.0, 130.0, 220.0)
    };
    let boost = 1.0 + FRESH_AGE.saturating_sub(age) as f32 / FRESH_AGE as f32 * 0.5;
    let c = |v: f32| (v * boost).min(255.0) as u8;
    egui::Color32::from_rgb(c(r), c(g), c(b))
}

impl App for Viewer {
    /// eframe callback that builds all UI panels for each frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_config_panel(ctx);
        self.ui_central_panel(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grow_core::config::SimConfig;

    fn test_rect() -> egui::Rect {
        egui::Rect::from_min_size(egui::Pos2::new(0.0, 0.0), egui::vec2(800.0, 600.0))
    }

    fn viewer() -> Viewer {
        Viewer::new(Simulation::new(SimConfig::default(), 11).unwrap())
    }

    #[test]
    fn world_to_screen_and_back_is_roundtrip() {
        let mut viewer = viewer();
        for _ in 0..6 {
            viewer.step_once();
        }
        // Use non-trivial zoom and pan to exercise the math.
        viewer.zoom = 2.0;
        viewer.pan = egui::vec2(15.0, -7.0);
        let rect = test_rect();

        let world_points = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(10.0, -5.0, 3.0),
            Vec3::new(-3.5, 8.25, 0.0),
        ];

        let eps = 1e-3;

        for p in world_points {
            let screen = viewer.world_to_screen(p, rect);
            let back = viewer.screen_to_world(screen, rect);

            assert!(
                (back.x - p.x).abs() < eps && (back.y - p.y).abs() < eps,
                "roundtrip mismatch: p={:?}, back={:?}",
                p,
                back
            );
        }
    }

    #[test]
    fn layout_center_maps_to_view_center() {
        let mut viewer = viewer();
        for _ in 0..4 {
            viewer.step_once();
        }
        let rect = test_rect();
        let p = viewer.world_to_screen(viewer.sim.layout.center(), rect);
        assert!((p - rect.center()).length() < 1e-3);
    }

    #[test]
    fn reset_restores_basic_state() {
        let mut viewer = viewer();
        for _ in 0..10 {
            viewer.step_once();
        }
        viewer.running = true;
        viewer.pan = egui::vec2(40.0, 40.0);

        viewer.reset();

        assert_eq!(viewer.sim.engine.graph().len(), 10);
        assert_eq!(viewer.sim.engine.graph().generation(), 0);
        assert!(viewer.sim.layout.is_empty());
        assert!(!viewer.running);
        assert_eq!(viewer.pan, egui::vec2(0.0, 0.0));
    }

    #[test]
    fn step_once_grows_and_places_nodes() {
        let mut viewer = viewer();

        viewer.step_once();
        assert_eq!(viewer.sim.layout.len(), 10);

        // The second frame completes a cycle with the default rule.
        viewer.step_once();
        assert_eq!(viewer.sim.engine.graph().generation(), 1);
        assert_eq!(viewer.sim.engine.graph().len(), 12);
        assert_eq!(viewer.sim.layout.len(), 12);
    }

    #[test]
    fn restart_with_switches_rule() {
        let mut viewer = viewer();
        for _ in 0..4 {
            viewer.step_once();
        }
        viewer.restart_with(Rule(0x8bc), 1e-3);
        assert_eq!(viewer.sim.engine.rule(), Rule(0x8bc));
        assert_eq!(viewer.sim.engine.config().flip_prob, 1e-3);
        assert_eq!(viewer.sim.engine.graph().len(), 10);

        // Out-of-range probabilities leave the run untouched.
        viewer.restart_with(Rule(0x886), 3.0);
        assert_eq!(viewer.sim.engine.rule(), Rule(0x8bc));
    }

    #[test]
    fn growth_limit_stays_within_capacity() {
        let viewer = viewer();
        let range = viewer.growth_limit_range();
        let capacity = viewer.sim.config().growth.capacity;
        // A graph at the limit can at most triple in one division.
        assert!(3 * range.end() <= capacity);
        assert!(range.contains(&viewer.sim.config().driver.growth_limit));
    }

    #[test]
    fn fresh_nodes_are_brighter() {
        let fresh = node_color(1, 0);
        let old = node_color(1, FRESH_AGE);
        assert!(fresh.r() >= old.r() && fresh.g() > old.g());
        assert_ne!(node_color(0, 50), node_color(1, 50));
    }
}
