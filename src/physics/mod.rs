//! Alpha-driven force integrator.
//!
//! Every tick the simulation's temperature (`alpha`) moves toward its target,
//! the force terms turn positions into velocity changes scaled by alpha, and
//! velocities are damped and integrated. Once alpha falls below `alpha_min`
//! the simulation settles and stops ticking until it is nudged, restarted or
//! warmed by a drag.

mod forces;
mod quadtree;

use std::collections::HashMap;

use eframe::egui::Vec2;
use log::{debug, info, warn};

use crate::graph::{Canvas, GraphStore, ReconcileReport};
use crate::style::node_radius;
use forces::{SpringTerm, apply_centering, apply_springs, charge_on, collide};
pub use quadtree::QuadtreeCell;
use quadtree::Quadtree;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationConfig {
    pub canvas: Canvas,
    /// Strength for nodes without a charge override. Negative repels.
    pub default_charge: f32,
    /// Rest length for links without a distance override.
    pub link_distance: f32,
    /// `None` uses `1 / min(degree(source), degree(target))`.
    pub link_strength: Option<f32>,
    pub velocity_decay: f32,
    pub alpha_min: f32,
    pub alpha_decay: f32,
    /// Alpha floor applied by [`ForceSimulation::nudge`].
    pub reheat_alpha: f32,
    /// Alpha floor after a reconciliation that left the node and link sets
    /// alone.
    pub idle_alpha: f32,
    /// Alpha target held while a node is dragged.
    pub drag_alpha_target: f32,
    pub center_strength: f32,
    pub collide: bool,
    pub collide_strength: f32,
    pub theta: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            canvas: Canvas::default(),
            default_charge: -100.0,
            link_distance: 30.0,
            link_strength: None,
            velocity_decay: 0.4,
            alpha_min: 0.001,
            alpha_decay: 1.0 - 0.001_f32.powf(1.0 / 300.0),
            reheat_alpha: 0.3,
            idle_alpha: 0.01,
            drag_alpha_target: 0.3,
            center_strength: 1.0,
            collide: true,
            collide_strength: 0.7,
            theta: 0.9,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimulationState {
    Stopped,
    Cooling,
    Warmed,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickReport {
    pub alpha: f32,
    pub state: SimulationState,
    /// Whether any node still moved noticeably.
    pub moving: bool,
}

#[derive(Default)]
struct BoundTerms {
    springs: Vec<SpringTerm>,
    charges: Vec<f32>,
    radii: Vec<f32>,
    max_radius: f32,
}

#[derive(Default)]
struct PhysicsScratch {
    positions: Vec<Vec2>,
    velocities: Vec<Vec2>,
    predicted: Vec<Vec2>,
    deltas: Vec<Vec2>,
}

pub struct ForceSimulation {
    config: SimulationConfig,
    alpha: f32,
    alpha_target: f32,
    running: bool,
    bound_revision: Option<u64>,
    terms: BoundTerms,
    scratch: PhysicsScratch,
    ticks: u64,
}

impl ForceSimulation {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            alpha: 1.0,
            alpha_target: 0.0,
            running: true,
            bound_revision: None,
            terms: BoundTerms::default(),
            scratch: PhysicsScratch::default(),
            ticks: 0,
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Replaces the configuration; bound terms are rebuilt on the next tick.
    pub fn set_config(&mut self, config: SimulationConfig) {
        self.config = config;
        self.bound_revision = None;
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn alpha_target(&self) -> f32 {
        self.alpha_target
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn state(&self) -> SimulationState {
        if !self.running {
            SimulationState::Stopped
        } else if self.alpha_target >= self.config.alpha_min {
            SimulationState::Warmed
        } else {
            SimulationState::Cooling
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha.clamp(0.0, 1.0);
    }

    pub fn set_alpha_target(&mut self, target: f32) {
        self.alpha_target = target.clamp(0.0, 1.0);
    }

    pub fn restart(&mut self) {
        if !self.running {
            debug!("simulation restarted at alpha {:.4}", self.alpha);
        }
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Perturbs the layout after a structural change.
    pub fn nudge(&mut self) {
        self.alpha = self.alpha.max(self.config.reheat_alpha);
        self.restart();
    }

    /// Wakes the layout after every applied snapshot: a full nudge when nodes
    /// or links came or went, a light one otherwise.
    pub fn reheat_for(&mut self, report: &ReconcileReport) {
        if report.is_structural() {
            self.nudge();
        } else {
            self.alpha = self.alpha.max(self.config.idle_alpha);
            self.restart();
        }
    }

    /// Resolves every link against the current arena and rebuilds the force
    /// terms. Safe to call any number of times.
    pub fn bind(&mut self, store: &mut GraphStore) {
        let dropped = store.resolve_links();
        for key in &dropped {
            warn!("link {key} lost an endpoint before binding; dropped");
        }

        let node_count = store.node_count();
        let mut degree = vec![0usize; node_count];
        for link in store.links() {
            if let Some((source, target)) = link.endpoints.indices() {
                degree[source] += 1;
                degree[target] += 1;
            }
        }

        self.terms.springs.clear();
        for link in store.links() {
            let Some((source, target)) = link.endpoints.indices() else {
                continue;
            };
            let (source_degree, target_degree) = (degree[source], degree[target]);
            let strength = self.config.link_strength.unwrap_or_else(|| {
                1.0 / source_degree.min(target_degree).max(1) as f32
            });
            self.terms.springs.push(SpringTerm {
                source,
                target,
                distance: link.distance.unwrap_or(self.config.link_distance),
                strength,
                bias: source_degree as f32 / (source_degree + target_degree).max(1) as f32,
            });
        }

        self.terms.charges.clear();
        self.terms.radii.clear();
        self.terms.max_radius = 0.0;
        for node in store.nodes() {
            self.terms
                .charges
                .push(node.charge.unwrap_or(self.config.default_charge));
            let radius = node_radius(node);
            self.terms.radii.push(radius);
            self.terms.max_radius = self.terms.max_radius.max(radius);
        }

        self.bound_revision = Some(store.revision());
        debug!(
            "bound {} nodes and {} springs (revision {})",
            node_count,
            self.terms.springs.len(),
            store.revision()
        );
    }

    pub fn is_bound_to(&self, store: &GraphStore) -> bool {
        self.bound_revision == Some(store.revision())
    }

    /// Advances the simulation by one step. Returns `None` while stopped.
    pub fn tick(&mut self, store: &mut GraphStore) -> Option<TickReport> {
        if !self.running {
            return None;
        }
        if !self.is_bound_to(store) {
            self.bind(store);
        }

        self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;
        self.ticks = self.ticks.wrapping_add(1);
        let moving = self.step(store);

        if self.alpha < self.config.alpha_min {
            self.running = false;
            info!(
                "layout settled after {} ticks (alpha {:.5})",
                self.ticks, self.alpha
            );
        }

        Some(TickReport {
            alpha: self.alpha,
            state: self.state(),
            moving,
        })
    }

    fn step(&mut self, store: &mut GraphStore) -> bool {
        let alpha = self.alpha;
        let config = self.config;
        let nodes = store.nodes_mut();
        let node_count = nodes.len();
        if node_count == 0 {
            return false;
        }

        let scratch = &mut self.scratch;
        scratch.positions.clear();
        scratch.velocities.clear();
        for node in nodes.iter() {
            scratch.positions.push(node.position);
            scratch.velocities.push(node.velocity);
        }

        let charges = &self.terms.charges;
        if node_count > 1
            && let Some(tree) = Quadtree::build(&scratch.positions, charges)
        {
            for index in 0..node_count {
                scratch.velocities[index] +=
                    charge_on(&tree, index, &scratch.positions, charges, alpha, config.theta);
            }
        }

        if config.collide && node_count > 1 && self.terms.max_radius > 0.0 {
            scratch.predicted.clear();
            scratch
                .predicted
                .extend(scratch.positions.iter().zip(&scratch.velocities).map(|(p, v)| *p + *v));
            scratch.deltas.clear();
            scratch.deltas.resize(node_count, Vec2::ZERO);

            if let Some(tree) = Quadtree::build(&scratch.predicted, &[]) {
                collide(
                    &tree,
                    &scratch.predicted,
                    &self.terms.radii,
                    self.terms.max_radius,
                    config.collide_strength,
                    &mut scratch.deltas,
                );
            }
            for (velocity, delta) in scratch.velocities.iter_mut().zip(&scratch.deltas) {
                *velocity += *delta;
            }
        }

        apply_centering(
            &mut scratch.positions,
            config.canvas.center(),
            config.center_strength,
        );

        apply_springs(
            &self.terms.springs,
            &scratch.positions,
            &mut scratch.velocities,
            alpha,
        );

        let retain = 1.0 - config.velocity_decay.clamp(0.0, 1.0);
        let mut moving = false;
        for (index, node) in nodes.iter_mut().enumerate() {
            if let Some(pin) = node.pin {
                node.position = pin;
                node.velocity = Vec2::ZERO;
                continue;
            }

            let velocity = scratch.velocities[index] * retain;
            node.velocity = velocity;
            node.position = scratch.positions[index] + velocity;
            if velocity.length_sq() > 1e-6 {
                moving = true;
            }
        }

        moving
    }

    /// Holds `id` at `position` until unpinned. Returns `false` for unknown ids.
    pub fn pin(&mut self, store: &mut GraphStore, id: &str, position: Vec2) -> bool {
        let Some(node) = store.node_mut(id) else {
            return false;
        };
        node.pin = Some(position);
        node.position = position;
        node.velocity = Vec2::ZERO;
        true
    }

    pub fn unpin(&mut self, store: &mut GraphStore, id: &str) -> bool {
        let Some(node) = store.node_mut(id) else {
            return false;
        };
        node.pin = None;
        true
    }

    pub fn is_pinned(&self, store: &GraphStore, id: &str) -> bool {
        store.node(id).is_some_and(|node| node.pin.is_some())
    }

    pub fn quadtree_cells(&self, store: &GraphStore, cells: &mut Vec<QuadtreeCell>) {
        cells.clear();
        let positions = store
            .nodes()
            .iter()
            .map(|node| node.position)
            .collect::<Vec<_>>();
        let charges = store
            .nodes()
            .iter()
            .map(|node| node.charge.unwrap_or(self.config.default_charge))
            .collect::<Vec<_>>();
        if let Some(tree) = Quadtree::build(&positions, &charges) {
            tree.overlay(cells);
        }
    }

    /// Spring parameters currently bound, keyed by endpoint ids.
    pub fn spring_lengths(&self, store: &GraphStore) -> HashMap<(String, String), f32> {
        let nodes = store.nodes();
        self.terms
            .springs
            .iter()
            .filter(|spring| spring.source < nodes.len() && spring.target < nodes.len())
            .map(|spring| {
                (
                    (nodes[spring.source].id.clone(), nodes[spring.target].id.clone()),
                    spring.distance,
                )
            })
            .collect()
    }
}
