//! Drag gestures translated into pins on the simulation.

use eframe::egui::Vec2;
use log::debug;

use crate::graph::GraphStore;
use crate::physics::ForceSimulation;

/// Tracks the drag gestures in progress. Warms the simulation when the first
/// gesture starts and lets it cool once the last one ends.
#[derive(Debug, Default)]
pub struct InteractionController {
    active: Vec<String>,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self, id: &str) -> bool {
        self.active.iter().any(|active| active == id)
    }

    pub fn has_active_drag(&self) -> bool {
        !self.active.is_empty()
    }

    pub fn active(&self) -> impl Iterator<Item = &str> {
        self.active.iter().map(String::as_str)
    }

    pub fn drag_start(
        &mut self,
        simulation: &mut ForceSimulation,
        store: &mut GraphStore,
        id: &str,
    ) -> bool {
        let Some(position) = store.node(id).map(|node| node.position()) else {
            return false;
        };

        if self.active.is_empty() {
            let target = simulation.config().drag_alpha_target;
            simulation.set_alpha_target(target);
            simulation.restart();
        }
        if !self.is_dragging(id) {
            self.active.push(id.to_owned());
        }
        debug!("drag start on {id}");
        simulation.pin(store, id, position)
    }

    pub fn drag_move(
        &mut self,
        simulation: &mut ForceSimulation,
        store: &mut GraphStore,
        id: &str,
        position: Vec2,
    ) -> bool {
        if !self.is_dragging(id) {
            return false;
        }
        simulation.pin(store, id, position)
    }

    pub fn drag_end(
        &mut self,
        simulation: &mut ForceSimulation,
        store: &mut GraphStore,
        id: &str,
    ) -> bool {
        let before = self.active.len();
        self.active.retain(|active| active != id);
        if self.active.len() == before {
            return false;
        }

        if self.active.is_empty() {
            simulation.set_alpha_target(0.0);
        }
        debug!("drag end on {id}");
        simulation.unpin(store, id);
        true
    }

    /// Forgets gestures whose node disappeared in a reconciliation.
    pub fn retain_existing(&mut self, simulation: &mut ForceSimulation, store: &GraphStore) {
        let before = self.active.len();
        self.active.retain(|id| store.contains_node(id));
        if before > 0 && self.active.is_empty() {
            simulation.set_alpha_target(0.0);
        }
    }
}
