use eframe::egui::{self, PointerButton, Pos2, Rect, Ui};

use super::super::ViewModel;
use super::super::render_utils::{ViewTransform, circle_visible};

impl ViewModel {
    pub(in crate::app) fn handle_graph_zoom(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let world_before = self.view_transform(rect).screen_to_world(pointer);

        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.zoom = (self.zoom * zoom_factor).clamp(0.05, 6.0);
        let origin = self.config.canvas.center();
        self.pan = pointer - rect.center() - (world_before - origin) * self.zoom;
    }

    pub(in crate::app) fn handle_graph_pan(&mut self, response: &egui::Response) {
        if response.dragged_by(PointerButton::Secondary)
            || response.dragged_by(PointerButton::Middle)
        {
            self.pan += response.drag_delta();
        }
    }

    /// Primary drags that start on a node pin it under the pointer until the
    /// button is released.
    pub(in crate::app) fn handle_node_drag(
        &mut self,
        ui: &Ui,
        view: ViewTransform,
        response: &egui::Response,
    ) {
        if response.drag_started_by(PointerButton::Primary)
            && let Some(origin) = ui.input(|input| input.pointer.press_origin())
            && let Some((index, _)) = self.node_at(origin)
            && let Some(id) = self.store.nodes().get(index).map(|node| node.id.clone())
            && self
                .interaction
                .drag_start(&mut self.simulation, &mut self.store, &id)
        {
            self.dragged = Some(id);
        }

        let Some(id) = self.dragged.clone() else {
            return;
        };

        if response.drag_stopped() || !response.dragged() {
            self.interaction
                .drag_end(&mut self.simulation, &mut self.store, &id);
            self.dragged = None;
            return;
        }

        if let Some(pointer) = response.interact_pointer_pos() {
            self.interaction.drag_move(
                &mut self.simulation,
                &mut self.store,
                &id,
                view.screen_to_world(pointer),
            );
        }
    }

    pub(in crate::app) fn visible_indices_into(
        rect: Rect,
        screen_positions: &[Pos2],
        screen_radii: &[f32],
        visible: &mut Vec<usize>,
    ) {
        visible.clear();
        visible.extend(
            (0..screen_positions.len())
                .filter(|&index| circle_visible(rect, screen_positions[index], screen_radii[index])),
        );
    }

    /// Closest visible node under `pointer`. Nothing is hit while the screen
    /// positions predate the store's current revision.
    pub(in crate::app) fn node_at(&self, pointer: Pos2) -> Option<(usize, f32)> {
        let scratch = &self.view_scratch;
        if scratch.revision != Some(self.store.revision()) {
            return None;
        }
        scratch
            .visible_indices
            .iter()
            .filter_map(|&index| {
                let position = scratch.screen_positions.get(index)?;
                let radius = scratch.screen_radii.get(index)?;
                let distance = position.distance(pointer);
                (distance <= radius.max(4.0)).then_some((index, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    pub(in crate::app) fn hovered_index(&self, ui: &Ui) -> Option<(usize, f32)> {
        ui.input(|input| input.pointer.hover_pos())
            .and_then(|pointer| self.node_at(pointer))
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use eframe::egui::{Pos2, Rect, vec2};
    use serde_json::json;

    use crate::app::{RenderStyle, ViewModel, ViewerOptions};
    use crate::physics::SimulationConfig;
    use crate::snapshot::{GraphSnapshot, SnapshotSource};

    fn model() -> ViewModel {
        ViewModel::new(&ViewerOptions {
            source: SnapshotSource::File(PathBuf::from("graph.json")),
            interval: Duration::from_secs(2),
            simulation: SimulationConfig::default(),
            seed: Some(4),
            style: RenderStyle::Bubble,
        })
    }

    fn snapshot(value: serde_json::Value) -> GraphSnapshot {
        GraphSnapshot::from_value(value).unwrap()
    }

    #[test]
    fn hits_resolve_against_the_current_arena() {
        let mut model = model();
        model.apply_snapshot(snapshot(json!({
            "nodes": [{"id": "a", "ix": 500, "iy": 500}],
            "links": [],
        })));
        let view = model.view_transform(Rect::from_min_size(Pos2::ZERO, vec2(800.0, 600.0)));
        model.update_screen_space(view);

        let pointer = view.world_to_screen(model.store.node("a").unwrap().position());
        assert_eq!(model.node_at(pointer).map(|(index, _)| index), Some(0));

        model.apply_snapshot(snapshot(json!({
            "nodes": [{"id": "a"}, {"id": "b", "ix": 100, "iy": 100}],
            "links": [],
        })));
        assert_eq!(model.node_at(pointer), None);

        model.update_screen_space(view);
        let (index, _) = model.node_at(pointer).unwrap();
        assert_eq!(model.store.nodes()[index].id, "a");
    }
}
