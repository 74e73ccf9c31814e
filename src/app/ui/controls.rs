use std::ops::RangeInclusive;

use eframe::egui::{self, Key, Ui};

use super::super::{RenderStyle, ViewModel};

/// Share of a slider's range that held arrow keys cover per second, before
/// and after a full second of holding.
const KEY_SWEEP_START: f32 = 0.05;
const KEY_SWEEP_MAX: f32 = 0.6;

/// Seconds the arrow key has been held on a focused slider, signed by
/// direction.
#[derive(Clone, Copy, Default)]
struct HeldArrow(f32);

/// Value change per second after holding an arrow key for `held` seconds on
/// a slider spanning `span`.
fn arrow_sweep(held: f32, span: f32) -> f32 {
    (KEY_SWEEP_START + (KEY_SWEEP_MAX - KEY_SWEEP_START) * held.clamp(0.0, 1.0)) * span
}

/// A clamped slider that also follows held arrow keys while focused, the
/// sweep speeding up the longer the key is held.
fn tuning_slider(
    ui: &mut Ui,
    value: &mut f32,
    range: RangeInclusive<f32>,
    text: &str,
    hover: &str,
) -> bool {
    let (min, max) = (*range.start(), *range.end());
    let response = ui
        .add(
            egui::Slider::new(&mut *value, range)
                .text(text)
                .clamping(egui::SliderClamping::Always),
        )
        .on_hover_text(hover);
    if response.hovered() {
        response.request_focus();
    }

    let held_id = response.id.with("held_arrow");
    let (dt, direction) = ui.input(|input| {
        let up = input.key_down(Key::ArrowRight) || input.key_down(Key::ArrowUp);
        let down = input.key_down(Key::ArrowLeft) || input.key_down(Key::ArrowDown);
        (input.stable_dt.min(0.1), f32::from(u8::from(up)) - f32::from(u8::from(down)))
    });
    if !response.has_focus() || direction == 0.0 {
        ui.ctx().data_mut(|data| data.remove::<HeldArrow>(held_id));
        return response.changed();
    }

    let HeldArrow(previous) = ui.ctx().data(|data| data.get_temp(held_id).unwrap_or_default());
    let held = if previous * direction > 0.0 {
        previous.abs() + dt
    } else {
        dt
    };
    ui.ctx()
        .data_mut(|data| data.insert_temp(held_id, HeldArrow(held * direction)));

    let sweep = arrow_sweep(held, max - min);
    let before = *value;
    *value = (*value + direction * sweep * dt).clamp(min, max);
    ui.ctx().request_repaint();

    response.changed() || *value != before
}

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Graph Controls");
        ui.separator();
        ui.add_space(4.0);

        ui.label("Search (id or label)")
            .on_hover_text("Fuzzy-highlight matching nodes without changing the graph.");
        ui.text_edit_singleline(&mut self.search);

        ui.separator();

        ui.horizontal(|ui| {
            ui.selectable_value(&mut self.style, RenderStyle::Bubble, "Bubbles")
                .on_hover_text("Curved links with arrows, labels inside the nodes.");
            ui.selectable_value(&mut self.style, RenderStyle::Lines, "Lines")
                .on_hover_text("Straight links, labels beside the nodes.");
        });

        ui.checkbox(&mut self.show_labels, "Show labels")
            .on_hover_text("Label nodes that are large enough on screen.");

        ui.checkbox(&mut self.live_physics, "Live physics simulation")
            .on_hover_text("Advance the layout every frame while it is not settled.");

        ui.checkbox(&mut self.show_quadtree_overlay, "Show quadtree overlay")
            .on_hover_text("Draw the Barnes-Hut partitions used for the charge force.");

        let readouts = &mut self.fps_readouts;
        ui.checkbox(&mut readouts.enabled, "FPS Display")
            .on_hover_text("Show a live FPS readout in the header.");

        ui.collapsing("FPS Display tuning", |ui| {
            ui.add_enabled_ui(readouts.enabled, |ui| {
                ui.checkbox(&mut readouts.current, "Show current FPS");
                ui.checkbox(&mut readouts.average, "Show average FPS");
                ui.checkbox(&mut readouts.low, "Show low FPS");
                ui.checkbox(&mut readouts.high, "Show high FPS");
                ui.checkbox(&mut readouts.frame_time, "Show frame time");
            });
        });

        ui.separator();

        let mut changed = false;
        ui.collapsing("Physics tuning", |ui| {
            changed |= tuning_slider(
                ui,
                &mut self.config.default_charge,
                -400.0..=0.0,
                "Charge",
                "Strength for nodes without their own charge. Negative repels.",
            );
            changed |= tuning_slider(
                ui,
                &mut self.config.link_distance,
                5.0..=200.0,
                "Link distance",
                "Rest length for links without their own distance.",
            );

            let mut fixed_strength = self.config.link_strength.is_some();
            let mut strength = self.config.link_strength.unwrap_or(1.0);
            changed |= ui
                .checkbox(&mut fixed_strength, "Fixed link strength")
                .on_hover_text("Off: one over the smaller endpoint degree.")
                .changed();
            if fixed_strength {
                changed |= tuning_slider(
                    ui,
                    &mut strength,
                    0.05..=3.0,
                    "Link strength",
                    "How hard links pull toward their rest length.",
                );
            }
            self.config.link_strength = fixed_strength.then_some(strength);

            changed |= tuning_slider(
                ui,
                &mut self.config.velocity_decay,
                0.05..=0.9,
                "Velocity decay",
                "Share of velocity lost every tick.",
            );
            changed |= ui
                .checkbox(&mut self.config.collide, "Collisions")
                .on_hover_text("Keep node circles from overlapping.")
                .changed();
        });

        if changed {
            self.simulation.set_config(self.config);
            self.simulation.nudge();
        }

        ui.add_space(6.0);
        ui.horizontal(|ui| {
            if ui
                .button("Reheat")
                .on_hover_text("Warm the layout back up.")
                .clicked()
            {
                self.simulation.nudge();
            }
            if ui.button("Recenter view").clicked() {
                self.pan = egui::Vec2::ZERO;
                self.zoom = 0.8;
            }
        });
    }
}
