use eframe::egui::{self, Align, Color32, Context, Layout, RichText};

use crate::physics::SimulationState;
use crate::snapshot::SnapshotSource;

use super::super::ViewModel;

/// Rows shown per list in the recent-changes panel.
const CHANGE_ROWS: usize = 40;

fn state_label(state: SimulationState) -> &'static str {
    match state {
        SimulationState::Stopped => "settled",
        SimulationState::Cooling => "cooling",
        SimulationState::Warmed => "warm",
    }
}

fn change_list(ui: &mut egui::Ui, title: &str, ids: &[impl AsRef<str>]) {
    if ids.is_empty() {
        return;
    }
    egui::CollapsingHeader::new(format!("{title} ({})", ids.len()))
        .default_open(ids.len() <= 8)
        .show(ui, |ui| {
            for id in ids.iter().take(CHANGE_ROWS) {
                ui.label(id.as_ref());
            }
            if ids.len() > CHANGE_ROWS {
                ui.weak(format!("... and {} more", ids.len() - CHANGE_ROWS));
            }
        });
}

impl ViewModel {
    pub(in crate::app) fn show(&mut self, ctx: &Context, source: &SnapshotSource) {
        self.update_fps_counter(ctx);

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("live-graph");
                    ui.separator();
                    ui.label(format!("source: {source}"));
                    ui.label(format!("nodes: {}", self.store.node_count()));
                    ui.label(format!("links: {}", self.store.link_count()));
                    if let Some(report) = &self.last_report {
                        ui.label(format!("last diff: {}", report.summary()));
                        if !report.issues.is_empty() {
                            ui.colored_label(
                                Color32::from_rgb(241, 180, 94),
                                format!("issues: {}", report.issues.len()),
                            );
                        }
                    }
                    ui.label(format!(
                        "layout: {} (alpha {:.3})",
                        state_label(self.simulation.state()),
                        self.simulation.alpha()
                    ));
                    if let Some(error) = &self.last_error {
                        ui.colored_label(Color32::from_rgb(235, 110, 100), "fetch failed")
                            .on_hover_text(error.as_str());
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(self.visible_graph_text());
                        if let Some(fps_text) = self.fps_display_text() {
                            ui.label(fps_text);
                        }
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("changes")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_changes(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            if self.store.is_empty() {
                ui.vertical_centered(|ui| {
                    ui.add_space(120.0);
                    ui.heading("The latest snapshot has no nodes.");
                });
            } else {
                self.draw_graph(ui);
            }
        });
    }

    fn draw_changes(&self, ui: &mut egui::Ui) {
        ui.heading("Recent changes");
        ui.label(format!("snapshots applied: {}", self.snapshots_applied));
        ui.separator();

        let Some(report) = &self.last_report else {
            ui.weak("No snapshot applied yet.");
            return;
        };

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                if !report.has_changes() {
                    ui.weak("The last snapshot changed nothing.");
                }
                change_list(ui, "Added nodes", &report.added_nodes);
                change_list(ui, "Removed nodes", &report.removed_nodes);
                change_list(ui, "Updated nodes", &report.updated_nodes);
                change_list(ui, "Added links", &report.added_links);
                change_list(ui, "Removed links", &report.removed_links);
                change_list(ui, "Updated links", &report.updated_links);

                if !report.issues.is_empty() {
                    ui.separator();
                    ui.label(RichText::new("Issues").strong());
                    for issue in report.issues.iter().take(CHANGE_ROWS) {
                        ui.colored_label(Color32::from_rgb(241, 180, 94), issue.to_string());
                    }
                }
            });
    }
}
