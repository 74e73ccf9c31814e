use std::collections::HashSet;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Duration;

use eframe::egui::{self, Context, Pos2, Vec2};
use log::{info, warn};

use crate::graph::{GraphStore, PositionSeeder, ReconcileReport, reconcile};
use crate::interaction::InteractionController;
use crate::physics::{ForceSimulation, QuadtreeCell, SimulationConfig};
use crate::snapshot::{GraphSnapshot, SnapshotSource, spawn_poller};
use ui::{FpsReadouts, FrameStats};

mod graph;
mod render_utils;
mod ui;

/// How links and labels are drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum RenderStyle {
    /// Curved links with arrow heads, labels inside the nodes.
    #[default]
    Bubble,
    /// Straight links, labels beside the nodes.
    Lines,
}

pub struct ViewerOptions {
    pub source: SnapshotSource,
    pub interval: Duration,
    pub simulation: SimulationConfig,
    pub seed: Option<u64>,
    pub style: RenderStyle,
}

pub struct LiveGraphApp {
    source: SnapshotSource,
    interval: Duration,
    snapshot_rx: Receiver<Result<GraphSnapshot, String>>,
    poller_alive: bool,
    state: AppState,
    model: Box<ViewModel>,
}

enum AppState {
    Loading,
    Ready,
    Error(String),
}

struct ViewModel {
    store: GraphStore,
    simulation: ForceSimulation,
    seeder: PositionSeeder,
    interaction: InteractionController,
    config: SimulationConfig,
    style: RenderStyle,
    show_labels: bool,
    live_physics: bool,
    show_quadtree_overlay: bool,
    search: String,
    search_match_cache: Option<SearchMatchCache>,
    pan: Vec2,
    zoom: f32,
    dragged: Option<String>,
    snapshots_applied: u64,
    last_report: Option<ReconcileReport>,
    last_error: Option<String>,
    view_scratch: ViewScratch,
    fps_readouts: FpsReadouts,
    frame_stats: FrameStats,
    visible_node_count: usize,
    visible_link_count: usize,
}

struct SearchMatchCache {
    query: String,
    graph_revision: u64,
    matches: Arc<HashSet<usize>>,
}

#[derive(Default)]
struct ViewScratch {
    screen_positions: Vec<Pos2>,
    screen_radii: Vec<f32>,
    visible_indices: Vec<usize>,
    visible_mask: Vec<bool>,
    quadtree_cells: Vec<QuadtreeCell>,
    /// Store revision the screen positions were computed for.
    revision: Option<u64>,
}

impl LiveGraphApp {
    pub fn new(cc: &eframe::CreationContext<'_>, options: ViewerOptions) -> Self {
        let ctx = cc.egui_ctx.clone();
        let snapshot_rx = spawn_poller(options.source.clone(), options.interval, move || {
            ctx.request_repaint();
        });

        Self {
            source: options.source.clone(),
            interval: options.interval,
            snapshot_rx,
            poller_alive: true,
            state: AppState::Loading,
            model: Box::new(ViewModel::new(&options)),
        }
    }

    /// Applies every snapshot the poller delivered since the last frame.
    fn drain_snapshots(&mut self) {
        loop {
            match self.snapshot_rx.try_recv() {
                Ok(Ok(snapshot)) => {
                    self.model.apply_snapshot(snapshot);
                    self.state = AppState::Ready;
                }
                Ok(Err(error)) => {
                    if !matches!(self.state, AppState::Ready) {
                        self.state = AppState::Error(error.clone());
                    }
                    self.model.last_error = Some(error);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if self.poller_alive {
                        warn!("snapshot poller disconnected");
                        self.poller_alive = false;
                        self.model.last_error = Some("snapshot poller disconnected".to_owned());
                    }
                    break;
                }
            }
        }
    }
}

impl eframe::App for LiveGraphApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.drain_snapshots();

        match &self.state {
            AppState::Loading => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading(format!("Waiting for the first snapshot from {}...", self.source));
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load a snapshot");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if self.poller_alive {
                        ui.label(format!(
                            "Retrying every {:.1}s.",
                            self.interval.as_secs_f32()
                        ));
                    }
                });
            }
            AppState::Ready => {
                self.model.show(ctx, &self.source);
            }
        }
    }
}

impl ViewModel {
    fn new(options: &ViewerOptions) -> Self {
        let canvas = options.simulation.canvas;
        let seeder = match options.seed {
            Some(seed) => PositionSeeder::with_seed(canvas, seed),
            None => PositionSeeder::new(canvas),
        };

        Self {
            store: GraphStore::new(),
            simulation: ForceSimulation::new(options.simulation),
            seeder,
            interaction: InteractionController::new(),
            config: options.simulation,
            style: options.style,
            show_labels: true,
            live_physics: true,
            show_quadtree_overlay: false,
            search: String::new(),
            search_match_cache: None,
            pan: Vec2::ZERO,
            zoom: 0.8,
            dragged: None,
            snapshots_applied: 0,
            last_report: None,
            last_error: None,
            view_scratch: ViewScratch::default(),
            fps_readouts: FpsReadouts::default(),
            frame_stats: FrameStats::default(),
            visible_node_count: 0,
            visible_link_count: 0,
        }
    }

    /// Merges a snapshot and wakes the layout.
    fn apply_snapshot(&mut self, snapshot: GraphSnapshot) {
        let report = reconcile(&mut self.store, snapshot, &mut self.seeder);
        self.interaction
            .retain_existing(&mut self.simulation, &self.store);
        if let Some(dragged) = &self.dragged
            && !self.store.contains_node(dragged)
        {
            self.dragged = None;
        }

        self.simulation.bind(&mut self.store);
        self.simulation.reheat_for(&report);

        if self.snapshots_applied == 0 {
            info!(
                "first snapshot: {} nodes, {} links",
                self.store.node_count(),
                self.store.link_count()
            );
        }
        self.snapshots_applied += 1;
        self.last_error = None;
        self.last_report = Some(report);
    }
}
