use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use live_graph::app::{LiveGraphApp, RenderStyle, ViewerOptions};
use live_graph::graph::Canvas;
use live_graph::physics::SimulationConfig;
use live_graph::snapshot::SnapshotSource;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Snapshot document to re-read on every poll.
    #[arg(long, conflicts_with = "command", required_unless_present = "command")]
    file: Option<PathBuf>,

    /// Program (and arguments) whose stdout is the snapshot document.
    #[arg(long, num_args = 1.., allow_hyphen_values = true)]
    command: Option<Vec<String>>,

    #[arg(long, default_value_t = 2.0)]
    interval_secs: f64,

    #[arg(long, default_value_t = 1000.0)]
    width: f32,

    #[arg(long, default_value_t = 1000.0)]
    height: f32,

    /// Charge for nodes without their own; negative repels.
    #[arg(long, default_value_t = -100.0, allow_hyphen_values = true)]
    charge: f32,

    #[arg(long, default_value_t = 30.0)]
    link_distance: f32,

    /// Fixed link strength. Defaults to one over the smaller endpoint degree.
    #[arg(long)]
    link_strength: Option<f32>,

    #[arg(long, default_value_t = 0.4)]
    velocity_decay: f32,

    #[arg(long)]
    no_collide: bool,

    /// Seed for random placement of new nodes.
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, value_enum, default_value_t = RenderStyle::Bubble)]
    style: RenderStyle,
}

impl Args {
    fn source(&self) -> SnapshotSource {
        match (&self.file, &self.command) {
            (Some(path), _) => SnapshotSource::File(path.clone()),
            (None, Some(argv)) => SnapshotSource::Command(argv.clone()),
            (None, None) => SnapshotSource::Command(Vec::new()),
        }
    }

    fn simulation(&self) -> SimulationConfig {
        SimulationConfig {
            canvas: Canvas::new(self.width, self.height),
            default_charge: self.charge,
            link_distance: self.link_distance,
            link_strength: self.link_strength,
            velocity_decay: self.velocity_decay,
            collide: !self.no_collide,
            ..SimulationConfig::default()
        }
    }
}

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let options = ViewerOptions {
        source: args.source(),
        interval: Duration::from_secs_f64(args.interval_secs.max(0.05)),
        simulation: args.simulation(),
        seed: args.seed,
        style: args.style,
    };

    let native_options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "live-graph",
        native_options,
        Box::new(move |cc| Ok(Box::new(LiveGraphApp::new(cc, options)))),
    )
}
