use std::fmt;
use std::path::PathBuf;
use std::process::Command;
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use log::{info, warn};

use super::GraphSnapshot;

/// Where snapshots come from.
#[derive(Clone, Debug)]
pub enum SnapshotSource {
    File(PathBuf),
    /// Program followed by its arguments; stdout is the snapshot document.
    Command(Vec<String>),
}

impl SnapshotSource {
    pub fn fetch(&self) -> Result<String> {
        match self {
            Self::File(path) => std::fs::read_to_string(path)
                .with_context(|| format!("failed to read snapshot file {}", path.display())),
            Self::Command(argv) => run_command(argv),
        }
    }

    pub fn fetch_snapshot(&self) -> Result<GraphSnapshot> {
        let raw = self.fetch()?;
        GraphSnapshot::parse(&raw).with_context(|| format!("failed to parse snapshot from {self}"))
    }
}

impl fmt::Display for SnapshotSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Command(argv) => write!(f, "`{}`", argv.join(" ")),
        }
    }
}

fn run_command(argv: &[String]) -> Result<String> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| anyhow!("snapshot command is empty"))?;

    let output = Command::new(program)
        .args(args)
        .output()
        .with_context(|| format!("failed to spawn {program} with args: {args:?}"))?;

    if output.status.success() {
        String::from_utf8(output.stdout).context("snapshot command output was not valid UTF-8")
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(anyhow!("snapshot command {program} {args:?} failed: {stderr}"))
    }
}

/// Fetches a snapshot every `interval` on a background thread.
///
/// Each result is sent over the returned channel and followed by a call to
/// `notify`. The thread exits once the receiver is dropped.
pub fn spawn_poller<F>(
    source: SnapshotSource,
    interval: Duration,
    notify: F,
) -> Receiver<Result<GraphSnapshot, String>>
where
    F: Fn() + Send + 'static,
{
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        info!("polling {source} every {:.1}s", interval.as_secs_f32());
        loop {
            let result = source.fetch_snapshot().map_err(|error| format!("{error:#}"));
            if let Err(error) = &result {
                warn!("snapshot fetch failed: {error}");
            }
            if tx.send(result).is_err() {
                break;
            }
            notify();
            thread::sleep(interval);
        }
    });

    rx
}
