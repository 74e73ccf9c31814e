mod parse;
mod source;

pub use parse::{GraphSnapshot, LinkRecord, NodeRecord};
pub use source::{SnapshotSource, spawn_poller};
