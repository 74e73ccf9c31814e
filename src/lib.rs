//! Incremental reconciliation and force layout for a graph that is
//! re-snapshotted while it is on screen.
//!
//! Snapshots are merged into a [`graph::GraphStore`] in place so that nodes
//! keep their identity, position and velocity across updates, and a
//! [`physics::ForceSimulation`] keeps the layout moving smoothly. The `app`
//! module wires both into an eframe viewer.

pub mod app;
pub mod graph;
pub mod interaction;
pub mod physics;
pub mod snapshot;
pub mod style;
