//! Authoritative in-memory graph: nodes and links keyed by stable identifiers.
//!
//! Nodes live in an ordered arena (`Vec<Node>`) whose order is also the draw
//! order. Links refer to nodes either by raw identifier, as they arrive in a
//! snapshot, or by [`NodeRef`] once the simulation has bound them.

mod key;
mod reconcile;
mod seed;

use std::collections::{HashMap, HashSet};

use eframe::egui::Vec2;
use serde_json::Value;

use crate::snapshot::{LinkRecord, NodeRecord};

pub use key::{LinkKey, link_key};
pub use reconcile::{EntityKind, ReconcileIssue, ReconcileReport, reconcile};
pub use seed::{Canvas, PositionSeeder, Seeding};

/// Lenient scalar read from snapshot JSON.
#[derive(Clone, Debug, PartialEq)]
pub enum Measure {
    Number(f64),
    Text(String),
    Invalid,
}

impl Measure {
    /// `null` reads as absent.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Number(number) => Some(number.as_f64().map_or(Self::Invalid, Self::Number)),
            Value::String(text) => Some(Self::Text(text.clone())),
            _ => Some(Self::Invalid),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Self::Number(value) => *value,
            Self::Text(text) => text.trim().parse::<f64>().ok()?,
            Self::Invalid => return None,
        };
        value.is_finite().then_some(value)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum NodeStatus {
    #[default]
    Normal,
    Darken,
    Other(String),
}

impl NodeStatus {
    pub fn from_label(label: Option<&str>) -> Self {
        match label.map(str::trim) {
            None | Some("") | Some("normal") => Self::Normal,
            Some("darken") | Some("degraded") => Self::Darken,
            Some(other) => Self::Other(other.to_owned()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Normal => "normal",
            Self::Darken => "darken",
            Self::Other(other) => other.as_str(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Node {
    pub id: String,
    pub group: i64,
    pub status: NodeStatus,
    pub value: Option<f64>,
    pub charge: Option<f32>,
    pub darken: Option<bool>,
    pub opacity: Option<f32>,
    pub class: Option<String>,
    pub label: Option<String>,
    pub inherit: Option<String>,
    pub hint_x: Option<f32>,
    pub hint_y: Option<f32>,
    pub(crate) position: Vec2,
    pub(crate) velocity: Vec2,
    pub(crate) pin: Option<Vec2>,
}

impl Node {
    pub(crate) fn from_record(record: NodeRecord, position: Vec2) -> Self {
        let mut node = Self {
            id: record.id.clone(),
            group: 0,
            status: NodeStatus::Normal,
            value: None,
            charge: None,
            darken: None,
            opacity: None,
            class: record.class.clone(),
            label: record.label.clone(),
            inherit: record.inherit.clone(),
            hint_x: record.ix,
            hint_y: record.iy,
            position,
            velocity: Vec2::ZERO,
            pin: None,
        };
        node.apply_update(&record);
        node
    }

    /// Copies the allow-listed attributes; returns whether any of them changed.
    pub(crate) fn apply_update(&mut self, record: &NodeRecord) -> bool {
        let status = NodeStatus::from_label(record.status.as_deref());
        let value = record.value.as_ref().and_then(Measure::from_json).and_then(|m| m.as_f64());
        let changed = self.group != record.group
            || self.status != status
            || self.value != value
            || self.charge != record.charge
            || self.darken != record.darken
            || self.opacity != record.opacity;

        self.group = record.group;
        self.status = status;
        self.value = value;
        self.charge = record.charge;
        self.darken = record.darken;
        self.opacity = record.opacity;
        changed
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn pin(&self) -> Option<Vec2> {
        self.pin
    }

    pub fn is_darkened(&self) -> bool {
        self.status == NodeStatus::Darken || self.darken == Some(true)
    }

    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }
}

/// Endpoint reference produced by binding: the node id plus its arena index
/// at bind time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeRef {
    pub id: String,
    pub index: usize,
}

/// Endpoint form of a link. Its accessors live beside [`link_key`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Endpoints {
    Raw { source: String, target: String },
    Resolved { source: NodeRef, target: NodeRef },
}

#[derive(Clone, Debug)]
pub struct Link {
    pub id: Option<String>,
    pub endpoints: Endpoints,
    pub value: Option<Measure>,
    pub distance: Option<f32>,
}

impl Link {
    pub fn raw(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: None,
            endpoints: Endpoints::Raw {
                source: source.into(),
                target: target.into(),
            },
            value: None,
            distance: None,
        }
    }

    pub(crate) fn from_record(record: LinkRecord) -> Self {
        Self {
            id: record.id.filter(|id| !id.is_empty()),
            endpoints: Endpoints::Raw {
                source: record.source,
                target: record.target,
            },
            value: record.value.as_ref().and_then(Measure::from_json),
            distance: record.distance,
        }
    }

    pub(crate) fn apply_update(&mut self, incoming: &Link) -> bool {
        let changed = self.value != incoming.value || self.distance != incoming.distance;
        self.value = incoming.value.clone();
        self.distance = incoming.distance;
        changed
    }

    pub fn key(&self) -> LinkKey {
        link_key(self)
    }
}

#[derive(Debug, Default)]
pub struct GraphStore {
    nodes: Vec<Node>,
    links: Vec<Link>,
    index_by_id: HashMap<String, usize>,
    revision: u64,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Bumped on every mutation that invalidates bound simulation terms.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.index_by_id.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index_of(id).map(|index| &self.nodes[index])
    }

    pub(crate) fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        let index = self.index_of(id)?;
        self.nodes.get_mut(index)
    }

    pub fn link(&self, key: &str) -> Option<&Link> {
        self.links.iter().find(|link| link.key().as_str() == key)
    }

    pub fn link_keys(&self) -> Vec<LinkKey> {
        self.links.iter().map(link_key).collect()
    }

    pub(crate) fn positions_by_id(&self) -> HashMap<String, Vec2> {
        self.nodes
            .iter()
            .map(|node| (node.id.clone(), node.position))
            .collect()
    }

    pub(crate) fn retain_nodes(&mut self, keep: impl Fn(&Node) -> bool) {
        self.nodes.retain(|node| keep(node));
        self.reindex();
    }

    pub(crate) fn retain_links(&mut self, keep: impl Fn(&Link) -> bool) {
        self.links.retain(|link| keep(link));
    }

    /// New nodes go in front, keeping their relative order.
    pub(crate) fn prepend_nodes(&mut self, nodes: Vec<Node>) {
        if nodes.is_empty() {
            return;
        }
        self.nodes.splice(0..0, nodes);
        self.reindex();
    }

    pub(crate) fn append_links(&mut self, links: Vec<Link>) {
        self.links.extend(links);
    }

    pub(crate) fn links_mut(&mut self) -> &mut [Link] {
        &mut self.links
    }

    pub(crate) fn bump_revision(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    /// Rewrites every link to the resolved form against the current arena and
    /// drops links whose endpoints are gone. Returns the dropped keys.
    pub(crate) fn resolve_links(&mut self) -> Vec<LinkKey> {
        let index_by_id = &self.index_by_id;
        let mut dropped = Vec::new();
        self.links.retain_mut(|link| {
            let source = index_by_id.get(link.endpoints.source_id()).copied();
            let target = index_by_id.get(link.endpoints.target_id()).copied();
            let (Some(source), Some(target)) = (source, target) else {
                dropped.push(link_key(link));
                return false;
            };

            link.endpoints = Endpoints::Resolved {
                source: NodeRef {
                    id: link.endpoints.source_id().to_owned(),
                    index: source,
                },
                target: NodeRef {
                    id: link.endpoints.target_id().to_owned(),
                    index: target,
                },
            };
            true
        });
        if !dropped.is_empty() {
            self.bump_revision();
        }
        dropped
    }

    pub(crate) fn node_ids(&self) -> HashSet<String> {
        self.index_by_id.keys().cloned().collect()
    }

    fn reindex(&mut self) {
        self.index_by_id.clear();
        self.index_by_id.reserve(self.nodes.len());
        for (index, node) in self.nodes.iter().enumerate() {
            self.index_by_id.insert(node.id.clone(), index);
        }
    }
}
