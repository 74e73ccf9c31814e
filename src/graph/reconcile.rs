use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;
use indexmap::map::Entry;
use log::{debug, warn};

use crate::snapshot::{GraphSnapshot, NodeRecord};

use super::{GraphStore, Link, LinkKey, Node, PositionSeeder, Seeding, link_key};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    Node,
    Link,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node => f.write_str("node"),
            Self::Link => f.write_str("link"),
        }
    }
}

/// Recoverable conditions met while reading or merging a snapshot. None of
/// them stop the merge.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ReconcileIssue {
    #[error("malformed snapshot: {detail}")]
    MalformedSnapshot { detail: String },
    #[error("link {key} references unknown node {endpoint}; link skipped")]
    DanglingLinkReference { key: LinkKey, endpoint: String },
    #[error("duplicate {kind} identifier {id}; last occurrence kept")]
    DuplicateIdentifier { kind: EntityKind, id: String },
}

#[derive(Clone, Debug, Default)]
pub struct ReconcileReport {
    pub added_nodes: Vec<String>,
    pub removed_nodes: Vec<String>,
    pub updated_nodes: Vec<String>,
    pub added_links: Vec<LinkKey>,
    pub removed_links: Vec<LinkKey>,
    pub updated_links: Vec<LinkKey>,
    /// How each added node got its first position, in `added_nodes` order.
    pub seeding: Vec<Seeding>,
    pub issues: Vec<ReconcileIssue>,
}

impl ReconcileReport {
    /// Whether the node or link sets changed.
    pub fn is_structural(&self) -> bool {
        !(self.added_nodes.is_empty()
            && self.removed_nodes.is_empty()
            && self.added_links.is_empty()
            && self.removed_links.is_empty())
    }

    /// Whether anything at all changed, attributes included.
    pub fn has_changes(&self) -> bool {
        self.is_structural() || !self.updated_nodes.is_empty() || !self.updated_links.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "+{} -{} ~{} nodes, +{} -{} ~{} links",
            self.added_nodes.len(),
            self.removed_nodes.len(),
            self.updated_nodes.len(),
            self.added_links.len(),
            self.removed_links.len(),
            self.updated_links.len(),
        )
    }
}

/// Merges `snapshot` into `store` in place.
///
/// Removals are applied first, then new nodes are seeded (inheriting only
/// from surviving nodes) and prepended, new
/// links appended, and finally allow-listed attributes are copied onto the
/// records both sides share. Positions, velocities and pins of surviving nodes
/// are never touched.
pub fn reconcile(
    store: &mut GraphStore,
    snapshot: GraphSnapshot,
    seeder: &mut PositionSeeder,
) -> ReconcileReport {
    let GraphSnapshot {
        nodes: node_records,
        links: link_records,
        issues,
    } = snapshot;
    let mut report = ReconcileReport {
        issues,
        ..Default::default()
    };

    let mut incoming_nodes: IndexMap<String, NodeRecord> = IndexMap::with_capacity(node_records.len());
    for record in node_records {
        match incoming_nodes.entry(record.id.clone()) {
            Entry::Occupied(mut slot) => {
                report.issues.push(ReconcileIssue::DuplicateIdentifier {
                    kind: EntityKind::Node,
                    id: record.id.clone(),
                });
                slot.insert(record);
            }
            Entry::Vacant(slot) => {
                slot.insert(record);
            }
        }
    }

    let mut incoming_links: IndexMap<LinkKey, Link> = IndexMap::with_capacity(link_records.len());
    for record in link_records {
        let link = Link::from_record(record);
        let key = link_key(&link);
        match incoming_links.entry(key) {
            Entry::Occupied(mut slot) => {
                report.issues.push(ReconcileIssue::DuplicateIdentifier {
                    kind: EntityKind::Link,
                    id: slot.key().to_string(),
                });
                slot.insert(link);
            }
            Entry::Vacant(slot) => {
                slot.insert(link);
            }
        }
    }

    report.removed_nodes = store
        .nodes()
        .iter()
        .filter(|node| !incoming_nodes.contains_key(&node.id))
        .map(|node| node.id.clone())
        .collect();
    let removed_node_ids = report.removed_nodes.iter().cloned().collect::<HashSet<_>>();

    report.removed_links = store
        .links()
        .iter()
        .filter(|link| {
            !incoming_links.contains_key(link_key(link).as_str())
                || removed_node_ids.contains(link.endpoints.source_id())
                || removed_node_ids.contains(link.endpoints.target_id())
        })
        .map(link_key)
        .collect();
    let removed_link_keys = report.removed_links.iter().cloned().collect::<HashSet<_>>();

    if !removed_link_keys.is_empty() {
        store.retain_links(|link| !removed_link_keys.contains(&link_key(link)));
    }
    if !removed_node_ids.is_empty() {
        store.retain_nodes(|node| !removed_node_ids.contains(&node.id));
    }

    let surviving_ids = store.node_ids();
    let survivor_positions = store.positions_by_id();
    let mut added = Vec::new();
    for (id, record) in &incoming_nodes {
        if surviving_ids.contains(id) {
            continue;
        }
        let (position, seeding) = seeder.seed(record, &survivor_positions);
        added.push(Node::from_record(record.clone(), position));
        report.added_nodes.push(id.clone());
        report.seeding.push(seeding);
    }
    store.prepend_nodes(added);

    let existing_links = store.link_keys().into_iter().collect::<HashSet<_>>();
    let mut appended = Vec::new();
    for (key, link) in &incoming_links {
        if existing_links.contains(key) {
            continue;
        }

        let missing = [link.endpoints.source_id(), link.endpoints.target_id()]
            .into_iter()
            .find(|endpoint| !store.contains_node(endpoint));
        if let Some(endpoint) = missing {
            report.issues.push(ReconcileIssue::DanglingLinkReference {
                key: key.clone(),
                endpoint: endpoint.to_owned(),
            });
            continue;
        }

        appended.push(link.clone());
        report.added_links.push(key.clone());
    }
    store.append_links(appended);

    let added_ids = report.added_nodes.iter().collect::<HashSet<_>>();
    for (id, record) in &incoming_nodes {
        if added_ids.contains(id) {
            continue;
        }
        if let Some(node) = store.node_mut(id)
            && node.apply_update(record)
        {
            report.updated_nodes.push(id.clone());
        }
    }

    let added_keys = report.added_links.iter().collect::<HashSet<_>>();
    for link in store.links_mut() {
        let key = link_key(link);
        if added_keys.contains(&key) {
            continue;
        }
        if let Some(incoming) = incoming_links.get(&key)
            && link.apply_update(incoming)
        {
            report.updated_links.push(key);
        }
    }

    if report.has_changes() {
        store.bump_revision();
    }

    for issue in &report.issues {
        warn!("{issue}");
    }
    debug!(
        "reconciled snapshot: {} ({} nodes, {} links stored)",
        report.summary(),
        store.node_count(),
        store.link_count()
    );

    report
}
