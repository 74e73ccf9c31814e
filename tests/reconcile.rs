use std::collections::HashMap;

use live_graph::graph::{
    Canvas, EntityKind, GraphStore, Link, PositionSeeder, ReconcileIssue, Seeding, link_key,
    reconcile,
};
use live_graph::physics::{ForceSimulation, SimulationConfig};
use live_graph::snapshot::GraphSnapshot;
use live_graph::style::link_stroke_weight;
use serde_json::{Value, json};

fn snapshot(value: Value) -> GraphSnapshot {
    GraphSnapshot::from_value(value).expect("snapshot fixture")
}

fn seeder() -> PositionSeeder {
    PositionSeeder::with_seed(Canvas::default(), 42)
}

fn positions(store: &GraphStore) -> HashMap<String, (f32, f32)> {
    store
        .nodes()
        .iter()
        .map(|node| (node.id.clone(), (node.position().x, node.position().y)))
        .collect()
}

fn node_ids(store: &GraphStore) -> Vec<&str> {
    store.nodes().iter().map(|node| node.id.as_str()).collect()
}

fn link_keys(store: &GraphStore) -> Vec<String> {
    store.links().iter().map(|link| link_key(link).to_string()).collect()
}

fn triangle() -> Value {
    json!({
        "nodes": [{"id": "a", "group": 1}, {"id": "b", "group": 2}, {"id": "c", "group": 3}],
        "links": [
            {"source": "a", "target": "b", "value": 4},
            {"source": "b", "target": "c"},
            {"source": "c", "target": "a", "distance": 60},
        ],
    })
}

#[test]
fn reconciling_the_same_snapshot_twice_changes_nothing() {
    let mut store = GraphStore::new();
    let mut seeder = seeder();

    let first = reconcile(&mut store, snapshot(triangle()), &mut seeder);
    assert_eq!(first.added_nodes.len(), 3);
    assert_eq!(first.added_links.len(), 3);
    let before = positions(&store);
    let revision = store.revision();

    let second = reconcile(&mut store, snapshot(triangle()), &mut seeder);

    assert!(second.added_nodes.is_empty());
    assert!(second.removed_nodes.is_empty());
    assert!(second.added_links.is_empty());
    assert!(second.removed_links.is_empty());
    assert!(!second.has_changes());
    assert_eq!(positions(&store), before);
    assert_eq!(store.revision(), revision);
}

#[test]
fn idempotent_after_the_simulation_resolved_links() {
    let mut store = GraphStore::new();
    let mut seeder = seeder();
    reconcile(&mut store, snapshot(triangle()), &mut seeder);

    let mut simulation = ForceSimulation::new(SimulationConfig::default());
    for _ in 0..10 {
        simulation.tick(&mut store);
    }
    assert!(store.links().iter().all(|link| link.endpoints.is_resolved()));
    let before = positions(&store);

    let report = reconcile(&mut store, snapshot(triangle()), &mut seeder);

    assert!(!report.is_structural());
    assert_eq!(store.link_count(), 3);
    assert_eq!(positions(&store), before);
}

#[test]
fn surviving_nodes_keep_their_position_through_attribute_changes() {
    let mut store = GraphStore::new();
    let mut seeder = seeder();
    reconcile(&mut store, snapshot(triangle()), &mut seeder);
    let before = positions(&store);

    let report = reconcile(
        &mut store,
        snapshot(json!({
            "nodes": [
                {"id": "a", "group": 7, "status": "darken", "value": 12},
                {"id": "b", "group": 2},
                {"id": "c", "group": 3, "charge": -300},
            ],
            "links": [],
        })),
        &mut seeder,
    );

    assert_eq!(report.removed_links.len(), 3);
    assert_eq!(positions(&store), before);

    let a = store.node("a").unwrap();
    assert_eq!(a.group, 7);
    assert!(a.is_darkened());
    assert_eq!(a.value, Some(12.0));
    assert_eq!(store.node("c").unwrap().charge, Some(-300.0));
}

#[test]
fn inheriting_node_starts_at_its_surviving_predecessor() {
    let mut store = GraphStore::new();
    let mut seeder = seeder();
    reconcile(
        &mut store,
        snapshot(json!({"nodes": [{"id": "old", "ix": 123, "iy": 456}], "links": []})),
        &mut seeder,
    );

    let report = reconcile(
        &mut store,
        snapshot(json!({
            "nodes": [{"id": "old"}, {"id": "new", "inherit": "old"}],
            "links": [],
        })),
        &mut seeder,
    );

    assert_eq!(report.added_nodes, vec!["new".to_owned()]);
    assert_eq!(report.seeding, vec![Seeding::Inherited]);
    let new = store.node("new").unwrap();
    assert_eq!((new.position().x, new.position().y), (123.0, 456.0));
}

#[test]
fn removed_predecessor_is_not_inherited() {
    let mut store = GraphStore::new();
    let mut seeder = seeder();
    reconcile(
        &mut store,
        snapshot(json!({"nodes": [{"id": "old", "ix": 123, "iy": 456}], "links": []})),
        &mut seeder,
    );

    let report = reconcile(
        &mut store,
        snapshot(json!({
            "nodes": [
                {"id": "hinted", "inherit": "old", "ix": 10, "iy": 20},
                {"id": "random", "inherit": "old"},
            ],
            "links": [],
        })),
        &mut seeder,
    );

    assert_eq!(report.removed_nodes, vec!["old".to_owned()]);
    assert_eq!(report.seeding, vec![Seeding::Hinted, Seeding::Random]);
    let hinted = store.node("hinted").unwrap();
    assert_eq!((hinted.position().x, hinted.position().y), (10.0, 20.0));
    let random = store.node("random").unwrap().position();
    assert!((300.0..700.0).contains(&random.x) && (300.0..700.0).contains(&random.y));
}

#[test]
fn mistyped_attributes_do_not_remove_live_nodes() {
    let mut store = GraphStore::new();
    let mut seeder = seeder();
    reconcile(
        &mut store,
        snapshot(json!({
            "nodes": [{"id": "a"}, {"id": "b"}],
            "links": [{"source": "a", "target": "b"}],
        })),
        &mut seeder,
    );
    let before = positions(&store);

    let report = reconcile(
        &mut store,
        snapshot(json!({
            "nodes": [{"id": "a", "label": 42}, {"id": "b", "group": 2.0}],
            "links": [{"source": "a", "target": "b"}],
        })),
        &mut seeder,
    );

    assert!(report.removed_nodes.is_empty());
    assert!(report.removed_links.is_empty());
    assert_eq!(positions(&store), before);
    assert_eq!(link_keys(&store), vec!["a-b".to_owned()]);
    assert_eq!(store.node("b").unwrap().group, 2);
    assert_eq!(report.updated_nodes, vec!["b".to_owned()]);
    assert!(
        report
            .issues
            .iter()
            .all(|issue| matches!(issue, ReconcileIssue::MalformedSnapshot { detail } if detail.contains("nodes[0].label")))
    );
    assert_eq!(report.issues.len(), 1);
}

#[test]
fn raw_and_resolved_links_share_a_key() {
    let mut store = GraphStore::new();
    let mut seeder = seeder();
    reconcile(&mut store, snapshot(triangle()), &mut seeder);
    let raw = link_keys(&store);

    let mut simulation = ForceSimulation::new(SimulationConfig::default());
    simulation.bind(&mut store);
    assert!(store.links().iter().all(|link| link.endpoints.is_resolved()));

    assert_eq!(link_keys(&store), raw);
    assert_eq!(link_key(&Link::raw("a", "b")).as_str(), "a-b");
    assert!(store.link("a-b").is_some());
}

#[test]
fn link_values_map_to_stroke_weights() {
    let mut store = GraphStore::new();
    let mut seeder = seeder();
    reconcile(
        &mut store,
        snapshot(json!({
            "nodes": [{"id": "a"}, {"id": "b"}, {"id": "c"}, {"id": "d"}, {"id": "e"}],
            "links": [
                {"source": "a", "target": "b", "value": 0},
                {"source": "a", "target": "c", "value": -1},
                {"source": "a", "target": "d", "value": 9},
                {"source": "a", "target": "e"},
            ],
        })),
        &mut seeder,
    );

    let weight = |key: &str| link_stroke_weight(store.link(key).unwrap().value.as_ref());
    assert_eq!(weight("a-b"), 0.0);
    assert_eq!(weight("a-c"), 1.0);
    assert_eq!(weight("a-d"), 3.0);
    assert_eq!(weight("a-e"), 1.0);
}

#[test]
fn removed_nodes_take_their_links_with_them() {
    let mut store = GraphStore::new();
    let mut seeder = seeder();
    reconcile(
        &mut store,
        snapshot(json!({
            "nodes": [{"id": "a"}, {"id": "b"}, {"id": "c"}],
            "links": [{"source": "a", "target": "b"}, {"source": "b", "target": "c"}],
        })),
        &mut seeder,
    );

    let report = reconcile(
        &mut store,
        snapshot(json!({"nodes": [{"id": "a"}, {"id": "c"}], "links": []})),
        &mut seeder,
    );

    let mut ids = node_ids(&store);
    ids.sort_unstable();
    assert_eq!(ids, vec!["a", "c"]);
    assert_eq!(store.link_count(), 0);
    assert_eq!(report.removed_nodes, vec!["b".to_owned()]);
    assert_eq!(report.removed_links.len(), 2);
    assert_eq!(store.index_of("c"), Some(1));
}

#[test]
fn links_to_a_removed_node_go_even_if_still_listed() {
    let mut store = GraphStore::new();
    let mut seeder = seeder();
    reconcile(
        &mut store,
        snapshot(json!({
            "nodes": [{"id": "a"}, {"id": "b"}],
            "links": [{"source": "a", "target": "b"}],
        })),
        &mut seeder,
    );

    let report = reconcile(
        &mut store,
        snapshot(json!({
            "nodes": [{"id": "a"}],
            "links": [{"source": "a", "target": "b"}],
        })),
        &mut seeder,
    );

    assert_eq!(store.link_count(), 0);
    assert_eq!(report.removed_links.len(), 1);
    assert!(report.issues.contains(&ReconcileIssue::DanglingLinkReference {
        key: "a-b".into(),
        endpoint: "b".to_owned(),
    }));
}

#[test]
fn renamed_and_regrouped_scenario() {
    let mut store = GraphStore::new();
    let mut seeder = seeder();
    reconcile(
        &mut store,
        snapshot(json!({"nodes": [{"id": "x", "group": 1}], "links": []})),
        &mut seeder,
    );
    let x_before = store.node("x").unwrap().position();

    reconcile(
        &mut store,
        snapshot(json!({
            "nodes": [{"id": "x", "group": 2}, {"id": "y", "group": 1, "inherit": "x"}],
            "links": [{"source": "x", "target": "y", "value": 4}],
        })),
        &mut seeder,
    );

    let x = store.node("x").unwrap();
    assert_eq!(x.position(), x_before);
    assert_eq!(x.group, 2);
    assert_eq!(store.node("y").unwrap().position(), x_before);
    assert_eq!(link_keys(&store), vec!["x-y".to_owned()]);
    assert_eq!(
        link_stroke_weight(store.link("x-y").unwrap().value.as_ref()),
        2.0
    );
}

#[test]
fn dangling_links_are_skipped_and_reported() {
    let mut store = GraphStore::new();
    let mut seeder = seeder();

    let report = reconcile(
        &mut store,
        snapshot(json!({
            "nodes": [{"id": "a"}, {"id": "b"}],
            "links": [{"source": "a", "target": "ghost"}, {"source": "a", "target": "b"}],
        })),
        &mut seeder,
    );

    assert_eq!(link_keys(&store), vec!["a-b".to_owned()]);
    assert_eq!(report.added_nodes.len(), 2);
    assert_eq!(
        report.issues,
        vec![ReconcileIssue::DanglingLinkReference {
            key: "a-ghost".into(),
            endpoint: "ghost".to_owned(),
        }]
    );
}

#[test]
fn duplicate_ids_keep_the_last_occurrence() {
    let mut store = GraphStore::new();
    let mut seeder = seeder();

    let report = reconcile(
        &mut store,
        snapshot(json!({
            "nodes": [{"id": "a", "group": 1}, {"id": "b"}, {"id": "a", "group": 5}],
            "links": [
                {"source": "a", "target": "b", "value": 1},
                {"source": "a", "target": "b", "value": 16},
            ],
        })),
        &mut seeder,
    );

    assert_eq!(store.node_count(), 2);
    assert_eq!(store.node("a").unwrap().group, 5);
    assert_eq!(store.link_count(), 1);
    assert_eq!(
        link_stroke_weight(store.link("a-b").unwrap().value.as_ref()),
        4.0
    );
    assert!(report.issues.contains(&ReconcileIssue::DuplicateIdentifier {
        kind: EntityKind::Node,
        id: "a".to_owned(),
    }));
    assert!(report.issues.contains(&ReconcileIssue::DuplicateIdentifier {
        kind: EntityKind::Link,
        id: "a-b".to_owned(),
    }));
}

#[test]
fn new_nodes_are_prepended_and_new_links_appended() {
    let mut store = GraphStore::new();
    let mut seeder = seeder();
    reconcile(
        &mut store,
        snapshot(json!({
            "nodes": [{"id": "a"}, {"id": "b"}],
            "links": [{"source": "a", "target": "b"}],
        })),
        &mut seeder,
    );

    reconcile(
        &mut store,
        snapshot(json!({
            "nodes": [{"id": "a"}, {"id": "b"}, {"id": "c"}, {"id": "d"}],
            "links": [
                {"source": "c", "target": "d"},
                {"source": "a", "target": "b"},
                {"source": "b", "target": "c"},
            ],
        })),
        &mut seeder,
    );

    assert_eq!(node_ids(&store), vec!["c", "d", "a", "b"]);
    assert_eq!(link_keys(&store), vec!["a-b", "c-d", "b-c"]);
    for (index, node) in store.nodes().iter().enumerate() {
        assert_eq!(store.index_of(&node.id), Some(index));
    }
}

#[test]
fn malformed_collections_degrade_to_empty() {
    let mut store = GraphStore::new();
    let mut seeder = seeder();

    let report = reconcile(
        &mut store,
        snapshot(json!({"nodes": [{"id": "a"}, {"group": 3}], "links": "nope"})),
        &mut seeder,
    );

    assert_eq!(node_ids(&store), vec!["a"]);
    assert_eq!(store.link_count(), 0);
    let malformed = report
        .issues
        .iter()
        .filter(|issue| matches!(issue, ReconcileIssue::MalformedSnapshot { .. }))
        .count();
    assert_eq!(malformed, 2);
}

#[test]
fn link_attribute_updates_apply_in_place() {
    let mut store = GraphStore::new();
    let mut seeder = seeder();
    reconcile(&mut store, snapshot(triangle()), &mut seeder);
    let revision = store.revision();

    let mut changed = triangle();
    changed["links"][0]["value"] = json!(25);
    changed["links"][1]["distance"] = json!(90);
    let report = reconcile(&mut store, snapshot(changed), &mut seeder);

    assert!(!report.is_structural());
    assert!(report.has_changes());
    assert!(store.revision() > revision);
    assert_eq!(
        link_stroke_weight(store.link("a-b").unwrap().value.as_ref()),
        5.0
    );
    assert_eq!(store.link("b-c").unwrap().distance, Some(90.0));
}
