use eframe::egui::Vec2;
use live_graph::graph::{Canvas, GraphStore, PositionSeeder, ReconcileReport, reconcile};
use live_graph::interaction::InteractionController;
use live_graph::physics::{ForceSimulation, SimulationConfig, SimulationState};
use live_graph::snapshot::GraphSnapshot;
use serde_json::{Value, json};

fn load(store: &mut GraphStore, seeder: &mut PositionSeeder, value: Value) -> ReconcileReport {
    reconcile(
        store,
        GraphSnapshot::from_value(value).expect("snapshot fixture"),
        seeder,
    )
}

fn ring(count: usize) -> Value {
    let nodes = (0..count)
        .map(|index| json!({"id": format!("n{index}"), "group": index}))
        .collect::<Vec<_>>();
    let links = (0..count)
        .map(|index| json!({"source": format!("n{index}"), "target": format!("n{}", (index + 1) % count)}))
        .collect::<Vec<_>>();
    json!({"nodes": nodes, "links": links})
}

fn run_until_settled(simulation: &mut ForceSimulation, store: &mut GraphStore) -> usize {
    let mut ticks = 0;
    while simulation.tick(store).is_some() {
        ticks += 1;
        assert!(ticks < 2000, "simulation never settled");
    }
    ticks
}

#[test]
fn layout_settles_and_wakes_on_new_snapshots() {
    let mut store = GraphStore::new();
    let mut seeder = PositionSeeder::with_seed(Canvas::default(), 9);
    load(&mut store, &mut seeder, ring(12));

    let mut simulation = ForceSimulation::new(SimulationConfig::default());
    run_until_settled(&mut simulation, &mut store);
    assert_eq!(simulation.state(), SimulationState::Stopped);

    for node in store.nodes() {
        let position = node.position();
        assert!(position.x.is_finite() && position.y.is_finite());
    }

    let report = load(&mut store, &mut seeder, ring(13));
    simulation.bind(&mut store);
    simulation.reheat_for(&report);
    assert_eq!(simulation.state(), SimulationState::Cooling);
    assert!(simulation.alpha() >= simulation.config().reheat_alpha);

    let ticks = run_until_settled(&mut simulation, &mut store);
    assert!(ticks > 0);
    assert_eq!(store.node_count(), 13);
    assert_eq!(store.link_count(), 13);
}

#[test]
fn unchanged_snapshot_wakes_the_layout_gently() {
    let mut store = GraphStore::new();
    let mut seeder = PositionSeeder::with_seed(Canvas::default(), 3);
    load(&mut store, &mut seeder, ring(8));

    let mut simulation = ForceSimulation::new(SimulationConfig::default());
    run_until_settled(&mut simulation, &mut store);
    assert_eq!(simulation.state(), SimulationState::Stopped);

    let report = load(&mut store, &mut seeder, ring(8));
    assert!(!report.has_changes());
    simulation.bind(&mut store);
    simulation.reheat_for(&report);

    assert_eq!(simulation.state(), SimulationState::Cooling);
    assert!(simulation.alpha() < simulation.config().reheat_alpha);
    assert!(simulation.tick(&mut store).is_some());
    run_until_settled(&mut simulation, &mut store);
    assert_eq!(simulation.state(), SimulationState::Stopped);
}

#[test]
fn repelling_nodes_spread_apart() {
    let mut store = GraphStore::new();
    let mut seeder = PositionSeeder::with_seed(Canvas::default(), 5);
    load(
        &mut store,
        &mut seeder,
        json!({
            "nodes": [{"id": "a", "ix": 495, "iy": 500}, {"id": "b", "ix": 505, "iy": 500}],
            "links": [],
        }),
    );

    let mut simulation = ForceSimulation::new(SimulationConfig::default());
    run_until_settled(&mut simulation, &mut store);

    let a = store.node("a").unwrap().position();
    let b = store.node("b").unwrap().position();
    assert!((a - b).length() > 10.0);
    assert!(a.x < b.x);
}

#[test]
fn dragging_holds_a_node_and_releasing_lets_it_cool() {
    let mut store = GraphStore::new();
    let mut seeder = PositionSeeder::with_seed(Canvas::default(), 11);
    load(&mut store, &mut seeder, ring(6));

    let mut simulation = ForceSimulation::new(SimulationConfig::default());
    run_until_settled(&mut simulation, &mut store);

    let mut controller = InteractionController::new();
    assert!(controller.drag_start(&mut simulation, &mut store, "n0"));
    assert_eq!(simulation.state(), SimulationState::Warmed);

    let target = Vec2::new(100.0, 120.0);
    for _ in 0..60 {
        controller.drag_move(&mut simulation, &mut store, "n0", target);
        assert!(simulation.tick(&mut store).is_some());
    }
    assert_eq!(store.node("n0").unwrap().position(), target);
    assert!(simulation.alpha() > simulation.config().alpha_min);

    let neighbour = store.node("n1").unwrap().position();
    let far = store.node("n3").unwrap().position();
    assert!((neighbour - target).length() < (far - target).length());

    assert!(controller.drag_end(&mut simulation, &mut store, "n0"));
    assert_eq!(simulation.state(), SimulationState::Cooling);
    run_until_settled(&mut simulation, &mut store);
    assert_eq!(simulation.state(), SimulationState::Stopped);
    assert!(store.node("n0").unwrap().pin().is_none());
}

#[test]
fn removed_pinned_node_releases_the_gesture() {
    let mut store = GraphStore::new();
    let mut seeder = PositionSeeder::with_seed(Canvas::default(), 2);
    load(&mut store, &mut seeder, ring(4));

    let mut simulation = ForceSimulation::new(SimulationConfig::default());
    let mut controller = InteractionController::new();
    controller.drag_start(&mut simulation, &mut store, "n2");

    load(&mut store, &mut seeder, ring(2));
    controller.retain_existing(&mut simulation, &store);
    simulation.bind(&mut store);

    assert!(!controller.has_active_drag());
    assert_eq!(simulation.alpha_target(), 0.0);
    assert!(simulation.tick(&mut store).is_some());
}
