//! End-to-end tests for `Navigator` over `MemoryStore`.
//!
//! Each test loads snapshots into the store, runs one operation through the
//! navigator, and checks both the result and what reached the store.

use pretty_assertions::assert_eq;
use venue_nav::{
    Anchor, Edge, Error, EstimateMethod, GraphSnapshot, NavConfig, Navigator, Node, NodeId,
    NodeKind, Reading, TurnKind,
};
use venue_nav::positioning::PathLossModel;

fn ground() -> GraphSnapshot {
    GraphSnapshot::new(
        vec![
            Node::new("lobby", "ground", 0.0, 0.0).with_label("the lobby"),
            Node::new("hall", "ground", 100.0, 0.0).with_label("Hall A"),
            Node::new("lift-g", "ground", 100.0, 100.0)
                .with_kind(NodeKind::Elevator)
                .linked_to("lift-1"),
        ],
        vec![
            Edge::new("lobby-hall", "lobby", "hall", 10.0),
            Edge::new("hall-lift", "hall", "lift-g", 10.0),
        ],
    )
}

fn first() -> GraphSnapshot {
    GraphSnapshot::new(
        vec![
            Node::new("lift-1", "first", 100.0, 100.0).with_kind(NodeKind::Elevator),
            Node::new("cafe", "first", 200.0, 100.0).with_label("the cafe"),
        ],
        vec![Edge::new("lift-cafe", "lift-1", "cafe", 10.0)],
    )
}

async fn navigator() -> Navigator<venue_nav::MemoryStore> {
    let nav = Navigator::open_memory().await.unwrap();
    nav.store().put_floor("expo", "ground", ground());
    nav.store().put_floor("expo", "first", first());
    nav
}

// ============================================================================
// Routing through the store
// ============================================================================

#[tokio::test]
async fn test_route_on_one_floor() {
    let nav = navigator().await;
    let route = nav
        .route(&"ground".into(), &"lobby".into(), &"lift-g".into(), false)
        .await
        .unwrap();
    assert_eq!(route.total_distance_m, 20.0);

    let steps = nav.directions(&route);
    assert_eq!(steps[0].text, "Start at the lobby and head toward Hall A for 10 m");
    assert_eq!(steps[1].turn_kind, TurnKind::Left);
    assert_eq!(steps[2].text, "Arrive at the elevator (lift-g)");
}

#[tokio::test]
async fn test_route_unknown_floor() {
    let nav = navigator().await;
    let result = nav.route(&"roof".into(), &"a".into(), &"b".into(), false).await;
    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_route_across_floors() {
    let nav = navigator().await;
    let route = nav
        .route_across_floors("expo", &"lobby".into(), &"cafe".into(), true)
        .await
        .unwrap();
    assert_eq!(route.floor_count(), 2);
    assert_eq!(route.total_distance_m, 30.0);
    assert_eq!(route.transitions[0].to_node, NodeId::from("lift-1"));
}

#[tokio::test]
async fn test_transfer_cost_from_config() {
    let config = NavConfig { floor_transfer_cost_m: 5.0, ..NavConfig::default() };
    let nav = navigator().await.with_config(config);
    let route = nav
        .route_across_floors("expo", &"lobby".into(), &"cafe".into(), false)
        .await
        .unwrap();
    assert_eq!(route.total_distance_m, 35.0);
}

#[tokio::test]
async fn test_optimize_tour() {
    let nav = navigator().await;
    let stops: Vec<NodeId> = vec!["cafe".into(), "hall".into()];
    let tour = nav.optimize_tour("expo", &"lobby".into(), &stops, false).await.unwrap();
    let order: Vec<&str> = tour.ordered_node_ids.iter().map(|n| n.0.as_str()).collect();
    assert_eq!(order, vec!["lobby", "hall", "cafe"]);
    assert_eq!(tour.total_distance_m, 30.0);
}

#[tokio::test]
async fn test_optimize_tour_respects_max_stops() {
    let config = NavConfig { max_stops: 1, ..NavConfig::default() };
    let nav = navigator().await.with_config(config);
    let stops: Vec<NodeId> = vec!["cafe".into(), "hall".into()];
    let result = nav.optimize_tour("expo", &"lobby".into(), &stops, false).await;
    assert!(matches!(result, Err(Error::InvalidInput(_))));
}

// ============================================================================
// Positioning through the store
// ============================================================================

fn anchors() -> Vec<Anchor> {
    let mut upstairs = Anchor::new("up", 50.0, 50.0);
    upstairs.floor_id = Some("first".into());
    vec![
        Anchor::new("a", 0.0, 0.0),
        Anchor::new("b", 10.0, 0.0),
        Anchor::new("c", 0.0, 10.0),
        upstairs,
    ]
}

fn reading_from(anchor: &Anchor, x: f64, y: f64) -> Reading {
    let d = (anchor.x - x).hypot(anchor.y - y);
    Reading::new(anchor.id.clone(), PathLossModel::default().strength_at(d))
}

#[tokio::test]
async fn test_locate_publishes_position() {
    let nav = navigator().await;
    nav.store().put_anchors("expo", anchors());

    let readings: Vec<Reading> = anchors()[..3].iter().map(|a| reading_from(a, 4.0, 3.0)).collect();
    let est = nav
        .locate("expo", "badge-7", Some(&"ground".into()), &readings)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(est.method, EstimateMethod::Trilateration);
    assert!((est.x - 4.0).abs() < 0.5 && (est.y - 3.0).abs() < 0.5);

    let live = nav.store().live_position("expo", "badge-7").unwrap();
    assert_eq!(live.estimate, est);
    assert_eq!(live.floor_id, Some("ground".into()));
    assert_eq!(nav.store().history("badge-7").len(), 1);
}

#[tokio::test]
async fn test_locate_ignores_anchors_on_other_floors() {
    let nav = navigator().await;
    nav.store().put_anchors("expo", anchors());

    let readings = vec![Reading::new("up", -60.0)];
    let est = nav.locate("expo", "badge-7", Some(&"ground".into()), &readings).await.unwrap();
    assert!(est.is_none());
    assert!(nav.store().live_position("expo", "badge-7").is_none());

    // Without a floor every anchor is eligible.
    let est = nav.locate("expo", "badge-7", None, &readings).await.unwrap().unwrap();
    assert_eq!(est.method, EstimateMethod::SingleAnchor);
    assert_eq!((est.x, est.y), (50.0, 50.0));
}

#[tokio::test]
async fn test_locate_without_readings() {
    let nav = navigator().await;
    let est = nav.locate("expo", "badge-1", None, &[]).await.unwrap();
    assert!(est.is_none());
    assert!(nav.store().history("badge-1").is_empty());
}
