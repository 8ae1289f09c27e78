use flowboard::config::LayoutConfig;
use flowboard::graph::{build_graph, Direction, FlowGraph, GraphNode};
use flowboard::workflow::{Action, AgentInputs, Mcp, Memory, Storage, Workflow, WorkflowEdge};

const EPS: f64 = 1e-9;

fn agent(id: &str, mcp_count: usize) -> Action {
    Action::agent(
        "triage",
        AgentInputs {
            mcps: (0..mcp_count)
                .map(|i| Mcp::new(format!("{}-mcp{}", id, i), format!("tool {}", i)))
                .collect(),
            memory: Memory::new("memory").with_id(format!("{}-mem", id)),
            storage: Storage::default().with_id(format!("{}-pg", id)),
        },
    )
    .with_id(id)
}

fn node<'a>(graph: &'a FlowGraph, id: &str) -> &'a GraphNode {
    graph.node(id).unwrap_or_else(|| panic!("missing node {}", id))
}

fn overlaps(a: &GraphNode, b: &GraphNode) -> bool {
    a.position.x < b.position.x + b.size.width - EPS
        && b.position.x < a.position.x + a.size.width - EPS
        && a.position.y < b.position.y + b.size.height - EPS
        && b.position.y < a.position.y + a.size.height - EPS
}

/// Vertical offsets of a node's auxiliary children from its center
fn child_offsets(graph: &FlowGraph, parent: &str) -> Vec<f64> {
    let center = node(graph, parent).center();
    graph
        .nodes
        .iter()
        .filter(|n| n.parent_id.as_deref() == Some(parent))
        .map(|n| n.center().y - center.y)
        .collect()
}

fn assert_symmetric(offsets: &[f64]) {
    let n = offsets.len();
    for i in 0..n {
        assert!((offsets[i] + offsets[n - 1 - i]).abs() < EPS, "offsets {:?} are not symmetric", offsets);
    }
}

#[test]
fn test_auxiliary_offsets_symmetric_for_odd_count() {
    let workflow = Workflow::new("wf", "odd").with_action(agent("ag", 2));
    let config = LayoutConfig::default();

    for direction in [Direction::Down, Direction::Right] {
        let graph = build_graph(&workflow, direction, &config);
        let offsets = child_offsets(&graph, "ag");
        assert_eq!(offsets.len(), 3);
        assert_symmetric(&offsets);
        assert!(offsets[1].abs() < EPS);
        assert!((offsets[2] - offsets[1] - config.auxiliary_spacing).abs() < EPS);
    }
}

#[test]
fn test_auxiliary_offsets_symmetric_for_even_count() {
    let workflow = Workflow::new("wf", "even").with_action(agent("ag", 1));

    for direction in [Direction::Down, Direction::Right] {
        let graph = build_graph(&workflow, direction, &LayoutConfig::default());
        let offsets = child_offsets(&graph, "ag");
        assert_eq!(offsets.len(), 2);
        assert_symmetric(&offsets);
        assert!(offsets.iter().all(|o| o.abs() > EPS), "{}: {:?}", direction, offsets);
    }
}

#[test]
fn test_auxiliary_nodes_sit_right_of_their_parent() {
    let config = LayoutConfig::default();
    let workflow = Workflow::new("wf", "beside")
        .with_action(agent("ag", 2))
        .with_action(Action::delay(10).with_id("d1"));

    for direction in [Direction::Down, Direction::Right] {
        let graph = build_graph(&workflow, direction, &config);
        let ag = node(&graph, "ag");
        for id in ["ag-mcp0", "ag-mcp1", "ag-mem"] {
            let aux = node(&graph, id);
            assert!((aux.position.x - (ag.position.x + ag.size.width + config.auxiliary_offset)).abs() < EPS);
        }
        let mem = node(&graph, "ag-mem");
        let pg = node(&graph, "ag-pg");
        assert!((pg.center().y - mem.center().y).abs() < EPS);
        assert!(pg.position.x > mem.position.x + mem.size.width);

        // the next rank starts past the whole fan when flowing rightwards
        if direction == Direction::Right {
            let d1 = node(&graph, "d1");
            assert!(d1.position.x > pg.position.x + pg.size.width);
        }
    }
}

#[test]
fn test_nothing_overlaps_in_a_branching_workflow() {
    let mut workflow = Workflow::new("wf", "branches")
        .with_action(agent("a1", 3))
        .with_action(Action::delay(10).with_id("d1"))
        .with_action(agent("a2", 1))
        .with_action(Action::email("x@y.z", "done", "").with_id("e1"));
    workflow.edges = vec![
        WorkflowEdge::between("trigger", "a2"),
        WorkflowEdge::between("a1", "e1"),
    ];

    for direction in [Direction::Down, Direction::Right] {
        let graph = build_graph(&workflow, direction, &LayoutConfig::default());
        for (i, a) in graph.nodes.iter().enumerate() {
            for b in &graph.nodes[i + 1..] {
                assert!(!overlaps(a, b), "{} overlaps {} ({})", a.id, b.id, direction);
            }
        }
    }
}

#[test]
fn test_rect_contains_every_node() {
    let workflow = Workflow::new("wf", "rect")
        .with_action(Action::delay(1).with_id("d1"))
        .with_action(agent("ag", 4));
    let graph = build_graph(&workflow, Direction::Down, &LayoutConfig::default());
    let rect = graph.rect;

    for n in &graph.nodes {
        assert!(n.position.x >= rect.x - EPS && n.position.y >= rect.y - EPS);
        assert!(n.position.x + n.size.width <= rect.x + rect.width + EPS);
        assert!(n.position.y + n.size.height <= rect.y + rect.height + EPS);
    }
    assert!(graph.nodes.iter().any(|n| (n.position.x - rect.x).abs() < EPS));
    assert!(graph.nodes.iter().any(|n| (n.position.x + n.size.width - rect.x - rect.width).abs() < EPS));
}

#[test]
fn test_layout_is_deterministic() {
    let mut workflow = Workflow::new("wf", "det")
        .with_action(agent("a1", 2))
        .with_action(Action::delay(1).with_id("d1"))
        .with_action(Action::delay(2).with_id("d2"));
    workflow.edges = vec![WorkflowEdge::between("trigger", "d2"), WorkflowEdge::between("d2", "a1")];

    let config = LayoutConfig::default();
    for direction in [Direction::Down, Direction::Right] {
        let first = build_graph(&workflow, direction, &config);
        for _ in 0..5 {
            assert_eq!(build_graph(&workflow, direction, &config), first);
        }
    }
}
