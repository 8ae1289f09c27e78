//! Workflow to graph synthesis
//!
//! One trigger node, one node per action chained linearly, and for agent
//! actions a fan of auxiliary nodes: every MCP and the memory hang off the
//! agent, the storage hangs off the memory.

use crate::config::LayoutConfig;
use crate::graph::types::{Direction, FlowGraph, GraphEdge, GraphNode, NodeKind, Point, Size};
use crate::layout::LayoutEngine;
use crate::workflow::{Action, ActionKind, Workflow};
use serde_json::json;
use std::collections::HashSet;

/// Id of the synthetic root node
pub const TRIGGER_ID: &str = "trigger";

/// Build and lay out the graph for a workflow
///
/// The result depends only on `(workflow, direction, config)`.
pub fn build_graph(workflow: &Workflow, direction: Direction, config: &LayoutConfig) -> FlowGraph {
    let mut graph = synthesize(workflow, config);
    LayoutEngine::new(config.clone()).layout(&mut graph, direction);
    graph
}

/// Build the node/edge lists without positions
pub fn synthesize(workflow: &Workflow, config: &LayoutConfig) -> FlowGraph {
    let mut builder = GraphBuilder::new(config);

    builder.push_node(TRIGGER_ID, NodeKind::Trigger, json!({ "trigger": workflow.id }), None);

    let mut previous = TRIGGER_ID.to_string();
    for action in &workflow.actions {
        if !builder.push_node(&action.id, action_node_kind(action), json!({ "action": action }), None) {
            continue;
        }
        builder.push_edge(&previous, &action.id);
        previous = action.id.clone();

        if let Some(inputs) = action.agent_inputs() {
            for mcp in &inputs.mcps {
                let data = json!({ "mcp": mcp, "parentId": action.id });
                if builder.push_node(&mcp.id, NodeKind::Mcp, data, Some(action.id.as_str())) {
                    builder.push_edge(&action.id, &mcp.id);
                }
            }

            let memory = &inputs.memory;
            let data = json!({ "memory": memory, "parentId": action.id });
            if builder.push_node(&memory.id, NodeKind::Memory, data, Some(action.id.as_str())) {
                builder.push_edge(&action.id, &memory.id);

                let storage = &inputs.storage;
                let data = json!({ "storage": storage, "parentId": memory.id });
                if builder.push_node(&storage.id, NodeKind::Storage, data, Some(memory.id.as_str())) {
                    builder.push_edge(&memory.id, &storage.id);
                }
            }
        }
    }

    for edge in &workflow.edges {
        if !builder.is_primary(&edge.source) || !builder.is_primary(&edge.target) {
            tracing::debug!("⏭️ Skipping override edge '{}' with unknown endpoint", edge.id);
            continue;
        }
        builder.push_edge(&edge.source, &edge.target);
    }

    tracing::debug!("🏗️ Synthesized graph for '{}': {} nodes, {} edges",
        workflow.id, builder.graph.nodes.len(), builder.graph.edges.len());

    builder.graph
}

fn action_node_kind(action: &Action) -> NodeKind {
    match action.kind() {
        ActionKind::Email => NodeKind::Email,
        ActionKind::Delay => NodeKind::Delay,
        ActionKind::Agent => NodeKind::Agent,
    }
}

struct GraphBuilder<'a> {
    config: &'a LayoutConfig,
    graph: FlowGraph,
    node_ids: HashSet<String>,
    primary_ids: HashSet<String>,
    edge_keys: HashSet<(String, String)>,
}

impl<'a> GraphBuilder<'a> {
    fn new(config: &'a LayoutConfig) -> Self {
        Self {
            config,
            graph: FlowGraph::default(),
            node_ids: HashSet::new(),
            primary_ids: HashSet::new(),
            edge_keys: HashSet::new(),
        }
    }

    /// Add a node; returns false when the id is already taken
    fn push_node(&mut self, id: &str, kind: NodeKind, data: serde_json::Value, parent_id: Option<&str>) -> bool {
        if !self.node_ids.insert(id.to_string()) {
            tracing::warn!("⚠️ Duplicate node id '{}' ignored", id);
            return false;
        }
        if parent_id.is_none() {
            self.primary_ids.insert(id.to_string());
        }
        let size: Size = if kind.is_auxiliary() {
            self.config.auxiliary_node_size
        } else {
            self.config.default_node_size
        };
        self.graph.nodes.push(GraphNode {
            id: id.to_string(),
            kind,
            data,
            parent_id: parent_id.map(str::to_string),
            position: Point::default(),
            size,
        });
        true
    }

    fn push_edge(&mut self, source: &str, target: &str) {
        if self.edge_keys.insert((source.to_string(), target.to_string())) {
            self.graph.edges.push(GraphEdge::new(source, target));
        }
    }

    fn is_primary(&self, id: &str) -> bool {
        self.primary_ids.contains(id)
    }
}
