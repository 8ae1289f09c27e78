/// Flowboard: headless workflow editor core
///
/// This library turns a workflow (a trigger followed by a chain of actions) into
/// a laid-out node/edge graph and holds the editing state of one editor instance.
/// Rendering is left to the consumer.

// Core configuration and environment overrides
pub mod config;

// Typed library error
pub mod error;

// Workflow data model, action catalogue and JSON load/save
pub mod workflow;

// Graph synthesis - workflow to nodes and edges
pub mod graph;

// Layered auto-layout built on petgraph
pub mod layout;

// Editing state, change notification and scoped provider access
pub mod editor;

// Re-export commonly used types for external consumers
pub use config::Config;
pub use editor::{Editor, Provider};
pub use error::{FlowboardError, Result};
pub use graph::{build_graph, Direction, FlowGraph, GraphEdge, GraphNode, NodeKind, Rect};
pub use workflow::{Action, ActionKind, EngineAction, Workflow, WorkflowEdge};
