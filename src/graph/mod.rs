/// Graph Synthesis Layer
///
/// Derives the node/edge graph an editor renders from a workflow:
/// - Node, edge, size and rectangle types
/// - The workflow to graph builder

// Graph node/edge type definitions
pub mod types;

// Workflow to graph synthesis
pub mod builder;

// Re-export commonly used types
pub use builder::{build_graph, synthesize, TRIGGER_ID};
pub use types::{Direction, FlowGraph, GraphEdge, GraphNode, NodeKind, Point, Rect, Size};
