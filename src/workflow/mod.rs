/// Workflow Management Layer
///
/// This module handles workflow definitions and the engine action catalogue.
/// It provides:
/// - Type definitions (Workflow, Action, Mcp, Memory, Storage, WorkflowEdge)
/// - The catalogue of actions an editor may append
/// - JSON load/save for workflow files

// Core workflow type definitions
pub mod types;

// Engine action catalogue
pub mod catalogue;

// JSON file persistence used by the CLI
pub mod io;

// Re-export commonly used types
pub use catalogue::{ActionCatalogue, EngineAction};
pub use io::{check_node_ids, load_workflow, save_workflow};
pub use types::{
    Action, ActionBody, ActionKind, AgentInputs, Mcp, McpTransport, Memory, Storage, StorageType,
    Workflow, WorkflowEdge,
};
