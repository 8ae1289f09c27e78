/// Editing State Layer
///
/// This module holds the state of one editor instance:
/// - The working copy of the workflow and its CRUD-style edits
/// - Selection, blank placeholder and sidebar state
/// - Scoped, thread-local access to the active editor

// Working copy and edit operations
pub mod state;

// Scoped provider access
pub mod provider;

// Re-export main types
pub use provider::{use_provider, use_workflow, Provider};
pub use state::{BlankNode, ChangeCallback, Editor, NodeSelectionChange, SidebarPosition, BLANK_ID};
