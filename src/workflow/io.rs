//! JSON load/save for workflow files
//!
//! Workflows are exchanged as pretty-printed JSON. There is no database;
//! the file on disk is the only copy the CLI edits.

use crate::editor::BLANK_ID;
use crate::error::{FlowboardError, Result};
use crate::graph::TRIGGER_ID;
use crate::workflow::types::Workflow;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Ids the graph gives to nodes no action owns
const RESERVED_NODE_IDS: [&str; 2] = [TRIGGER_ID, BLANK_ID];

pub fn to_json(workflow: &Workflow) -> Result<String> {
    Ok(serde_json::to_string_pretty(workflow)?)
}

pub fn from_json(raw: &str) -> Result<Workflow> {
    let workflow = serde_json::from_str::<Workflow>(raw)?;
    check_node_ids(&workflow)?;
    Ok(workflow)
}

/// Reject node ids that collide with synthetic nodes or with each other
pub fn check_node_ids(workflow: &Workflow) -> Result<()> {
    let mut seen = HashSet::new();
    for id in workflow.node_ids() {
        if RESERVED_NODE_IDS.contains(&id) {
            return Err(FlowboardError::ReservedNodeId(id.to_string()));
        }
        if !seen.insert(id) {
            return Err(FlowboardError::DuplicateNodeId(id.to_string()));
        }
    }
    Ok(())
}

/// Read a workflow from a JSON file
pub fn load_workflow(path: &Path) -> Result<Workflow> {
    let raw = fs::read_to_string(path)?;
    let workflow = from_json(&raw)?;
    tracing::debug!("📥 Loaded workflow '{}' with {} actions from {}",
        workflow.id, workflow.actions.len(), path.display());
    Ok(workflow)
}

/// Write a workflow to a JSON file, replacing its contents
pub fn save_workflow(path: &Path, workflow: &Workflow) -> Result<()> {
    fs::write(path, to_json(workflow)?)?;
    tracing::debug!("💾 Saved workflow '{}' to {}", workflow.id, path.display());
    Ok(())
}
