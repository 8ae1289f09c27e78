/// Auto-layout Engine
///
/// This module positions graph nodes for display:
/// - Layered ranking and ordering of primary nodes on a petgraph DAG
/// - Procedural fan-out of auxiliary nodes beside their owner
/// - Bounding rectangle for view fitting

// Layered layout of primary nodes
pub mod engine;

// Auxiliary node fan-out placement
pub mod auxiliary;

// Re-export main types
pub use engine::LayoutEngine;
