//! Graph node and edge types
//!
//! These are derived from a workflow on every change and never persisted.
//! Positions are top-left corners in canvas units.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Flow direction of the primary chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Top to bottom
    #[default]
    Down,
    /// Left to right
    Right,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Down => f.write_str("down"),
            Direction::Right => f.write_str("right"),
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "down" | "tb" => Ok(Direction::Down),
            "right" | "lr" => Ok(Direction::Right),
            other => Err(format!("unknown direction '{}', expected 'down' or 'right'", other)),
        }
    }
}

/// Canvas coordinates; y grows downwards
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Rendered node dimensions
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// Axis-aligned bounding rectangle used to fit the view
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Smallest rectangle containing every `(position, size)` box; zero when empty
    pub fn bounding<'a>(boxes: impl IntoIterator<Item = (&'a Point, &'a Size)>) -> Rect {
        let mut bounds: Option<(f64, f64, f64, f64)> = None;
        for (p, s) in boxes {
            let (min_x, min_y, max_x, max_y) =
                bounds.unwrap_or((f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY));
            bounds = Some((
                min_x.min(p.x),
                min_y.min(p.y),
                max_x.max(p.x + s.width),
                max_y.max(p.y + s.height),
            ));
        }
        match bounds {
            Some((min_x, min_y, max_x, max_y)) => Rect {
                x: min_x,
                y: min_y,
                width: max_x - min_x,
                height: max_y - min_y,
            },
            None => Rect::default(),
        }
    }
}

/// What a graph node renders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Trigger,
    Email,
    Delay,
    Agent,
    Mcp,
    Memory,
    Storage,
    Blank,
}

impl NodeKind {
    /// Auxiliary kinds are placed beside a parent instead of ranked
    pub fn is_auxiliary(&self) -> bool {
        matches!(self, NodeKind::Mcp | NodeKind::Memory | NodeKind::Storage)
    }
}

/// A positioned node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: String,
    /// Renderer node type
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Payload the renderer needs (the action, MCP, memory...)
    pub data: Value,
    /// Owning node for auxiliary nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Top-left corner
    #[serde(default)]
    pub position: Point,
    /// Measured or default size
    pub size: Size,
}

impl GraphNode {
    /// Center of the node's box
    pub fn center(&self) -> Point {
        Point {
            x: self.position.x + self.size.width / 2.0,
            y: self.position.y + self.size.height / 2.0,
        }
    }
}

/// Edge style rendered for every synthesized edge
pub const EDGE_TYPE: &str = "smoothstep";

/// A directed connection between two graph nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    /// `source->target`
    pub id: String,
    pub source: String,
    pub target: String,
    /// Renderer edge style
    #[serde(rename = "type")]
    pub edge_type: String,
}

impl GraphEdge {
    /// Edge whose id is derived from its endpoints, so rebuilds are stable
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        let source = source.into();
        let target = target.into();
        Self {
            id: format!("{}->{}", source, target),
            source,
            target,
            edge_type: EDGE_TYPE.to_string(),
        }
    }
}

/// A laid-out graph plus the rectangle that contains it
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FlowGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub rect: Rect,
}

impl FlowGraph {
    /// Look up a node by id
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Edges leaving the given node, in insertion order
    pub fn outgoing<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.edges.iter().filter(move |e| e.source == id)
    }

    /// Edges entering the given node, in insertion order
    pub fn incoming<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.edges.iter().filter(move |e| e.target == id)
    }

    /// Replace node sizes with measurements reported by a renderer
    ///
    /// Unknown ids are ignored. Positions are stale until the graph is laid out again.
    pub fn apply_measures<'a>(&mut self, measures: impl IntoIterator<Item = (&'a str, Size)>) {
        for (id, size) in measures {
            if let Some(node) = self.nodes.iter_mut().find(|n| n.id == id) {
                node.size = size;
            }
        }
    }
}
