//! Auxiliary node placement
//!
//! MCP, memory and storage nodes are not ranked. They sit right of their
//! owner at a fixed offset and fan out vertically, centred on the owner so
//! sibling y-offsets are symmetric. This holds for both flow directions.

use crate::config::LayoutConfig;
use crate::graph::{Direction, FlowGraph, Point};
use std::collections::{HashMap, VecDeque};

/// Parent/child structure of a graph split into ranked roots and auxiliary subtrees
#[derive(Debug, Clone)]
pub struct AuxTree {
    /// Node indices positioned by the layered layout, in node order
    pub roots: Vec<usize>,
    /// Auxiliary children per node index, in node order
    pub children: Vec<Vec<usize>>,
}

/// Space an auxiliary fan claims around its owner
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Footprint {
    /// Horizontal distance the fan extends past the owner's right edge
    pub reach: f64,
    /// Vertical half extent of owner plus fan, measured from the owner's center
    pub half_span: f64,
}

/// Split nodes into roots and auxiliary children
///
/// A node is auxiliary when its `parent_id` names another node in the graph.
/// Parent chains that loop without reaching a root are cut, and the cut node
/// becomes a root.
pub fn partition(graph: &FlowGraph) -> AuxTree {
    let n = graph.nodes.len();
    let index_of: HashMap<&str, usize> = graph
        .nodes
        .iter()
        .enumerate()
        .map(|(i, node)| (node.id.as_str(), i))
        .collect();

    let mut parent: Vec<Option<usize>> = graph
        .nodes
        .iter()
        .enumerate()
        .map(|(i, node)| {
            node.parent_id
                .as_deref()
                .and_then(|p| index_of.get(p).copied())
                .filter(|&p| p != i)
        })
        .collect();

    let mut children = vec![Vec::new(); n];
    for (i, p) in parent.iter().enumerate() {
        if let Some(p) = p {
            children[*p].push(i);
        }
    }

    let mut roots: Vec<usize> = (0..n).filter(|&i| parent[i].is_none()).collect();
    let mut reached = vec![false; n];
    mark_subtrees(&roots, &children, &mut reached);

    for i in 0..n {
        if reached[i] {
            continue;
        }
        if let Some(p) = parent[i].take() {
            children[p].retain(|&c| c != i);
        }
        tracing::warn!("⚠️ Auxiliary node '{}' has a looping parent chain, ranking it instead",
            graph.nodes[i].id);
        roots.push(i);
        mark_subtrees(&[i], &children, &mut reached);
    }
    roots.sort_unstable();

    AuxTree { roots, children }
}

fn mark_subtrees(starts: &[usize], children: &[Vec<usize>], reached: &mut [bool]) {
    let mut queue: VecDeque<usize> = starts.iter().copied().collect();
    while let Some(current) = queue.pop_front() {
        if reached[current] {
            continue;
        }
        reached[current] = true;
        queue.extend(children[current].iter().copied());
    }
}

/// Turn (cross, flow) coordinates into canvas coordinates
pub fn to_point(cross: f64, flow: f64, direction: Direction) -> Point {
    match direction {
        Direction::Down => Point { x: cross, y: flow },
        Direction::Right => Point { x: flow, y: cross },
    }
}

/// Vertical offset of sibling `index` out of `count`, centred on zero
pub fn fan_offset(index: usize, count: usize, spacing: f64) -> f64 {
    (index as f64 - (count as f64 - 1.0) / 2.0) * spacing
}

/// Space the auxiliary subtree under `idx` needs
///
/// Fans always open to the right of their owner and spread vertically, so the
/// footprint is the same for both flow directions.
pub fn footprint(graph: &FlowGraph, tree: &AuxTree, idx: usize, config: &LayoutConfig) -> Footprint {
    let kids = &tree.children[idx];

    let mut result = Footprint { reach: 0.0, half_span: graph.nodes[idx].size.height / 2.0 };
    for (i, &child) in kids.iter().enumerate() {
        let child_fp = footprint(graph, tree, child, config);
        let offset = fan_offset(i, kids.len(), config.auxiliary_spacing);

        result.reach = result.reach.max(config.auxiliary_offset + graph.nodes[child].size.width + child_fp.reach);
        result.half_span = result.half_span.max(offset.abs() + child_fp.half_span);
    }
    result
}

/// Position every auxiliary descendant of `idx` relative to it
///
/// `idx` itself must already be positioned.
pub fn place_children(graph: &mut FlowGraph, tree: &AuxTree, idx: usize, config: &LayoutConfig) {
    let kids = &tree.children[idx];
    if kids.is_empty() {
        return;
    }

    let parent = &graph.nodes[idx];
    let left = parent.position.x + parent.size.width + config.auxiliary_offset;
    let center_y = parent.center().y;

    for (i, &child) in kids.iter().enumerate() {
        let size = graph.nodes[child].size;
        let y = center_y + fan_offset(i, kids.len(), config.auxiliary_spacing);
        graph.nodes[child].position = Point {
            x: left,
            y: y - size.height / 2.0,
        };
        place_children(graph, tree, child, config);
    }
}
