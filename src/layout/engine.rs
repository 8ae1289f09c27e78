//! Petgraph-based layered layout engine
//!
//! Assigns positions to the primary nodes of a graph with a layered
//! (Sugiyama-style) pipeline, then hands auxiliary nodes to the fan-out placer.

use crate::config::LayoutConfig;
use crate::graph::{Direction, FlowGraph, Point, Rect};
use crate::layout::auxiliary::{self, AuxTree, Footprint};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction::Incoming;
use std::collections::{HashMap, HashSet};

/// Layered layout engine
///
/// Pipeline for primary nodes:
/// 1. reverse DFS back edges so the graph is acyclic
/// 2. longest-path ranking over a petgraph DAG
/// 3. split edges spanning several ranks with virtual nodes
/// 4. barycenter ordering sweeps, keeping the ordering with fewest crossings
/// 5. cross-axis coordinates aligned to neighbours, spaced by `node_sep`
/// 6. flow-axis coordinates from cumulative rank extents and `rank_sep`
#[derive(Debug, Clone)]
pub struct LayoutEngine {
    config: LayoutConfig,
}

/// A ranked node; `slot` is `None` for virtual nodes on long edges
#[derive(Debug, Clone)]
struct LayerNode {
    slot: Option<usize>,
    rank: usize,
    /// Cross-axis extent left of the center
    left: f64,
    /// Cross-axis extent right of the center, auxiliary fan included
    right: f64,
    /// Flow-axis extent before the center
    before: f64,
    /// Flow-axis extent after the center, auxiliary fan included
    after: f64,
}

/// Working state of the layered pipeline
#[derive(Debug)]
struct Layering {
    nodes: Vec<LayerNode>,
    /// Neighbours in the next rank
    down: Vec<Vec<usize>>,
    /// Neighbours in the previous rank
    up: Vec<Vec<usize>>,
    /// Node ids per rank, in cross-axis order
    layers: Vec<Vec<usize>>,
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Position every node of `graph` and store the bounding rectangle
    ///
    /// Deterministic for a fixed `(nodes, edges, direction)` input.
    pub fn layout(&self, graph: &mut FlowGraph, direction: Direction) -> Rect {
        if graph.nodes.is_empty() {
            graph.rect = Rect::default();
            return graph.rect;
        }

        let tree = auxiliary::partition(graph);
        let footprints: Vec<Footprint> = tree
            .roots
            .iter()
            .map(|&root| auxiliary::footprint(graph, &tree, root, &self.config))
            .collect();
        let edges = self.primary_edges(graph, &tree);

        tracing::debug!("📐 Laying out {} primary nodes, {} primary edges, {} auxiliary nodes ({})",
            tree.roots.len(), edges.len(), graph.nodes.len() - tree.roots.len(), direction);

        let edges = remove_cycles(tree.roots.len(), &edges);
        let ranks = rank_nodes(tree.roots.len(), &edges);

        let mut layering = Layering::build(graph, &tree, &footprints, &ranks, &edges, direction);
        layering.order(self.config.ordering_iterations);
        let cross = layering.cross_coordinates(self.config.node_sep, self.config.ordering_iterations);
        let flow = layering.flow_coordinates(self.config.rank_sep_for(direction));

        self.assign_primary_positions(graph, &tree, &layering, &cross, &flow, direction);
        for &root in &tree.roots {
            auxiliary::place_children(graph, &tree, root, &self.config);
        }

        graph.rect = Rect::bounding(graph.nodes.iter().map(|n| (&n.position, &n.size)));
        tracing::debug!("✅ Layout complete, bounds {:?}", graph.rect);
        graph.rect
    }

    /// Edges between primary nodes as root slots, without self loops or duplicates
    fn primary_edges(&self, graph: &FlowGraph, tree: &AuxTree) -> Vec<(usize, usize)> {
        let slot_of: HashMap<&str, usize> = tree
            .roots
            .iter()
            .enumerate()
            .map(|(slot, &idx)| (graph.nodes[idx].id.as_str(), slot))
            .collect();

        let mut seen = HashSet::new();
        let mut edges = Vec::new();
        for edge in &graph.edges {
            let (Some(&u), Some(&v)) = (slot_of.get(edge.source.as_str()), slot_of.get(edge.target.as_str())) else {
                continue;
            };
            if u != v && seen.insert((u, v)) {
                edges.push((u, v));
            }
        }
        edges
    }

    fn assign_primary_positions(
        &self,
        graph: &mut FlowGraph,
        tree: &AuxTree,
        layering: &Layering,
        cross: &[f64],
        flow: &[f64],
        direction: Direction,
    ) {
        let mut min_corner = Point { x: f64::INFINITY, y: f64::INFINITY };
        for (lnode, node) in layering.nodes.iter().enumerate() {
            let Some(slot) = node.slot else { continue };
            let target = &mut graph.nodes[tree.roots[slot]];
            let center = auxiliary::to_point(cross[lnode], flow[node.rank], direction);
            target.position = Point {
                x: center.x - target.size.width / 2.0,
                y: center.y - target.size.height / 2.0,
            };
            min_corner.x = min_corner.x.min(target.position.x);
            min_corner.y = min_corner.y.min(target.position.y);
        }

        for &root in &tree.roots {
            let position = &mut graph.nodes[root].position;
            position.x -= min_corner.x;
            position.y -= min_corner.y;
        }
    }
}

/// Reverse the back edges found by a DFS in node order
///
/// A reversed edge that duplicates an existing one is dropped.
fn remove_cycles(n: usize, edges: &[(usize, usize)]) -> Vec<(usize, usize)> {
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (i, &(u, _)) in edges.iter().enumerate() {
        adjacency[u].push(i);
    }

    // 0 = unvisited, 1 = on stack, 2 = finished
    let mut state = vec![0u8; n];
    let mut reversed = vec![false; edges.len()];

    for start in 0..n {
        if state[start] != 0 {
            continue;
        }
        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
        state[start] = 1;
        while let Some((node, next)) = stack.last_mut() {
            if let Some(&edge) = adjacency[*node].get(*next) {
                *next += 1;
                let target = edges[edge].1;
                match state[target] {
                    0 => {
                        state[target] = 1;
                        stack.push((target, 0));
                    }
                    1 => reversed[edge] = true,
                    _ => {}
                }
            } else {
                state[*node] = 2;
                stack.pop();
            }
        }
    }

    let mut seen: HashSet<(usize, usize)> = HashSet::new();
    let mut result = Vec::with_capacity(edges.len());
    for (i, &(u, v)) in edges.iter().enumerate() {
        let edge = if reversed[i] {
            tracing::debug!("🔁 Reversing back edge {} -> {} to break a cycle", u, v);
            (v, u)
        } else {
            (u, v)
        };
        if seen.insert(edge) {
            result.push(edge);
        }
    }
    result
}

/// Longest-path ranking: sources at rank 0, every edge spans at least one rank
fn rank_nodes(n: usize, edges: &[(usize, usize)]) -> Vec<usize> {
    let mut dag: DiGraph<(), ()> = DiGraph::with_capacity(n, edges.len());
    for _ in 0..n {
        dag.add_node(());
    }
    for &(u, v) in edges {
        dag.add_edge(NodeIndex::new(u), NodeIndex::new(v), ());
    }

    let order = toposort(&dag, None).unwrap_or_else(|cycle| {
        tracing::error!("❌ Cycle survived back-edge removal at node {}", cycle.node_id().index());
        dag.node_indices().collect()
    });

    let mut ranks = vec![0usize; n];
    for node in order {
        let rank = dag
            .neighbors_directed(node, Incoming)
            .map(|pred| ranks[pred.index()] + 1)
            .max()
            .unwrap_or(0);
        ranks[node.index()] = rank;
    }
    ranks
}

impl Layering {
    fn build(
        graph: &FlowGraph,
        tree: &AuxTree,
        footprints: &[Footprint],
        ranks: &[usize],
        edges: &[(usize, usize)],
        direction: Direction,
    ) -> Self {
        let mut nodes: Vec<LayerNode> = tree
            .roots
            .iter()
            .enumerate()
            .map(|(slot, &idx)| {
                let half_width = graph.nodes[idx].size.width / 2.0;
                let fp = footprints[slot];
                // Fans open rightwards and spread vertically in both directions
                let (left, right, before, after) = match direction {
                    Direction::Down => (half_width, half_width + fp.reach, fp.half_span, fp.half_span),
                    Direction::Right => (fp.half_span, fp.half_span, half_width, half_width + fp.reach),
                };
                LayerNode { slot: Some(slot), rank: ranks[slot], left, right, before, after }
            })
            .collect();
        let mut down: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
        let mut up: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];

        for &(u, v) in edges {
            let mut previous = u;
            for rank in ranks[u] + 1..ranks[v] {
                nodes.push(LayerNode { slot: None, rank, left: 0.0, right: 0.0, before: 0.0, after: 0.0 });
                down.push(Vec::new());
                up.push(Vec::new());
                let virtual_node = nodes.len() - 1;
                down[previous].push(virtual_node);
                up[virtual_node].push(previous);
                previous = virtual_node;
            }
            down[previous].push(v);
            up[v].push(previous);
        }

        let rank_count = ranks.iter().copied().max().map_or(0, |r| r + 1);
        let mut layers: Vec<Vec<usize>> = vec![Vec::new(); rank_count];

        // Initial order: first visit of a DFS from each real node in slot order
        let mut visited = vec![false; nodes.len()];
        for start in 0..tree.roots.len() {
            let mut stack = vec![start];
            while let Some(node) = stack.pop() {
                if visited[node] {
                    continue;
                }
                visited[node] = true;
                layers[nodes[node].rank].push(node);
                stack.extend(down[node].iter().rev().copied());
            }
        }

        Self { nodes, down, up, layers }
    }

    /// Position of every node within its layer
    fn positions(&self) -> Vec<usize> {
        let mut pos = vec![0; self.nodes.len()];
        for layer in &self.layers {
            for (i, &node) in layer.iter().enumerate() {
                pos[node] = i;
            }
        }
        pos
    }

    fn order(&mut self, iterations: usize) {
        if self.layers.len() < 2 {
            return;
        }

        let mut best = self.layers.clone();
        let mut best_crossings = self.crossings();

        for iteration in 0..iterations {
            if iteration % 2 == 0 {
                for rank in 1..self.layers.len() {
                    self.reorder_by_barycenter(rank, true);
                }
            } else {
                for rank in (0..self.layers.len() - 1).rev() {
                    self.reorder_by_barycenter(rank, false);
                }
            }

            let crossings = self.crossings();
            if crossings < best_crossings {
                best = self.layers.clone();
                best_crossings = crossings;
            }
        }

        tracing::debug!("🔀 Ordering settled with {} crossings", best_crossings);
        self.layers = best;
    }

    fn reorder_by_barycenter(&mut self, rank: usize, use_up: bool) {
        let pos = self.positions();
        let neighbours = if use_up { &self.up } else { &self.down };

        let mut keyed: Vec<(f64, usize, usize)> = self.layers[rank]
            .iter()
            .map(|&node| {
                let adjacent = &neighbours[node];
                let barycenter = if adjacent.is_empty() {
                    pos[node] as f64
                } else {
                    adjacent.iter().map(|&a| pos[a] as f64).sum::<f64>() / adjacent.len() as f64
                };
                (barycenter, pos[node], node)
            })
            .collect();

        keyed.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        self.layers[rank] = keyed.into_iter().map(|(_, _, node)| node).collect();
    }

    /// Number of edge crossings between adjacent layers
    fn crossings(&self) -> usize {
        let pos = self.positions();
        let mut total = 0;
        for layer in &self.layers {
            let segments: Vec<(usize, usize)> = layer
                .iter()
                .flat_map(|&u| self.down[u].iter().map(move |&v| (u, v)))
                .map(|(u, v)| (pos[u], pos[v]))
                .collect();
            for i in 0..segments.len() {
                for j in i + 1..segments.len() {
                    let (a1, b1) = segments[i];
                    let (a2, b2) = segments[j];
                    if (a1 < a2 && b1 > b2) || (a1 > a2 && b1 < b2) {
                        total += 1;
                    }
                }
            }
        }
        total
    }

    /// Minimum center distance between two neighbours in a layer
    fn separation(&self, a: usize, b: usize, node_sep: f64) -> f64 {
        let gap = if self.nodes[a].slot.is_some() && self.nodes[b].slot.is_some() {
            node_sep
        } else {
            node_sep / 2.0
        };
        self.nodes[a].right + gap + self.nodes[b].left
    }

    fn cross_coordinates(&self, node_sep: f64, iterations: usize) -> Vec<f64> {
        let mut coord = vec![0.0; self.nodes.len()];

        // Pack each layer tightly and center it on zero
        for layer in &self.layers {
            let mut cursor = 0.0;
            for (i, &node) in layer.iter().enumerate() {
                cursor = if i == 0 {
                    self.nodes[node].left
                } else {
                    cursor + self.separation(layer[i - 1], node, node_sep)
                };
                coord[node] = cursor;
            }
            if let (Some(&first), Some(&last)) = (layer.first(), layer.last()) {
                let start = coord[first] - self.nodes[first].left;
                let end = coord[last] + self.nodes[last].right;
                let shift = (start + end) / 2.0;
                for &node in layer {
                    coord[node] -= shift;
                }
            }
        }

        // Pull nodes towards their neighbours, alternating downward and upward passes
        for pass in 0..iterations.max(1) * 2 {
            let downward = pass % 2 == 0;
            let neighbours = if downward { &self.up } else { &self.down };
            let ranks: Vec<usize> = if downward {
                (0..self.layers.len()).collect()
            } else {
                (0..self.layers.len()).rev().collect()
            };

            for rank in ranks {
                let layer = &self.layers[rank];
                if layer.is_empty() {
                    continue;
                }
                let desired: Vec<f64> = layer
                    .iter()
                    .map(|&node| {
                        let adjacent = &neighbours[node];
                        if adjacent.is_empty() {
                            coord[node]
                        } else {
                            adjacent.iter().map(|&a| coord[a]).sum::<f64>() / adjacent.len() as f64
                        }
                    })
                    .collect();
                let gaps: Vec<f64> = layer
                    .windows(2)
                    .map(|pair| self.separation(pair[0], pair[1], node_sep))
                    .collect();

                for (&node, value) in layer.iter().zip(fit_with_gaps(&desired, &gaps)) {
                    coord[node] = value;
                }
            }
        }

        coord
    }

    /// Center of every rank along the flow axis
    fn flow_coordinates(&self, rank_sep: f64) -> Vec<f64> {
        let mut centers = Vec::with_capacity(self.layers.len());
        let mut cursor = 0.0;
        for layer in &self.layers {
            let before = layer.iter().map(|&node| self.nodes[node].before).fold(0.0, f64::max);
            let after = layer.iter().map(|&node| self.nodes[node].after).fold(0.0, f64::max);
            centers.push(cursor + before);
            cursor += before + after + rank_sep;
        }
        centers
    }
}

/// Closest positions to `desired` (least squares) that keep consecutive
/// entries at least `gaps[i]` apart
///
/// Shifting by the cumulative gaps turns the constraint into plain
/// monotonicity, solved with pool-adjacent-violators.
fn fit_with_gaps(desired: &[f64], gaps: &[f64]) -> Vec<f64> {
    let mut offsets = Vec::with_capacity(desired.len());
    let mut acc = 0.0;
    for i in 0..desired.len() {
        if i > 0 {
            acc += gaps[i - 1];
        }
        offsets.push(acc);
    }

    // (sum, count) blocks of pooled targets
    let mut blocks: Vec<(f64, usize)> = Vec::new();
    for (d, o) in desired.iter().zip(&offsets) {
        blocks.push((d - o, 1));
        while blocks.len() >= 2 {
            let (s2, c2) = blocks[blocks.len() - 1];
            let (s1, c1) = blocks[blocks.len() - 2];
            if s1 / c1 as f64 <= s2 / c2 as f64 {
                break;
            }
            blocks.pop();
            blocks.pop();
            blocks.push((s1 + s2, c1 + c2));
        }
    }

    let mut result = Vec::with_capacity(desired.len());
    for (sum, count) in blocks {
        let mean = sum / count as f64;
        for _ in 0..count {
            let i = result.len();
            result.push(mean + offsets[i]);
        }
    }
    result
}
