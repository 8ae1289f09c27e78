//! Editing state of one editor instance
//!
//! Holds the working copy of a workflow plus UI-facing state (selection,
//! blank placeholder, sidebar side). Every mutation replaces the working copy
//! and reports it through the change callback.

use crate::config::Config;
use crate::error::Result;
use crate::graph::{self, Direction, FlowGraph, GraphEdge, GraphNode, NodeKind, Point, Size};
use crate::layout::LayoutEngine;
use crate::workflow::{ActionCatalogue, EngineAction, Workflow, WorkflowEdge};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Id given to the temporary placeholder node
pub const BLANK_ID: &str = "blank";

/// Callback invoked with the new working copy after every edit
pub type ChangeCallback = Box<dyn FnMut(&Workflow)>;

/// Side of the canvas the sidebar form is docked on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SidebarPosition {
    Left,
    #[default]
    Right,
}

impl FromStr for SidebarPosition {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "left" => Ok(SidebarPosition::Left),
            "right" => Ok(SidebarPosition::Right),
            other => Err(format!("unknown sidebar position '{}'", other)),
        }
    }
}

/// Placeholder spliced between two nodes while the user picks an action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlankNode {
    pub id: String,
    /// Node the placeholder hangs off
    pub source: String,
    /// Node the placeholder leads to
    pub target: String,
}

/// Selection change reported by a renderer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSelectionChange {
    pub id: String,
    pub selected: bool,
}

/// Working copy of a workflow and the editor state around it
pub struct Editor {
    workflow: Workflow,
    available_actions: ActionCatalogue,
    on_change: Option<ChangeCallback>,
    selected_node: Option<String>,
    blank_node: Option<BlankNode>,
    sidebar_position: SidebarPosition,
    measures: HashMap<String, Size>,
    layout: LayoutEngine,
}

impl fmt::Debug for Editor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Editor")
            .field("workflow", &self.workflow)
            .field("available_actions", &self.available_actions)
            .field("on_change", &self.on_change.is_some())
            .field("selected_node", &self.selected_node)
            .field("blank_node", &self.blank_node)
            .field("sidebar_position", &self.sidebar_position)
            .finish()
    }
}

impl Editor {
    /// Create an editor over its own copy of `workflow`
    pub fn new(workflow: Workflow, available_actions: ActionCatalogue, config: &Config) -> Self {
        Self {
            workflow,
            available_actions,
            on_change: None,
            selected_node: None,
            blank_node: None,
            sidebar_position: config.editor.sidebar_position,
            measures: HashMap::new(),
            layout: LayoutEngine::new(config.layout.clone()),
        }
    }

    /// Register the change callback
    pub fn with_on_change(mut self, on_change: impl FnMut(&Workflow) + 'static) -> Self {
        self.on_change = Some(Box::new(on_change));
        self
    }

    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    pub fn available_actions(&self) -> &ActionCatalogue {
        &self.available_actions
    }

    /// Replace the working copy and notify
    ///
    /// Measured sizes of nodes the new copy no longer has are dropped.
    pub fn set_workflow(&mut self, workflow: Workflow) {
        self.workflow = workflow;
        let live: HashSet<&str> = self.workflow.node_ids().collect();
        self.measures
            .retain(|id, _| id == graph::TRIGGER_ID || id == BLANK_ID || live.contains(id.as_str()));
        if let Some(on_change) = self.on_change.as_mut() {
            on_change(&self.workflow);
        }
    }

    /// Plain field replace, no validation
    pub fn set_name(&mut self, name: impl Into<String>) {
        let mut next = self.workflow.clone();
        next.name = name.into();
        self.set_workflow(next);
    }

    /// Plain field replace, no validation
    pub fn set_description(&mut self, description: impl Into<String>) {
        let mut next = self.workflow.clone();
        next.description = description.into();
        self.set_workflow(next);
    }

    /// Add a fresh action of the catalogue kind after `parent_action_id`
    ///
    /// The trigger as parent puts the action first. Without a parent (or with
    /// one that is not in the chain) the action goes to the end.
    /// `connecting_edge` is the override edge the user clicked to insert
    /// between two nodes; it is replaced by `parent -> new` and
    /// `new -> old target`. Replacements the chain already implies are not
    /// saved. Returns the new action id.
    pub fn append_action(
        &mut self,
        engine_action: &EngineAction,
        parent_action_id: Option<&str>,
        connecting_edge: Option<&WorkflowEdge>,
    ) -> Result<String> {
        let action = engine_action.instantiate()?;
        let new_id = action.id.clone();

        let (parent, insert_at) = match parent_action_id {
            Some(graph::TRIGGER_ID) => (Some(graph::TRIGGER_ID), 0),
            Some(id) => match self.workflow.action_index(id) {
                Some(i) => (Some(id), i + 1),
                None => {
                    tracing::warn!("⚠️ Parent action '{}' not found, appending '{}' at the end", id, new_id);
                    (None, self.workflow.actions.len())
                }
            },
            None => (None, self.workflow.actions.len()),
        };

        let mut next = self.workflow.clone();
        next.actions.insert(insert_at, action);

        let mut rewired = Vec::new();
        if let Some(edge) = connecting_edge {
            next.edges.retain(|e| e.id != edge.id);
            let target_is_node = edge.target == graph::TRIGGER_ID || self.workflow.action(&edge.target).is_some();
            if target_is_node && edge.target != new_id {
                rewired.push(WorkflowEdge::between(new_id.as_str(), edge.target.as_str()));
            }
        }
        if let Some(parent_id) = parent {
            rewired.insert(0, WorkflowEdge::between(parent_id, new_id.as_str()));
        }
        for edge in rewired {
            if next.is_chain_edge(&edge.source, &edge.target, graph::TRIGGER_ID) || next.edges.contains(&edge) {
                continue;
            }
            next.edges.push(edge);
        }

        tracing::info!("➕ Appended {} action '{}' at position {}", engine_action.kind, new_id, insert_at);
        self.set_workflow(next);
        self.blank_node = None;
        self.selected_node = None;
        Ok(new_id)
    }

    /// Remove an action and every override edge referencing it
    ///
    /// Unknown ids are a silent no-op; returns whether anything was removed.
    pub fn delete_action(&mut self, action_id: &str) -> bool {
        if self.workflow.action_index(action_id).is_none() {
            tracing::debug!("⏭️ Delete of unknown action '{}' ignored", action_id);
            return false;
        }

        let mut next = self.workflow.clone();
        next.actions.retain(|a| a.id != action_id);
        next.edges.retain(|e| !e.references(action_id));

        tracing::info!("🗑️ Deleted action '{}'", action_id);
        self.set_workflow(next);
        if self.selected_node.as_deref() == Some(action_id) {
            self.selected_node = None;
        }
        true
    }

    pub fn selected_node(&self) -> Option<&str> {
        self.selected_node.as_deref()
    }

    pub fn select_node(&mut self, node_id: Option<&str>) {
        self.selected_node = node_id.map(str::to_string);
    }

    /// Select the first node a renderer reports as selected, or clear
    pub fn sync_selection(&mut self, changes: &[NodeSelectionChange]) {
        self.selected_node = changes.iter().find(|c| c.selected).map(|c| c.id.clone());
    }

    pub fn blank_node(&self) -> Option<&BlankNode> {
        self.blank_node.as_ref()
    }

    /// Splice a placeholder into `edge`, replacing any previous one
    pub fn insert_blank(&mut self, edge: &GraphEdge) -> &BlankNode {
        self.blank_node.insert(BlankNode {
            id: BLANK_ID.to_string(),
            source: edge.source.clone(),
            target: edge.target.clone(),
        })
    }

    pub fn clear_blank(&mut self) {
        self.blank_node = None;
    }

    pub fn sidebar_position(&self) -> SidebarPosition {
        self.sidebar_position
    }

    pub fn set_sidebar_position(&mut self, position: SidebarPosition) {
        self.sidebar_position = position;
    }

    /// Record node sizes measured by the renderer; used on the next layout
    pub fn set_measures(&mut self, measures: impl IntoIterator<Item = (String, Size)>) {
        self.measures.extend(measures);
    }

    /// Laid-out graph of the current working copy
    pub fn graph(&self, direction: Direction) -> FlowGraph {
        let mut graph = graph::synthesize(&self.workflow, self.layout.config());
        if let Some(blank) = &self.blank_node {
            self.splice_blank(&mut graph, blank);
        }
        graph.apply_measures(self.measures.iter().map(|(id, size)| (id.as_str(), *size)));
        self.layout.layout(&mut graph, direction);
        graph
    }

    fn splice_blank(&self, graph: &mut FlowGraph, blank: &BlankNode) {
        if graph.node(&blank.source).is_none() {
            tracing::debug!("⏭️ Blank node source '{}' is gone, not drawing it", blank.source);
            return;
        }
        if graph.node(&blank.id).is_some() {
            tracing::warn!("⚠️ Node id '{}' is taken, not drawing the blank node", blank.id);
            return;
        }
        graph.edges.retain(|e| !(e.source == blank.source && e.target == blank.target));
        graph.nodes.push(GraphNode {
            id: blank.id.clone(),
            kind: NodeKind::Blank,
            data: json!({}),
            parent_id: None,
            position: Point::default(),
            size: self.layout.config().default_node_size,
        });
        graph.edges.push(GraphEdge::new(blank.source.as_str(), blank.id.as_str()));
        if graph.node(&blank.target).is_some() {
            graph.edges.push(GraphEdge::new(blank.id.as_str(), blank.target.as_str()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::{Action, ActionKind};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn workflow() -> Workflow {
        Workflow::new("wf", "Onboarding")
            .with_action(Action::email("a@b.c", "Welcome", "").with_id("e1"))
            .with_action(Action::delay(1000).with_id("d1"))
            .with_action(Action::email("a@b.c", "Follow up", "").with_id("e2"))
    }

    fn editor() -> Editor {
        Editor::new(workflow(), ActionCatalogue::builtin(), &Config::default())
    }

    fn ids(editor: &Editor) -> Vec<&str> {
        editor.workflow().actions.iter().map(|a| a.id.as_str()).collect()
    }

    #[test]
    fn test_append_after_parent() {
        let mut editor = editor();
        let id = editor.append_action(&EngineAction::new("delay", "Wait"), Some("d1"), None).unwrap();

        assert_eq!(ids(&editor), vec!["e1", "d1", id.as_str(), "e2"]);
        assert_eq!(editor.workflow().actions[2].kind(), ActionKind::Delay);
        assert!(editor.workflow().edges.is_empty());
    }

    #[test]
    fn test_append_after_trigger_goes_first() {
        let mut editor = editor();
        let id = editor.append_action(&EngineAction::new("email", "Email"), Some("trigger"), None).unwrap();
        assert_eq!(ids(&editor), vec![id.as_str(), "e1", "d1", "e2"]);
        assert!(editor.workflow().edges.is_empty());
    }

    #[test]
    fn test_repeated_appends_after_one_parent_save_no_edges() {
        let mut editor = editor();
        let x = editor.append_action(&EngineAction::new("delay", "Wait"), Some("e1"), None).unwrap();
        let y = editor.append_action(&EngineAction::new("delay", "Wait"), Some("e1"), None).unwrap();
        assert_eq!(ids(&editor), vec!["e1", y.as_str(), x.as_str(), "d1", "e2"]);
        assert!(editor.workflow().edges.is_empty());
    }

    #[test]
    fn test_append_without_parent_goes_last() {
        let mut editor = editor();
        let id = editor.append_action(&EngineAction::new("agent", "Agent"), None, None).unwrap();
        assert_eq!(ids(&editor).last(), Some(&id.as_str()));
        assert!(editor.workflow().edges.is_empty());
    }

    #[test]
    fn test_append_with_unknown_parent_goes_last() {
        let mut editor = editor();
        let id = editor.append_action(&EngineAction::new("email", "Email"), Some("ghost"), None).unwrap();
        assert_eq!(ids(&editor).last(), Some(&id.as_str()));
        assert!(editor.workflow().edges.is_empty());
    }

    #[test]
    fn test_append_on_chain_edge_saves_nothing() {
        let mut editor = editor();
        let mut wf = editor.workflow().clone();
        let connecting = WorkflowEdge::between("e1", "d1");
        wf.edges.push(connecting.clone());
        editor.set_workflow(wf);

        let id = editor.append_action(&EngineAction::new("email", "Email"), Some("e1"), Some(&connecting)).unwrap();
        assert_eq!(ids(&editor), vec!["e1", id.as_str(), "d1", "e2"]);
        assert!(editor.workflow().edges.is_empty());
    }

    #[test]
    fn test_append_on_override_edge_keeps_the_bypass() {
        let mut editor = editor();
        let mut wf = editor.workflow().clone();
        let connecting = WorkflowEdge::between("trigger", "e2");
        wf.edges.push(connecting.clone());
        editor.set_workflow(wf);

        let id = editor.append_action(&EngineAction::new("delay", "Wait"), Some("trigger"), Some(&connecting)).unwrap();
        assert_eq!(ids(&editor), vec![id.as_str(), "e1", "d1", "e2"]);
        assert_eq!(editor.workflow().edges, vec![WorkflowEdge::between(id.as_str(), "e2")]);
    }

    #[test]
    fn test_append_unknown_kind_changes_nothing() {
        let calls = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&calls);
        let mut editor = editor().with_on_change(move |_| *counter.borrow_mut() += 1);

        assert!(editor.append_action(&EngineAction::new("webhook", "Hook"), None, None).is_err());
        assert_eq!(ids(&editor), vec!["e1", "d1", "e2"]);
        assert_eq!(*calls.borrow(), 0);
    }

    #[test]
    fn test_append_clears_blank_and_selection() {
        let mut editor = editor();
        editor.insert_blank(&GraphEdge::new("e1", "d1"));
        editor.select_node(Some("e1"));
        editor.append_action(&EngineAction::new("delay", "Wait"), Some("e1"), None).unwrap();
        assert!(editor.blank_node().is_none());
        assert!(editor.selected_node().is_none());
    }

    #[test]
    fn test_delete_removes_action_and_edges() {
        let mut editor = editor();
        let mut wf = editor.workflow().clone();
        wf.edges = vec![WorkflowEdge::between("e1", "d1"), WorkflowEdge::between("trigger", "e2")];
        editor.set_workflow(wf);
        editor.select_node(Some("d1"));

        assert!(editor.delete_action("d1"));
        assert_eq!(ids(&editor), vec!["e1", "e2"]);
        assert_eq!(editor.workflow().edges, vec![WorkflowEdge::between("trigger", "e2")]);
        assert!(editor.selected_node().is_none());
    }

    #[test]
    fn test_delete_unknown_is_silent_noop() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut editor = editor().with_on_change(move |wf| sink.borrow_mut().push(wf.clone()));

        assert!(!editor.delete_action("ghost"));
        assert_eq!(ids(&editor), vec!["e1", "d1", "e2"]);
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn test_name_and_description_notify() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut editor = editor().with_on_change(move |wf| sink.borrow_mut().push(wf.clone()));

        editor.set_name("");
        editor.set_description("Welcome new users");

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].name, "");
        assert_eq!(seen[1].description, "Welcome new users");
        assert_eq!(editor.workflow().name, "");
    }

    #[test]
    fn test_sync_selection_picks_first_selected() {
        let mut editor = editor();
        editor.sync_selection(&[
            NodeSelectionChange { id: "e1".into(), selected: false },
            NodeSelectionChange { id: "d1".into(), selected: true },
            NodeSelectionChange { id: "e2".into(), selected: true },
        ]);
        assert_eq!(editor.selected_node(), Some("d1"));

        editor.sync_selection(&[NodeSelectionChange { id: "d1".into(), selected: false }]);
        assert_eq!(editor.selected_node(), None);
    }

    #[test]
    fn test_blank_node_is_spliced_into_graph() {
        let mut editor = editor();
        editor.insert_blank(&GraphEdge::new("e1", "d1"));
        let graph = editor.graph(Direction::Down);

        assert_eq!(graph.node(BLANK_ID).map(|n| n.kind), Some(NodeKind::Blank));
        assert!(graph.edges.iter().all(|e| !(e.source == "e1" && e.target == "d1")));
        assert!(graph.outgoing("e1").any(|e| e.target == BLANK_ID));
        assert!(graph.outgoing(BLANK_ID).any(|e| e.target == "d1"));

        let blank = graph.node(BLANK_ID).unwrap();
        assert!(blank.position.y > graph.node("e1").unwrap().position.y);
        assert!(blank.position.y < graph.node("d1").unwrap().position.y);
    }

    #[test]
    fn test_measures_of_deleted_nodes_are_dropped() {
        let mut editor = editor();
        editor.set_measures([
            ("d1".to_string(), Size { width: 300.0, height: 120.0 }),
            ("e1".to_string(), Size { width: 250.0, height: 90.0 }),
            ("trigger".to_string(), Size { width: 200.0, height: 50.0 }),
        ]);
        editor.delete_action("d1");

        let mut kept: Vec<&str> = editor.measures.keys().map(String::as_str).collect();
        kept.sort_unstable();
        assert_eq!(kept, vec!["e1", "trigger"]);
    }

    #[test]
    fn test_blank_node_never_shadows_an_action() {
        let mut editor = Editor::new(
            workflow().with_action(Action::delay(1).with_id(BLANK_ID)),
            ActionCatalogue::builtin(),
            &Config::default(),
        );
        editor.insert_blank(&GraphEdge::new("e1", "d1"));
        let graph = editor.graph(Direction::Down);

        assert_eq!(graph.nodes.iter().filter(|n| n.id == BLANK_ID).count(), 1);
        assert_eq!(graph.node(BLANK_ID).map(|n| n.kind), Some(NodeKind::Delay));
        assert!(graph.outgoing("e1").any(|e| e.target == "d1"));
    }

    #[test]
    fn test_measures_feed_layout() {
        let mut editor = editor();
        editor.set_measures([("d1".to_string(), Size { width: 300.0, height: 120.0 })]);
        let graph = editor.graph(Direction::Down);
        assert_eq!(graph.node("d1").unwrap().size, Size { width: 300.0, height: 120.0 });
        assert_eq!(graph.rect.width, 300.0);
    }
}
