//! Catalogue of actions an editor can add to a workflow
//!
//! Front-ends fetch the list of engine actions once when the editor mounts.
//! The catalogue resolves a chosen entry into a concrete action kind.

use crate::error::{FlowboardError, Result};
use crate::workflow::types::{Action, ActionKind};
use serde::{Deserialize, Serialize};

/// A catalogue item as published by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineAction {
    /// Action kind identifier (e.g. "email")
    pub kind: String,
    /// Display name shown in the picker
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl EngineAction {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            description: None,
        }
    }

    /// Resolve the catalogue kind into a known action kind
    pub fn action_kind(&self) -> Result<ActionKind> {
        self.kind
            .parse()
            .map_err(FlowboardError::UnknownActionKind)
    }

    /// Build a fresh default action for this catalogue entry
    pub fn instantiate(&self) -> Result<Action> {
        let kind = self.action_kind()?;
        let mut action = Action::new(kind);
        action.name = Some(self.name.clone());
        Ok(action)
    }
}

/// Ordered set of engine actions available to one editor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionCatalogue {
    actions: Vec<EngineAction>,
}

impl ActionCatalogue {
    pub fn new(actions: Vec<EngineAction>) -> Self {
        Self { actions }
    }

    /// Catalogue offering every built-in action kind
    pub fn builtin() -> Self {
        Self::new(vec![
            EngineAction {
                kind: "email".to_string(),
                name: "Send email".to_string(),
                description: Some("Send an email to a recipient".to_string()),
            },
            EngineAction {
                kind: "delay".to_string(),
                name: "Delay".to_string(),
                description: Some("Wait before running the next step".to_string()),
            },
            EngineAction {
                kind: "agent".to_string(),
                name: "Agent".to_string(),
                description: Some("Run an agent with tools, memory and storage".to_string()),
            },
        ])
    }

    /// Find a catalogue entry by kind
    pub fn get(&self, kind: &str) -> Option<&EngineAction> {
        self.actions.iter().find(|a| a.kind == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EngineAction> {
        self.actions.iter()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instantiate_uses_catalogue_name() {
        let action = EngineAction::new("delay", "Wait a bit").instantiate().unwrap();
        assert_eq!(action.kind(), ActionKind::Delay);
        assert_eq!(action.name.as_deref(), Some("Wait a bit"));
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let err = EngineAction::new("webhook", "Webhook").instantiate().unwrap_err();
        assert!(matches!(err, FlowboardError::UnknownActionKind(kind) if kind == "webhook"));
    }

    #[test]
    fn test_builtin_catalogue_covers_every_kind() {
        let catalogue = ActionCatalogue::builtin();
        assert_eq!(catalogue.len(), 3);
        for entry in catalogue.iter() {
            assert!(entry.action_kind().is_ok());
        }
        assert!(catalogue.get("agent").is_some());
        assert!(catalogue.get("webhook").is_none());
    }
}
