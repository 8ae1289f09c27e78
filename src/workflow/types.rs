//! Core workflow type definitions
//!
//! A workflow is an ordered chain of actions plus optional manual edge overrides.
//! The JSON shape matches what editor front-ends exchange: flat actions tagged by
//! `kind`, camelCase field names.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// A complete workflow definition
///
/// Actions run in list order after the trigger fires. `edges` holds manual
/// overrides only; the linear chain is always derived from `actions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    /// Unique workflow identifier
    pub id: String,
    /// Human-readable workflow name
    pub name: String,
    /// Free-form description edited from the sidebar form
    #[serde(default)]
    pub description: String,
    /// Ordered list of actions
    #[serde(default)]
    pub actions: Vec<Action>,
    /// Manual edge overrides
    #[serde(default)]
    pub edges: Vec<WorkflowEdge>,
}

impl Workflow {
    /// Create an empty workflow with the given id and name
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            actions: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Append an action to the end of the chain
    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Position of an action in the chain
    pub fn action_index(&self, action_id: &str) -> Option<usize> {
        self.actions.iter().position(|a| a.id == action_id)
    }

    /// Look up an action by id
    pub fn action(&self, action_id: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.id == action_id)
    }

    /// Ids of every node this workflow contributes to its graph
    ///
    /// Actions in chain order, each followed by its agent sub-resources.
    pub fn node_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.actions.iter().flat_map(|action| {
            let auxiliary = action.agent_inputs().into_iter().flat_map(|inputs| {
                inputs
                    .mcps
                    .iter()
                    .map(|mcp| mcp.id.as_str())
                    .chain([inputs.memory.id.as_str(), inputs.storage.id.as_str()])
            });
            std::iter::once(action.id.as_str()).chain(auxiliary)
        })
    }

    /// Whether `source -> target` is an edge the action chain already implies
    pub fn is_chain_edge(&self, source: &str, target: &str, root_id: &str) -> bool {
        if source == root_id {
            return self.actions.first().map_or(false, |a| a.id == target);
        }
        self.actions.windows(2).any(|pair| pair[0].id == source && pair[1].id == target)
    }
}

/// Connection override between two workflow nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowEdge {
    /// Edge identifier, `source->target` for edges the editor creates
    pub id: String,
    /// Node the edge leaves (an action id or the trigger)
    pub source: String,
    /// Node the edge enters
    pub target: String,
}

impl WorkflowEdge {
    /// Edge with an id derived from its endpoints
    pub fn between(source: impl Into<String>, target: impl Into<String>) -> Self {
        let source = source.into();
        let target = target.into();
        Self {
            id: format!("{}->{}", source, target),
            source,
            target,
        }
    }

    /// Whether this edge touches the given node
    pub fn references(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

/// Kinds of action an editor can place in a workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Email,
    Delay,
    Agent,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Email => "email",
            ActionKind::Delay => "delay",
            ActionKind::Agent => "agent",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(ActionKind::Email),
            "delay" => Ok(ActionKind::Delay),
            "agent" => Ok(ActionKind::Agent),
            other => Err(other.to_string()),
        }
    }
}

/// A single workflow step
///
/// Common fields live on the struct; kind-specific fields are flattened from
/// `body` so the JSON stays a single flat object tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Action identifier, unique across the workflow's nodes
    pub id: String,
    /// Optional display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Kind tag and kind-specific fields
    #[serde(flatten)]
    pub body: ActionBody,
}

/// Kind-specific action payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ActionBody {
    /// Send an email
    Email {
        #[serde(default)]
        to: String,
        #[serde(default)]
        subject: String,
        #[serde(default)]
        body: String,
    },
    /// Pause the workflow
    Delay {
        #[serde(rename = "durationMs", default)]
        duration_ms: u64,
    },
    /// Run an agent with its tool connectors, memory and storage
    Agent {
        #[serde(default)]
        instructions: String,
        inputs: AgentInputs,
    },
}

/// Sub-resources an agent action owns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentInputs {
    /// Tool connectors, drawn in list order
    #[serde(default)]
    pub mcps: Vec<Mcp>,
    /// Conversation memory
    pub memory: Memory,
    /// Store backing the memory
    pub storage: Storage,
}

/// External tool connector used by an agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mcp {
    /// Connector identifier, unique across the workflow's nodes
    pub id: String,
    /// Display name
    pub name: String,
    /// URL or command the connector is reached at
    #[serde(default)]
    pub endpoint: String,
    /// Wire transport
    #[serde(default)]
    pub transport: McpTransport,
    /// Environment variables passed to the connector
    #[serde(default)]
    pub envs: Map<String, Value>,
    /// Extra command-line arguments
    #[serde(default)]
    pub args: Vec<String>,
}

/// How an MCP connector is reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum McpTransport {
    #[default]
    Stdio,
    Sse,
    StreamableHttp,
}

/// Conversation memory attached to an agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Memory {
    /// Memory identifier, unique across the workflow's nodes
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Number of past turns kept in context
    #[serde(default)]
    pub conversation_history: u32,
    /// Free-form scratch state shared across turns
    #[serde(default)]
    pub working_memory: Value,
}

/// Backing store for an agent's memory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Storage {
    /// Storage identifier, unique across the workflow's nodes
    pub id: String,
    /// Backend kind
    #[serde(rename = "type", default)]
    pub storage_type: StorageType,
    /// Database host
    #[serde(default)]
    pub endpoint: String,
    /// Database port
    #[serde(default = "default_storage_port")]
    pub port: u16,
    /// Login user
    #[serde(default)]
    pub user: String,
    /// Login password, stored as entered
    #[serde(default)]
    pub password: String,
    /// Database name
    #[serde(default)]
    pub database: String,
}

/// Supported storage backends (currently fixed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    #[default]
    Postgres,
}

fn default_storage_port() -> u16 {
    5432
}

fn fresh_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl Action {
    /// Default action of the given kind with a fresh id and empty fields
    pub fn new(kind: ActionKind) -> Self {
        let body = match kind {
            ActionKind::Email => ActionBody::Email {
                to: String::new(),
                subject: String::new(),
                body: String::new(),
            },
            ActionKind::Delay => ActionBody::Delay { duration_ms: 0 },
            ActionKind::Agent => ActionBody::Agent {
                instructions: String::new(),
                inputs: AgentInputs {
                    mcps: Vec::new(),
                    memory: Memory::new("memory"),
                    storage: Storage::default(),
                },
            },
        };
        Self {
            id: fresh_id(),
            name: None,
            description: None,
            body,
        }
    }

    /// Email action with a fresh id
    pub fn email(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            body: ActionBody::Email {
                to: to.into(),
                subject: subject.into(),
                body: body.into(),
            },
            ..Self::new(ActionKind::Email)
        }
    }

    /// Delay action with a fresh id
    pub fn delay(duration_ms: u64) -> Self {
        Self {
            body: ActionBody::Delay { duration_ms },
            ..Self::new(ActionKind::Delay)
        }
    }

    /// Agent action with a fresh id owning `inputs`
    pub fn agent(instructions: impl Into<String>, inputs: AgentInputs) -> Self {
        Self {
            body: ActionBody::Agent {
                instructions: instructions.into(),
                inputs,
            },
            ..Self::new(ActionKind::Agent)
        }
    }

    /// Replace the generated id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Kind derived from the body variant
    pub fn kind(&self) -> ActionKind {
        match self.body {
            ActionBody::Email { .. } => ActionKind::Email,
            ActionBody::Delay { .. } => ActionKind::Delay,
            ActionBody::Agent { .. } => ActionKind::Agent,
        }
    }

    /// Agent sub-resources, if this is an agent action
    pub fn agent_inputs(&self) -> Option<&AgentInputs> {
        match &self.body {
            ActionBody::Agent { inputs, .. } => Some(inputs),
            _ => None,
        }
    }
}

impl Mcp {
    /// Stdio connector with no endpoint, envs or args
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            endpoint: String::new(),
            transport: McpTransport::default(),
            envs: Map::new(),
            args: Vec::new(),
        }
    }
}

impl Memory {
    /// Empty memory with a fresh id
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: fresh_id(),
            name: name.into(),
            conversation_history: 0,
            working_memory: Value::Null,
        }
    }

    /// Replace the generated id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

impl Default for Storage {
    fn default() -> Self {
        Self {
            id: fresh_id(),
            storage_type: StorageType::Postgres,
            endpoint: "localhost".to_string(),
            port: default_storage_port(),
            user: String::new(),
            password: String::new(),
            database: String::new(),
        }
    }
}

impl Storage {
    /// Replace the generated id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}
