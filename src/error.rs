use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlowboardError {
    #[error("use_provider must be used within a Provider scope")]
    OutsideProvider,

    #[error("Provider is already borrowed by an enclosing use_provider call")]
    ProviderBusy,

    #[error("Unknown action kind: {0}")]
    UnknownActionKind(String),

    #[error("Node id '{0}' is reserved for a synthetic node")]
    ReservedNodeId(String),

    #[error("Node id '{0}' is used more than once")]
    DuplicateNodeId(String),

    #[error("Workflow JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FlowboardError>;
