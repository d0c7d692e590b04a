use thiserror::Error;

pub type Result<T> = std::result::Result<T, PoetError>;

#[derive(Debug, Error)]
pub enum PoetError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("mailbox storage error: {0}")]
    Storage(String),

    #[error("`{0}` is not installed or not on PATH")]
    ToolUnavailable(String),

    #[error("`{name}` invocation failed: {source}")]
    ToolInvocation {
        name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}
