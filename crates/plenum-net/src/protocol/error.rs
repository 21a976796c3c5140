use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("operation timed out after {0}ms")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("rpc handler error: {0}")]
    Handler(String),

    #[error("transport is shut down")]
    Shutdown,
}

pub type Result<T> = std::result::Result<T, TransportError>;
