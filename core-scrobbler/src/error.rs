use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScrobblerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    #[error("Worker is already running")]
    AlreadyRunning,

    #[error("Worker is not running")]
    NotRunning,

    #[error("Coordinator has been shut down")]
    ShutDown,
}

pub type Result<T> = std::result::Result<T, ScrobblerError>;
