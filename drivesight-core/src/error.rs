use thiserror::Error;

/// Pipeline stage that talks to an external adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Perception,
    Summary,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Perception => write!(f, "perception"),
            Self::Summary => write!(f, "summary"),
        }
    }
}

// Clone is required: one failed flight is delivered to every waiter.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("{stage} adapter timed out after {timeout_ms}ms")]
    AdapterTimeout { stage: Stage, timeout_ms: u64 },

    #[error("{stage} adapter failed: {message}")]
    AdapterError { stage: Stage, message: String },

    #[error("Cache invariant violated: {0}")]
    CacheInternal(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn adapter(stage: Stage, message: impl Into<String>) -> Self {
        Self::AdapterError {
            stage,
            message: message.into(),
        }
    }

    pub fn timeout(stage: Stage, timeout: std::time::Duration) -> Self {
        Self::AdapterTimeout {
            stage,
            timeout_ms: timeout.as_millis() as u64,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
