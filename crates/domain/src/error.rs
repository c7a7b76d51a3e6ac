/// Shared error type used across all NEURA crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP: {0}")]
    Http(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("cancelled: {0}")]
    Cancelled(String),

    #[error("provider {provider}: {message}")]
    Provider { provider: String, message: String },

    #[error("storage: {0}")]
    Storage(String),

    #[error("config: {0}")]
    Config(String),

    #[error("auth: {0}")]
    Auth(String),

    /// An outbound intelligence call failed. The API log already records
    /// the failure when this is returned.
    #[error("remote call failed ({endpoint}): {source}")]
    RemoteCallFailed {
        endpoint: String,
        #[source]
        source: Box<Error>,
    },

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Wrap an error as a failed remote call against `endpoint`.
    pub fn remote(endpoint: impl Into<String>, source: Error) -> Self {
        Error::RemoteCallFailed {
            endpoint: endpoint.into(),
            source: Box::new(source),
        }
    }

    /// True when the error (or the cause of a failed remote call) is a timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Timeout(_) => true,
            Error::RemoteCallFailed { source, .. } => source.is_timeout(),
            _ => false,
        }
    }

    /// True when the error (or the cause of a failed remote call) is a cancellation.
    pub fn is_cancelled(&self) -> bool {
        match self {
            Error::Cancelled(_) => true,
            Error::RemoteCallFailed { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
