//! Error types for console operations

/// Result type alias for console operations
pub type ConsoleResult<T> = Result<T, ConsoleError>;

/// Errors that can occur while talking to the backend or driving an execution
///
/// Every variant is cloneable so that failures can travel inside events and be kept in the
/// console state for display.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConsoleError {
    /// The request never reached the backend or no response came back
    #[error("connection failed: {0}")]
    Transport(String),

    /// The backend answered with a non-success status code
    #[error("HTTP {status}: {message}")]
    Response { status: u16, message: String },

    /// The backend answered successfully but the body was not JSON
    #[error("invalid response body: {0}")]
    InvalidBody(String),

    /// A recommendation token could not be decoded
    #[error("malformed recommendation token: {0}")]
    Decode(String),

    /// The backend ran the operation and reported `success: false`
    #[error("{0}")]
    Application(String),

    /// The operation needs a selected host
    #[error("no host selected")]
    NoHostSelected,

    /// The host is not part of the listed hosts
    #[error("unknown host: {0}")]
    UnknownHost(String),
}

impl ConsoleError {
    /// Message shown to the operator for a failed execution
    ///
    /// Application errors are displayed verbatim, everything else with its category.
    pub fn user_message(&self) -> String {
        match self {
            ConsoleError::Application(msg) => msg.clone(),
            other => other.to_string(),
        }
    }

    /// Whether this error means the host could not be reached at all
    pub fn is_transport(&self) -> bool {
        matches!(self, ConsoleError::Transport(_))
    }
}

impl From<reqwest::Error> for ConsoleError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return ConsoleError::InvalidBody(err.to_string());
        }

        match err.status() {
            Some(status) => ConsoleError::Response {
                status: status.as_u16(),
                message: status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_string(),
            },
            None => ConsoleError::Transport(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ConsoleError {
    fn from(err: serde_json::Error) -> Self {
        ConsoleError::InvalidBody(err.to_string())
    }
}
