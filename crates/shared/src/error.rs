use thiserror::Error;

/// Failure family surfaced by the form session agent.
///
/// Everything fatal for the current exchange lands here; the caller is
/// expected to close the session and redirect to the error page rather than
/// retry.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Missing transport context, unresolved upload directory, unrecognized
    /// client-agent class and friends. Never retried.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O failure while issuing a redirect or writing a response body.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// Failure reported by the form-processing engine.
    #[error("engine error: {0}")]
    Engine(String),

    /// No input document source was present on an initialization exchange.
    #[error("no input document found - init failed")]
    MissingDocument,

    /// A URI on the exchange or in configuration did not parse.
    #[error("malformed uri '{uri}': {reason}")]
    BadUri { uri: String, reason: String },
}

impl AgentError {
    pub fn engine(message: impl Into<String>) -> Self {
        Self::Engine(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
