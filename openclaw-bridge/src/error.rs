//! Error types for gateway communication.

/// Failures of a single gateway call.
///
/// Authentication and connectivity failures are kept apart because setup
/// maps them to different remediation: re-enter credentials versus wait
/// for the next attempt.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The gateway rejected the token (HTTP 401/403).
    #[error("Authentication failed: gateway returned {status}")]
    Authentication { status: u16 },

    /// The gateway could not be reached, the call timed out, or the
    /// transport was closed underneath it.
    #[error("Cannot connect to gateway: {0}")]
    Connectivity(String),

    /// Any other HTTP error status, with a best-effort body excerpt.
    #[error("Gateway request failed with status {status}: {body}")]
    Gateway { status: u16, body: String },

    /// Transport failure that is neither a connect error nor a timeout.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

impl Error {
    pub fn is_auth(&self) -> bool {
        matches!(self, Error::Authentication { .. })
    }

    /// Classify a reqwest failure into the taxonomy.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Connectivity(format!("request timed out: {}", err))
        } else if err.is_connect() {
            Error::Connectivity(err.to_string())
        } else {
            Error::Transport(err)
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
