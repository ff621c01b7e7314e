use thiserror::Error;

/// Error type for remote and session operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("network error: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("{message} ({status})")]
    Rejected { status: u16, message: String },
    #[error("invalid response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
    #[error("login returned no token")]
    MissingToken,
    #[error("login code unavailable: {0}")]
    LoginCode(String),
    #[error("credential store: {0}")]
    Store(String),
}

/// Result type for remote and session operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// HTTP status carried by the failure, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Rejected { status, .. } => Some(*status),
            Error::Unauthorized(_) => Some(401),
            _ => None,
        }
    }

    /// Text shown to the user when an action fails; `fallback` covers
    /// failures that carry no server message.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Error::Rejected { message, .. } if !message.trim().is_empty() => message.clone(),
            _ => fallback.to_string(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Store(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Store(err.to_string())
    }
}
