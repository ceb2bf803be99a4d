use thiserror::Error;

/// Failure of a single read or write against the club site.
///
/// Never crosses the collaborator boundary: `RemoteState` methods log it
/// and report "no signal" instead.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("page is missing {0}")]
    MissingField(&'static str),

    #[error("invalid {field}: {value:?}")]
    InvalidField { field: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, RemoteError>;
