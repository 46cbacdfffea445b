use thiserror::Error;
use vortex_extract::ExtractError;

#[derive(Error, Debug)]
pub enum ClientError {
    /// A required binding failed: the page layout changed or the wrong
    /// schema was applied. Never recovered locally.
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// The site rejected a state-changing action and re-rendered the
    /// page with inline error text.
    #[error("action rejected: {}", messages.join("; "))]
    Action { messages: Vec<String> },

    /// The resource is blocked for this session (sign-in required,
    /// region or content block).
    #[error("access restricted: {notice}")]
    Restricted { notice: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A status the response conventions don't account for.
    #[error("unexpected status {status}: {reason}")]
    Status { status: u16, reason: String },

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, ClientError>;
