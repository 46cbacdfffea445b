use thiserror::Error;

/// A field binding that could not be satisfied. Carries enough context to
/// tell a changed page layout apart from a wrong schema.
#[derive(Error, Debug)]
#[error("field `{field}` at `{path}`: {reason}")]
pub struct ExtractError {
    pub field: &'static str,
    pub path: String,
    pub reason: Reason,
}

impl ExtractError {
    pub fn new(field: &'static str, path: &str, reason: Reason) -> Self {
        Self {
            field,
            path: path.to_string(),
            reason,
        }
    }
}

#[derive(Error, Debug)]
pub enum Reason {
    #[error("no node matched")]
    NoMatch,

    #[error("matched node has no `{0}` attribute")]
    MissingAttribute(String),

    #[error("invalid selector: {0}")]
    BadSelector(String),

    #[error("`{0}` is not an integer")]
    IntFormat(String),

    #[error("`{0}` is not a timestamp")]
    FormatError(String),
}

pub type Result<T> = std::result::Result<T, ExtractError>;
