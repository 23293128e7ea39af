use thiserror::Error;

pub type SessionResult<T> = std::result::Result<T, SessionError>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no source could be loaded")]
    NoSources,
    #[error("display failed: {0}")]
    Display(String),
}
