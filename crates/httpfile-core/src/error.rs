use crate::canon::CanonError;
use crate::fetch::LoadError;
use thiserror::Error;

/// Core error type for httpfile operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Canon(#[from] CanonError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("failed to create HTTP client: {0}")]
    Client(String),
}

impl Error {
    #[must_use]
    pub fn client(msg: impl Into<String>) -> Self {
        Self::Client(msg.into())
    }
}
