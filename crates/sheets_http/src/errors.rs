use std::error::Error as StdError;

use reqwest::StatusCode;

pub type Result<T, E = SheetsHttpError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum SheetsHttpError {
    /// Upstream returned a non-success status.
    ///
    /// The message is taken from the error body when the body is in one of
    /// the known google error formats.
    #[error("{message}")]
    Api { status: StatusCode, message: String },

    #[error("{msg}: {source}")]
    WithSource {
        msg: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("{0}")]
    Invalid(String),
}

impl SheetsHttpError {
    pub fn new(msg: impl Into<String>) -> Self {
        SheetsHttpError::Invalid(msg.into())
    }

    pub fn with_source(
        msg: impl Into<String>,
        source: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        SheetsHttpError::WithSource {
            msg: msg.into(),
            source: source.into(),
        }
    }
}

pub trait ResultExt<T> {
    /// Wrap the error with a static message.
    fn context(self, msg: &'static str) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: StdError + Send + Sync + 'static,
{
    fn context(self, msg: &'static str) -> Result<T> {
        self.map_err(|e| SheetsHttpError::with_source(msg, e))
    }
}
