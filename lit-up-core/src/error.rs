//! Error types for update execution and rendering
//!
//! A string update that does not resolve is not an error: see
//! [`Lookup`](crate::registry::Lookup).

use std::borrow::Cow;
use std::io;

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Fault raised by an update function, either synchronously or from its
/// pending result.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct UpdateError {
    message: Cow<'static, str>,
    #[source]
    source: Option<BoxError>,
}

impl UpdateError {
    /// Create an error with a message only.
    pub fn new(message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an underlying error.
    pub fn from_source<Err>(message: impl Into<Cow<'static, str>>, source: Err) -> Self
    where
        Err: std::error::Error + Send + Sync + 'static,
    {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<&'static str> for UpdateError {
    fn from(message: &'static str) -> Self {
        Self::new(message)
    }
}

impl From<String> for UpdateError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// Fault raised by the external render function.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("render failed: {0}")]
    Failed(String),

    #[error("render I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Error returned by a dispatch handler.
///
/// The model may already have been mutated when this is returned; the next
/// successful dispatch paints the latest model regardless.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("update `{update}` failed: {source}")]
    Update {
        update: String,
        #[source]
        source: UpdateError,
    },

    #[error(transparent)]
    Render(#[from] RenderError),
}

impl DispatchError {
    /// Name of the failing update, if the fault came from an update.
    pub fn update_name(&self) -> Option<&str> {
        match self {
            DispatchError::Update { update, .. } => Some(update),
            DispatchError::Render(_) => None,
        }
    }
}
