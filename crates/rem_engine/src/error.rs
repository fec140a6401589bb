use std::any::Any;
use std::io;

use thiserror::Error;

use crate::compat::ShimKind;
use crate::Stage;

/// Missing or invalid inputs. Reported before any work starts, never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("invalid parameters: {}", .0.join("; "))]
    Invalid(Vec<String>),
    #[error("pipeline does not accept required parameter `{0}` (unsupported pipeline version)")]
    UnsupportedRequired(String),
}

/// A compatibility shim whose failure leaves nothing else able to run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{shim} shim failed: {reason}")]
pub struct AdapterFailure {
    pub shim: ShimKind,
    pub reason: String,
}

/// Anything raised from inside a pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{stage} failed: {message}")]
pub struct ExternalLibraryError {
    pub stage: Stage,
    pub message: String,
    /// Full cause chain, for the console.
    pub detail: Option<String>,
}

impl ExternalLibraryError {
    pub fn from_anyhow(stage: Stage, err: &anyhow::Error) -> Self {
        let chain: Vec<String> = err.chain().skip(1).map(ToString::to_string).collect();
        let detail = if chain.is_empty() {
            None
        } else {
            Some(format!("Caused by:\n    {}", chain.join("\n    ")))
        };
        Self {
            stage,
            message: err.to_string(),
            detail,
        }
    }

    pub fn from_panic(stage: Stage, payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(text) = payload.downcast_ref::<&str>() {
            (*text).to_string()
        } else if let Some(text) = payload.downcast_ref::<String>() {
            text.clone()
        } else {
            "unknown panic payload".to_string()
        };
        Self {
            stage,
            message: format!("panicked: {message}"),
            detail: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("a task is already running")]
    AlreadyRunning,
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("could not spawn worker thread: {0}")]
    Spawn(#[source] io::Error),
}

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
