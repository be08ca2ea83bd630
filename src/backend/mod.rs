//! Backend capabilities the controller depends on.
//!
//! The controller only sees the [`Backend`] trait and the fixed [`BackendError`]
//! type; [`ProcessBackend`] is the real implementation that drives the runner
//! script and the local Ollama service.

mod ollama;
mod process;

pub use ollama::{parse_list_output, parse_tags_response};
pub use process::{DiscoveryMode, ProcessBackend, RunnerConfig};

use crate::model::InvocationRequest;
use async_trait::async_trait;
use thiserror::Error;

/// Failure reported by a backend capability.
///
/// The `Display` output is the description shown to the user after `Error: `.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The capability answered with an error description of its own.
    #[error("{0}")]
    Rejected(String),

    #[error("{0} is not available")]
    Unavailable(String),

    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to talk to {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Python script failed: {0}")]
    ScriptFailed(String),

    #[error("Failed to parse {what} output: {reason}")]
    Parse { what: &'static str, reason: String },

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The task driving the call ended without producing an answer.
    #[error("Invocation aborted: {0}")]
    Aborted(String),
}

#[async_trait]
pub trait Backend: Send + Sync {
    /// Execute a prompt with the given provider and return display-ready text.
    async fn run_command(&self, request: &InvocationRequest) -> Result<String, BackendError>;

    /// List the names of locally installed models.
    async fn discover_models(&self) -> Result<Vec<String>, BackendError>;
}
