//! One-shot discovery of local Ollama models for the dynamic catalog group.

use crate::backend::{Backend, BackendError};
use crate::catalog::{OLLAMA_PREFIX, OLLAMA_SECTION};
use crate::model::{ProviderGroup, ProviderOption};
use tracing::{info, warn};

pub const NO_MODELS_LABEL: &str = "No Ollama models found";
pub const UNAVAILABLE_LABEL: &str = "Ollama not available";

/// Build the dynamic group from a discovery outcome.
///
/// Empty results and failures each yield a single disabled entry.
pub fn dynamic_options(outcome: Result<Vec<String>, BackendError>) -> Vec<ProviderOption> {
    match outcome {
        Ok(models) if models.is_empty() => vec![ProviderOption::placeholder(
            "",
            NO_MODELS_LABEL,
            ProviderGroup::Dynamic,
            OLLAMA_SECTION,
        )],
        Ok(models) => models
            .into_iter()
            .map(|model| {
                ProviderOption::selectable(
                    format!("{OLLAMA_PREFIX}{model}"),
                    model,
                    ProviderGroup::Dynamic,
                    OLLAMA_SECTION,
                )
            })
            .collect(),
        Err(_) => vec![ProviderOption::placeholder(
            "",
            UNAVAILABLE_LABEL,
            ProviderGroup::Dynamic,
            OLLAMA_SECTION,
        )],
    }
}

/// Ask the backend for local models and turn the answer into catalog entries.
pub async fn discover(backend: &dyn Backend) -> Vec<ProviderOption> {
    let outcome = backend.discover_models().await;
    match &outcome {
        Ok(models) => info!(count = models.len(), "ollama discovery finished"),
        Err(e) => warn!(error = %e, "failed to load ollama models"),
    }
    dynamic_options(outcome)
}
