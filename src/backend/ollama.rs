//! Ollama model listing over HTTP (`/api/tags`) and from `ollama list` output.

use super::BackendError;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    name: String,
}

/// Strip the implicit tag, drop empties, sort.
fn normalize(names: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut models: Vec<String> = names
        .into_iter()
        .map(|n| n.replace(":latest", ""))
        .filter(|n| !n.is_empty())
        .collect();
    models.sort();
    models
}

/// Extract model names from the tabular output of `ollama list`.
pub fn parse_list_output(stdout: &str) -> Vec<String> {
    normalize(
        stdout
            .lines()
            .filter(|line| !line.starts_with("NAME") && !line.trim().is_empty())
            .filter_map(|line| line.split_whitespace().next())
            .map(str::to_string),
    )
}

/// Extract model names from a `/api/tags` response body.
pub fn parse_tags_response(body: &str) -> Result<Vec<String>, BackendError> {
    let tags: TagsResponse = serde_json::from_str(body).map_err(|e| BackendError::Parse {
        what: "Ollama tags",
        reason: e.to_string(),
    })?;
    Ok(normalize(tags.models.into_iter().map(|m| m.name)))
}

pub(crate) async fn fetch_tags(
    base_url: &str,
    timeout: Duration,
) -> Result<Vec<String>, BackendError> {
    let client = Client::builder().timeout(timeout).build()?;
    let url = format!("{}/api/tags", base_url.trim_end_matches('/'));
    debug!(%url, "querying ollama tags");

    let response = client.get(&url).send().await.map_err(|e| {
        if e.is_connect() {
            BackendError::Unavailable(format!("Ollama at {base_url}"))
        } else {
            BackendError::Http(e)
        }
    })?;

    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(BackendError::Rejected(format!(
            "Ollama returned HTTP {status}: {}",
            body.trim()
        )));
    }
    parse_tags_response(&body)
}
