//! Subprocess-backed implementation of [`Backend`].
//!
//! Prompts are handed to the runner script on stdin, with the provider id as its
//! only argument. Model discovery talks to Ollama over HTTP, or falls back to
//! parsing `ollama list`.

use super::{ollama, Backend, BackendError};
use crate::model::InvocationRequest;
use async_trait::async_trait;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

/// Interpreters tried in order when none is configured.
const DEFAULT_INTERPRETERS: &[&str] = &["python3", "python"];

/// How local models are enumerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryMode {
    /// HTTP first, then the `ollama` binary.
    #[default]
    Auto,
    Http,
    Cli,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    pub script: PathBuf,
    pub python: Option<String>,
    pub ollama_url: String,
    pub ollama_bin: String,
    pub discovery: DiscoveryMode,
    #[serde(with = "humantime_serde")]
    pub discovery_timeout: Duration,
}

pub struct ProcessBackend {
    cfg: RunnerConfig,
}

impl ProcessBackend {
    pub fn new(cfg: RunnerConfig) -> Self {
        Self { cfg }
    }

    fn runner_command(&self, program: &str, provider_id: &str) -> Command {
        let mut cmd = Command::new(program);
        cmd.env("PYTHONIOENCODING", "utf-8")
            .arg(&self.cfg.script)
            .arg(provider_id)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// Spawn the runner with the first interpreter that starts.
    fn spawn_runner(&self, provider_id: &str) -> Result<(String, Child), BackendError> {
        let candidates: Vec<&str> = match self.cfg.python.as_deref() {
            Some(program) => vec![program],
            None => DEFAULT_INTERPRETERS.to_vec(),
        };

        let mut failure = None;
        for program in candidates {
            match self.runner_command(program, provider_id).spawn() {
                Ok(child) => return Ok((program.to_string(), child)),
                Err(source) => {
                    debug!(program, error = %source, "interpreter did not start");
                    failure = Some(BackendError::Spawn {
                        program: program.to_string(),
                        source,
                    });
                }
            }
        }
        Err(failure.unwrap_or_else(|| BackendError::Unavailable("Python interpreter".into())))
    }

    async fn list_via_cli(&self) -> Result<Vec<String>, BackendError> {
        let program = self.cfg.ollama_bin.as_str();
        let output = Command::new(program)
            .arg("list")
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| {
                if source.kind() == std::io::ErrorKind::NotFound {
                    BackendError::Unavailable(program.to_string())
                } else {
                    BackendError::Spawn {
                        program: program.to_string(),
                        source,
                    }
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BackendError::Rejected(format!(
                "Ollama command failed: {}",
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8(output.stdout).map_err(|e| BackendError::Parse {
            what: "ollama",
            reason: e.to_string(),
        })?;
        Ok(ollama::parse_list_output(&stdout))
    }
}

#[async_trait]
impl Backend for ProcessBackend {
    async fn run_command(&self, request: &InvocationRequest) -> Result<String, BackendError> {
        let (program, mut child) = self.spawn_runner(&request.provider_id)?;
        info!(%program, provider = %request.provider_id, "runner started");

        // Dropping stdin after the write closes the pipe so the script sees EOF.
        if let Some(mut stdin) = child.stdin.take() {
            let io_err = |source| BackendError::Io {
                program: program.clone(),
                source,
            };
            stdin
                .write_all(request.prompt.as_bytes())
                .await
                .map_err(io_err)?;
            stdin.flush().await.map_err(io_err)?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|source| BackendError::Io {
                program: program.clone(),
                source,
            })?;

        if output.status.success() {
            String::from_utf8(output.stdout).map_err(|e| BackendError::Parse {
                what: "Python",
                reason: e.to_string(),
            })
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(status = %output.status, "runner exited with failure");
            Err(BackendError::ScriptFailed(stderr.trim().to_string()))
        }
    }

    async fn discover_models(&self) -> Result<Vec<String>, BackendError> {
        let url = self.cfg.ollama_url.as_str();
        let timeout = self.cfg.discovery_timeout;
        match self.cfg.discovery {
            DiscoveryMode::Http => ollama::fetch_tags(url, timeout).await,
            DiscoveryMode::Cli => self.list_via_cli().await,
            DiscoveryMode::Auto => match ollama::fetch_tags(url, timeout).await {
                Ok(models) => Ok(models),
                Err(e) => {
                    debug!(error = %e, "ollama http discovery failed, trying cli");
                    self.list_via_cli().await
                }
            },
        }
    }
}
