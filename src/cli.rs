use crate::backend::{Backend, DiscoveryMode, ProcessBackend, RunnerConfig};
use crate::catalog::ProviderCatalog;
use crate::model::{Control, OutputState, ProviderOption, Severity, ShellConfig};
use crate::orchestrator::{InvocationController, PresentationPort, Timings};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "odk-shell",
    version,
    about = "Run prompts against AI providers and local Ollama models"
)]
pub struct Cli {
    /// Runner script that executes a prompt (prompt on stdin, provider id as argument)
    #[arg(long, default_value = "runner.py")]
    pub runner_script: PathBuf,

    /// Interpreter for the runner script (default: python3, then python)
    #[arg(long)]
    pub python: Option<String>,

    /// Base URL of the local Ollama service
    #[arg(long, default_value = "http://localhost:11434")]
    pub ollama_url: String,

    /// Ollama executable used for `ollama list`
    #[arg(long, default_value = "ollama")]
    pub ollama_bin: String,

    /// How local models are discovered
    #[arg(long, value_enum, default_value = "auto")]
    pub discovery: DiscoveryMode,

    /// Timeout for the Ollama HTTP request during discovery
    #[arg(long, default_value = "5s")]
    pub discovery_timeout: humantime::Duration,

    /// How long a provider confirmation stays visible
    #[arg(long, default_value = "3s")]
    pub confirm_revert: humantime::Duration,

    /// How long the startup hint stays visible
    #[arg(long, default_value = "4s")]
    pub startup_hint: humantime::Duration,

    /// Log file (default: <cache dir>/odk-shell/odk-shell.log)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Discover local models, print the provider catalog and exit (no TUI)
    #[arg(long)]
    pub list_models: bool,

    /// Print the catalog as JSON (with --list-models)
    #[arg(long)]
    pub json: bool,

    /// Run a single prompt and exit (no TUI); requires --provider
    #[arg(long, requires = "provider")]
    pub prompt: Option<String>,

    /// Provider id for --prompt, e.g. claude-3-opus or ollama-llama3
    #[arg(long, requires = "prompt")]
    pub provider: Option<String>,
}

impl Cli {
    /// True when the run ends without starting the TUI.
    pub fn is_headless(&self) -> bool {
        self.list_models || self.prompt.is_some()
    }
}

/// Build a `ShellConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> ShellConfig {
    ShellConfig {
        runner: RunnerConfig {
            script: args.runner_script.clone(),
            python: args.python.clone(),
            ollama_url: args.ollama_url.clone(),
            ollama_bin: args.ollama_bin.clone(),
            discovery: args.discovery,
            discovery_timeout: Duration::from(args.discovery_timeout),
        },
        confirm_revert: Duration::from(args.confirm_revert),
        startup_hint: Duration::from(args.startup_hint),
    }
}

/// Run the selected mode and return the process exit code.
pub async fn run(args: Cli) -> Result<i32> {
    if args.json && !args.list_models {
        return Err(anyhow::anyhow!(
            "--json can only be used with --list-models."
        ));
    }

    let cfg = build_config(&args);
    debug!(config = %serde_json::to_string(&cfg)?, "configuration");
    let backend: Arc<dyn Backend> = Arc::new(ProcessBackend::new(cfg.runner.clone()));

    if args.list_models {
        return list_models(backend.as_ref(), args.json).await;
    }

    if let (Some(prompt), Some(provider)) = (args.prompt.as_deref(), args.provider.as_deref()) {
        return run_once(backend, &cfg, prompt, provider).await;
    }

    #[cfg(feature = "tui")]
    return crate::tui::run(backend, cfg.timings()).await.map(|()| 0);

    #[cfg(not(feature = "tui"))]
    return Err(anyhow::anyhow!(
        "built without TUI support; use --prompt with --provider, or --list-models"
    ));
}

/// Presentation port for headless runs: the invocation result on stdout,
/// every status message on stderr.
struct TextPort {
    tx: mpsc::UnboundedSender<OutputLine>,
    running: bool,
}

impl TextPort {
    fn new(tx: mpsc::UnboundedSender<OutputLine>) -> Self {
        Self { tx, running: false }
    }
}

impl PresentationPort for TextPort {
    fn render_output(&mut self, output: &OutputState) {
        let line = match output {
            OutputState::Placeholder => return,
            // The result is rendered before the run control unlocks.
            OutputState::Message {
                content,
                severity: Severity::Success,
            } if self.running => OutputLine::Stdout(content.clone()),
            OutputState::Message { content, .. } => OutputLine::Stderr(content.clone()),
        };
        let _ = self.tx.send(line);
    }

    fn set_busy(&mut self, busy: bool) {
        self.running = busy;
    }

    // There are no controls to update without a UI.
    fn populate_group(&mut self, _options: &[ProviderOption]) {}

    fn focus_control(&mut self, _control: Control) {}

    fn clear_selection(&mut self) {}
}

/// Select `provider` and perform one invocation through the controller.
async fn run_once(
    backend: Arc<dyn Backend>,
    cfg: &ShellConfig,
    prompt: &str,
    provider: &str,
) -> Result<i32> {
    let (out_tx, out_handle) = spawn_output_writer();
    let code = invoke_once(backend.as_ref(), cfg.timings(), out_tx, prompt, provider).await;
    out_handle.await.context("output writer task failed")?;
    Ok(code)
}

/// Exit code of one headless invocation. The controller (and with it the
/// writer channel) is dropped on return.
async fn invoke_once(
    backend: &dyn Backend,
    timings: Timings,
    tx: mpsc::UnboundedSender<OutputLine>,
    prompt: &str,
    provider: &str,
) -> i32 {
    let mut controller = InvocationController::new(TextPort::new(tx), timings);
    controller.select(provider);
    match controller.run(backend, prompt).await {
        Some(r) if r.is_success() => 0,
        _ => 1,
    }
}

async fn list_models(backend: &dyn Backend, json: bool) -> Result<i32> {
    let mut catalog = ProviderCatalog::new();
    catalog.replace_dynamic(crate::discovery::discover(backend).await);

    let (out_tx, out_handle) = spawn_output_writer();
    if json {
        let options: Vec<&ProviderOption> = catalog.options().collect();
        let _ = out_tx.send(OutputLine::Stdout(serde_json::to_string_pretty(&options)?));
    } else {
        for line in catalog_lines(&catalog) {
            let _ = out_tx.send(OutputLine::Stdout(line));
        }
    }
    drop(out_tx);
    out_handle.await.context("output writer task failed")?;
    Ok(0)
}

/// Text rendering of the catalog, grouped by section.
fn catalog_lines(catalog: &ProviderCatalog) -> Vec<String> {
    let mut lines = Vec::new();
    let mut section: Option<&str> = None;
    for option in catalog.options() {
        if section != Some(option.section.as_str()) {
            lines.push(format!("{}:", option.section));
            section = Some(option.section.as_str());
        }
        if option.selectable {
            lines.push(format!("  {:<24} {}", option.id, option.display_name));
        } else {
            lines.push(format!("  ({})", option.display_name));
        }
    }
    lines
}
