//! Run lifecycle: validate, lock the run control, call the backend, render,
//! unlock.

use super::presenter::{OutputPresenter, PresentationPort};
use super::selection::{SelectionChange, SelectionState};
use crate::backend::{Backend, BackendError};
use crate::catalog::{resolve_display_name, ProviderCatalog};
use crate::model::{
    Control, InvocationRequest, InvocationResult, OutputState, ProviderOption, Severity,
};
use tokio::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub const EMPTY_PROMPT_MESSAGE: &str = "Please enter a prompt before running.";
pub const NO_PROVIDER_MESSAGE: &str =
    "⚠️ Please select an AI provider first from the provider list.";
pub const STARTUP_HINT: &str = "💡 Please select an AI provider from the list to get started.";

/// Reversion delays for the output slot.
#[derive(Debug, Clone, Copy)]
pub struct Timings {
    /// How long a selection confirmation stays visible.
    pub confirm_revert: Duration,
    /// How long the startup hint stays visible.
    pub startup_hint: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            confirm_revert: Duration::from_millis(3000),
            startup_hint: Duration::from_millis(4000),
        }
    }
}

/// Owns selection, output and catalog state for one session and drives a
/// presentation port.
pub struct InvocationController<P> {
    port: P,
    selection: SelectionState,
    output: OutputPresenter,
    catalog: ProviderCatalog,
    timings: Timings,
    busy: bool,
    discovered: bool,
}

impl<P: PresentationPort> InvocationController<P> {
    pub fn new(port: P, timings: Timings) -> Self {
        Self {
            port,
            selection: SelectionState::default(),
            output: OutputPresenter::default(),
            catalog: ProviderCatalog::new(),
            timings,
            busy: false,
            discovered: false,
        }
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn output(&self) -> &OutputState {
        self.output.state()
    }

    pub fn catalog(&self) -> &ProviderCatalog {
        &self.catalog
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn reversion_deadline(&self) -> Option<Instant> {
        self.output.reversion_deadline()
    }

    fn display(&mut self, content: impl Into<String>, severity: Severity) {
        self.output.display(&mut self.port, content, severity);
    }

    /// Initial focus, the getting-started hint and its reversion.
    pub fn startup(&mut self) {
        self.port.focus_control(Control::Prompt);
        self.port.populate_group(self.catalog.dynamic_options());
        self.display(STARTUP_HINT, Severity::Info);
        self.output.schedule_reversion(self.timings.startup_hint);
    }

    /// Handle a selection event from the provider control.
    pub fn select(&mut self, value: &str) {
        match self.selection.apply(value) {
            SelectionChange::Cleared => {}
            SelectionChange::Rejected => {
                debug!("ignoring selection of the loading placeholder");
                self.port.clear_selection();
            }
            SelectionChange::Selected(id) => {
                let name = resolve_display_name(&id);
                info!(provider = %id, "provider selected");
                self.display(
                    format!("✅ {name} selected. Ready for commands!"),
                    Severity::Success,
                );
                self.output.schedule_reversion(self.timings.confirm_revert);
            }
        }
    }

    /// Validate and lock. Returns the request to send, or `None` when the run
    /// was refused (already busy, empty prompt, no provider).
    pub fn begin_run(&mut self, prompt: &str) -> Option<InvocationRequest> {
        if self.busy {
            debug!("run requested while another invocation is in flight");
            return None;
        }

        let prompt = prompt.trim();
        if prompt.is_empty() {
            self.display(EMPTY_PROMPT_MESSAGE, Severity::Error);
            return None;
        }

        let Some(provider_id) = self.selection.selected().map(str::to_string) else {
            self.display(NO_PROVIDER_MESSAGE, Severity::Error);
            self.port.focus_control(Control::Provider);
            return None;
        };

        self.busy = true;
        self.port.set_busy(true);
        self.display(
            format!("Executing command with {}...", resolve_display_name(&provider_id)),
            Severity::Info,
        );
        info!(provider = %provider_id, chars = prompt.len(), "invocation started");

        Some(InvocationRequest {
            prompt: prompt.to_string(),
            provider_id,
        })
    }

    /// Render the outcome and unlock the run control. Runs for every
    /// outcome, including a call task that died.
    pub fn finish_run(&mut self, outcome: Result<String, BackendError>) -> InvocationResult {
        let result = InvocationResult::from(outcome);
        match &result {
            InvocationResult::Success(text) => {
                info!(bytes = text.len(), "invocation succeeded");
                self.display(text.clone(), Severity::Success);
            }
            InvocationResult::Failure(description) => {
                warn!(error = %description, "invocation failed");
                self.display(format!("Error: {description}"), Severity::Error);
            }
        }
        self.busy = false;
        self.port.set_busy(false);
        result
    }

    /// Full lifecycle in one call. `None` means validation refused the run
    /// and the backend was not contacted.
    pub async fn run(&mut self, backend: &dyn Backend, prompt: &str) -> Option<InvocationResult> {
        let request = self.begin_run(prompt)?;
        let outcome = backend.run_command(&request).await;
        Some(self.finish_run(outcome))
    }

    /// Install the discovered models. Later calls are ignored.
    pub fn apply_discovery(&mut self, options: Vec<ProviderOption>) {
        if self.discovered {
            debug!("discovery already applied");
            return;
        }
        self.discovered = true;
        self.catalog.replace_dynamic(options);
        self.port.populate_group(self.catalog.dynamic_options());
    }

    /// Fire the pending output reversion.
    pub fn revert_output(&mut self) {
        if self.output.revert(&mut self.port) {
            debug!("output reverted to placeholder");
        }
    }
}
