use crate::backend::RunnerConfig;
use crate::orchestrator::Timings;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShellConfig {
    pub runner: RunnerConfig,
    #[serde(with = "humantime_serde")]
    pub confirm_revert: Duration,
    #[serde(with = "humantime_serde")]
    pub startup_hint: Duration,
}

impl ShellConfig {
    pub fn timings(&self) -> Timings {
        Timings {
            confirm_revert: self.confirm_revert,
            startup_hint: self.startup_hint,
        }
    }
}

/// Text shown in the output slot when no message is displayed.
pub const PLACEHOLDER_TEXT: &str = "Results will appear here...";

/// Which part of the catalog an option belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderGroup {
    /// Built-in entries, fixed for the lifetime of the process.
    Static,
    /// Entries produced by local model discovery.
    Dynamic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderOption {
    pub id: String,
    pub display_name: String,
    pub group: ProviderGroup,
    pub selectable: bool,
    /// Heading the option is listed under in the selector.
    pub section: String,
}

impl ProviderOption {
    pub fn selectable(
        id: impl Into<String>,
        display_name: impl Into<String>,
        group: ProviderGroup,
        section: &str,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            group,
            selectable: true,
            section: section.to_string(),
        }
    }

    /// A disabled entry that carries a label but no usable id.
    pub fn placeholder(
        id: impl Into<String>,
        display_name: impl Into<String>,
        group: ProviderGroup,
        section: &str,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            group,
            selectable: false,
            section: section.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Success,
    Error,
    Normal,
}

/// Contents of the single-slot output area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputState {
    Placeholder,
    Message { content: String, severity: Severity },
}

impl OutputState {
    pub fn is_message(&self) -> bool {
        matches!(self, OutputState::Message { .. })
    }

    /// Text currently visible in the slot.
    pub fn text(&self) -> &str {
        match self {
            OutputState::Placeholder => PLACEHOLDER_TEXT,
            OutputState::Message { content, .. } => content,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationRequest {
    pub prompt: String,
    pub provider_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvocationResult {
    Success(String),
    Failure(String),
}

impl InvocationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, InvocationResult::Success(_))
    }
}

impl<E: std::fmt::Display> From<Result<String, E>> for InvocationResult {
    fn from(outcome: Result<String, E>) -> Self {
        match outcome {
            Ok(text) => InvocationResult::Success(text),
            Err(e) => InvocationResult::Failure(e.to_string()),
        }
    }
}

/// Controls of the presentation surface the controller can address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Control {
    Prompt,
    Provider,
    Run,
}

impl Control {
    pub fn next(self) -> Self {
        match self {
            Control::Prompt => Control::Provider,
            Control::Provider => Control::Run,
            Control::Run => Control::Prompt,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Control::Prompt => Control::Run,
            Control::Provider => Control::Prompt,
            Control::Run => Control::Provider,
        }
    }
}

/// Updates pushed from the controller to a presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Output(OutputState),
    Busy(bool),
    DynamicGroup(Vec<ProviderOption>),
    Focus(Control),
    SelectionCleared,
}
