//! Test doubles for the backend and the presentation port.

use super::presenter::PresentationPort;
use crate::backend::{Backend, BackendError};
use crate::model::{Control, InvocationRequest, OutputState, ProviderOption, UiEvent};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Port that records every call as a [`UiEvent`]. Clones share the log.
#[derive(Debug, Clone, Default)]
pub struct RecordingPort {
    log: Arc<Mutex<Vec<UiEvent>>>,
}

impl RecordingPort {
    fn push(&self, ev: UiEvent) {
        self.log.lock().unwrap().push(ev);
    }

    pub fn events(&self) -> Vec<UiEvent> {
        self.log.lock().unwrap().clone()
    }

    pub fn outputs(&self) -> Vec<OutputState> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                UiEvent::Output(o) => Some(o),
                _ => None,
            })
            .collect()
    }

    pub fn groups(&self) -> Vec<Vec<ProviderOption>> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                UiEvent::DynamicGroup(g) => Some(g),
                _ => None,
            })
            .collect()
    }
}

impl PresentationPort for RecordingPort {
    fn render_output(&mut self, output: &OutputState) {
        self.push(UiEvent::Output(output.clone()));
    }

    fn set_busy(&mut self, busy: bool) {
        self.push(UiEvent::Busy(busy));
    }

    fn populate_group(&mut self, options: &[ProviderOption]) {
        self.push(UiEvent::DynamicGroup(options.to_vec()));
    }

    fn focus_control(&mut self, control: Control) {
        self.push(UiEvent::Focus(control));
    }

    fn clear_selection(&mut self) {
        self.push(UiEvent::SelectionCleared);
    }
}

/// Backend with canned answers. Errors are given as descriptions and come back
/// as [`BackendError::Rejected`]; a missing model list means the capability is
/// absent.
#[derive(Debug, Default)]
pub struct StubBackend {
    reply: Option<Result<String, String>>,
    models: Option<Result<Vec<String>, String>>,
    delay: Option<std::time::Duration>,
    requests: Mutex<Vec<InvocationRequest>>,
    discover_calls: Mutex<usize>,
}

impl StubBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(mut self, reply: Result<String, String>) -> Self {
        self.reply = Some(reply);
        self
    }

    pub fn with_models(mut self, models: Result<Vec<String>, String>) -> Self {
        self.models = Some(models);
        self
    }

    /// Make `run_command` sleep before answering.
    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<InvocationRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn run_calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn discover_calls(&self) -> usize {
        *self.discover_calls.lock().unwrap()
    }
}

#[async_trait]
impl Backend for StubBackend {
    async fn run_command(&self, request: &InvocationRequest) -> Result<String, BackendError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.reply {
            Some(Ok(text)) => Ok(text.clone()),
            Some(Err(description)) => Err(BackendError::Rejected(description.clone())),
            None => Err(BackendError::Unavailable("run command".into())),
        }
    }

    async fn discover_models(&self) -> Result<Vec<String>, BackendError> {
        *self.discover_calls.lock().unwrap() += 1;
        match &self.models {
            Some(Ok(models)) => Ok(models.clone()),
            Some(Err(description)) => Err(BackendError::Rejected(description.clone())),
            None => Err(BackendError::Unavailable("model discovery".into())),
        }
    }
}
