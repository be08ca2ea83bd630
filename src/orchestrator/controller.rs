//! Session event loop.
//!
//! Owns the invocation controller and multiplexes UI commands, the in-flight
//! backend call, the one-shot model discovery and the output reversion deadline.

use super::invocation::InvocationController;
use super::presenter::PresentationPort;
use crate::backend::{Backend, BackendError};
use crate::discovery;
use crate::model::ProviderOption;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Commands emitted by UI layers.
#[derive(Debug, Clone)]
pub(crate) enum UiCommand {
    /// Raw value of the provider selector.
    Select(String),
    /// Untrimmed prompt text.
    Run(String),
    Quit,
}

/// Drive a session until the UI quits or drops its command sender.
/// Returns the controller so callers can inspect the final state.
pub(crate) async fn run_controller<P: PresentationPort>(
    backend: Arc<dyn Backend>,
    mut controller: InvocationController<P>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> InvocationController<P> {
    controller.startup();

    let discovery_backend = backend.clone();
    let mut discovery: Option<JoinHandle<Vec<ProviderOption>>> = Some(tokio::spawn(async move {
        discovery::discover(discovery_backend.as_ref()).await
    }));
    let mut in_flight: Option<JoinHandle<Result<String, BackendError>>> = None;

    loop {
        let reversion_at = controller.reversion_deadline();
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UiCommand::Select(value)) => controller.select(&value),
                    Some(UiCommand::Run(prompt)) => {
                        if let Some(request) = controller.begin_run(&prompt) {
                            let backend = backend.clone();
                            in_flight = Some(tokio::spawn(async move {
                                backend.run_command(&request).await
                            }));
                        }
                    }
                    Some(UiCommand::Quit) | None => {
                        // Aborting drops the call future, which kills a running child.
                        if let Some(handle) = in_flight.take() {
                            info!("quitting with an invocation in flight");
                            handle.abort();
                        }
                        if let Some(handle) = discovery.take() {
                            handle.abort();
                        }
                        break;
                    }
                }
            }
            // Do not take the JoinHandle before this branch wins; otherwise it is dropped
            // when another branch is chosen and the completion is never observed.
            joined = async {
                match in_flight.as_mut() {
                    Some(h) => h.await,
                    None => futures::future::pending().await,
                }
            } => {
                in_flight = None;
                let outcome = joined.unwrap_or_else(|e| Err(BackendError::Aborted(e.to_string())));
                controller.finish_run(outcome);
            }
            found = async {
                match discovery.as_mut() {
                    Some(h) => h.await,
                    None => futures::future::pending().await,
                }
            } => {
                discovery = None;
                let options = found.unwrap_or_else(|e| {
                    warn!(error = %e, "discovery task failed");
                    discovery::dynamic_options(Err(BackendError::Aborted(e.to_string())))
                });
                controller.apply_discovery(options);
            }
            _ = async {
                match reversion_at {
                    Some(at) => tokio::time::sleep_until(at).await,
                    None => futures::future::pending().await,
                }
            } => {
                controller.revert_output();
            }
        }
    }

    controller
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::UNAVAILABLE_LABEL;
    use crate::model::{OutputState, Severity, UiEvent};
    use crate::orchestrator::invocation::{Timings, STARTUP_HINT};
    use crate::orchestrator::testing::{RecordingPort, StubBackend};
    use crate::orchestrator::selection::SelectionState;
    use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
    use tokio::time::{sleep, Duration};

    type Session = (
        RecordingPort,
        UnboundedSender<UiCommand>,
        JoinHandle<InvocationController<RecordingPort>>,
    );

    fn start(backend: StubBackend) -> Session {
        let port = RecordingPort::default();
        let (tx, rx) = unbounded_channel();
        let controller = InvocationController::new(port.clone(), Timings::default());
        let handle = tokio::spawn(run_controller(Arc::new(backend), controller, rx));
        (port, tx, handle)
    }

    fn last_output(port: &RecordingPort) -> OutputState {
        port.outputs().pop().unwrap_or(OutputState::Placeholder)
    }

    #[tokio::test(start_paused = true)]
    async fn startup_hint_reverts_after_four_seconds() {
        let (port, tx, handle) = start(StubBackend::new());

        sleep(Duration::from_millis(3900)).await;
        assert_eq!(last_output(&port).text(), STARTUP_HINT);

        sleep(Duration::from_millis(200)).await;
        assert_eq!(last_output(&port), OutputState::Placeholder);

        tx.send(UiCommand::Quit).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn discovery_runs_once_and_populates_group() {
        let backend = StubBackend::new().with_models(Ok(vec!["llama3".into()]));
        let (port, tx, handle) = start(backend);

        sleep(Duration::from_millis(10)).await;
        let groups = port.groups();
        // Loading placeholder at startup, then the discovered models.
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[1][0].id, "ollama-llama3");

        drop(tx);
        let controller = handle.await.unwrap();
        assert!(controller.catalog().find("ollama-llama3").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_discovery_leaves_session_usable() {
        let backend = StubBackend::new()
            .with_models(Err("connection refused".into()))
            .with_reply(Ok("ok".into()));
        let (port, tx, handle) = start(backend);

        tx.send(UiCommand::Select("gemini-pro".into())).unwrap();
        tx.send(UiCommand::Run("Hi".into())).unwrap();
        sleep(Duration::from_millis(10)).await;

        assert_eq!(port.groups()[1][0].display_name, UNAVAILABLE_LABEL);
        assert_eq!(
            last_output(&port),
            OutputState::Message {
                content: "ok".into(),
                severity: Severity::Success
            }
        );
        tx.send(UiCommand::Quit).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn confirmation_reverts_after_three_seconds() {
        let (port, tx, handle) = start(StubBackend::new());
        tx.send(UiCommand::Select("ollama-llama3".into())).unwrap();

        sleep(Duration::from_millis(2900)).await;
        assert_eq!(
            last_output(&port).text(),
            "✅ llama3 (Ollama) selected. Ready for commands!"
        );

        sleep(Duration::from_millis(200)).await;
        assert_eq!(last_output(&port), OutputState::Placeholder);

        tx.send(UiCommand::Quit).unwrap();
        let controller = handle.await.unwrap();
        assert_eq!(
            controller.selection(),
            &SelectionState::Selected("ollama-llama3".into())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_runs_reach_backend_once() {
        let backend = StubBackend::new()
            .with_reply(Ok("42".into()))
            .with_delay(Duration::from_secs(1));
        let (port, tx, handle) = start(backend);

        tx.send(UiCommand::Select("claude-3-opus".into())).unwrap();
        tx.send(UiCommand::Run("Hello".into())).unwrap();
        tx.send(UiCommand::Run("Hello".into())).unwrap();

        sleep(Duration::from_millis(500)).await;
        assert_eq!(
            last_output(&port).text(),
            "Executing command with Claude 3 Opus..."
        );

        sleep(Duration::from_secs(1)).await;
        assert_eq!(
            last_output(&port),
            OutputState::Message {
                content: "42".into(),
                severity: Severity::Success
            }
        );
        let busy: Vec<_> = port
            .events()
            .into_iter()
            .filter(|e| matches!(e, UiEvent::Busy(_)))
            .collect();
        assert_eq!(busy, vec![UiEvent::Busy(true), UiEvent::Busy(false)]);

        // The result must survive past the old confirmation deadline.
        sleep(Duration::from_secs(5)).await;
        assert_eq!(last_output(&port).text(), "42");

        tx.send(UiCommand::Quit).unwrap();
        let controller = handle.await.unwrap();
        assert!(!controller.is_busy());
    }
}
