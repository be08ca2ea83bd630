//! Single-slot output area and the presentation port it renders through.

use crate::model::{Control, OutputState, ProviderOption, Severity};
use tokio::time::{Duration, Instant};

/// Capabilities of a presentation surface the controller drives.
pub trait PresentationPort: Send {
    /// Show the slot contents, scrolled to the latest text.
    fn render_output(&mut self, output: &OutputState);
    /// Toggle the run control between idle and running.
    fn set_busy(&mut self, busy: bool);
    /// Replace the options of the discovered-models group.
    fn populate_group(&mut self, options: &[ProviderOption]);
    fn focus_control(&mut self, control: Control);
    /// Reset the provider selector to show no choice.
    fn clear_selection(&mut self);
}

/// Owns the output slot and its pending reversion.
///
/// Each `display` cancels the pending reversion, so a timer armed for an older
/// message never clears a newer one.
#[derive(Debug)]
pub struct OutputPresenter {
    state: OutputState,
    reversion_at: Option<Instant>,
}

impl Default for OutputPresenter {
    fn default() -> Self {
        Self {
            state: OutputState::Placeholder,
            reversion_at: None,
        }
    }
}

impl OutputPresenter {
    pub fn state(&self) -> &OutputState {
        &self.state
    }

    pub fn reversion_deadline(&self) -> Option<Instant> {
        self.reversion_at
    }

    pub fn display<P: PresentationPort + ?Sized>(
        &mut self,
        port: &mut P,
        content: impl Into<String>,
        severity: Severity,
    ) {
        self.reversion_at = None;
        self.state = OutputState::Message {
            content: content.into(),
            severity,
        };
        port.render_output(&self.state);
    }

    /// Arm the slot's reversion, replacing any pending one.
    pub fn schedule_reversion(&mut self, delay: Duration) {
        self.reversion_at = Some(Instant::now() + delay);
    }

    /// Fire the pending reversion. Returns true if a message was replaced.
    pub fn revert<P: PresentationPort + ?Sized>(&mut self, port: &mut P) -> bool {
        self.reversion_at = None;
        if !self.state.is_message() {
            return false;
        }
        self.state = OutputState::Placeholder;
        port.render_output(&self.state);
        true
    }
}
