//! Application-level orchestration.
//!
//! This module owns provider selection, the run lifecycle and the output slot.
//! UI and CLI layers talk to it through [`UiCommand`]s and receive updates
//! through a [`PresentationPort`], which keeps the terminal out of the core.

mod controller;
mod invocation;
mod presenter;
mod selection;
#[cfg(test)]
pub(crate) mod testing;

pub(crate) use controller::{run_controller, UiCommand};
pub use invocation::{InvocationController, Timings};
pub use presenter::PresentationPort;
