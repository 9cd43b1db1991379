//! Core automation engine: action registry, timeline polling, prompt queue,
//! and the sequential job runner.

pub mod action;
pub mod actions;
pub mod config;
pub mod error;
pub mod naming;
pub mod poller;
pub mod queue;
pub mod runner;
pub mod selectors;

#[cfg(test)]
pub(crate) mod testutil;

pub use action::{Action, ActionRegistry, ActionSchema, ParamKind, ParamSpec};
pub use config::{PausePolicy, RunConfig};
pub use error::{AutomationError, Result};
pub use queue::{PromptJob, PromptQueue};
pub use runner::Runner;
