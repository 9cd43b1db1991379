//! The registered browser operations.
//!
//! Each action is a struct holding the shared run configuration (and, for
//! downloads, the byte fetcher); parameters arrive as a schema-validated
//! JSON object, the session page is passed in by the registry.

mod bot_command;
mod download;
mod open_channel;
mod submit_prompt;
mod upscale;
mod wait;

pub use bot_command::SendBotCommandAction;
pub use download::DownloadImagesAction;
pub use open_channel::OpenChannelAction;
pub use submit_prompt::SubmitPromptAction;
pub use upscale::{SelectSubtleUpscaleAction, SelectUpscaleAction};
pub use wait::WaitAction;

use std::sync::Arc;

use artflow_browser::ByteFetcher;

use crate::action::ActionRegistry;
use crate::config::RunConfig;
use crate::error::Result;

/// Register the full action set in its canonical order.
pub fn register_defaults(
    registry: &mut ActionRegistry,
    config: Arc<RunConfig>,
    fetcher: Arc<dyn ByteFetcher>,
) -> Result<()> {
    registry.register(OpenChannelAction::new(config.clone()))?;
    registry.register(SendBotCommandAction::new(config.clone()))?;
    registry.register(SubmitPromptAction::new(config.clone()))?;
    registry.register(SelectUpscaleAction::new(config.clone()))?;
    registry.register(SelectSubtleUpscaleAction::new(config.clone()))?;
    registry.register(DownloadImagesAction::new(config.clone(), fetcher))?;
    registry.register(WaitAction)?;
    Ok(())
}
