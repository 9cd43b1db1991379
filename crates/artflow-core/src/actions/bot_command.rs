//! Invoke the bot's slash command in the chat bar.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::info;

use artflow_browser::{Page, PageError};

use crate::action::{Action, ActionSchema, ParamKind, ParamSpec};
use crate::config::{PausePolicy, RunConfig};
use crate::error::{AutomationError, Result};
use crate::selectors;

/// Type the bot command into the chat bar and pick the suggestion the
/// command UI offers.
pub struct SendBotCommandAction {
    config: Arc<RunConfig>,
}

impl SendBotCommandAction {
    pub fn new(config: Arc<RunConfig>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Action for SendBotCommandAction {
    fn name(&self) -> &str {
        "send_bot_command"
    }

    fn description(&self) -> &str {
        "Select a command for the bot in the chat bar"
    }

    fn schema(&self) -> ActionSchema {
        ActionSchema::new(vec![
            ParamSpec::required("command", ParamKind::String, "slash command to invoke"),
            ParamSpec::required(
                "chat_placeholder",
                ParamKind::String,
                "placeholder label of the chat textbox",
            ),
        ])
    }

    async fn execute(&self, params: Value, page: &dyn Page) -> Result<Value> {
        let command = params["command"].as_str().unwrap_or_default();
        let placeholder = params["chat_placeholder"].as_str().unwrap_or_default();

        info!(command, "typing bot command into the chat bar");
        PausePolicy::sleep(self.config.pauses.action).await;
        page.fill_textbox_by_label(placeholder, command)
            .await
            .map_err(element)?;

        page.wait_for_selector_visible(selectors::COMMAND_SUGGESTION, self.config.suggestion_timeout)
            .await
            .map_err(element)?;
        PausePolicy::sleep(self.config.pauses.action).await;
        page.click(selectors::COMMAND_SUGGESTION).await.map_err(element)?;

        info!(command, "selected the command suggestion");
        Ok(json!({ "command": command }))
    }
}

fn element(e: PageError) -> AutomationError {
    AutomationError::ElementNotFound(e.to_string())
}
