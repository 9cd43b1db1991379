//! Open the target channel.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::info;

use artflow_browser::Page;

use crate::action::{Action, ActionSchema, ParamKind, ParamSpec};
use crate::config::{PausePolicy, RunConfig};
use crate::error::{AutomationError, Result};

/// Navigate to a channel and wait for its content to settle.
pub struct OpenChannelAction {
    config: Arc<RunConfig>,
}

impl OpenChannelAction {
    pub fn new(config: Arc<RunConfig>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Action for OpenChannelAction {
    fn name(&self) -> &str {
        "open_channel"
    }

    fn description(&self) -> &str {
        "Go to a channel and wait for it to finish loading"
    }

    fn schema(&self) -> ActionSchema {
        ActionSchema::new(vec![ParamSpec::required(
            "channel_url",
            ParamKind::String,
            "URL of the channel to open",
        )])
    }

    async fn execute(&self, params: Value, page: &dyn Page) -> Result<Value> {
        let url = params["channel_url"].as_str().unwrap_or_default();

        page.navigate(url)
            .await
            .map_err(|e| AutomationError::Navigation(e.to_string()))?;
        PausePolicy::sleep(self.config.pauses.action).await;
        page.wait_for_idle(self.config.idle_timeout)
            .await
            .map_err(|e| AutomationError::Navigation(e.to_string()))?;

        info!(url, "opened channel");
        Ok(json!({ "opened": url }))
    }
}
