//! Submit the prompt text into the command pill.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::info;

use artflow_browser::Page;

use crate::action::{Action, ActionSchema, ParamKind, ParamSpec};
use crate::config::{PausePolicy, RunConfig};
use crate::error::{AutomationError, Result};
use crate::selectors;

/// Fill the prompt pill the slash command injected, pause, and submit.
pub struct SubmitPromptAction {
    config: Arc<RunConfig>,
}

impl SubmitPromptAction {
    pub fn new(config: Arc<RunConfig>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Action for SubmitPromptAction {
    fn name(&self) -> &str {
        "submit_prompt"
    }

    fn description(&self) -> &str {
        "Type the prompt into the command pill and press Enter"
    }

    fn schema(&self) -> ActionSchema {
        ActionSchema::new(vec![ParamSpec::required(
            "prompt",
            ParamKind::String,
            "prompt text to generate from",
        )])
    }

    async fn execute(&self, params: Value, page: &dyn Page) -> Result<Value> {
        let prompt = params["prompt"].as_str().unwrap_or_default();
        if prompt.trim().is_empty() {
            return Err(AutomationError::Validation(
                "prompt must not be blank".to_string(),
            ));
        }

        page.fill(selectors::PROMPT_PILL, prompt)
            .await
            .map_err(|e| AutomationError::ElementNotFound(e.to_string()))?;
        PausePolicy::sleep(self.config.pauses.pre_submit).await;
        page.press_key("Enter").await?;

        info!(prompt, "submitted prompt");
        Ok(json!({ "prompt": prompt }))
    }
}
