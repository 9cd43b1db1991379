//! Upscale selection against the generated grid.
//!
//! Two variants: the ordinal picker, which clicks a random subset of the
//! `U1`..`U4` buttons on the four-image grid, and the subtle picker, which
//! waits for and clicks the single `Upscale (Subtle)` control some grids
//! expose instead.

use std::sync::Arc;

use async_trait::async_trait;
use rand::seq::IndexedRandom;
use serde_json::{Value, json};
use tracing::info;

use artflow_browser::Page;

use crate::action::{Action, ActionSchema, ParamKind, ParamSpec};
use crate::config::{PausePolicy, RunConfig};
use crate::error::Result;
use crate::poller::{PollOptions, wait_for_messages};
use crate::selectors;

const MAX_GRID_OPTIONS: usize = 4;

/// Wait for the upscale buttons to appear on the newest message and click a
/// random sample of them.
pub struct SelectUpscaleAction {
    config: Arc<RunConfig>,
}

impl SelectUpscaleAction {
    pub fn new(config: Arc<RunConfig>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Action for SelectUpscaleAction {
    fn name(&self) -> &str {
        "select_upscale"
    }

    fn description(&self) -> &str {
        "Wait for the generated grid and click random upscale options"
    }

    fn schema(&self) -> ActionSchema {
        ActionSchema::new(vec![ParamSpec::optional(
            "count",
            ParamKind::Integer,
            Some(json!(1)),
            "how many of the four options to click",
        )])
    }

    async fn execute(&self, params: Value, page: &dyn Page) -> Result<Value> {
        let count = params["count"].as_u64().unwrap_or(1) as usize;
        let count = count.clamp(1, MAX_GRID_OPTIONS);

        let opts = PollOptions::new(
            "select_upscale",
            self.config.upscale_poll_interval,
            self.config.upscale_timeout,
        );
        wait_for_messages(
            || page.query_text_all(selectors::MESSAGE_LIST_ITEM),
            |tail| tail.iter().any(|m| m.contains(selectors::UPSCALE_MARKER)),
            &opts,
        )
        .await?;

        // Clicked in sample order, not ordinal order.
        let picks: Vec<&str> = selectors::UPSCALE_OPTIONS
            .choose_multiple(&mut rand::rng(), count)
            .copied()
            .collect();

        for pick in &picks {
            PausePolicy::sleep(self.config.pauses.between_selections).await;
            page.click_last_with_text("button", pick).await?;
            info!(option = pick, "clicked upscale option");
        }

        Ok(json!({ "selected": picks }))
    }
}

/// Wait for the single-image grid's `Upscale (Subtle)` control and click it.
pub struct SelectSubtleUpscaleAction {
    config: Arc<RunConfig>,
}

impl SelectSubtleUpscaleAction {
    pub fn new(config: Arc<RunConfig>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Action for SelectSubtleUpscaleAction {
    fn name(&self) -> &str {
        "select_subtle_upscale"
    }

    fn description(&self) -> &str {
        "Wait for the subtle-upscale control and click it"
    }

    fn schema(&self) -> ActionSchema {
        ActionSchema::new(Vec::new())
    }

    async fn execute(&self, _params: Value, page: &dyn Page) -> Result<Value> {
        let opts = PollOptions::new(
            "select_subtle_upscale",
            self.config.upscale_poll_interval,
            self.config.upscale_timeout,
        );
        wait_for_messages(
            || page.query_text_all(selectors::MESSAGE_LIST_ITEM),
            |tail| {
                tail.iter()
                    .any(|m| m.contains(selectors::SUBTLE_UPSCALE_LABEL))
            },
            &opts,
        )
        .await?;

        PausePolicy::sleep(self.config.pauses.between_selections).await;
        page.click_last_with_text("button", selectors::SUBTLE_UPSCALE_LABEL)
            .await?;

        info!("clicked subtle upscale");
        Ok(json!({ "selected": [selectors::SUBTLE_UPSCALE_LABEL] }))
    }
}
