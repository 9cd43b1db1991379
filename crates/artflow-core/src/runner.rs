//! Sequential job runner.
//!
//! Jobs run strictly one at a time against a single page; the remote bot
//! mixes every reply into the same channel timeline, so overlapping jobs
//! would make the step predicates ambiguous.

use std::sync::Arc;

use serde_json::json;
use tracing::{error, info, warn};

use artflow_browser::{ByteFetcher, Page};

use crate::action::ActionRegistry;
use crate::actions::register_defaults;
use crate::config::{PausePolicy, RunConfig};
use crate::error::Result;
use crate::queue::{PromptJob, PromptQueue};

/// Drives the full pipeline (open channel, command, prompt, upscale,
/// download) for each queued job in order.
///
/// The runner owns the page and closes it on every exit path, success or
/// failure.
pub struct Runner {
    page: Box<dyn Page>,
    registry: ActionRegistry,
    config: Arc<RunConfig>,
    subtle_upscale: bool,
}

impl Runner {
    pub fn new(
        page: Box<dyn Page>,
        config: Arc<RunConfig>,
        fetcher: Arc<dyn ByteFetcher>,
    ) -> Result<Self> {
        let mut registry = ActionRegistry::new();
        register_defaults(&mut registry, config.clone(), fetcher)?;
        Ok(Self {
            page,
            registry,
            config,
            subtle_upscale: false,
        })
    }

    /// Use the single `Upscale (Subtle)` control instead of the ordinal
    /// `U1`..`U4` grid buttons.
    pub fn with_subtle_upscale(mut self, subtle: bool) -> Self {
        self.subtle_upscale = subtle;
        self
    }

    /// Catalog of the registered actions, for `--describe`.
    pub fn describe_actions(&self) -> String {
        self.registry.describe_all()
    }

    /// Run every queued job, reporting whole-run percentage after each one.
    ///
    /// The first failing job aborts the run; the page is closed regardless.
    pub async fn run(mut self, queue: &PromptQueue, mut on_progress: impl FnMut(u8)) -> Result<()> {
        let result = self.run_inner(queue, &mut on_progress).await;
        if let Err(e) = self.page.close().await {
            warn!(error = %e, "failed to close the page");
        }
        result
    }

    async fn run_inner(
        &mut self,
        queue: &PromptQueue,
        on_progress: &mut impl FnMut(u8),
    ) -> Result<()> {
        let total = queue.len();
        for (i, job) in queue.jobs().iter().enumerate() {
            info!(
                sequence = job.sequence,
                prompt = %job.text,
                "starting job {}/{total}",
                i + 1
            );
            if let Err(e) = self.run_job(job).await {
                error!(sequence = job.sequence, error = %e, "job failed, aborting run");
                return Err(e);
            }

            let percent = ((i + 1) * 100).div_ceil(total) as u8;
            on_progress(percent);
            info!(sequence = job.sequence, percent, "job finished");

            if i + 1 < total {
                PausePolicy::sleep(self.config.pauses.between_jobs).await;
            }
        }
        Ok(())
    }

    async fn run_job(&self, job: &PromptJob) -> Result<()> {
        let page = self.page.as_ref();
        let config = &self.config;

        self.registry
            .invoke(
                "open_channel",
                json!({ "channel_url": config.channel_url }),
                page,
            )
            .await?;
        self.registry
            .invoke(
                "send_bot_command",
                json!({
                    "command": config.bot_command,
                    "chat_placeholder": config.chat_placeholder,
                }),
                page,
            )
            .await?;
        self.registry
            .invoke("submit_prompt", json!({ "prompt": job.text }), page)
            .await?;

        if self.subtle_upscale {
            self.registry
                .invoke("select_subtle_upscale", json!({}), page)
                .await?;
        } else {
            self.registry
                .invoke(
                    "select_upscale",
                    json!({ "count": config.image_count }),
                    page,
                )
                .await?;
        }

        let mut params = json!({
            "prompt": job.text,
            "sequence_number": job.sequence,
            "count": config.image_count,
        });
        if let Some(dir) = &job.output_dir {
            params["output_dir"] = json!(dir.display().to_string());
        }
        self.registry.invoke("download_images", params, page).await?;
        Ok(())
    }
}
