//! Run configuration.
//!
//! Everything the steps need is carried explicitly in [`RunConfig`]; no step
//! reads the process environment on its own. [`RunConfig::from_env`] is the
//! one place environment variables are recognized.

use std::path::PathBuf;
use std::time::Duration;

use rand::RngExt;

/// Randomized pause ranges, in whole seconds (inclusive).
///
/// The pauses are behavioral camouflage against the remote platform's
/// anti-automation heuristics, not a correctness mechanism. They must stay
/// between the submit / observe / select / download phases, but tests zero
/// them out with [`PausePolicy::none`].
#[derive(Debug, Clone)]
pub struct PausePolicy {
    /// Short pause around individual UI interactions.
    pub action: (u64, u64),
    /// Pause between filling the prompt and pressing Enter.
    pub pre_submit: (u64, u64),
    /// Pause between consecutive upscale-option clicks.
    pub between_selections: (u64, u64),
    /// Cool-down between finished jobs.
    pub between_jobs: (u64, u64),
}

impl Default for PausePolicy {
    fn default() -> Self {
        Self {
            action: (1, 5),
            pre_submit: (3, 5),
            between_selections: (5, 10),
            between_jobs: (50, 60),
        }
    }
}

impl PausePolicy {
    /// No pauses at all; test use only.
    pub fn none() -> Self {
        Self {
            action: (0, 0),
            pre_submit: (0, 0),
            between_selections: (0, 0),
            between_jobs: (0, 0),
        }
    }

    /// Sample a duration from an inclusive range of whole seconds.
    pub fn sample(range: (u64, u64)) -> Duration {
        let (lo, hi) = range;
        if hi == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs(rand::rng().random_range(lo..=hi))
    }

    /// Sleep for a duration sampled from `range`; no-op on a zero range.
    pub async fn sleep(range: (u64, u64)) {
        let duration = Self::sample(range);
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

/// Configuration for one automation run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Channel the worker navigates to and posts into.
    pub channel_url: String,
    /// Slash command that invokes the image bot.
    pub bot_command: String,
    /// Placeholder label of the channel's chat textbox.
    pub chat_placeholder: String,
    /// Images extracted (and upscale options clicked) per job.
    pub image_count: usize,
    /// Bound on waiting for the command-suggestion element.
    pub suggestion_timeout: Duration,
    /// Bound on waiting for the channel to finish loading.
    pub idle_timeout: Duration,
    /// Polling budget for the upscale controls to appear.
    pub upscale_timeout: Duration,
    pub upscale_poll_interval: Duration,
    /// Polling budget for the finished upscaled message.
    pub download_timeout: Duration,
    pub download_poll_interval: Duration,
    /// Where images are written; current directory when `None`. Must exist.
    pub output_dir: Option<PathBuf>,
    pub pauses: PausePolicy,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            channel_url: String::new(),
            bot_command: "/imagine".to_string(),
            chat_placeholder: String::new(),
            image_count: 1,
            suggestion_timeout: Duration::from_secs(10),
            idle_timeout: Duration::from_secs(30),
            upscale_timeout: Duration::from_secs(120),
            upscale_poll_interval: Duration::from_secs(10),
            download_timeout: Duration::from_secs(600),
            download_poll_interval: Duration::from_secs(10),
            output_dir: None,
            pauses: PausePolicy::default(),
        }
    }
}

impl RunConfig {
    /// Build a config from the recognized environment variables, with
    /// defaults for everything unset.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("DISCORD_CHANNEL_URL") {
            config.channel_url = url;
        }
        if let Ok(placeholder) = std::env::var("ARTFLOW_CHAT_PLACEHOLDER") {
            config.chat_placeholder = placeholder;
        }
        if let Ok(count) = std::env::var("ARTFLOW_IMAGE_COUNT")
            && let Ok(count) = count.parse()
        {
            config.image_count = count;
        }
        if let Some(secs) = env_secs("ARTFLOW_UPSCALE_TIMEOUT_SECS") {
            config.upscale_timeout = secs;
        }
        if let Some(secs) = env_secs("ARTFLOW_DOWNLOAD_TIMEOUT_SECS") {
            config.download_timeout = secs;
        }
        if let Ok(dir) = std::env::var("ARTFLOW_OUTPUT_DIR") {
            config.output_dir = Some(PathBuf::from(dir));
        }
        config
    }
}

fn env_secs(name: &str) -> Option<Duration> {
    std::env::var(name).ok()?.parse().ok().map(Duration::from_secs)
}
