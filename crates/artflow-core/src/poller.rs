//! Timeline polling primitive.
//!
//! The remote chat timeline is eventually consistent and pushes nothing to
//! us, so every state transition (command accepted, grid generated, upscale
//! posted) is detected by re-reading the rendered message list until a
//! predicate holds or the budget runs out. Predicates must be side-effect
//! free; they are evaluated on every pass.

use std::future::Future;
use std::time::{Duration, Instant};

use tracing::info;

use artflow_browser::PageError;

use crate::error::{AutomationError, Result};

/// Options for one polling call.
#[derive(Debug, Clone)]
pub struct PollOptions {
    /// Sleep between passes.
    pub interval: Duration,
    /// Total budget, measured in elapsed wall-clock time.
    pub timeout: Duration,
    /// How many trailing messages the predicate sees.
    pub window: usize,
    /// Cadence of "still waiting" progress logs.
    pub log_every: Duration,
    /// Step name carried into logs and timeout errors.
    pub step: &'static str,
}

impl PollOptions {
    pub fn new(step: &'static str, interval: Duration, timeout: Duration) -> Self {
        Self {
            interval,
            timeout,
            window: 1,
            log_every: Duration::from_secs(30),
            step,
        }
    }

    pub fn window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }
}

/// Poll the rendered message list until `predicate` accepts the trailing
/// window, returning that window.
///
/// The first check happens before any sleep, so an already-true predicate
/// returns immediately. An empty message list is a distinct failure from a
/// predicate that never became true: the former means the channel never
/// rendered at all. On timeout the error carries the last-seen message text
/// for diagnosis against the remote UI's current markup.
pub async fn wait_for_messages<F, Fut, P>(
    mut fetch: F,
    predicate: P,
    opts: &PollOptions,
) -> Result<Vec<String>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<Vec<String>, PageError>>,
    P: Fn(&[String]) -> bool,
{
    let started = Instant::now();
    let mut last_log = Instant::now();

    loop {
        let messages = fetch().await?;
        if messages.is_empty() {
            return Err(AutomationError::EmptyTimeline(opts.step.to_string()));
        }

        let window = opts.window.clamp(1, messages.len());
        let tail = &messages[messages.len() - window..];
        if predicate(tail) {
            return Ok(tail.to_vec());
        }

        if started.elapsed() >= opts.timeout {
            return Err(AutomationError::Timeout {
                step: opts.step.to_string(),
                last_seen: tail.last().cloned().unwrap_or_default(),
            });
        }

        if last_log.elapsed() >= opts.log_every {
            info!(
                step = opts.step,
                waited_secs = started.elapsed().as_secs(),
                budget_secs = opts.timeout.as_secs(),
                "condition not yet met, waiting"
            );
            last_log = Instant::now();
        }

        tokio::time::sleep(opts.interval).await;
    }
}
