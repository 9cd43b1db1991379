//! Randomized wait.

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use artflow_browser::Page;

use crate::action::{Action, ActionSchema, ParamKind, ParamSpec};
use crate::config::PausePolicy;
use crate::error::Result;

/// Sleep for roughly `seconds`, jittered downward by up to `range` seconds
/// so runs never tick at an exact cadence.
pub struct WaitAction;

#[async_trait]
impl Action for WaitAction {
    fn name(&self) -> &str {
        "wait"
    }

    fn description(&self) -> &str {
        "Sleep for a randomized number of seconds"
    }

    fn schema(&self) -> ActionSchema {
        ActionSchema::new(vec![
            ParamSpec::required("seconds", ParamKind::Integer, "upper bound in seconds"),
            ParamSpec::optional(
                "range",
                ParamKind::Integer,
                Some(json!(10)),
                "maximum downward jitter in seconds",
            ),
        ])
    }

    async fn execute(&self, params: Value, _page: &dyn Page) -> Result<Value> {
        let seconds = params["seconds"].as_u64().unwrap_or_default();
        let range = params["range"].as_u64().unwrap_or(10).min(seconds);

        let duration = PausePolicy::sample((seconds - range, seconds));
        debug!(secs = duration.as_secs(), "waiting");
        tokio::time::sleep(duration).await;
        Ok(json!({ "slept_secs": duration.as_secs() }))
    }
}
