//! Wait for the finished upscaled message and save its images.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{info, warn};

use artflow_browser::{ByteFetcher, Page};

use crate::action::{Action, ActionSchema, ParamKind, ParamSpec};
use crate::config::RunConfig;
use crate::error::{AutomationError, Result};
use crate::naming;
use crate::poller::{PollOptions, wait_for_messages};
use crate::selectors;

/// Poll for the bot's finished-image message, then fetch every requested
/// full-size image link and write it to disk.
///
/// Download trouble is never fatal: a failed fetch or write is logged and
/// skipped per image, and a batch that saves nothing still succeeds with an
/// empty `saved` list so the remaining queue keeps running. Only the poll
/// itself (no finished message within the budget) aborts the job.
pub struct DownloadImagesAction {
    config: Arc<RunConfig>,
    fetcher: Arc<dyn ByteFetcher>,
}

impl DownloadImagesAction {
    pub fn new(config: Arc<RunConfig>, fetcher: Arc<dyn ByteFetcher>) -> Self {
        Self { config, fetcher }
    }
}

#[async_trait]
impl Action for DownloadImagesAction {
    fn name(&self) -> &str {
        "download_images"
    }

    fn description(&self) -> &str {
        "Wait for the upscaled message and save its full-size images"
    }

    fn schema(&self) -> ActionSchema {
        ActionSchema::new(vec![
            ParamSpec::required("prompt", ParamKind::String, "prompt the images came from"),
            ParamSpec::optional(
                "sequence_number",
                ParamKind::Integer,
                None,
                "queue position; switches naming to pic_<n>",
            ),
            ParamSpec::optional(
                "output_dir",
                ParamKind::String,
                None,
                "existing directory to write into",
            ),
            ParamSpec::optional(
                "count",
                ParamKind::Integer,
                Some(json!(1)),
                "how many trailing images to save",
            ),
        ])
    }

    async fn execute(&self, params: Value, page: &dyn Page) -> Result<Value> {
        let prompt = params["prompt"].as_str().unwrap_or_default();
        let sequence = params["sequence_number"].as_u64().map(|n| n as u32);
        let count = params["count"].as_u64().unwrap_or(1).max(1) as usize;
        let dir = params["output_dir"]
            .as_str()
            .map(PathBuf::from)
            .or_else(|| self.config.output_dir.clone());

        let opts = PollOptions::new(
            "download_images",
            self.config.download_poll_interval,
            self.config.download_timeout,
        );
        wait_for_messages(
            || page.query_text_all(selectors::MESSAGE_LIST_ITEM),
            |tail| {
                tail.iter().any(|m| {
                    m.contains(selectors::VARIED_MARKER) && m.contains(selectors::WEB_VIEW_MARKER)
                })
            },
            &opts,
        )
        .await?;

        let links = page
            .query_attr_all(selectors::IMAGE_LINK, "href")
            .await
            .map_err(|e| AutomationError::Download(e.to_string()))?;
        if links.is_empty() {
            warn!(prompt, sequence, "finished message carries no image links");
            return Ok(json!({ "saved": [] }));
        }

        let take = count.min(links.len());
        let tail = &links[links.len() - take..];

        let mut saved = Vec::new();
        for (i, url) in tail.iter().enumerate() {
            let name = naming::output_name(prompt, sequence, i, take);
            let mut path = dir.clone().unwrap_or_default();
            path.push(format!("{name}.png"));

            let bytes = match self.fetcher.fetch(url).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(url, error = %e, "image fetch failed, skipping");
                    continue;
                }
            };
            if let Err(e) = std::fs::write(&path, bytes) {
                warn!(path = %path.display(), error = %e, "image write failed, skipping");
                continue;
            }
            info!(path = %path.display(), "saved image");
            saved.push(path.display().to_string());
        }

        if saved.is_empty() {
            warn!(prompt, sequence, "no image of this batch could be saved");
        }
        Ok(json!({ "saved": saved }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    use artflow_browser::PageError;

    use crate::config::PausePolicy;
    use crate::testutil::MockPage;

    struct MapFetcher {
        responses: Mutex<Vec<(String, Option<Vec<u8>>)>>,
    }

    impl MapFetcher {
        fn new(responses: Vec<(&str, Option<&[u8]>)>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(
                    responses
                        .into_iter()
                        .map(|(url, body)| (url.to_string(), body.map(<[u8]>::to_vec)))
                        .collect(),
                ),
            })
        }
    }

    #[async_trait]
    impl ByteFetcher for MapFetcher {
        async fn fetch(&self, url: &str) -> std::result::Result<Vec<u8>, PageError> {
            let responses = self.responses.lock().unwrap();
            match responses.iter().find(|(u, _)| u == url) {
                Some((_, Some(body))) => Ok(body.clone()),
                _ => Err(PageError::Protocol(format!("no response for {url}"))),
            }
        }
    }

    fn config(dir: &std::path::Path) -> Arc<RunConfig> {
        Arc::new(RunConfig {
            pauses: PausePolicy::none(),
            download_poll_interval: Duration::from_millis(5),
            download_timeout: Duration::from_millis(50),
            output_dir: Some(dir.to_path_buf()),
            ..RunConfig::default()
        })
    }

    fn finished_page() -> MockPage {
        MockPage::with_timeline(vec![
            vec!["still working"],
            vec!["done Vary (Strong) Vary (Subtle) Web"],
        ])
    }

    #[tokio::test]
    async fn saves_last_image_with_sequence_name() {
        let dir = tempfile::tempdir().unwrap();
        let page = finished_page();
        page.set_attrs(vec!["https://cdn/a.png", "https://cdn/b.png"]);
        let fetcher = MapFetcher::new(vec![("https://cdn/b.png", Some(b"png-bytes"))]);

        let result = DownloadImagesAction::new(config(dir.path()), fetcher)
            .execute(
                json!({ "prompt": "a whale", "sequence_number": 3 }),
                &page,
            )
            .await
            .unwrap();

        let expected = dir.path().join("pic_3.png");
        assert_eq!(result["saved"][0], expected.display().to_string());
        assert_eq!(std::fs::read(expected).unwrap(), b"png-bytes");
    }

    #[tokio::test]
    async fn prompt_naming_used_without_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let page = finished_page();
        page.set_attrs(vec!["https://cdn/a.png"]);
        let fetcher = MapFetcher::new(vec![("https://cdn/a.png", Some(b"x"))]);

        DownloadImagesAction::new(config(dir.path()), fetcher)
            .execute(json!({ "prompt": "a whale in a sunny day" }), &page)
            .await
            .unwrap();

        let entries: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].starts_with("a_whale_in_a_sunny_day"));
        assert!(entries[0].ends_with(".png"));
    }

    #[tokio::test]
    async fn failed_fetch_is_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let page = finished_page();
        page.set_attrs(vec!["https://cdn/bad.png", "https://cdn/good.png"]);
        let fetcher = MapFetcher::new(vec![
            ("https://cdn/bad.png", None),
            ("https://cdn/good.png", Some(b"ok")),
        ]);

        let result = DownloadImagesAction::new(config(dir.path()), fetcher)
            .execute(
                json!({ "prompt": "p", "sequence_number": 1, "count": 2 }),
                &page,
            )
            .await
            .unwrap();
        assert_eq!(result["saved"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn all_fetches_failing_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let page = finished_page();
        page.set_attrs(vec!["https://cdn/bad.png"]);
        let fetcher = MapFetcher::new(vec![("https://cdn/bad.png", None)]);

        let result = DownloadImagesAction::new(config(dir.path()), fetcher)
            .execute(json!({ "prompt": "p", "sequence_number": 1 }), &page)
            .await
            .unwrap();
        assert_eq!(result["saved"].as_array().unwrap().len(), 0);
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn missing_links_yield_an_empty_batch() {
        let dir = tempfile::tempdir().unwrap();
        let page = finished_page();
        let fetcher = MapFetcher::new(Vec::new());

        let result = DownloadImagesAction::new(config(dir.path()), fetcher)
            .execute(json!({ "prompt": "p" }), &page)
            .await
            .unwrap();
        assert_eq!(result["saved"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn never_finishing_message_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let page = MockPage::with_timeline(vec![vec!["still working"]]);
        let fetcher = MapFetcher::new(Vec::new());

        let err = DownloadImagesAction::new(config(dir.path()), fetcher)
            .execute(json!({ "prompt": "p" }), &page)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AutomationError::Timeout { ref step, .. } if step == "download_images"
        ));
    }
}
