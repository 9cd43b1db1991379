//! End-to-end run over a scripted page: two prompts in, two images out.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use artflow_browser::{ByteFetcher, Page, PageError};
use artflow_core::{PausePolicy, PromptQueue, RunConfig, Runner};

/// A channel timeline that advances one scripted snapshot per read and then
/// sticks on the last one.
#[derive(Default)]
struct ScriptedPage {
    snapshots: Mutex<Vec<Vec<String>>>,
    links: Vec<String>,
    closed: Mutex<bool>,
}

impl ScriptedPage {
    fn new(snapshots: Vec<Vec<&str>>, links: Vec<&str>) -> Arc<Self> {
        Arc::new(Self {
            snapshots: Mutex::new(
                snapshots
                    .into_iter()
                    .map(|s| s.into_iter().map(String::from).collect())
                    .collect(),
            ),
            links: links.into_iter().map(String::from).collect(),
            closed: Mutex::new(false),
        })
    }
}

#[async_trait]
impl Page for ScriptedPage {
    async fn navigate(&self, _url: &str) -> Result<(), PageError> {
        Ok(())
    }

    async fn wait_for_idle(&self, _timeout: Duration) -> Result<(), PageError> {
        Ok(())
    }

    async fn query_text_all(&self, _selector: &str) -> Result<Vec<String>, PageError> {
        let mut snapshots = self.snapshots.lock().unwrap();
        if snapshots.len() > 1 {
            return Ok(snapshots.remove(0));
        }
        Ok(snapshots.first().cloned().unwrap_or_default())
    }

    async fn query_attr_all(&self, _selector: &str, _attr: &str) -> Result<Vec<String>, PageError> {
        Ok(self.links.clone())
    }

    async fn fill(&self, _selector: &str, _text: &str) -> Result<(), PageError> {
        Ok(())
    }

    async fn fill_textbox_by_label(&self, _label: &str, _text: &str) -> Result<(), PageError> {
        Ok(())
    }

    async fn click(&self, _selector: &str) -> Result<(), PageError> {
        Ok(())
    }

    async fn click_last_with_text(&self, _tag: &str, _text: &str) -> Result<(), PageError> {
        Ok(())
    }

    async fn press_key(&self, _key: &str) -> Result<(), PageError> {
        Ok(())
    }

    async fn wait_for_selector_visible(
        &self,
        _selector: &str,
        _timeout: Duration,
    ) -> Result<(), PageError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), PageError> {
        *self.closed.lock().unwrap() = true;
        Ok(())
    }
}

struct PngFetcher;

#[async_trait]
impl ByteFetcher for PngFetcher {
    async fn fetch(&self, _url: &str) -> Result<Vec<u8>, PageError> {
        Ok(b"\x89PNG".to_vec())
    }
}

#[tokio::test]
async fn two_prompt_queue_downloads_one_image_per_job() {
    let dir = tempfile::tempdir().unwrap();
    let config = Arc::new(RunConfig {
        channel_url: "https://discord.com/channels/1/2".to_string(),
        chat_placeholder: "Message #art".to_string(),
        pauses: PausePolicy::none(),
        upscale_poll_interval: Duration::from_millis(5),
        upscale_timeout: Duration::from_millis(100),
        download_poll_interval: Duration::from_millis(5),
        download_timeout: Duration::from_millis(100),
        output_dir: Some(dir.path().to_path_buf()),
        ..RunConfig::default()
    });

    let page = ScriptedPage::new(
        vec![
            vec!["waiting for the bot"],
            vec!["grid ready U1 U2 U3 U4"],
            vec!["upscaled U1 Vary (Strong) Web"],
        ],
        vec!["https://cdn.example/full.png"],
    );
    let queue =
        PromptQueue::from_lines(["a whale in a sunny day", "a lion in a suit"]).unwrap();

    let runner = Runner::new(Box::new(page.clone()), config, Arc::new(PngFetcher)).unwrap();
    let mut progress = Vec::new();
    runner.run(&queue, |p| progress.push(p)).await.unwrap();

    assert_eq!(progress, vec![50, 100]);
    assert_eq!(
        std::fs::read(dir.path().join("pic_1.png")).unwrap(),
        b"\x89PNG"
    );
    assert!(dir.path().join("pic_2.png").exists());
    assert!(*page.closed.lock().unwrap());
}
