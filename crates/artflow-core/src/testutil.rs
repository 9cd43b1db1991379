//! Scripted `Page` mock shared by the unit tests.

use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use artflow_browser::{ByteFetcher, Page, PageError};

/// A `Page` whose timeline and failures are scripted per test.
///
/// `query_text_all` walks through the queued snapshots, sticking on the last
/// one; every call is recorded so tests can assert on the interaction order.
#[derive(Default)]
pub struct MockPage {
    pub log: Mutex<Vec<String>>,
    snapshots: Mutex<Vec<Vec<String>>>,
    attrs: Mutex<Vec<String>>,
    failing: Mutex<HashSet<&'static str>>,
}

/// A page that renders nothing and accepts everything.
pub type NullPage = MockPage;

impl MockPage {
    pub fn with_timeline(snapshots: Vec<Vec<&str>>) -> Self {
        let page = Self::default();
        *page.snapshots.lock().unwrap() = snapshots
            .into_iter()
            .map(|s| s.into_iter().map(String::from).collect())
            .collect();
        page
    }

    pub fn set_attrs(&self, values: Vec<&str>) {
        *self.attrs.lock().unwrap() = values.into_iter().map(String::from).collect();
    }

    /// Make the named method fail with `ElementNotFound`.
    pub fn fail_on(&self, method: &'static str) {
        self.failing.lock().unwrap().insert(method);
    }

    pub fn calls(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.log.lock().unwrap().push(call);
    }

    fn check(&self, method: &'static str) -> Result<(), PageError> {
        if self.failing.lock().unwrap().contains(method) {
            return Err(PageError::ElementNotFound(format!("mock {method}")));
        }
        Ok(())
    }
}

#[async_trait]
impl Page for MockPage {
    async fn navigate(&self, url: &str) -> Result<(), PageError> {
        self.record(format!("navigate:{url}"));
        self.check("navigate")
            .map_err(|_| PageError::Navigation(url.to_string()))
    }

    async fn wait_for_idle(&self, _timeout: Duration) -> Result<(), PageError> {
        self.record("wait_for_idle".to_string());
        Ok(())
    }

    async fn query_text_all(&self, selector: &str) -> Result<Vec<String>, PageError> {
        self.record(format!("query_text_all:{selector}"));
        let mut snapshots = self.snapshots.lock().unwrap();
        if snapshots.is_empty() {
            return Ok(Vec::new());
        }
        if snapshots.len() > 1 {
            return Ok(snapshots.remove(0));
        }
        Ok(snapshots[0].clone())
    }

    async fn query_attr_all(&self, selector: &str, attr: &str) -> Result<Vec<String>, PageError> {
        self.record(format!("query_attr_all:{selector}:{attr}"));
        Ok(self.attrs.lock().unwrap().clone())
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<(), PageError> {
        self.record(format!("fill:{selector}:{text}"));
        self.check("fill")
    }

    async fn fill_textbox_by_label(&self, label: &str, text: &str) -> Result<(), PageError> {
        self.record(format!("fill_textbox:{label}:{text}"));
        self.check("fill_textbox_by_label")
    }

    async fn click(&self, selector: &str) -> Result<(), PageError> {
        self.record(format!("click:{selector}"));
        self.check("click")
    }

    async fn click_last_with_text(&self, tag: &str, text: &str) -> Result<(), PageError> {
        self.record(format!("click_last:{tag}:{text}"));
        self.check("click_last_with_text")
    }

    async fn press_key(&self, key: &str) -> Result<(), PageError> {
        self.record(format!("press:{key}"));
        self.check("press_key")
    }

    async fn wait_for_selector_visible(
        &self,
        selector: &str,
        _timeout: Duration,
    ) -> Result<(), PageError> {
        self.record(format!("wait_visible:{selector}"));
        if self.failing.lock().unwrap().contains("wait_for_selector_visible") {
            return Err(PageError::SelectorTimeout(selector.to_string()));
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), PageError> {
        self.record("close".to_string());
        Ok(())
    }
}

/// A fetcher that answers every URL with the same bytes.
pub struct StaticFetcher(pub &'static [u8]);

#[async_trait]
impl ByteFetcher for StaticFetcher {
    async fn fetch(&self, _url: &str) -> Result<Vec<u8>, PageError> {
        Ok(self.0.to_vec())
    }
}
