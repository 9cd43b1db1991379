//! Attached-browser page handle for ArtFlow.
//!
//! This crate owns the boundary to the live browser: a [`Page`] trait the
//! automation core drives, a [`CdpPage`] implementation that attaches to an
//! already-running Chromium over its local DevTools endpoint, and a
//! [`ByteFetcher`] for pulling image bytes off a URL. Launching or logging in
//! a browser is deliberately not handled here; the operator points us at a
//! debugging port of a session that is already signed in.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::debug;

/// How long a single DevTools command may take before we give up on it.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Settle delay after `document.readyState` reaches `complete`; cheap stand-in
/// for a network-idle signal, which plain CDP does not expose per page.
const IDLE_SETTLE: Duration = Duration::from_millis(500);

const READY_POLL: Duration = Duration::from_millis(250);

#[derive(Debug, Error)]
pub enum PageError {
    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("element not found: {0}")]
    ElementNotFound(String),

    #[error("timed out waiting for selector: {0}")]
    SelectorTimeout(String),

    #[error("devtools protocol error: {0}")]
    Protocol(String),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PageError>;

/// The "current page" capability consumed by the automation core.
///
/// Element queries return snapshots in document order; there is no element
/// identity across calls. Every method is a suspension point.
#[async_trait]
pub trait Page: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Wait until the page looks done loading, up to `timeout`.
    async fn wait_for_idle(&self, timeout: Duration) -> Result<()>;

    /// Visible text of every element matching `selector`, in document order.
    async fn query_text_all(&self, selector: &str) -> Result<Vec<String>>;

    /// `attr` values of every element matching `selector` that has the
    /// attribute, in document order.
    async fn query_attr_all(&self, selector: &str, attr: &str) -> Result<Vec<String>>;

    async fn fill(&self, selector: &str, text: &str) -> Result<()>;

    /// Fill the textbox located by its accessible role and placeholder label.
    async fn fill_textbox_by_label(&self, label: &str, text: &str) -> Result<()>;

    async fn click(&self, selector: &str) -> Result<()>;

    /// Click the last element of `tag` whose visible text contains `text`.
    async fn click_last_with_text(&self, tag: &str, text: &str) -> Result<()>;

    async fn press_key(&self, key: &str) -> Result<()>;

    async fn wait_for_selector_visible(&self, selector: &str, timeout: Duration) -> Result<()>;

    /// Release the page. Idempotence is not required; callers invoke this
    /// exactly once, on every exit path.
    async fn close(&self) -> Result<()>;
}

#[async_trait]
impl<P: Page + ?Sized> Page for std::sync::Arc<P> {
    async fn navigate(&self, url: &str) -> Result<()> {
        (**self).navigate(url).await
    }

    async fn wait_for_idle(&self, timeout: Duration) -> Result<()> {
        (**self).wait_for_idle(timeout).await
    }

    async fn query_text_all(&self, selector: &str) -> Result<Vec<String>> {
        (**self).query_text_all(selector).await
    }

    async fn query_attr_all(&self, selector: &str, attr: &str) -> Result<Vec<String>> {
        (**self).query_attr_all(selector, attr).await
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<()> {
        (**self).fill(selector, text).await
    }

    async fn fill_textbox_by_label(&self, label: &str, text: &str) -> Result<()> {
        (**self).fill_textbox_by_label(label, text).await
    }

    async fn click(&self, selector: &str) -> Result<()> {
        (**self).click(selector).await
    }

    async fn click_last_with_text(&self, tag: &str, text: &str) -> Result<()> {
        (**self).click_last_with_text(tag, text).await
    }

    async fn press_key(&self, key: &str) -> Result<()> {
        (**self).press_key(key).await
    }

    async fn wait_for_selector_visible(&self, selector: &str, timeout: Duration) -> Result<()> {
        (**self).wait_for_selector_visible(selector, timeout).await
    }

    async fn close(&self) -> Result<()> {
        (**self).close().await
    }
}

/// Black-box "fetch bytes at URL" capability used by artifact extraction.
#[async_trait]
pub trait ByteFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// [`ByteFetcher`] backed by a shared reqwest client.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ByteFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

/// One page target reported by the browser's `/json/list` endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetInfo {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub r#type: String,
    #[serde(default)]
    pub web_socket_debugger_url: Option<String>,
}

/// Pick the target to attach to: the first ordinary page with a debugger URL.
fn pick_page_target(targets: &[TargetInfo]) -> Option<&TargetInfo> {
    targets
        .iter()
        .find(|t| t.r#type == "page" && t.web_socket_debugger_url.is_some())
}

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsStream = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// A [`Page`] attached to a running Chromium via the DevTools protocol.
///
/// Commands are JSON-RPC over the page target's WebSocket, correlated by id;
/// unsolicited event messages are skipped. Element work goes through
/// `Runtime.evaluate` so we only depend on the DOM the remote UI renders,
/// not on any accessibility tree support.
pub struct CdpPage {
    sink: Mutex<WsSink>,
    stream: Mutex<WsStream>,
    next_id: AtomicU64,
}

impl CdpPage {
    /// Attach to the first page target of the browser listening at
    /// `endpoint` (e.g. `http://localhost:9222`).
    pub async fn attach(endpoint: &str) -> Result<Self> {
        let list_url = format!("{}/json/list", endpoint.trim_end_matches('/'));
        debug!(url = %list_url, "discovering page targets");

        let targets: Vec<TargetInfo> = reqwest::get(&list_url).await?.json().await?;
        let target = pick_page_target(&targets).ok_or_else(|| {
            PageError::Protocol(format!("no attachable page target at {endpoint}"))
        })?;
        let ws_url = target
            .web_socket_debugger_url
            .clone()
            .ok_or_else(|| PageError::Protocol("page target has no debugger url".into()))?;

        debug!(target = %target.id, url = %ws_url, "attaching to page target");
        let (ws, _) = connect_async(&ws_url).await?;
        let (sink, stream) = ws.split();

        Ok(Self {
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
            next_id: AtomicU64::new(1),
        })
    }

    /// Send a DevTools command and wait for the matching response.
    async fn send_command(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let message = json!({ "id": id, "method": method, "params": params });
        debug!(id, method, "sending devtools command");

        {
            let mut sink = self.sink.lock().await;
            sink.send(Message::Text(message.to_string().into())).await?;
        }

        let mut stream = self.stream.lock().await;
        let response = tokio::time::timeout(COMMAND_TIMEOUT, async {
            loop {
                match stream.next().await {
                    Some(Ok(Message::Text(text))) => {
                        let Ok(value) = serde_json::from_str::<Value>(&text) else {
                            continue;
                        };
                        if value.get("id").and_then(Value::as_u64) == Some(id) {
                            return Ok(value);
                        }
                        // An event or another command's response; skip.
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => return Err(PageError::WebSocket(e)),
                    None => {
                        return Err(PageError::Protocol(
                            "devtools connection closed unexpectedly".into(),
                        ));
                    }
                }
            }
        })
        .await
        .map_err(|_| PageError::Protocol(format!("command {method} timed out")))??;

        if let Some(error) = response.get("error") {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown devtools error");
            return Err(PageError::Protocol(message.to_string()));
        }

        Ok(response.get("result").cloned().unwrap_or_else(|| json!({})))
    }

    /// Evaluate a JS expression and return its value.
    async fn evaluate(&self, expression: &str) -> Result<Value> {
        self.evaluate_with(expression, false).await
    }

    async fn evaluate_with(&self, expression: &str, await_promise: bool) -> Result<Value> {
        let result = self
            .send_command(
                "Runtime.evaluate",
                json!({
                    "expression": expression,
                    "returnByValue": true,
                    "awaitPromise": await_promise,
                }),
            )
            .await?;

        if let Some(exception) = result.get("exceptionDetails") {
            let text = exception
                .get("exception")
                .and_then(|e| e.get("description"))
                .or_else(|| exception.get("text"))
                .and_then(Value::as_str)
                .unwrap_or("script exception");
            return Err(PageError::Protocol(text.to_string()));
        }

        Ok(result
            .get("result")
            .and_then(|r| r.get("value"))
            .cloned()
            .unwrap_or(Value::Null))
    }
}

/// Embed a Rust string as a JS string literal.
fn js_str(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_default()
}

#[async_trait]
impl Page for CdpPage {
    async fn navigate(&self, url: &str) -> Result<()> {
        let result = self
            .send_command("Page.navigate", json!({ "url": url }))
            .await
            .map_err(|e| PageError::Navigation(e.to_string()))?;

        if let Some(error_text) = result.get("errorText").and_then(Value::as_str)
            && !error_text.is_empty()
        {
            return Err(PageError::Navigation(format!("{url}: {error_text}")));
        }
        Ok(())
    }

    async fn wait_for_idle(&self, timeout: Duration) -> Result<()> {
        let started = std::time::Instant::now();
        loop {
            let state = self.evaluate("document.readyState").await?;
            if state.as_str() == Some("complete") {
                tokio::time::sleep(IDLE_SETTLE).await;
                return Ok(());
            }
            if started.elapsed() >= timeout {
                return Err(PageError::Navigation(format!(
                    "page did not finish loading within {}s",
                    timeout.as_secs()
                )));
            }
            tokio::time::sleep(READY_POLL).await;
        }
    }

    async fn query_text_all(&self, selector: &str) -> Result<Vec<String>> {
        let script = format!(
            "Array.from(document.querySelectorAll({sel})).map(e => e.innerText || '')",
            sel = js_str(selector),
        );
        let value = self.evaluate(&script).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn query_attr_all(&self, selector: &str, attr: &str) -> Result<Vec<String>> {
        let script = format!(
            "Array.from(document.querySelectorAll({sel}))\
             .map(e => e.getAttribute({attr}))\
             .filter(v => v !== null)",
            sel = js_str(selector),
            attr = js_str(attr),
        );
        let value = self.evaluate(&script).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<()> {
        let script = format!(
            r#"(() => {{
                const el = document.querySelector({sel});
                if (!el) return null;
                el.focus();
                if ('value' in el) {{
                    el.value = {text};
                }} else {{
                    el.textContent = {text};
                }}
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return 'ok';
            }})()"#,
            sel = js_str(selector),
            text = js_str(text),
        );
        match self.evaluate(&script).await?.as_str() {
            Some("ok") => Ok(()),
            _ => Err(PageError::ElementNotFound(selector.to_string())),
        }
    }

    async fn fill_textbox_by_label(&self, label: &str, text: &str) -> Result<()> {
        let script = format!(
            r#"(() => {{
                const label = {label};
                const boxes = Array.from(document.querySelectorAll('[role="textbox"]'));
                const el = boxes.find(e =>
                    (e.getAttribute('aria-label') || '').includes(label) ||
                    (e.getAttribute('placeholder') || '').includes(label));
                if (!el) return null;
                el.focus();
                if ('value' in el && el.tagName !== 'DIV') {{
                    el.value = {text};
                }} else {{
                    el.textContent = {text};
                }}
                el.dispatchEvent(new InputEvent('input', {{ bubbles: true }}));
                return 'ok';
            }})()"#,
            label = js_str(label),
            text = js_str(text),
        );
        match self.evaluate(&script).await?.as_str() {
            Some("ok") => Ok(()),
            _ => Err(PageError::ElementNotFound(format!(
                "textbox labelled '{label}'"
            ))),
        }
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let script = format!(
            r#"(() => {{
                const el = document.querySelector({sel});
                if (!el) return null;
                el.click();
                return 'ok';
            }})()"#,
            sel = js_str(selector),
        );
        match self.evaluate(&script).await?.as_str() {
            Some("ok") => Ok(()),
            _ => Err(PageError::ElementNotFound(selector.to_string())),
        }
    }

    async fn click_last_with_text(&self, tag: &str, text: &str) -> Result<()> {
        let script = format!(
            r#"(() => {{
                const matches = Array.from(document.querySelectorAll({tag}))
                    .filter(e => (e.innerText || '').includes({text}));
                const el = matches[matches.length - 1];
                if (!el) return null;
                el.click();
                return 'ok';
            }})()"#,
            tag = js_str(tag),
            text = js_str(text),
        );
        match self.evaluate(&script).await?.as_str() {
            Some("ok") => Ok(()),
            _ => Err(PageError::ElementNotFound(format!(
                "{tag} with text '{text}'"
            ))),
        }
    }

    async fn press_key(&self, key: &str) -> Result<()> {
        // Discord submits on a raw Enter; a synthesized pair of key events on
        // the focused element is enough.
        let (code, vk, text) = match key {
            "Enter" => ("Enter", 13, "\r"),
            other => (other, 0, ""),
        };
        self.send_command(
            "Input.dispatchKeyEvent",
            json!({
                "type": "keyDown",
                "key": key,
                "code": code,
                "windowsVirtualKeyCode": vk,
                "nativeVirtualKeyCode": vk,
                "text": text,
            }),
        )
        .await?;
        self.send_command(
            "Input.dispatchKeyEvent",
            json!({
                "type": "keyUp",
                "key": key,
                "code": code,
                "windowsVirtualKeyCode": vk,
                "nativeVirtualKeyCode": vk,
            }),
        )
        .await?;
        Ok(())
    }

    async fn wait_for_selector_visible(&self, selector: &str, timeout: Duration) -> Result<()> {
        let script = format!(
            r#"new Promise((resolve) => {{
                const sel = {sel};
                const visible = () => {{
                    const el = document.querySelector(sel);
                    return el && el.offsetParent !== null;
                }};
                if (visible()) {{ resolve('found'); return; }}
                const observer = new MutationObserver(() => {{
                    if (visible()) {{
                        observer.disconnect();
                        resolve('found');
                    }}
                }});
                observer.observe(document.documentElement, {{ childList: true, subtree: true }});
                setTimeout(() => {{
                    observer.disconnect();
                    resolve('timeout');
                }}, {timeout_ms});
            }})"#,
            sel = js_str(selector),
            timeout_ms = timeout.as_millis(),
        );
        match self.evaluate_with(&script, true).await?.as_str() {
            Some("found") => Ok(()),
            _ => Err(PageError::SelectorTimeout(selector.to_string())),
        }
    }

    async fn close(&self) -> Result<()> {
        // Best effort: detach cleanly even if the page refuses to close.
        let _ = self.send_command("Page.close", json!({})).await;
        let mut sink = self.sink.lock().await;
        sink.send(Message::Close(None)).await?;
        Ok(())
    }
}
