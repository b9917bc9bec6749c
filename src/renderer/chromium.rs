//! Headless Chromium acquisition using chromiumoxide.

use super::{is_schedule_response, JsonPacket, PageCapture, RenderOptions, Renderer};
use crate::error::{Result, ScheduleError};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchMouseEventParams, DispatchMouseEventType,
};
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventLoadingFinished, EventResponseReceived, GetResponseBodyParams, RequestId,
    Response,
};
use chromiumoxide::page::Page;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info};

const SCROLL_DELTA: f64 = 30_000.0;
const CLICK_POLL: Duration = Duration::from_millis(200);

/// Find a Chromium binary on PATH.
pub fn find_chromium() -> Option<PathBuf> {
    ["google-chrome", "chromium", "chromium-browser"]
        .iter()
        .find_map(|name| which::which(name).ok())
}

pub struct ChromiumRenderer {
    options: RenderOptions,
}

impl ChromiumRenderer {
    pub fn new(options: RenderOptions) -> Self {
        info!("Created Chromium renderer");
        Self { options }
    }

    async fn launch(&self) -> Result<(Browser, JoinHandle<()>)> {
        let mut builder = BrowserConfig::builder()
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions");

        if let Some(path) = self.options.chrome_path.clone().or_else(find_chromium) {
            debug!("Using browser at {:?}", path);
            builder = builder.chrome_executable(path);
        }

        let config = builder
            .build()
            .map_err(|e| ScheduleError::Browser(format!("failed to build browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(config).await?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler stopped: {}", e);
                    break;
                }
            }
        });

        Ok((browser, handler_task))
    }

    /// Waits until no response has arrived for one idle window.
    async fn wait_for_network_idle(&self, activity: &AtomicUsize, deadline: Instant) {
        loop {
            let before = activity.load(Ordering::Relaxed);
            sleep(self.options.idle_window).await;
            if activity.load(Ordering::Relaxed) == before {
                return;
            }
            if Instant::now() >= deadline {
                debug!("Network never went idle, continuing");
                return;
            }
        }
    }

    async fn click_age_group(&self, page: &Page) {
        let token = &self.options.age_group;
        let pattern = match Regex::new(&format!("(?i){}", regex::escape(token))) {
            Ok(pattern) => pattern,
            Err(_) => return,
        };

        let attempt = async {
            loop {
                if try_click_matching(page, &pattern).await? {
                    return Ok::<(), ScheduleError>(());
                }
                sleep(CLICK_POLL).await;
            }
        };

        match timeout(self.options.click_timeout, attempt).await {
            Ok(Ok(())) => {
                info!("Clicked {} filter", token);
                sleep(self.options.scroll_pause).await;
            }
            Ok(Err(e)) => debug!("{} filter click failed: {}", token, e),
            Err(_) => debug!("No {} filter control found", token),
        }
    }

    async fn scroll(&self, page: &Page) -> Result<()> {
        let wheel = DispatchMouseEventParams::builder()
            .r#type(DispatchMouseEventType::MouseWheel)
            .x(0.0)
            .y(0.0)
            .delta_x(0.0)
            .delta_y(SCROLL_DELTA)
            .build()
            .map_err(ScheduleError::Browser)?;

        let pb = ProgressBar::new(self.options.scroll_count as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
                .map_err(|e| ScheduleError::Other(e.to_string()))?,
        );
        pb.set_message("Loading more matches");

        // Always the full count; there is no "no more content" detection
        for _ in 0..self.options.scroll_count {
            page.execute(wheel.clone()).await?;
            sleep(self.options.scroll_pause).await;
            pb.inc(1);
        }

        pb.finish_with_message("Done scrolling");
        Ok(())
    }

    async fn render(&self, page: &Page, url: &str) -> Result<PageCapture> {
        page.execute(EnableParams::default()).await?;

        let activity = Arc::new(AtomicUsize::new(0));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let collector = spawn_collector(page, Arc::clone(&activity), tx).await?;

        info!("Loading {}", url);
        let deadline = Instant::now() + self.options.nav_timeout;
        match timeout(self.options.nav_timeout, page.goto(url)).await {
            Ok(result) => {
                result?;
            }
            Err(_) => {
                collector.abort();
                return Err(ScheduleError::Browser(format!(
                    "navigation timed out after {:?}",
                    self.options.nav_timeout
                )));
            }
        }
        self.wait_for_network_idle(&activity, deadline).await;

        self.click_age_group(page).await;
        self.scroll(page).await?;

        let html = page.content().await?;

        // Capture phase ends here; only then are the packets read
        collector.abort();
        let mut packets = Vec::new();
        while let Ok(packet) = rx.try_recv() {
            packets.push(packet);
        }
        info!("Captured {} JSON responses", packets.len());

        Ok(PageCapture { html, packets })
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn capture(&self, url: &str) -> Result<PageCapture> {
        let (mut browser, handler_task) = self.launch().await?;

        let result = match browser.new_page("about:blank").await {
            Ok(page) => self.render(&page, url).await,
            Err(e) => Err(e.into()),
        };

        if let Err(e) = browser.close().await {
            debug!("Browser close failed: {}", e);
        }
        handler_task.abort();

        result
    }
}

enum NetworkEvent {
    Response(Arc<EventResponseReceived>),
    Finished(Arc<EventLoadingFinished>),
}

/// Listens for schedule-looking JSON responses and forwards their parsed
/// bodies. Bodies are read once loading has finished.
async fn spawn_collector(
    page: &Page,
    activity: Arc<AtomicUsize>,
    tx: mpsc::UnboundedSender<JsonPacket>,
) -> Result<JoinHandle<()>> {
    let responses = page
        .event_listener::<EventResponseReceived>()
        .await?
        .map(NetworkEvent::Response);
    let finished = page
        .event_listener::<EventLoadingFinished>()
        .await?
        .map(NetworkEvent::Finished);
    let mut events = Box::pin(futures::stream::select(responses, finished));
    let page = page.clone();

    Ok(tokio::spawn(async move {
        let mut pending: HashMap<String, String> = HashMap::new();

        while let Some(event) = events.next().await {
            match event {
                NetworkEvent::Response(ev) => {
                    activity.fetch_add(1, Ordering::Relaxed);
                    let response = &ev.response;
                    if is_schedule_response(&content_type(response), &response.url) {
                        pending.insert(ev.request_id.inner().clone(), response.url.clone());
                    }
                }
                NetworkEvent::Finished(ev) => {
                    let Some(url) = pending.remove(ev.request_id.inner()) else {
                        continue;
                    };
                    match read_json_body(&page, ev.request_id.clone()).await {
                        Some(data) => {
                            debug!("Captured JSON from {}", url);
                            if tx.send(JsonPacket { url, data }).is_err() {
                                return;
                            }
                        }
                        None => debug!("Ignoring unreadable JSON from {}", url),
                    }
                }
            }
        }
    }))
}

fn content_type(response: &Response) -> String {
    header_content_type(response.headers.inner(), &response.mime_type)
}

/// Content-Type header in any casing, else the reported MIME type.
fn header_content_type(headers: &Value, mime_type: &str) -> String {
    headers
        .as_object()
        .and_then(|headers| {
            headers
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case("content-type"))
                .and_then(|(_, value)| value.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| mime_type.to_string())
}

async fn read_json_body(page: &Page, request_id: RequestId) -> Option<Value> {
    let body = page
        .execute(GetResponseBodyParams::new(request_id))
        .await
        .ok()?;

    decode_body(&body.result.body, body.result.base64_encoded)
}

fn decode_body(body: &str, base64_encoded: bool) -> Option<Value> {
    if base64_encoded {
        let bytes = STANDARD.decode(body).ok()?;
        serde_json::from_slice(&bytes).ok()
    } else {
        serde_json::from_str(body).ok()
    }
}

async fn try_click_matching(page: &Page, pattern: &Regex) -> Result<bool> {
    let candidates = page.find_elements("button, [role='button']").await?;

    for element in candidates {
        let text = element.inner_text().await?.unwrap_or_default();
        let label = element.attribute("aria-label").await?.unwrap_or_default();
        if pattern.is_match(&text) || pattern.is_match(&label) {
            element.click().await?;
            return Ok(true);
        }
    }

    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_json_body_is_parsed() {
        assert_eq!(decode_body(r#"{"a":1}"#, false), Some(json!({"a": 1})));
    }

    #[test]
    fn base64_body_is_decoded_first() {
        let encoded = STANDARD.encode(r#"{"a":1}"#);
        assert_eq!(decode_body(&encoded, true), Some(json!({"a": 1})));
        assert_eq!(decode_body(r#"{"a":1}"#, true), None);
    }

    #[test]
    fn malformed_body_is_skipped() {
        assert_eq!(decode_body("{not json", false), None);
        assert_eq!(decode_body(&STANDARD.encode("<html>"), true), None);
        assert_eq!(decode_body("", false), None);
    }

    #[test]
    fn content_type_header_in_any_case() {
        let upper = json!({ "Content-Type": "application/json; charset=utf-8" });
        let lower = json!({ "content-type": "application/json" });
        assert_eq!(
            header_content_type(&upper, "text/html"),
            "application/json; charset=utf-8"
        );
        assert_eq!(header_content_type(&lower, "text/html"), "application/json");
    }

    #[test]
    fn content_type_falls_back_to_mime_type() {
        let missing = json!({ "Cache-Control": "no-cache" });
        let not_a_string = json!({ "Content-Type": 42 });
        assert_eq!(header_content_type(&missing, "application/json"), "application/json");
        assert_eq!(header_content_type(&not_a_string, "text/plain"), "text/plain");
        assert_eq!(header_content_type(&json!(null), "text/plain"), "text/plain");
    }

    #[tokio::test]
    #[ignore] // Requires Chromium to be installed
    async fn renders_page_and_reads_html() {
        let renderer = ChromiumRenderer::new(RenderOptions {
            scroll_count: 1,
            scroll_pause: Duration::from_millis(10),
            click_timeout: Duration::from_millis(100),
            ..RenderOptions::default()
        });

        let capture = renderer
            .capture("data:text/html,<ul><li>LA Surf Soccer Club vs Tigers <time datetime='2024-03-10T15:30:00'>Sun</time></li></ul>")
            .await
            .expect("render failed");

        assert!(capture.html.contains("<time"));
        assert!(capture.packets.is_empty());
    }
}
