//! Page acquisition.
//!
//! A `Renderer` loads the schedule page and hands back everything the
//! scrapers work from: the rendered HTML and the JSON responses that looked
//! like schedule data while the page was loading.

pub mod chromium;
pub mod http;

use crate::error::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

pub use chromium::ChromiumRenderer;
pub use http::HttpRenderer;

static SCHEDULE_URL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(schedule|match|fixture|game|event)").unwrap());

/// A JSON response body captured while the page loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonPacket {
    pub url: String,
    pub data: Value,
}

/// Everything collected from one page load.
#[derive(Debug, Clone, Default)]
pub struct PageCapture {
    pub html: String,
    pub packets: Vec<JsonPacket>,
}

impl PageCapture {
    /// Dumps the capture to `dir` as `page.html` and `packets.json`.
    pub fn save(&self, dir: &Path) -> Result<()> {
        if !dir.exists() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(dir.join("page.html"), &self.html)?;
        std::fs::write(
            dir.join("packets.json"),
            serde_json::to_string_pretty(&self.packets)?,
        )?;
        info!("Saved page capture to {:?}", dir);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub age_group: String,
    pub chrome_path: Option<PathBuf>,
    pub scroll_count: u32,
    pub scroll_pause: Duration,
    pub click_timeout: Duration,
    pub nav_timeout: Duration,
    pub idle_window: Duration,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            age_group: "U14".to_string(),
            chrome_path: None,
            scroll_count: 8,
            scroll_pause: Duration::from_millis(800),
            click_timeout: Duration::from_millis(2000),
            nav_timeout: Duration::from_secs(60),
            idle_window: Duration::from_millis(500),
        }
    }
}

#[async_trait]
pub trait Renderer: Send + Sync {
    /// Load `url` and return the rendered document and captured packets.
    async fn capture(&self, url: &str) -> Result<PageCapture>;
}

/// A response is kept when it is JSON and its URL mentions schedule data.
pub fn is_schedule_response(content_type: &str, url: &str) -> bool {
    content_type.to_lowercase().contains("application/json") && SCHEDULE_URL_REGEX.is_match(url)
}
