//! Plain HTTP acquisition. No JavaScript runs, so nothing is captured
//! besides the served HTML.

use super::{PageCapture, Renderer};
use crate::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use tracing::info;

pub struct HttpRenderer {
    client: Client,
}

impl HttpRenderer {
    pub fn new(client: Client) -> Self {
        info!("Created HTTP renderer");
        Self { client }
    }
}

#[async_trait]
impl Renderer for HttpRenderer {
    async fn capture(&self, url: &str) -> Result<PageCapture> {
        info!("Fetching {}", url);
        let html = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        Ok(PageCapture {
            html,
            packets: Vec::new(),
        })
    }
}
