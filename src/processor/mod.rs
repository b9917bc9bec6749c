use crate::calendar::{build_calendar, write_calendar, CalendarEvent};
use crate::config::cli::RendererKind;
use crate::config::Config;
use crate::error::{Result, ScheduleError};
use crate::renderer::{ChromiumRenderer, HttpRenderer, PageCapture, Renderer};
use crate::scrapers::{DomScraper, ExtractContext, JsonScraper, ScheduleScraper};
use std::path::PathBuf;
use tracing::info;

/// Outcome of a successful run.
#[derive(Debug)]
pub struct RunSummary {
    pub path: PathBuf,
    pub events: usize,
    pub source: &'static str,
}

pub struct Processor {
    config: Config,
    renderer: Box<dyn Renderer>,
}

impl Processor {
    pub fn new(config: Config) -> Result<Self> {
        let renderer: Box<dyn Renderer> = match config.args.renderer {
            RendererKind::Chromium => Box::new(ChromiumRenderer::new(config.render_options())),
            RendererKind::Http => Box::new(HttpRenderer::new(config.http_client()?)),
        };
        Ok(Self::with_renderer(config, renderer))
    }

    pub fn with_renderer(config: Config, renderer: Box<dyn Renderer>) -> Self {
        Self { config, renderer }
    }

    pub async fn run(&self) -> Result<RunSummary> {
        // Step 1: Load the page
        info!("Step 1: Loading schedule page...");
        let capture = self.renderer.capture(&self.config.args.url).await?;
        if let Some(dir) = &self.config.args.capture_dir {
            capture.save(dir)?;
        }

        // Step 2: Rows first, JSON only when the page had nothing
        info!("Step 2: Extracting matches...");
        let (events, source) = self.extract(capture)?;
        if events.is_empty() {
            return Err(ScheduleError::NoEvents {
                team: self.config.args.team.clone(),
                age_group: self.config.args.age_group.clone(),
            });
        }
        info!("Found {} events from {}", events.len(), source);

        // Step 3: Serialize, and only then touch the output file
        info!("Step 3: Building calendar...");
        let ics = build_calendar(&events)?;
        let path = self.config.output_path().clone();
        write_calendar(&path, &ics)?;

        Ok(RunSummary {
            path,
            events: events.len(),
            source,
        })
    }

    fn extract(&self, capture: PageCapture) -> Result<(Vec<CalendarEvent>, &'static str)> {
        let description_prefix = self.config.description_prefix();
        let ctx = ExtractContext {
            team: &self.config.team_filter,
            age_group: &self.config.age_filter,
            description_prefix: &description_prefix,
            page_url: &self.config.args.url,
        };

        let packet_count = capture.packets.len();
        let scrapers: Vec<Box<dyn ScheduleScraper>> = vec![
            Box::new(DomScraper::parse(&capture.html)?),
            Box::new(JsonScraper::new(capture.packets)),
        ];

        let mut last = "none";
        for scraper in &scrapers {
            let events = scraper.extract_events(&ctx)?;
            if !events.is_empty() {
                return Ok((events, scraper.name()));
            }
            last = scraper.name();
            info!("No events from {}, {} JSON responses captured", last, packet_count);
        }

        Ok((Vec::new(), last))
    }
}
