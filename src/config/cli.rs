use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::Level;

pub const DEFAULT_URL: &str = "https://www.mlssoccer.com/mlsnext/schedule/academy_division/";
pub const DEFAULT_TEAM: &str = "LA Surf Soccer Club";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RendererKind {
    /// Headless Chromium with JSON response capture
    Chromium,
    /// Plain HTTP fetch, no JavaScript
    Http,
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Args {
    /// Schedule page to scrape
    #[arg(long, env = "SCHEDULE_URL", default_value = DEFAULT_URL)]
    pub url: String,

    /// Team whose matches end up in the calendar
    #[arg(long, env = "TEAM", default_value = DEFAULT_TEAM)]
    pub team: String,

    /// Age group token clicked in the page filters
    #[arg(long, env = "AGE_GROUP", default_value = "U14")]
    pub age_group: String,

    /// Drop rows that don't mention the age group
    #[arg(long)]
    pub strict_age_group: bool,

    /// Calendar file to write
    #[arg(long, default_value = "docs/mlsnext.ics")]
    pub output: PathBuf,

    /// How the page is loaded
    #[arg(long, value_enum, default_value_t = RendererKind::Chromium)]
    pub renderer: RendererKind,

    /// Chromium binary to launch
    #[arg(long, env = "CHROME_PATH")]
    pub chrome_path: Option<PathBuf>,

    /// Number of scroll-wheel events used to trigger lazy loading
    #[arg(long, default_value_t = 8)]
    pub scroll_count: u32,

    /// Pause after each scroll and after the filter click
    #[arg(long, default_value_t = 800)]
    pub scroll_pause_ms: u64,

    /// How long to look for the age group control
    #[arg(long, default_value_t = 2000)]
    pub click_timeout_ms: u64,

    /// Upper bound for navigation plus network idle
    #[arg(long, default_value_t = 60_000)]
    pub nav_timeout_ms: u64,

    /// Quiet period without responses that counts as network idle
    #[arg(long, default_value_t = 500)]
    pub idle_ms: u64,

    /// Directory for the rendered HTML and captured JSON, for debugging selectors
    #[arg(long)]
    pub capture_dir: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value_t = Level::INFO)]
    pub log_level: Level,
}
