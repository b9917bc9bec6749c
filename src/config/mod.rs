use crate::config::cli::Args;
use crate::error::Result;
use crate::matcher::{AgeGroupFilter, TeamFilter};
use crate::renderer::RenderOptions;
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

pub(crate) mod cli;

pub struct Config {
    pub args: Args,
    pub team_filter: TeamFilter,
    pub age_filter: AgeGroupFilter,
}

impl Config {
    pub fn new(args: Args) -> Result<Self> {
        let team_filter = TeamFilter::new(&args.team)?;
        let age_filter = AgeGroupFilter::new(&args.age_group, args.strict_age_group)?;

        info!(
            "Matching team {:?} (json key {:?}), age group {}{}",
            args.team,
            team_filter.short_key(),
            args.age_group,
            if age_filter.is_strict() { " (strict)" } else { "" }
        );

        Ok(Self {
            args,
            team_filter,
            age_filter,
        })
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            age_group: self.args.age_group.clone(),
            chrome_path: self.args.chrome_path.clone(),
            scroll_count: self.args.scroll_count,
            scroll_pause: Duration::from_millis(self.args.scroll_pause_ms),
            click_timeout: Duration::from_millis(self.args.click_timeout_ms),
            nav_timeout: Duration::from_millis(self.args.nav_timeout_ms),
            idle_window: Duration::from_millis(self.args.idle_ms),
        }
    }

    pub fn http_client(&self) -> Result<Client> {
        let client = Client::builder()
            .timeout(Duration::from_millis(self.args.nav_timeout_ms))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()?;
        Ok(client)
    }

    pub fn output_path(&self) -> &PathBuf {
        &self.args.output
    }

    /// Provenance line attached to every event.
    pub fn description_prefix(&self) -> String {
        format!("MLS NEXT Academy Division ({})", self.args.age_group)
    }
}
