use crate::calendar::CalendarEvent;
use crate::error::{Result, ScheduleError};
use crate::matcher::{AgeGroupFilter, TeamFilter};
use scraper::Selector;

pub(crate) mod dom;
pub(crate) mod json;

pub use dom::DomScraper;
pub use json::JsonScraper;

/// Loose on purpose: any of these may be a match row.
pub const ROW_SELECTOR: &str =
    r#"article, li, [data-testid*="match"], .match, .schedule__row"#;
/// Rows picked by these don't need a nested time element to qualify.
pub const MARKED_ROW_SELECTOR: &str = r#"[data-testid*="match"], .match, .schedule__row"#;
pub const TIME_SELECTOR: &str = "time";

/// What every scraper needs to decide on and describe a match.
pub struct ExtractContext<'a> {
    pub team: &'a TeamFilter,
    pub age_group: &'a AgeGroupFilter,
    pub description_prefix: &'a str,
    pub page_url: &'a str,
}

/// A source of match events: the rendered page or captured JSON.
pub trait ScheduleScraper {
    fn name(&self) -> &'static str;
    fn extract_events(&self, ctx: &ExtractContext) -> Result<Vec<CalendarEvent>>;
}

pub struct Selectors {
    pub row: Selector,
    pub marked_row: Selector,
    pub time: Selector,
}

impl Selectors {
    pub fn new(row_selector: &str, marked_row_selector: &str, time_selector: &str) -> Result<Self> {
        Ok(Self {
            row: parse_selector(row_selector)?,
            marked_row: parse_selector(marked_row_selector)?,
            time: parse_selector(time_selector)?,
        })
    }

    pub fn built_in() -> Result<Self> {
        Self::new(ROW_SELECTOR, MARKED_ROW_SELECTOR, TIME_SELECTOR)
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| ScheduleError::Selector(e.to_string()))
}
