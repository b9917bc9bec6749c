use crate::error::{Result, ScheduleError};
use chrono::{Datelike, Local, NaiveDateTime, TimeZone, Timelike, Utc};
use icalendar::{Calendar, Component, Event, EventLike, EventStatus};
use std::path::Path;
use tracing::info;

pub const PRODUCT_ID: &str = "mlsnext-ics";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Confirmed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusyStatus {
    Busy,
}

impl BusyStatus {
    fn as_str(&self) -> &'static str {
        match self {
            BusyStatus::Busy => "BUSY",
        }
    }
}

/// One match as it lands in the calendar. `start` is local wall-clock time.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEvent {
    pub start: NaiveDateTime,
    pub title: String,
    pub description: String,
    pub status: Status,
    pub busy_status: BusyStatus,
}

impl CalendarEvent {
    pub fn new(start: NaiveDateTime, title: String, description: String) -> Self {
        Self {
            start,
            title,
            description,
            status: Status::Confirmed,
            busy_status: BusyStatus::Busy,
        }
    }

    /// `[year, month, day, hour, minute]`
    pub fn start_array(&self) -> [i32; 5] {
        [
            self.start.year(),
            self.start.month() as i32,
            self.start.day() as i32,
            self.start.hour() as i32,
            self.start.minute() as i32,
        ]
    }

    fn uid(&self) -> String {
        let slug: String = self
            .title
            .to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '-' })
            .collect();
        format!("{}-{}@{}", self.start.format("%Y%m%dT%H%M"), slug, PRODUCT_ID)
    }

    fn validate(&self) -> Result<()> {
        if !(1..=9999).contains(&self.start.year()) {
            return Err(ScheduleError::Calendar(format!(
                "start year {} of {:?} is out of range",
                self.start.year(),
                self.title
            )));
        }
        Ok(())
    }
}

/// Renders the events as an iCalendar document. Any structurally invalid
/// event fails the whole calendar.
pub fn build_calendar(events: &[CalendarEvent]) -> Result<String> {
    let stamp = Utc::now();
    let mut calendar = Calendar::empty();
    calendar
        .append_property(("VERSION", "2.0"))
        .append_property(("CALSCALE", "GREGORIAN"))
        .append_property(("PRODID", PRODUCT_ID))
        .append_property(("METHOD", "PUBLISH"))
        .append_property(("X-PUBLISHED-TTL", "PT1H"));

    for event in events {
        event.validate()?;

        let start_utc = Local
            .from_local_datetime(&event.start)
            .earliest()
            .ok_or_else(|| {
                ScheduleError::Calendar(format!(
                    "start {} of {:?} does not exist in the local timezone",
                    event.start, event.title
                ))
            })?
            .with_timezone(&Utc);

        let status = match event.status {
            Status::Confirmed => EventStatus::Confirmed,
        };

        calendar.push(
            Event::new()
                .uid(&event.uid())
                .timestamp(stamp)
                .summary(&event.title)
                .description(&event.description)
                .starts(start_utc)
                .status(status)
                .add_property("X-MICROSOFT-CDO-BUSYSTATUS", event.busy_status.as_str())
                .done(),
        );
    }

    Ok(calendar.to_string())
}

/// Writes the calendar text, replacing any previous file.
pub fn write_calendar(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)?;
    info!("Saved calendar to {:?}", path);
    Ok(())
}
