use super::{ExtractContext, ScheduleScraper};
use crate::calendar::CalendarEvent;
use crate::error::Result;
use crate::matcher::{local_start, parse_timestamp, Teams};
use crate::renderer::JsonPacket;
use serde_json::Value;
use tracing::{debug, warn};

const TIME_FIELDS: &[&str] = &["startTime", "kickoff", "date", "datetime", "start"];

/// Mines match records out of captured JSON responses.
pub struct JsonScraper {
    packets: Vec<JsonPacket>,
}

impl JsonScraper {
    pub fn new(packets: Vec<JsonPacket>) -> Self {
        Self { packets }
    }
}

/// JavaScript-style truthiness, so empty strings and zeros count as missing.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn field<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value.get(key).filter(|v| is_truthy(v))
}

/// The record list of a body: the body itself, or its `data` or `items`.
fn records(body: &Value) -> &[Value] {
    if let Value::Array(list) = body {
        return list;
    }
    field(body, "data")
        .or_else(|| field(body, "items"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// `<side>Team.name`, then `<side>.name`, then `<side>` itself.
fn side_name(record: &Value, side: &str) -> String {
    field(record, &format!("{side}Team"))
        .and_then(|team| field(team, "name"))
        .or_else(|| field(record, side).and_then(|s| field(s, "name")))
        .or_else(|| field(record, side).filter(|s| !s.is_object()))
        .and_then(as_text)
        .unwrap_or_default()
}

fn record_teams(record: &Value) -> Teams {
    Teams::new(side_name(record, "home"), side_name(record, "away"))
}

fn record_time(record: &Value) -> Option<&Value> {
    TIME_FIELDS.iter().find_map(|key| field(record, key))
}

fn record_title(record: &Value, teams: &Teams) -> String {
    teams
        .title()
        .or_else(|| field(record, "title").and_then(as_text))
        .unwrap_or_else(|| "Match".to_string())
}

impl ScheduleScraper for JsonScraper {
    fn name(&self) -> &'static str {
        "json"
    }

    fn extract_events(&self, ctx: &ExtractContext) -> Result<Vec<CalendarEvent>> {
        let mut events = Vec::new();

        for packet in &self.packets {
            let list = records(&packet.data);
            debug!("{} records in {}", list.len(), packet.url);

            for record in list {
                let teams = record_teams(record);
                if !ctx.team.matches_pair(&teams.home, &teams.away) {
                    continue;
                }
                let Some(when) = record_time(record) else {
                    continue;
                };
                let Some(start) = parse_timestamp(when) else {
                    warn!("Skipping record with unreadable time {}", when);
                    continue;
                };

                events.push(CalendarEvent::new(
                    local_start(&start),
                    record_title(record, &teams),
                    format!("{} - {}", ctx.description_prefix, packet.url),
                ));
            }
        }

        Ok(events)
    }
}
