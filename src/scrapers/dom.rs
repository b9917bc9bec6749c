use super::{ExtractContext, ScheduleScraper, Selectors};
use crate::calendar::CalendarEvent;
use crate::error::Result;
use crate::matcher::normalize::parse_timestamp_str;
use crate::matcher::{collapse_whitespace, local_start, parse_teams, truncate_chars};
use scraper::{ElementRef, Html, Node};
use tracing::{debug, warn};

const TITLE_FALLBACK_CHARS: usize = 80;

/// Never rendered, so never part of a row's text.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "template", "noscript", "head"];
/// Elements that start on their own line when rendered.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "div", "dl", "dd", "dt", "footer", "form", "h1", "h2", "h3",
    "h4", "h5", "h6", "header", "li", "main", "nav", "ol", "p", "section", "table", "td", "th",
    "tr", "ul",
];

fn push_visible_text(element: ElementRef, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let name = el.name();
                if HIDDEN_ELEMENTS.contains(&name) {
                    continue;
                }
                let block = BLOCK_ELEMENTS.contains(&name);
                if block || name == "br" {
                    out.push(' ');
                }
                if let Some(child) = ElementRef::wrap(child) {
                    push_visible_text(child, out);
                }
                if block {
                    out.push(' ');
                }
            }
            _ => {}
        }
    }
}

/// Rendered text of a row: inline fragments run together, blocks and
/// line breaks separate words, whitespace collapsed.
pub fn visible_text(element: ElementRef) -> String {
    let mut out = String::new();
    push_visible_text(element, &mut out);
    collapse_whitespace(&out)
}

/// Reads match rows out of the rendered page.
pub struct DomScraper {
    document: Html,
    selectors: Selectors,
}

impl DomScraper {
    pub fn parse(html: &str) -> Result<Self> {
        Ok(Self {
            document: Html::parse_document(html),
            selectors: Selectors::built_in()?,
        })
    }

    fn candidate_rows(&self) -> impl Iterator<Item = ElementRef<'_>> {
        self.document.select(&self.selectors.row).filter(|row| {
            self.selectors.marked_row.matches(row) || row.select(&self.selectors.time).next().is_some()
        })
    }

    fn row_to_event(&self, row: ElementRef, ctx: &ExtractContext) -> Option<CalendarEvent> {
        let text = visible_text(row);

        if !ctx.team.matches_text(&text) {
            return None;
        }
        if !ctx.age_group.accepts(&text) {
            debug!("Skipping row without age group: {}", text);
            return None;
        }

        let iso = row
            .select(&self.selectors.time)
            .next()
            .and_then(|time| time.value().attr("datetime"))
            .filter(|iso| !iso.is_empty())?;

        let Some(start) = parse_timestamp_str(iso) else {
            warn!("Skipping row with unreadable datetime {:?}: {}", iso, text);
            return None;
        };

        let title = parse_teams(&text)
            .title()
            .unwrap_or_else(|| truncate_chars(&text, TITLE_FALLBACK_CHARS));

        Some(CalendarEvent::new(
            local_start(&start),
            title,
            format!("{} - scraped from {}", ctx.description_prefix, ctx.page_url),
        ))
    }
}

impl ScheduleScraper for DomScraper {
    fn name(&self) -> &'static str {
        "page"
    }

    fn extract_events(&self, ctx: &ExtractContext) -> Result<Vec<CalendarEvent>> {
        let mut events = Vec::new();
        let mut rows = 0;

        for row in self.candidate_rows() {
            rows += 1;
            if let Some(event) = self.row_to_event(row, ctx) {
                events.push(event);
            }
        }

        debug!("{} candidate rows, {} events", rows, events.len());
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::{AgeGroupFilter, TeamFilter};

    const URL: &str = "https://www.mlssoccer.com/mlsnext/schedule/academy_division/";

    fn extract(html: &str, strict: bool) -> Vec<CalendarEvent> {
        let team = TeamFilter::new("LA Surf Soccer Club").unwrap();
        let age_group = AgeGroupFilter::new("U14", strict).unwrap();
        let ctx = ExtractContext {
            team: &team,
            age_group: &age_group,
            description_prefix: "MLS NEXT Academy Division (U14)",
            page_url: URL,
        };
        DomScraper::parse(html).unwrap().extract_events(&ctx).unwrap()
    }

    #[test]
    fn list_item_with_time_becomes_event() {
        let events = extract(
            r#"<ul><li>LA Surf Soccer Club vs Tigers
                <time datetime="2024-03-10T15:30:00">Sun 3:30</time></li></ul>"#,
            false,
        );

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "LA Surf Soccer Club vs Tigers");
        assert_eq!(events[0].start_array(), [2024, 3, 10, 15, 30]);
        assert_eq!(
            events[0].description,
            format!("MLS NEXT Academy Division (U14) - scraped from {}", URL)
        );
    }

    #[test]
    fn other_teams_are_skipped() {
        let events = extract(
            r#"<article>LA Galaxy vs Tigers <time datetime="2024-03-10T15:30:00"></time></article>"#,
            false,
        );
        assert!(events.is_empty());
    }

    #[test]
    fn rows_without_datetime_are_skipped() {
        let events = extract(
            r#"<div class="match">LA Surf Soccer Club vs Tigers <span>Sun 3:30</span></div>
               <div class="match">LA Surf Soccer Club vs Rivals <time>TBD</time></div>"#,
            false,
        );
        assert!(events.is_empty());
    }

    #[test]
    fn unreadable_datetime_is_skipped() {
        let events = extract(
            r#"<li>LA Surf Soccer Club vs Tigers <time datetime="soon"></time></li>"#,
            false,
        );
        assert!(events.is_empty());
    }

    #[test]
    fn list_item_without_time_is_not_a_row() {
        let events = extract(
            r#"<ul><li>LA Surf Soccer Club vs Tigers</li></ul>"#,
            false,
        );
        assert!(events.is_empty());
    }

    #[test]
    fn marked_rows_use_test_id_and_classes() {
        let events = extract(
            r#"<div data-testid="match-card">LA Surf Soccer Club @ Rivals
                 <time datetime="2024-04-01T09:00:00"></time></div>
               <div class="schedule__row">Strikers vs LA Surf Soccer Club
                 <time datetime="2024-04-08T11:15:00"></time></div>"#,
            false,
        );

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].title, "Rivals vs LA Surf Soccer Club");
        assert_eq!(events[1].title, "Strikers vs LA");
        assert_eq!(events[1].start_array(), [2024, 4, 8, 11, 15]);
    }

    #[test]
    fn title_falls_back_to_row_text() {
        let long_tail = "x".repeat(100);
        let html = format!(
            r#"<li>LA Surf Soccer Club - Field 3 {} <time datetime="2024-03-10T15:30:00"></time></li>"#,
            long_tail
        );
        let events = extract(&html, false);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title.chars().count(), 80);
        assert!(events[0].title.starts_with("LA Surf Soccer Club - Field 3 xxx"));
    }

    #[test]
    fn text_split_across_elements_still_matches() {
        let events = extract(
            r#"<article><span>LA Surf</span><span>Soccer Club</span> vs <b>Tigers</b>
                 <time datetime="2024-03-10T15:30:00"></time></article>"#,
            false,
        );
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "LA SurfSoccer Club vs Tigers");
    }

    #[test]
    fn inline_markup_does_not_split_words() {
        let events = extract(
            r#"<li>LA Surf Soccer Club vs <b>Tig</b>ers<script>track("row")</script>
                 <time datetime="2024-03-10T15:30:00"></time></li>"#,
            false,
        );
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "LA Surf Soccer Club vs Tigers");
    }

    #[test]
    fn script_text_does_not_count_as_team_mention() {
        let events = extract(
            r#"<li><script>track("LA Surf Soccer Club")</script><style>.x{}</style>Galaxy vs Tigers
                 <time datetime="2024-03-10T15:30:00"></time></li>"#,
            false,
        );
        assert!(events.is_empty());
    }

    #[test]
    fn blocks_and_line_breaks_separate_words() {
        let html = Html::parse_fragment(
            "<article><div>LA Surf Soccer Club</div><div>vs</div>Tigers<br>Field<i>3</i></article>",
        );
        let selector = scraper::Selector::parse("article").unwrap();
        let row = html.select(&selector).next().unwrap();
        assert_eq!(visible_text(row), "LA Surf Soccer Club vs Tigers Field3");
    }

    #[test]
    fn strict_age_group_drops_unlabelled_rows() {
        let html = r#"<li>U14 LA Surf Soccer Club vs Tigers <time datetime="2024-03-10T15:30:00"></time></li>
                      <li>LA Surf Soccer Club vs Rivals <time datetime="2024-03-17T15:30:00"></time></li>"#;

        assert_eq!(extract(html, false).len(), 2);

        let strict = extract(html, true);
        assert_eq!(strict.len(), 1);
        assert_eq!(strict[0].title, "U14 LA Surf Soccer Club vs Tigers");
    }
}
