//! ICS file generation.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use icalendar::{Alarm, Calendar, Component, EventLike, Trigger};
use tracing::debug;
use uuid::Uuid;

use super::CalendarArtifact;
use crate::config::CalendarConfig;
use crate::error::SerializationError;
use crate::event::EventRecord;
use crate::filename::suggested_file_name;

/// Floating local time: no `Z`, no `TZID`.
const FLOATING_FORMAT: &str = "%Y%m%dT%H%M%S";
const UTC_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Renders [`EventRecord`]s as calendar files.
///
/// Stateless apart from its configuration; every call assigns a new UID.
#[derive(Debug, Clone)]
pub struct IcsGenerator {
    product_id: String,
    calendar_name: String,
    alarm_description: String,
    alarm_minutes_before: u32,
    duration_hours: u32,
}

impl Default for IcsGenerator {
    fn default() -> Self {
        Self::new(&CalendarConfig::default())
    }
}

impl IcsGenerator {
    pub fn new(config: &CalendarConfig) -> Self {
        Self {
            product_id: config.product_id.clone(),
            calendar_name: config.calendar_name.clone(),
            alarm_description: config.alarm_description.clone(),
            alarm_minutes_before: config.alarm_minutes_before,
            duration_hours: config.duration_hours,
        }
    }

    /// Start and end of the event as floating date-times.
    ///
    /// End is start plus the configured duration, rolling over days, months
    /// and years. Out-of-range components (`2024-02-30`, `25:00`) are
    /// rejected here rather than normalized.
    pub fn event_window(
        &self,
        event: &EventRecord,
    ) -> Result<(NaiveDateTime, NaiveDateTime), SerializationError> {
        let date = parse_date(event.date())?;
        let time = parse_time(event.time())?;
        let start = date.and_time(time);

        let end = start
            .checked_add_signed(Duration::hours(i64::from(self.duration_hours)))
            .ok_or(SerializationError::Overflow)?;

        Ok((start, end))
    }

    /// Generate the .ics document for `event`, embedding `url` when given.
    pub fn generate(
        &self,
        event: &EventRecord,
        url: Option<&str>,
    ) -> Result<CalendarArtifact, SerializationError> {
        let (start, end) = self.event_window(event)?;
        let uid = Uuid::new_v4().to_string();

        let mut cal = Calendar::new();

        let mut ics_event = icalendar::Event::new();
        ics_event.uid(&uid);
        ics_event.summary(&normalize_newlines(event.title()));

        // DTSTAMP is required by RFC 5545; it never feeds the date math
        ics_event.add_property("DTSTAMP", Utc::now().format(UTC_FORMAT).to_string());

        ics_event.add_property("DTSTART", start.format(FLOATING_FORMAT).to_string());
        ics_event.add_property("DTEND", end.format(FLOATING_FORMAT).to_string());

        if !event.description().is_empty() {
            ics_event.description(&normalize_newlines(event.description()));
        }

        if !event.location().is_empty() {
            ics_event.location(&normalize_newlines(event.location()));
        }

        if let Some(url) = url.map(str::trim).filter(|u| !u.is_empty()) {
            // URL is a URI value, not TEXT: no escaping
            ics_event.add_property("URL", url);
        }

        ics_event.add_property("STATUS", "CONFIRMED");
        ics_event.add_property("TRANSP", "OPAQUE");
        ics_event.add_property("X-MICROSOFT-CDO-BUSYSTATUS", "BUSY");

        let trigger =
            Trigger::before_start(Duration::minutes(i64::from(self.alarm_minutes_before)));
        ics_event.alarm(Alarm::display(&self.alarm_description, trigger));

        let ics_event = ics_event.done();
        cal.push(ics_event);
        let cal = cal.done();

        let content = self.rewrite_header(&cal.to_string());
        check_structure(&content)?;

        debug!(%uid, %start, %end, "generated ics");

        Ok(CalendarArtifact {
            content,
            file_name: suggested_file_name(event.title()),
        })
    }

    /// Swap the builder's PRODID (and its folded tail) for the configured
    /// product id followed by X-WR-CALNAME. Drops CALSCALE and the UID and
    /// DTSTAMP lines the builder puts inside VALARM.
    fn rewrite_header(&self, ics: &str) -> String {
        let mut result = String::with_capacity(ics.len() + 64);
        let mut in_valarm = false;
        let mut in_prodid = false;

        for line in ics.lines() {
            // Continuation lines of the crate's own PRODID
            if in_prodid && line.starts_with(' ') {
                continue;
            }
            in_prodid = false;

            if line.starts_with("PRODID:") {
                in_prodid = true;
                push_line(&mut result, &format!("PRODID:{}", self.product_id));
                if !self.calendar_name.is_empty() {
                    let name = escape_text(&self.calendar_name);
                    push_line(&mut result, &format!("X-WR-CALNAME:{name}"));
                }
                continue;
            }

            if line == "CALSCALE:GREGORIAN" {
                continue;
            }

            if line == "BEGIN:VALARM" {
                in_valarm = true;
            } else if line == "END:VALARM" {
                in_valarm = false;
            }

            if in_valarm && (line.starts_with("DTSTAMP:") || line.starts_with("UID:")) {
                continue;
            }

            result.push_str(line);
            result.push_str("\r\n");
        }

        result
    }
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(&fold_line(line));
    out.push_str("\r\n");
}

fn parse_date(value: &str) -> Result<NaiveDate, SerializationError> {
    let invalid = |reason: &str| SerializationError::InvalidDate {
        value: value.to_string(),
        reason: reason.to_string(),
    };

    let parts = split_numbers::<i32>(value, '-', 3).ok_or_else(|| invalid("expected YYYY-MM-DD"))?;
    let (year, month, day) = (parts[0], parts[1], parts[2]);
    let (month, day) = (
        u32::try_from(month).map_err(|_| invalid("month out of range"))?,
        u32::try_from(day).map_err(|_| invalid("day out of range"))?,
    );

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| invalid("not a calendar date"))
}

fn parse_time(value: &str) -> Result<NaiveTime, SerializationError> {
    let invalid = |reason: &str| SerializationError::InvalidTime {
        value: value.to_string(),
        reason: reason.to_string(),
    };

    let parts = split_numbers::<u32>(value, ':', 2).ok_or_else(|| invalid("expected HH:MM"))?;
    NaiveTime::from_hms_opt(parts[0], parts[1], 0).ok_or_else(|| invalid("not a clock time"))
}

fn split_numbers<T: std::str::FromStr>(value: &str, delimiter: char, count: usize) -> Option<Vec<T>> {
    let parts = value
        .split(delimiter)
        .map(|p| p.parse::<T>().ok())
        .collect::<Option<Vec<_>>>()?;
    (parts.len() == count).then_some(parts)
}

/// The builder escapes LF but passes CR through untouched.
fn normalize_newlines(value: &str) -> String {
    value.replace("\r\n", "\n").replace('\r', "\n")
}

/// Escape a TEXT value per RFC 5545 §3.3.11.
///
/// Only for lines written by hand; builder properties are escaped on render.
pub fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in normalize_newlines(value).chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}

/// Fold a content line at 75 octets without splitting a UTF-8 sequence.
pub fn fold_line(line: &str) -> String {
    const LIMIT: usize = 75;

    if line.len() <= LIMIT {
        return line.to_string();
    }

    let mut out = String::with_capacity(line.len() + line.len() / LIMIT * 3);
    let mut width = 0;
    for c in line.chars() {
        let len = c.len_utf8();
        if width + len > LIMIT {
            out.push_str("\r\n ");
            // the leading space counts toward the next line
            width = 1;
        }
        out.push(c);
        width += len;
    }
    out
}

/// Required markers and properties a reader will look for.
fn check_structure(ics: &str) -> Result<(), SerializationError> {
    const REQUIRED: [&str; 10] = [
        "BEGIN:VCALENDAR",
        "VERSION:2.0",
        "PRODID:",
        "BEGIN:VEVENT",
        "UID:",
        "DTSTAMP:",
        "DTSTART:",
        "BEGIN:VALARM",
        "END:VEVENT",
        "END:VCALENDAR",
    ];

    match REQUIRED
        .iter()
        .find(|marker| !ics.lines().any(|line| line.starts_with(*marker)))
    {
        Some(marker) => Err(SerializationError::Render(format!(
            "rendered calendar is missing {marker}"
        ))),
        None => Ok(()),
    }
}
