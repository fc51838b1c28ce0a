//! The extracted event and its schema.
//!
//! An [`EventRecord`] only exists in a valid state: every constructor runs the
//! full set of field rules and either returns the record or every violation.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::error::{FieldIssue, SchemaValidationError};

pub const TITLE_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MAX_CHARS: usize = 500;
pub const LOCATION_MAX_CHARS: usize = 500;

// ASCII digits only; `\d` would also accept other Unicode digits.
static DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("valid date regex"));
static TIME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{2}:[0-9]{2}$").expect("valid time regex"));

/// A calendar event extracted from free text.
///
/// `date` and `time` are pattern-checked only. Calendar validity
/// (`2024-02-30`) and clock range (`25:61`) are left to the serializer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventRecord {
    title: String,
    description: String,
    date: String,
    time: String,
    location: String,
}

impl EventRecord {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        date: impl Into<String>,
        time: impl Into<String>,
        location: impl Into<String>,
    ) -> Result<Self, SchemaValidationError> {
        let record = EventRecord {
            title: title.into(),
            description: description.into(),
            date: date.into(),
            time: time.into(),
            location: location.into(),
        };

        let mut issues = Vec::new();
        check_title(&record.title, &mut issues);
        check_max_len("description", &record.description, DESCRIPTION_MAX_CHARS, &mut issues);
        check_pattern("date", &record.date, &DATE_PATTERN, "YYYY-MM-DD", &mut issues);
        check_pattern("time", &record.time, &TIME_PATTERN, "HH:MM", &mut issues);
        check_max_len("location", &record.location, LOCATION_MAX_CHARS, &mut issues);

        if issues.is_empty() {
            Ok(record)
        } else {
            Err(SchemaValidationError::Fields(issues))
        }
    }

    /// Validate an untyped JSON tree against the event schema.
    ///
    /// Unknown keys are ignored. No coercion is applied: numbers are not
    /// stringified and strings are not trimmed.
    pub fn validate(candidate: &Value) -> Result<Self, SchemaValidationError> {
        let object = candidate
            .as_object()
            .ok_or(SchemaValidationError::NotAnObject)?;

        let mut issues = Vec::new();
        let mut field = |name: &'static str| match object.get(name) {
            None | Some(Value::Null) => {
                issues.push(FieldIssue::Missing(name));
                None
            }
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                issues.push(FieldIssue::NotAString(name));
                None
            }
        };

        let title = field("title");
        let description = field("description");
        let date = field("date");
        let time = field("time");
        let location = field("location");

        match (title, description, date, time, location) {
            (Some(title), Some(description), Some(date), Some(time), Some(location))
                if issues.is_empty() =>
            {
                EventRecord::new(title, description, date, time, location)
            }
            (title, description, date, time, location) => {
                // Report content issues for the fields that were present too.
                let filled = |v: Option<String>| v.unwrap_or_default();
                if let Some(t) = title.as_deref() {
                    check_title(t, &mut issues);
                }
                check_max_len("description", &filled(description), DESCRIPTION_MAX_CHARS, &mut issues);
                if let Some(d) = date.as_deref() {
                    check_pattern("date", d, &DATE_PATTERN, "YYYY-MM-DD", &mut issues);
                }
                if let Some(t) = time.as_deref() {
                    check_pattern("time", t, &TIME_PATTERN, "HH:MM", &mut issues);
                }
                check_max_len("location", &filled(location), LOCATION_MAX_CHARS, &mut issues);
                Err(SchemaValidationError::Fields(issues))
            }
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// `YYYY-MM-DD`
    pub fn date(&self) -> &str {
        &self.date
    }

    /// `HH:MM`, 24-hour clock
    pub fn time(&self) -> &str {
        &self.time
    }

    pub fn location(&self) -> &str {
        &self.location
    }
}

impl TryFrom<Value> for EventRecord {
    type Error = SchemaValidationError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        EventRecord::validate(&value)
    }
}

/// Both bounds apply to the trimmed title; the stored value keeps its spaces.
fn check_title(title: &str, issues: &mut Vec<FieldIssue>) {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        issues.push(FieldIssue::TooShort {
            field: "title",
            min: 1,
        });
    }
    check_max_len("title", trimmed, TITLE_MAX_CHARS, issues);
}

fn check_max_len(field: &'static str, value: &str, max: usize, issues: &mut Vec<FieldIssue>) {
    let actual = value.chars().count();
    if actual > max {
        issues.push(FieldIssue::TooLong { field, max, actual });
    }
}

fn check_pattern(
    field: &'static str,
    value: &str,
    pattern: &Regex,
    expected: &'static str,
    issues: &mut Vec<FieldIssue>,
) {
    if !pattern.is_match(value) {
        issues.push(FieldIssue::Pattern { field, expected });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn candidate() -> Value {
        json!({
            "title": "Team Dinner",
            "description": "Team dinner",
            "date": "2024-05-10",
            "time": "19:00",
            "location": "ABC Restaurant, Gangnam"
        })
    }

    fn issue_fields(err: &SchemaValidationError) -> Vec<&'static str> {
        err.issues().iter().map(FieldIssue::field).collect()
    }

    #[test]
    fn test_validate_accepts_well_formed_event() {
        let record = EventRecord::validate(&candidate()).unwrap();
        assert_eq!(record.title(), "Team Dinner");
        assert_eq!(record.description(), "Team dinner");
        assert_eq!(record.date(), "2024-05-10");
        assert_eq!(record.time(), "19:00");
        assert_eq!(record.location(), "ABC Restaurant, Gangnam");
    }

    #[test]
    fn test_validate_ignores_extra_fields() {
        let mut value = candidate();
        value["confidence"] = json!(0.9);
        assert!(EventRecord::validate(&value).is_ok());
    }

    #[test]
    fn test_validate_allows_empty_description_and_location() {
        let mut value = candidate();
        value["description"] = json!("");
        value["location"] = json!("");
        assert!(EventRecord::validate(&value).is_ok());
    }

    #[test]
    fn test_title_of_101_chars_is_rejected() {
        let mut value = candidate();
        value["title"] = json!("a".repeat(101));
        let err = EventRecord::validate(&value).unwrap_err();
        assert_eq!(
            err.issues(),
            &[FieldIssue::TooLong {
                field: "title",
                max: 100,
                actual: 101
            }]
        );

        value["title"] = json!("a".repeat(100));
        assert!(EventRecord::validate(&value).is_ok());
    }

    #[test]
    fn test_title_length_counts_characters_not_bytes() {
        let mut value = candidate();
        value["title"] = json!("회".repeat(100));
        assert!(EventRecord::validate(&value).is_ok());
    }

    #[test]
    fn test_blank_title_is_rejected() {
        let mut value = candidate();
        value["title"] = json!("   ");
        let err = EventRecord::validate(&value).unwrap_err();
        assert_eq!(issue_fields(&err), vec!["title"]);
    }

    #[test]
    fn test_title_is_not_trimmed() {
        let mut value = candidate();
        value["title"] = json!("  Dinner ");
        assert_eq!(EventRecord::validate(&value).unwrap().title(), "  Dinner ");
    }

    #[test]
    fn test_title_length_ignores_surrounding_whitespace() {
        let padded = format!("  {}  ", "a".repeat(100));
        let record = EventRecord::new(padded.clone(), "", "2024-05-10", "19:00", "").unwrap();
        assert_eq!(record.title(), padded);

        let err = EventRecord::new(format!(" {} ", "a".repeat(101)), "", "2024-05-10", "19:00", "")
            .unwrap_err();
        assert_eq!(
            err.issues(),
            &[FieldIssue::TooLong {
                field: "title",
                max: 100,
                actual: 101
            }]
        );
    }

    #[test]
    fn test_date_with_wrong_delimiter_is_rejected() {
        let mut value = candidate();
        value["date"] = json!("2024/01/01");
        let err = EventRecord::validate(&value).unwrap_err();
        assert_eq!(issue_fields(&err), vec!["date"]);
    }

    #[test]
    fn test_time_without_leading_zero_is_rejected() {
        let mut value = candidate();
        value["time"] = json!("9:00");
        let err = EventRecord::validate(&value).unwrap_err();
        assert_eq!(issue_fields(&err), vec!["time"]);
    }

    #[test]
    fn test_pattern_only_checks_shape() {
        let mut value = candidate();
        value["date"] = json!("2024-02-30");
        value["time"] = json!("25:61");
        assert!(EventRecord::validate(&value).is_ok());
    }

    #[test]
    fn test_non_ascii_digits_are_rejected() {
        let mut value = candidate();
        value["date"] = json!("２０２４-05-10");
        assert!(EventRecord::validate(&value).is_err());
    }

    #[test]
    fn test_missing_and_mistyped_fields_are_all_reported() {
        let value = json!({
            "title": "Dinner",
            "date": 20240510,
            "time": "19:00",
            "location": "x".repeat(501)
        });
        let err = EventRecord::validate(&value).unwrap_err();
        let fields = issue_fields(&err);
        assert!(fields.contains(&"description"));
        assert!(fields.contains(&"date"));
        assert!(fields.contains(&"location"));
        assert!(err.issues().contains(&FieldIssue::NotAString("date")));
        assert!(err.issues().contains(&FieldIssue::Missing("description")));
    }

    #[test]
    fn test_non_object_is_rejected() {
        assert_eq!(
            EventRecord::validate(&json!(["title"])).unwrap_err(),
            SchemaValidationError::NotAnObject
        );
    }

    #[test]
    fn test_new_runs_the_same_rules() {
        assert!(EventRecord::new("Dinner", "", "2024-05-10", "19:00", "").is_ok());
        assert!(EventRecord::new("", "", "2024-05-10", "19:00", "").is_err());
    }

    #[test]
    fn test_serializes_to_the_five_fields() {
        let record = EventRecord::validate(&candidate()).unwrap();
        assert_eq!(serde_json::to_value(&record).unwrap(), candidate());
    }
}
