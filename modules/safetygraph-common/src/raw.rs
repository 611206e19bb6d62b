//! Typed envelope around a raw source record.
//!
//! Source systems spell the same logical field several ways over the years
//! (`event_type` / `EventType`, `geo` / `GEO`). Accessors take an alias list
//! and return the first alias that carries a usable value.

use chrono::{Datelike, NaiveDate};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

/// Date layouts seen in source exports, tried in order.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d", "%d.%m.%Y"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RawFieldError {
    #[error("record is not a key/value mapping (got {0})")]
    NotAMapping(&'static str),

    #[error("field {field} has an unusable value: {value}")]
    InvalidValue { field: String, value: String },
}

/// Opaque bag of named fields from one source system.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    fields: Map<String, Value>,
}

impl RawRecord {
    pub fn from_value(value: Value) -> Result<Self, RawFieldError> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(RawFieldError::NotAMapping(value_kind(&other))),
        }
    }

    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn contains_any(&self, keys: &[&str]) -> bool {
        keys.iter().any(|k| self.fields.contains_key(*k))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// First non-null value among `aliases`, with the alias that matched.
    pub fn get_any<'a>(&'a self, aliases: &[&'a str]) -> Option<(&'a str, &'a Value)> {
        aliases.iter().find_map(|alias| match self.fields.get(*alias) {
            Some(Value::Null) | None => None,
            Some(v) => Some((*alias, v)),
        })
    }

    /// Scalar value coerced to a string key. Blank strings count as absent.
    ///
    /// Integral floats render without a fraction so a code exported as `42.0`
    /// still resolves as `"42"`.
    pub fn text(&self, aliases: &[&str]) -> Option<String> {
        aliases.iter().find_map(|alias| {
            let value = self.fields.get(*alias)?;
            scalar_to_string(value).filter(|s| !s.is_empty())
        })
    }

    /// Non-negative whole count. Absent, null and blank values yield `None`;
    /// anything else that is not a whole number is an error.
    pub fn count(&self, aliases: &[&str]) -> Result<Option<u64>, RawFieldError> {
        let Some((field, value)) = self.get_any(aliases) else {
            return Ok(None);
        };
        let invalid = || RawFieldError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
        };
        match value {
            Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    Ok(Some(u))
                } else {
                    match n.as_f64() {
                        Some(f) if f >= 0.0 && f.fract() == 0.0 => Ok(Some(f as u64)),
                        _ => Err(invalid()),
                    }
                }
            }
            Value::String(s) if s.trim().is_empty() => Ok(None),
            Value::String(s) => {
                let s = s.trim();
                if let Ok(u) = s.parse::<u64>() {
                    return Ok(Some(u));
                }
                match s.parse::<f64>() {
                    Ok(f) if f >= 0.0 && f.fract() == 0.0 => Ok(Some(f as u64)),
                    _ => Err(invalid()),
                }
            }
            _ => Err(invalid()),
        }
    }

    /// Calendar year from a year, a date or a period string: `2023`, `"2023-Q1"`,
    /// `"2023-04-17"`, `"4/17/2023"`. A value that carries no recognisable year
    /// is logged and treated as absent.
    pub fn year(&self, aliases: &[&str]) -> Option<i32> {
        let (field, _) = self.get_any(aliases)?;
        let text = self.text(&[field])?;
        let year = parse_year(&text);
        if year.is_none() {
            warn!(field, value = text.as_str(), "Unrecognised year, treating as absent");
        }
        year
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

fn parse_year(text: &str) -> Option<i32> {
    let text = text.trim();
    let date = text.split(|c: char| c == 'T' || c.is_whitespace()).next().unwrap_or(text);
    let from_date = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date, fmt).ok())
        .map(|d| d.year());

    from_date
        .or_else(|| four_digit_run(text, false))
        .or_else(|| four_digit_run(text.trim_end_matches(|c: char| !c.is_ascii_digit()), true))
        .filter(|y| (1800..=9999).contains(y))
}

/// Exactly four digits at the start (or end) of `text`, as a number.
fn four_digit_run(text: &str, from_end: bool) -> Option<i32> {
    let run = if from_end {
        let start = text.trim_end_matches(|c: char| c.is_ascii_digit()).len();
        &text[start..]
    } else {
        let end = text.len() - text.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        &text[..end]
    };
    if run.len() == 4 {
        run.parse().ok()
    } else {
        None
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Some(u.to_string())
            } else {
                n.as_f64().map(|f| {
                    if f.fract() == 0.0 && f.abs() < 1e15 {
                        format!("{}", f as i64)
                    } else {
                        f.to_string()
                    }
                })
            }
        }
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawRecord {
        RawRecord::from_value(value).unwrap()
    }

    #[test]
    fn rejects_non_mappings() {
        assert_eq!(
            RawRecord::from_value(json!([1, 2])),
            Err(RawFieldError::NotAMapping("array"))
        );
        assert!(RawRecord::from_value(json!("text")).is_err());
    }

    #[test]
    fn text_takes_first_usable_alias() {
        let r = raw(json!({"event_type": null, "EventType": 42}));
        assert_eq!(r.text(&["event_type", "EventType"]), Some("42".into()));
    }

    #[test]
    fn text_renders_integral_floats_as_integers() {
        let r = raw(json!({"code": 421.0}));
        assert_eq!(r.text(&["code"]), Some("421".into()));
    }

    #[test]
    fn blank_text_counts_as_absent() {
        let r = raw(json!({"naics": "  "}));
        assert_eq!(r.text(&["naics"]), None);
    }

    #[test]
    fn count_parses_numbers_and_strings() {
        let r = raw(json!({"a": 12, "b": "45", "c": 3.0, "d": "", "e": "many"}));
        assert_eq!(r.count(&["a"]), Ok(Some(12)));
        assert_eq!(r.count(&["b"]), Ok(Some(45)));
        assert_eq!(r.count(&["c"]), Ok(Some(3)));
        assert_eq!(r.count(&["d"]), Ok(None));
        assert_eq!(r.count(&["missing"]), Ok(None));
        assert!(r.count(&["e"]).is_err());
    }

    #[test]
    fn negative_count_is_invalid() {
        let r = raw(json!({"n": -4}));
        assert!(r.count(&["n"]).is_err());
    }

    #[test]
    fn year_accepts_period_strings() {
        let r = raw(json!({"TIME_PERIOD": "2021-Q3", "year": 2019}));
        assert_eq!(r.year(&["TIME_PERIOD"]), Some(2021));
        assert_eq!(r.year(&["year"]), Some(2019));
    }

    #[test]
    fn year_reads_common_date_layouts() {
        let r = raw(json!({
            "us": "1/1/2015",
            "iso": "2016-03-09",
            "stamp": "2017-06-30T08:15:00",
            "with_time": "12/31/2018 0:00",
            "trailing": "FY 2019",
        }));
        assert_eq!(r.year(&["us"]), Some(2015));
        assert_eq!(r.year(&["iso"]), Some(2016));
        assert_eq!(r.year(&["stamp"]), Some(2017));
        assert_eq!(r.year(&["with_time"]), Some(2018));
        assert_eq!(r.year(&["trailing"]), Some(2019));
    }

    #[test]
    fn unrecognised_year_is_absent() {
        let r = raw(json!({"bad": "20x1", "short": "15"}));
        assert_eq!(r.year(&["bad"]), None);
        assert_eq!(r.year(&["short"]), None);
        assert_eq!(r.year(&["missing"]), None);
    }

    #[test]
    fn get_any_reports_the_matching_alias() {
        let r = raw(json!({"EventDate": "1/1/2015"}));
        let (field, _) = r.get_any(&["year", "EventDate"]).unwrap();
        assert_eq!(field, "EventDate");
    }
}
