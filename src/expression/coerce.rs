//! Conversions between attribute strings and typed values.

use crate::expression::{EvaluationError, EvaluationResult, ResultType, TypedResult, Value};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use std::fmt::Write;

pub fn parse_whole_number(text: &str) -> EvaluationResult<i64> {
    text.trim()
        .parse::<i64>()
        .map_err(|_| EvaluationError::coercion(text, ResultType::WholeNumber))
}

pub fn parse_decimal(text: &str) -> EvaluationResult<f64> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| EvaluationError::coercion(text, ResultType::Decimal))
}

pub fn parse_boolean(text: &str) -> EvaluationResult<bool> {
    let trimmed = text.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if trimmed.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(EvaluationError::coercion(text, ResultType::Boolean))
    }
}

/// Reject format strings chrono cannot interpret
pub fn check_date_format(format: &str) -> EvaluationResult<()> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(EvaluationError::InvalidDateFormat {
            format: format.to_string(),
            reason: "unrecognized format specifier".to_string(),
        });
    }
    Ok(())
}

/// Parse a date. Without a format the input must be RFC 3339. Formats
/// without an offset are read as UTC, date-only formats as midnight UTC.
pub fn parse_date(text: &str, format: Option<&str>) -> EvaluationResult<DateTime<Utc>> {
    let trimmed = text.trim();
    let failed = || EvaluationError::coercion(text, ResultType::Date);

    let Some(format) = format else {
        return DateTime::parse_from_rfc3339(trimmed)
            .map(|d| d.with_timezone(&Utc))
            .map_err(|_| failed());
    };

    check_date_format(format)?;

    if let Ok(d) = DateTime::parse_from_str(trimmed, format) {
        return Ok(d.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    NaiveDate::parse_from_str(trimmed, format)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(failed)
}

pub fn date_from_millis(millis: i64) -> EvaluationResult<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| EvaluationError::coercion(millis.to_string(), ResultType::Date))
}

pub fn format_date(date: &DateTime<Utc>, format: Option<&str>) -> EvaluationResult<String> {
    let Some(format) = format else {
        return Ok(date.to_rfc3339_opts(SecondsFormat::Millis, true));
    };

    check_date_format(format)?;

    let mut out = String::new();
    write!(out, "{}", date.format(format)).map_err(|_| EvaluationError::InvalidDateFormat {
        format: format.to_string(),
        reason: "format cannot be applied to a date".to_string(),
    })?;
    Ok(out)
}

/// Decimals always carry a fractional part, so `2` renders as `2.0`
pub fn format_decimal(value: f64) -> String {
    let text = value.to_string();
    if value.is_finite() && !text.contains(['.', 'e']) {
        format!("{}.0", text)
    } else {
        text
    }
}

/// String form of any value, as concatenation and string conversion see it
pub fn render(value: &Value, date_format: Option<&str>) -> EvaluationResult<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Boolean(b) => Ok(b.to_string()),
        Value::WholeNumber(n) => Ok(n.to_string()),
        Value::Decimal(d) => Ok(format_decimal(*d)),
        Value::Date(d) => format_date(d, date_format),
    }
}

/// String form of a result, `None` when absent
pub fn render_result(
    result: &TypedResult,
    date_format: Option<&str>,
) -> EvaluationResult<Option<String>> {
    result
        .value()
        .map(|value| render(value, date_format))
        .transpose()
}
