//! 타임스탬프 해석
//!
//! 모든 결과는 UTC로 정규화됩니다.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

use logfeed_core::config::TimestampSpec;
use logfeed_core::error::ParseError;

use super::lookup;

/// 유닉스 초를 UTC 시각으로 변환합니다.
pub fn from_unix_seconds(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(secs, 0)
}

/// 레코드 값에서 `spec`에 따라 타임스탬프를 추출합니다.
pub fn resolve(value: &Value, spec: &TimestampSpec, format: &str) -> Result<DateTime<Utc>, ParseError> {
    let field = spec.field();
    let raw = lookup(value, field).ok_or_else(|| ParseError::MissingField {
        format: format.to_owned(),
        field: field.to_owned(),
    })?;

    let invalid = |reason: &str| ParseError::InvalidTimestamp {
        format: format.to_owned(),
        value: raw.to_string(),
        reason: reason.to_owned(),
    };

    match spec {
        TimestampSpec::UnixSeconds { .. } => {
            if let Some(secs) = raw.as_i64() {
                return from_unix_seconds(secs).ok_or_else(|| invalid("out of range"));
            }
            let secs = raw.as_f64().ok_or_else(|| invalid("expected a number"))?;
            let whole = secs.floor();
            let nanos = ((secs - whole) * 1e9) as u32;
            DateTime::<Utc>::from_timestamp(whole as i64, nanos).ok_or_else(|| invalid("out of range"))
        }
        TimestampSpec::UnixMillis { .. } => {
            let millis = raw
                .as_i64()
                .or_else(|| raw.as_f64().map(|f| f as i64))
                .ok_or_else(|| invalid("expected a number"))?;
            DateTime::<Utc>::from_timestamp_millis(millis).ok_or_else(|| invalid("out of range"))
        }
        TimestampSpec::UnixSecondsString { .. } => {
            let text = raw.as_str().ok_or_else(|| invalid("expected a string"))?;
            let secs: i64 = text
                .trim()
                .parse()
                .map_err(|e: std::num::ParseIntError| invalid(&e.to_string()))?;
            from_unix_seconds(secs).ok_or_else(|| invalid("out of range"))
        }
        TimestampSpec::Rfc3339 { .. } => {
            let text = raw.as_str().ok_or_else(|| invalid("expected a string"))?;
            DateTime::parse_from_rfc3339(text)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| invalid(&e.to_string()))
        }
        TimestampSpec::Formatted { format: fmt, .. } => {
            let text = raw.as_str().ok_or_else(|| invalid("expected a string"))?;
            parse_formatted(text, fmt).map_err(|e| invalid(&e.to_string()))
        }
    }
}

/// strftime 형식으로 파싱합니다. 형식에 오프셋이 없으면 UTC로 간주합니다.
fn parse_formatted(text: &str, fmt: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    match DateTime::parse_from_str(text, fmt) {
        Ok(dt) => Ok(dt.with_timezone(&Utc)),
        Err(_) => NaiveDateTime::parse_from_str(text, fmt).map(|naive| naive.and_utc()),
    }
}
