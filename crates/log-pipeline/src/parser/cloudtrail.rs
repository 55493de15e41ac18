//! AWS CloudTrail 파서
//!
//! CloudTrail이 S3에 직접 기록한 객체는 `{"Records":[...]}` 엔벨로프 하나입니다.
//! 객체 전체 로더와 함께 사용하며, 엔벨로프의 각 이벤트가 레코드 하나가 됩니다.
//!
//! - 태그: `aws.cloudtrail`
//! - 타임스탬프: `eventTime` (RFC 3339)
//! - raw: 이벤트를 다시 직렬화한 JSON

use chrono::{DateTime, Utc};
use serde::Deserialize;

use logfeed_core::error::ParseError;
use logfeed_core::pipeline::LogParser;
use logfeed_core::types::{LogRecord, RawFrame};

/// CloudTrail 레코드 태그
pub const TAG: &str = "aws.cloudtrail";

const FORMAT: &str = "cloudtrail";

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "Records")]
    records: Vec<serde_json::Value>,
}

/// CloudTrail 엔벨로프 파서
#[derive(Debug, Clone, Copy, Default)]
pub struct CloudTrailParser;

impl CloudTrailParser {
    /// 새 파서를 생성합니다.
    pub fn new() -> Self {
        Self
    }

    fn event_time(event: &serde_json::Value, index: usize) -> Result<DateTime<Utc>, ParseError> {
        let raw = event
            .get("eventTime")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ParseError::MissingField {
                format: FORMAT.to_owned(),
                field: format!("Records[{index}].eventTime"),
            })?;
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| ParseError::InvalidTimestamp {
                format: FORMAT.to_owned(),
                value: raw.to_owned(),
                reason: e.to_string(),
            })
    }
}

impl LogParser for CloudTrailParser {
    fn format_name(&self) -> &str {
        FORMAT
    }

    fn parse(&mut self, frame: &RawFrame) -> Result<Vec<LogRecord>, ParseError> {
        let envelope: Envelope =
            serde_json::from_slice(&frame.data).map_err(|e| ParseError::Malformed {
                format: FORMAT.to_owned(),
                reason: e.to_string(),
            })?;

        let mut records = Vec::with_capacity(envelope.records.len());
        for (index, event) in envelope.records.into_iter().enumerate() {
            if !event.is_object() {
                return Err(ParseError::Malformed {
                    format: FORMAT.to_owned(),
                    reason: format!("Records[{index}] is not an object"),
                });
            }
            let ts = Self::event_time(&event, index)?;
            let raw = serde_json::to_vec(&event).map_err(|e| ParseError::Malformed {
                format: FORMAT.to_owned(),
                reason: e.to_string(),
            })?;
            records.push(LogRecord::from_frame(frame, TAG, ts, event).with_raw(raw));
        }
        Ok(records)
    }
}
