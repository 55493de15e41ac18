//! JSON 로그 파서
//!
//! 프레임당 JSON 객체 하나를 레코드 하나로 변환합니다. 값은 파싱한 객체 전체이며,
//! 타임스탬프는 [`TimestampSpec`]에 따라 지정된 필드에서 읽습니다.
//!
//! # 지원 형식
//! - 평탄(flat) JSON 객체
//! - 중첩(nested) JSON 객체 (dot notation으로 타임스탬프 필드 접근)
//!
//! 배열 최상위 형식(예: CloudTrail 엔벨로프)은 [`CloudTrailParser`](super::CloudTrailParser)를
//! 사용합니다.
//!
//! # 사용 예시
//! ```
//! use std::sync::Arc;
//! use logfeed_core::config::TimestampSpec;
//! use logfeed_core::pipeline::LogParser;
//! use logfeed_core::source::LogSource;
//! use logfeed_core::types::RawFrame;
//! use logfeed_pipeline::parser::JsonParser;
//!
//! let mut parser = JsonParser::new("app.log", TimestampSpec::UnixSeconds { field: "ts".to_owned() });
//! let frame = RawFrame::new(0, &br#"{"ts":1705320000,"msg":"hi"}"#[..], Arc::new(LogSource::file("/tmp/a.log")));
//! let records = parser.parse(&frame).unwrap();
//! assert_eq!(records[0].timestamp.timestamp(), 1705320000);
//! ```

use logfeed_core::config::TimestampSpec;
use logfeed_core::error::ParseError;
use logfeed_core::pipeline::LogParser;
use logfeed_core::types::{LogRecord, RawFrame};

use super::timestamp;

const FORMAT: &str = "json";

/// 기본 최대 입력 크기 (1 MiB)
pub const DEFAULT_MAX_INPUT_SIZE: usize = 1024 * 1024;

/// JSON 로그 파서
#[derive(Debug, Clone)]
pub struct JsonParser {
    /// 레코드 태그
    tag: String,
    /// 타임스탬프 해석 방식
    timestamp: TimestampSpec,
    /// 최대 허용 입력 크기 (바이트)
    max_input_size: usize,
}

impl JsonParser {
    /// 새 파서를 생성합니다.
    pub fn new(tag: impl Into<String>, timestamp: TimestampSpec) -> Self {
        Self {
            tag: tag.into(),
            timestamp,
            max_input_size: DEFAULT_MAX_INPUT_SIZE,
        }
    }

    /// 최대 입력 크기를 설정합니다.
    pub fn with_max_input_size(mut self, size: usize) -> Self {
        self.max_input_size = size;
        self
    }

    /// JSON 바이트를 파싱해 최상위 객체를 반환합니다.
    fn decode(&self, raw: &[u8]) -> Result<serde_json::Value, ParseError> {
        if raw.len() > self.max_input_size {
            return Err(ParseError::TooLarge {
                format: FORMAT.to_owned(),
                size: raw.len(),
                max: self.max_input_size,
            });
        }

        let value: serde_json::Value =
            serde_json::from_slice(raw).map_err(|e| ParseError::Malformed {
                format: FORMAT.to_owned(),
                reason: e.to_string(),
            })?;

        // 최상위가 JSON 객체여야 합니다
        if !value.is_object() {
            return Err(ParseError::Malformed {
                format: FORMAT.to_owned(),
                reason: "expected JSON object at top level".to_owned(),
            });
        }

        Ok(value)
    }
}

impl LogParser for JsonParser {
    fn format_name(&self) -> &str {
        FORMAT
    }

    fn parse(&mut self, frame: &RawFrame) -> Result<Vec<LogRecord>, ParseError> {
        let value = self.decode(&frame.data)?;
        let ts = timestamp::resolve(&value, &self.timestamp, FORMAT)?;
        Ok(vec![LogRecord::from_frame(
            frame,
            self.tag.clone(),
            ts,
            value,
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use logfeed_core::source::LogSource;

    fn frame(data: &'static [u8]) -> RawFrame {
        RawFrame::new(0, data, Arc::new(LogSource::s3("r", "b", "k")))
    }

    fn parser() -> JsonParser {
        JsonParser::new(
            "app.log",
            TimestampSpec::Rfc3339 {
                field: "timestamp".to_owned(),
            },
        )
    }

    #[test]
    fn format_name_is_json() {
        assert_eq!(parser().format_name(), "json");
    }

    #[test]
    fn parse_basic_json() {
        let raw = br#"{"timestamp":"2024-01-15T12:00:00Z","host":"web-01","message":"GET /index.html"}"#;
        let records = parser().parse(&frame(raw)).unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.tag, "app.log");
        assert_eq!(record.value["host"], "web-01");
        assert_eq!(record.timestamp.timestamp(), 1705320000);
        assert_eq!(&record.raw[..], &raw[..]);
    }

    #[test]
    fn parse_nested_timestamp_field() {
        let mut parser = JsonParser::new(
            "t",
            TimestampSpec::UnixMillis {
                field: "meta.ts".to_owned(),
            },
        );
        let records = parser
            .parse(&frame(br#"{"meta":{"ts":1705320000000},"message":"test"}"#))
            .unwrap();
        assert_eq!(records[0].timestamp.timestamp(), 1705320000);
    }

    #[test]
    fn parse_non_object_fails() {
        let err = parser().parse(&frame(br#"["not","an","object"]"#)).unwrap_err();
        assert!(matches!(err, ParseError::Malformed { .. }));
    }

    #[test]
    fn parse_invalid_json_fails() {
        let err = parser().parse(&frame(b"not json at all")).unwrap_err();
        assert!(matches!(err, ParseError::Malformed { .. }));
    }

    #[test]
    fn parse_empty_frame_fails() {
        assert!(parser().parse(&frame(b"")).is_err());
    }

    #[test]
    fn missing_timestamp_field_fails() {
        let err = parser().parse(&frame(br#"{"message":"no time"}"#)).unwrap_err();
        assert!(matches!(err, ParseError::MissingField { .. }));
    }

    #[test]
    fn parse_too_large_input_fails() {
        let mut parser = parser().with_max_input_size(10);
        let err = parser
            .parse(&frame(br#"{"message":"this is way too long for the limit"}"#))
            .unwrap_err();
        assert!(matches!(err, ParseError::TooLarge { max: 10, .. }));
    }
}
