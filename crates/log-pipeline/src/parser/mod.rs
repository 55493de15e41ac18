//! 로그 파싱 모듈 -- 형식별 파서
//!
//! 각 파서는 core의 [`LogParser`](logfeed_core::pipeline::LogParser) trait을 구현하며,
//! 프레임 하나를 0개 이상의 [`LogRecord`](logfeed_core::types::LogRecord)로 변환합니다.
//!
//! # 지원 형식
//! - 원시 문자열 ([`RawParser`])
//! - 프레임당 JSON 객체 하나 ([`JsonParser`])
//! - AWS CloudTrail 엔벨로프 ([`CloudTrailParser`])
//! - 헤더가 있는 공백 구분 컬럼, AWS VPC Flow Logs 포함 ([`ColumnarParser`])
//!
//! # 사용 예시
//! ```
//! use std::sync::Arc;
//! use logfeed_core::config::TimestampSpec;
//! use logfeed_core::pipeline::ParserFactory;
//! use logfeed_pipeline::parser::JsonParser;
//!
//! let factory: Arc<dyn ParserFactory> = Arc::new(|| {
//!     JsonParser::new("app.log", TimestampSpec::Rfc3339 { field: "time".to_owned() })
//! });
//! let parser = factory.create();
//! assert_eq!(parser.format_name(), "json");
//! ```

pub mod cloudtrail;
pub mod columnar;
pub mod json;
pub mod raw;
pub mod timestamp;

pub use cloudtrail::CloudTrailParser;
pub use columnar::ColumnarParser;
pub use json::JsonParser;
pub use raw::RawParser;

/// JSON 값에서 dot notation 경로로 하위 값을 찾습니다 (예: "metadata.host").
pub fn lookup<'a>(value: &'a serde_json::Value, path: &str) -> Option<&'a serde_json::Value> {
    path.split('.').try_fold(value, |current, part| current.get(part))
}
