//! 원시 문자열 파서
//!
//! 프레임 하나를 그대로 레코드 하나로 전달합니다. 값은 (손실 허용) UTF-8 문자열이며,
//! 타임스탬프는 결정적이도록 유닉스 기준 시각을 사용합니다.

use chrono::{DateTime, Utc};

use logfeed_core::error::ParseError;
use logfeed_core::pipeline::LogParser;
use logfeed_core::types::{LogRecord, RawFrame};

/// 통과(pass-through) 파서
#[derive(Debug, Clone)]
pub struct RawParser {
    tag: String,
}

impl RawParser {
    /// 레코드 태그를 지정해 생성합니다.
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }
}

impl Default for RawParser {
    fn default() -> Self {
        Self::new("raw")
    }
}

impl LogParser for RawParser {
    fn format_name(&self) -> &str {
        "raw"
    }

    fn parse(&mut self, frame: &RawFrame) -> Result<Vec<LogRecord>, ParseError> {
        let text = String::from_utf8_lossy(&frame.data).into_owned();
        Ok(vec![LogRecord::from_frame(
            frame,
            self.tag.clone(),
            DateTime::<Utc>::UNIX_EPOCH,
            serde_json::Value::String(text),
        )])
    }
}
