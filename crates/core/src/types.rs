//! 도메인 타입 — 로더와 파서, 파이프라인이 주고받는 데이터
//!
//! - [`RawFrame`]: 로더가 만드는 원시 메시지 단위 (라인 또는 객체 전체)
//! - [`LogRecord`]: 파서가 만드는 구조화된 로그 레코드
//! - [`ResultItem`]: 파이프라인 출력 단위 (레코드 또는 에러)

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LogfeedError;
use crate::source::LogSource;

/// 파이프라인/리더 출력 단위
///
/// 레코드 하나 또는 종료 에러 하나. 에러는 항상 스트림의 마지막 항목입니다.
pub type ResultItem = Result<LogRecord, LogfeedError>;

/// 원시 메시지 프레임
///
/// 로더가 생성하고 정확히 한 번의 파서 호출이 소비합니다.
/// `seq`는 객체 단위로 0부터 1씩 증가합니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    /// 객체 내 순번 (0부터)
    pub seq: u64,
    /// 원시 바이트
    pub data: Bytes,
    /// 원본 객체 위치
    pub source: Arc<LogSource>,
}

impl RawFrame {
    /// 새 프레임을 생성합니다.
    pub fn new(seq: u64, data: impl Into<Bytes>, source: Arc<LogSource>) -> Self {
        Self {
            seq,
            data: data.into(),
            source,
        }
    }
}

/// 구조화된 로그 레코드
///
/// 파서가 생성한 뒤에는 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    /// 레코드 유형 (로그 스키마 식별자, 파서가 지정)
    pub tag: String,
    /// 로그 시각 (항상 UTC)
    pub timestamp: DateTime<Utc>,
    /// 디코딩된 값
    pub value: serde_json::Value,
    /// 이 레코드를 만든 원시 바이트
    pub raw: Bytes,
    /// 원본 프레임 순번
    pub seq: u64,
    /// 원본 객체 위치
    pub source: Arc<LogSource>,
}

impl LogRecord {
    /// 프레임에서 레코드를 생성합니다. `raw`, `seq`, `source`는 프레임에서 가져옵니다.
    pub fn from_frame(
        frame: &RawFrame,
        tag: impl Into<String>,
        timestamp: DateTime<Utc>,
        value: serde_json::Value,
    ) -> Self {
        Self {
            tag: tag.into(),
            timestamp,
            value,
            raw: frame.data.clone(),
            seq: frame.seq,
            source: Arc::clone(&frame.source),
        }
    }

    /// 원시 바이트를 교체합니다 (배치 엔벨로프의 개별 이벤트 등).
    pub fn with_raw(mut self, raw: impl Into<Bytes>) -> Self {
        self.raw = raw.into();
        self
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {}#{}",
            self.tag,
            self.timestamp.to_rfc3339(),
            self.source,
            self.seq,
        )
    }
}

/// 프레이밍 정책
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Framing {
    /// 개행 문자 단위 (구분자 제외)
    #[default]
    Lines,
    /// 객체 전체를 하나의 프레임으로
    WholeObject,
}

impl fmt::Display for Framing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lines => write!(f, "lines"),
            Self::WholeObject => write!(f, "whole_object"),
        }
    }
}

/// 압축 처리 정책
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compression {
    /// content-type 힌트 우선, 없으면 `.gz` 확장자로 판단
    #[default]
    Auto,
    /// 항상 gzip 해제
    Gzip,
    /// 압축 해제하지 않음
    None,
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Gzip => write!(f, "gzip"),
            Self::None => write!(f, "none"),
        }
    }
}
