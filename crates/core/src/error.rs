//! 에러 타입 — 도메인별 에러 정의
//!
//! 모든 실패는 [`LogfeedError`] 하나로 호출자에게 전달됩니다.
//! 파이프라인/리더 스트림에서는 종료 항목으로 정확히 한 번 나타납니다.

use bytes::Bytes;

/// logfeed 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum LogfeedError {
    /// 소스에 맞는 라우팅 규칙 없음
    #[error("no matching entry for source: {location}")]
    NoMatchingRule {
        /// 요청된 소스
        location: String,
    },

    /// 객체 조회 실패 (전송 중 읽기 실패 포함)
    #[error("fetch failed for {location}: {cause}")]
    Fetch {
        /// 객체 위치
        location: String,
        /// 원인
        #[source]
        cause: FetchError,
    },

    /// 압축 해제 실패
    #[error("decompress failed for {location}: {reason}")]
    Decompress {
        /// 객체 위치
        location: String,
        /// 실패 사유
        reason: String,
    },

    /// 프레임 크기 상한 초과
    #[error("frame {seq} of {location} exceeds {limit} bytes")]
    FrameTooLarge {
        /// 객체 위치
        location: String,
        /// 초과가 발생한 프레임 순번
        seq: u64,
        /// 설정된 상한 (바이트)
        limit: usize,
    },

    /// 파싱 실패
    #[error("parse failed: {0}")]
    Parse(#[from] ParseFailure),

    /// 설정 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl LogfeedError {
    /// 메트릭/로그 레이블용 에러 종류
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoMatchingRule { .. } => "no_matching_rule",
            Self::Fetch { .. } => "fetch",
            Self::Decompress { .. } => "decompress",
            Self::FrameTooLarge { .. } => "frame_too_large",
            Self::Parse(_) => "parse",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
        }
    }
}

/// 객체 스토리지 조회 에러
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// 객체 없음
    #[error("object not found: {0}")]
    NotFound(String),

    /// 접근 거부
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// 일시적 전송/네트워크 실패
    #[error("transient failure: {0}")]
    Transient(String),

    /// 이 fetcher가 처리하지 않는 소스 백엔드
    #[error("unsupported source backend: {0}")]
    Unsupported(String),
}

/// 파서 에러
///
/// 형식별 원인을 담습니다. 파이프라인은 이를 [`ParseFailure`]로 감싸
/// 원시 프레임과 함께 전달합니다.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// 형식이 맞지 않는 입력
    #[error("{format}: malformed input: {reason}")]
    Malformed { format: String, reason: String },

    /// 필수 필드 없음
    #[error("{format}: missing field '{field}'")]
    MissingField { format: String, field: String },

    /// 타임스탬프 해석 실패
    #[error("{format}: invalid timestamp '{value}': {reason}")]
    InvalidTimestamp {
        format: String,
        value: String,
        reason: String,
    },

    /// 헤더에 알 수 없는 컬럼
    #[error("{format}: unknown column '{column}'")]
    UnknownColumn { format: String, column: String },

    /// 행의 필드 수가 헤더와 다름
    #[error("{format}: invalid row length (expected {expected}, got {actual})")]
    FieldCount {
        format: String,
        expected: usize,
        actual: usize,
    },

    /// 헤더 없이 데이터 행이 도착
    #[error("{format}: data row before header")]
    MissingHeader { format: String },

    /// 입력 데이터 초과
    #[error("{format}: input too large: {size} bytes (max: {max})")]
    TooLarge {
        format: String,
        size: usize,
        max: usize,
    },
}

/// 파이프라인이 보고하는 파싱 실패
///
/// 형식별 원인과 함께 문제가 된 프레임의 원시 바이트를 보존합니다.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{location} frame {seq}: {cause}")]
pub struct ParseFailure {
    /// 객체 위치
    pub location: String,
    /// 프레임 순번
    pub seq: u64,
    /// 프레임 원시 바이트 (진단용)
    pub raw: Bytes,
    /// 형식별 원인
    #[source]
    pub cause: ParseError,
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_matching_rule_display() {
        let err = LogfeedError::NoMatchingRule {
            location: "s3://bucket/key".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "no matching entry for source: s3://bucket/key"
        );
        assert_eq!(err.kind(), "no_matching_rule");
    }

    #[test]
    fn parse_failure_keeps_raw_and_cause() {
        let failure = ParseFailure {
            location: "s3://b/k".to_owned(),
            seq: 3,
            raw: Bytes::from_static(b"{broken"),
            cause: ParseError::Malformed {
                format: "json".to_owned(),
                reason: "EOF while parsing".to_owned(),
            },
        };
        let msg = failure.to_string();
        assert!(msg.contains("frame 3"));
        assert!(msg.contains("json"));

        let err: LogfeedError = failure.into();
        assert_eq!(err.kind(), "parse");
        match err {
            LogfeedError::Parse(f) => assert_eq!(&f.raw[..], b"{broken"),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn fetch_error_is_source_of_logfeed_error() {
        use std::error::Error;

        let err = LogfeedError::Fetch {
            location: "s3://b/k".to_owned(),
            cause: FetchError::NotFound("b/k".to_owned()),
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("object not found"));
    }

    #[test]
    fn frame_too_large_display() {
        let err = LogfeedError::FrameTooLarge {
            location: "s3://b/k".to_owned(),
            seq: 12,
            limit: 1024,
        };
        let msg = err.to_string();
        assert!(msg.contains("12"));
        assert!(msg.contains("1024"));
    }

    #[test]
    fn field_count_display() {
        let err = ParseError::FieldCount {
            format: "vpc_flow_logs".to_owned(),
            expected: 14,
            actual: 13,
        };
        assert!(err.to_string().contains("invalid row length"));
    }
}
