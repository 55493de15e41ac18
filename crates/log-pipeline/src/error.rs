//! 로그 파이프라인 에러 타입
//!
//! [`LogPipelineError`]는 리더/라우트 구성 단계에서 발생하는 에러를 표현합니다.
//! 실행 중 실패는 스트림 항목([`LogfeedError`])으로 전달되므로 여기에 없습니다.
//! `From<LogPipelineError> for LogfeedError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use logfeed_core::error::{ConfigError, LogfeedError};

/// 로그 파이프라인 구성 에러
#[derive(Debug, thiserror::Error)]
pub enum LogPipelineError {
    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 라우트 구성 에러
    #[error("route error: '{route}': {reason}")]
    Route {
        /// 라우트 이름 또는 패턴
        route: String,
        /// 에러 사유
        reason: String,
    },
}

impl From<LogPipelineError> for LogfeedError {
    fn from(err: LogPipelineError) -> Self {
        match err {
            LogPipelineError::Config { field, reason } => {
                LogfeedError::Config(ConfigError::InvalidValue { field, reason })
            }
            LogPipelineError::Route { route, reason } => {
                LogfeedError::Config(ConfigError::InvalidValue {
                    field: format!("routes.{route}"),
                    reason,
                })
            }
        }
    }
}
