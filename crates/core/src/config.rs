//! 설정 관리 — logfeed.toml 파싱 및 런타임 설정
//!
//! [`LogfeedConfig`]는 리더와 라우팅 규칙 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`LOGFEED_READER_CHANNEL_CAPACITY=256` 형식)
//! 3. 설정 파일 (`logfeed.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! 라우팅 규칙(`[[routes]]`)은 등록 순서가 곧 우선순위이며 환경변수로
//! 덮어쓸 수 없습니다.
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), logfeed_core::error::LogfeedError> {
//! use logfeed_core::config::LogfeedConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = LogfeedConfig::load("logfeed.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = LogfeedConfig::parse("[reader]\nchannel_capacity = 256")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, LogfeedError};
use crate::source::LogSource;
use crate::types::Compression;

/// 채널 용량 상한
pub const MAX_CHANNEL_CAPACITY: usize = 1_000_000;

/// 프레임 크기 상한 (1 GiB)
pub const MAX_FRAME_SIZE_LIMIT: usize = 1024 * 1024 * 1024;

/// logfeed 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogfeedConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 리더 기본값
    #[serde(default)]
    pub reader: ReaderConfig,
    /// 라우팅 규칙 (등록 순서대로 매칭)
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
}

impl LogfeedConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    ///
    /// 설정 로딩 순서:
    /// 1. TOML 파일 파싱
    /// 2. 환경변수 오버라이드 적용
    /// 3. 유효성 검증
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, LogfeedError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, LogfeedError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LogfeedError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                LogfeedError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, LogfeedError> {
        toml::from_str(toml_str).map_err(|e| {
            LogfeedError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `LOGFEED_{SECTION}_{FIELD}`
    /// 예: `LOGFEED_GENERAL_LOG_LEVEL=debug`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "LOGFEED_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "LOGFEED_GENERAL_LOG_FORMAT");

        // Reader
        override_usize(
            &mut self.reader.channel_capacity,
            "LOGFEED_READER_CHANNEL_CAPACITY",
        );
        override_usize(
            &mut self.reader.frame_channel_capacity,
            "LOGFEED_READER_FRAME_CHANNEL_CAPACITY",
        );
        override_usize(
            &mut self.reader.initial_buffer_size,
            "LOGFEED_READER_INITIAL_BUFFER_SIZE",
        );
        override_usize(
            &mut self.reader.max_frame_size,
            "LOGFEED_READER_MAX_FRAME_SIZE",
        );
        override_usize(
            &mut self.reader.read_chunk_size,
            "LOGFEED_READER_READ_CHUNK_SIZE",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), LogfeedError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        self.reader.validate()?;

        for (index, route) in self.routes.iter().enumerate() {
            route.validate(&format!("routes[{index}]"))?;
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// 리더/로더 기본값
///
/// 라우트별 설정이 없으면 이 값을 사용합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// 결과 채널 용량
    pub channel_capacity: usize,
    /// 로더 -> 파이프라인 프레임 채널 용량
    pub frame_channel_capacity: usize,
    /// 라인 버퍼 초기 크기 (바이트)
    pub initial_buffer_size: usize,
    /// 프레임 크기 상한 (바이트, 압축 해제 후)
    pub max_frame_size: usize,
    /// 본문 읽기 단위 (바이트)
    pub read_chunk_size: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 128,
            frame_channel_capacity: 32,
            initial_buffer_size: 64 * 1024,
            max_frame_size: 32 * 1024 * 1024,
            read_chunk_size: 8 * 1024,
        }
    }
}

impl ReaderConfig {
    fn validate(&self) -> Result<(), LogfeedError> {
        check_capacity("reader.channel_capacity", self.channel_capacity)?;
        check_capacity("reader.frame_channel_capacity", self.frame_channel_capacity)?;
        check_frame_size("reader.max_frame_size", self.max_frame_size)?;

        if self.initial_buffer_size == 0 || self.initial_buffer_size > self.max_frame_size {
            return Err(invalid(
                "reader.initial_buffer_size",
                format!(
                    "must be between 1 and max_frame_size ({})",
                    self.max_frame_size
                ),
            ));
        }

        if self.read_chunk_size == 0 || self.read_chunk_size > MAX_FRAME_SIZE_LIMIT {
            return Err(invalid(
                "reader.read_chunk_size",
                format!("must be between 1 and {MAX_FRAME_SIZE_LIMIT}"),
            ));
        }

        Ok(())
    }
}

/// 라우팅 규칙 하나
///
/// ```toml
/// [[routes]]
/// name = "vpc"
/// pattern = { backend = "s3", region = "ap-northeast-1", bucket = "logs", prefix = "AWSLogs/" }
/// loader = { mode = "lines" }
/// parser = { format = "vpc_flow_logs" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteConfig {
    /// 라우트 이름 (로그/CLI 표시용)
    #[serde(default)]
    pub name: Option<String>,
    /// 매칭 패턴
    pub pattern: LogSource,
    /// 로더 설정
    #[serde(default)]
    pub loader: LoaderConfig,
    /// 파서 설정
    pub parser: ParserConfig,
    /// 결과 채널 용량 (없으면 `reader.channel_capacity`)
    #[serde(default)]
    pub channel_capacity: Option<usize>,
}

impl RouteConfig {
    /// 표시용 이름. 이름이 없으면 패턴을 사용합니다.
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.pattern.to_string())
    }

    fn validate(&self, field: &str) -> Result<(), LogfeedError> {
        match &self.pattern {
            LogSource::S3(loc) => {
                if loc.region.is_empty() {
                    return Err(invalid(
                        &format!("{field}.pattern.region"),
                        "must not be empty",
                    ));
                }
                if loc.bucket.is_empty() {
                    return Err(invalid(
                        &format!("{field}.pattern.bucket"),
                        "must not be empty",
                    ));
                }
            }
            LogSource::File(loc) => {
                if loc.path.as_os_str().is_empty() {
                    return Err(invalid(
                        &format!("{field}.pattern.path"),
                        "must not be empty",
                    ));
                }
            }
        }

        if let Some(capacity) = self.channel_capacity {
            check_capacity(&format!("{field}.channel_capacity"), capacity)?;
        }
        if let Some(size) = self.loader.max_frame_size {
            check_frame_size(&format!("{field}.loader.max_frame_size"), size)?;
        }

        self.parser.validate(&format!("{field}.parser"))
    }
}

/// 로더 동작 방식
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoaderMode {
    /// 라인 단위 프레임
    #[default]
    Lines,
    /// 객체 전체를 하나의 프레임으로
    WholeObject,
    /// 객체를 건너뜀 (결과 없음)
    Ignore,
}

/// 로더 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// 프레이밍 방식
    pub mode: LoaderMode,
    /// 압축 처리
    pub compression: Compression,
    /// 프레임 크기 상한 (없으면 `reader.max_frame_size`)
    pub max_frame_size: Option<usize>,
}

/// 파서 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum ParserConfig {
    /// 프레임을 문자열 그대로 전달
    Raw {
        #[serde(default = "default_raw_tag")]
        tag: String,
    },
    /// 프레임당 JSON 객체 하나
    Json {
        tag: String,
        timestamp: TimestampSpec,
        /// 입력 크기 상한 (없으면 파서 기본값)
        #[serde(default)]
        max_input_size: Option<usize>,
    },
    /// CloudTrail `{"Records":[...]}` 엔벨로프
    Cloudtrail,
    /// 헤더가 있는 공백 구분 컬럼 형식
    Columnar {
        tag: String,
        /// 허용 컬럼 목록 (비어 있으면 모두 허용)
        #[serde(default)]
        known_columns: Vec<String>,
        /// 헤더가 없을 때 사용할 컬럼 순서
        #[serde(default)]
        default_columns: Vec<String>,
        /// 유닉스 초 타임스탬프 컬럼
        #[serde(default)]
        timestamp_column: Option<String>,
    },
    /// AWS VPC Flow Logs
    VpcFlowLogs,
}

fn default_raw_tag() -> String {
    "raw".to_owned()
}

impl ParserConfig {
    /// 설정 형식 이름
    pub fn format_name(&self) -> &'static str {
        match self {
            Self::Raw { .. } => "raw",
            Self::Json { .. } => "json",
            Self::Cloudtrail => "cloudtrail",
            Self::Columnar { .. } => "columnar",
            Self::VpcFlowLogs => "vpc_flow_logs",
        }
    }

    fn validate(&self, field: &str) -> Result<(), LogfeedError> {
        match self {
            Self::Raw { tag } => check_tag(field, tag),
            Self::Json {
                tag,
                timestamp,
                max_input_size,
            } => {
                check_tag(field, tag)?;
                if *max_input_size == Some(0) {
                    return Err(invalid(
                        &format!("{field}.max_input_size"),
                        "must be greater than 0",
                    ));
                }
                timestamp.validate(&format!("{field}.timestamp"))
            }
            Self::Columnar {
                tag,
                known_columns,
                default_columns,
                timestamp_column,
            } => {
                check_tag(field, tag)?;
                if !known_columns.is_empty() {
                    if let Some(unknown) = default_columns
                        .iter()
                        .find(|c| !known_columns.contains(c))
                    {
                        return Err(invalid(
                            &format!("{field}.default_columns"),
                            format!("'{unknown}' is not in known_columns"),
                        ));
                    }
                }
                if timestamp_column.as_deref() == Some("") {
                    return Err(invalid(
                        &format!("{field}.timestamp_column"),
                        "must not be empty",
                    ));
                }
                Ok(())
            }
            Self::Cloudtrail | Self::VpcFlowLogs => Ok(()),
        }
    }
}

/// JSON 레코드의 타임스탬프 해석 방식
///
/// `field`는 dot notation을 지원합니다 (예: "meta.time").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimestampSpec {
    /// 유닉스 초 (숫자)
    UnixSeconds { field: String },
    /// 유닉스 밀리초 (숫자)
    UnixMillis { field: String },
    /// 유닉스 초 (문자열)
    UnixSecondsString { field: String },
    /// RFC 3339 문자열
    Rfc3339 { field: String },
    /// chrono strftime 형식 문자열 (오프셋이 없으면 UTC)
    Formatted { field: String, format: String },
}

impl TimestampSpec {
    /// 타임스탬프 필드 경로
    pub fn field(&self) -> &str {
        match self {
            Self::UnixSeconds { field }
            | Self::UnixMillis { field }
            | Self::UnixSecondsString { field }
            | Self::Rfc3339 { field }
            | Self::Formatted { field, .. } => field,
        }
    }

    fn validate(&self, field: &str) -> Result<(), LogfeedError> {
        if self.field().is_empty() {
            return Err(invalid(&format!("{field}.field"), "must not be empty"));
        }
        if let Self::Formatted { format, .. } = self {
            if format.is_empty() {
                return Err(invalid(&format!("{field}.format"), "must not be empty"));
            }
        }
        Ok(())
    }
}

// --- 검증 헬퍼 ---

fn invalid(field: &str, reason: impl Into<String>) -> LogfeedError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason: reason.into(),
    }
    .into()
}

fn check_capacity(field: &str, value: usize) -> Result<(), LogfeedError> {
    if value == 0 || value > MAX_CHANNEL_CAPACITY {
        return Err(invalid(
            field,
            format!("must be between 1 and {MAX_CHANNEL_CAPACITY}"),
        ));
    }
    Ok(())
}

fn check_frame_size(field: &str, value: usize) -> Result<(), LogfeedError> {
    if value == 0 || value > MAX_FRAME_SIZE_LIMIT {
        return Err(invalid(
            field,
            format!("must be between 1 and {MAX_FRAME_SIZE_LIMIT}"),
        ));
    }
    Ok(())
}

fn check_tag(field: &str, tag: &str) -> Result<(), LogfeedError> {
    if tag.trim().is_empty() {
        return Err(invalid(&format!("{field}.tag"), "must not be empty"));
    }
    Ok(())
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}
