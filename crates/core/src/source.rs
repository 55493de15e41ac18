//! 로그 소스 — 로그 객체의 위치와 규칙 매칭
//!
//! [`LogSource`]는 스토리지 백엔드별 로그 객체 위치를 나타냅니다.
//! 같은 타입이 라우팅 규칙(패턴)으로도 쓰이며, [`LogSource::contains`]가
//! "이 규칙이 저 객체에 적용되는가"를 판정합니다.
//!
//! # 매칭 규칙
//! - 백엔드(variant)가 다르면 항상 불일치 (에러가 아님)
//! - `region`, `bucket` 등 식별 필드는 정확히 일치해야 함
//! - 경로(`key`, `path`)는 바이트 단위 접두어 비교
//!
//! ```
//! use logfeed_core::source::LogSource;
//!
//! let rule = LogSource::s3("ap-northeast-1", "my-logs", "AWSLogs/");
//! let object = LogSource::s3("ap-northeast-1", "my-logs", "AWSLogs/vpc/2024/01/15/a.log.gz");
//! assert!(rule.contains(&object));
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 로그 객체 위치
///
/// 스토리지 백엔드마다 하나의 variant를 가집니다.
/// 라우팅 규칙으로 사용될 때 `key`/`path`는 접두어로 해석됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum LogSource {
    /// S3 호환 객체 스토리지
    S3(S3Location),
    /// 로컬 파일
    File(FileLocation),
}

/// S3 객체 위치
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct S3Location {
    /// 리전 (예: "ap-northeast-1")
    pub region: String,
    /// 버킷 이름
    pub bucket: String,
    /// 객체 키 (규칙에서는 키 접두어)
    #[serde(default, alias = "prefix")]
    pub key: String,
}

/// 로컬 파일 위치
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileLocation {
    /// 파일 경로 (규칙에서는 경로 접두어)
    #[serde(alias = "prefix")]
    pub path: PathBuf,
}

impl LogSource {
    /// S3 위치를 생성합니다.
    pub fn s3(region: impl Into<String>, bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self::S3(S3Location {
            region: region.into(),
            bucket: bucket.into(),
            key: key.into(),
        })
    }

    /// 로컬 파일 위치를 생성합니다.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(FileLocation { path: path.into() })
    }

    /// 이 소스를 규칙으로 보았을 때 `candidate`를 포함하는지 판정합니다.
    ///
    /// 순수 함수이며 실패하지 않습니다.
    pub fn contains(&self, candidate: &LogSource) -> bool {
        match (self, candidate) {
            (Self::S3(rule), Self::S3(object)) => {
                rule.region == object.region
                    && rule.bucket == object.bucket
                    && object.key.as_bytes().starts_with(rule.key.as_bytes())
            }
            (Self::File(rule), Self::File(object)) => object
                .path
                .as_os_str()
                .as_encoded_bytes()
                .starts_with(rule.path.as_os_str().as_encoded_bytes()),
            _ => false,
        }
    }

    /// 백엔드 이름 ("s3", "file")
    pub fn backend(&self) -> &'static str {
        match self {
            Self::S3(_) => "s3",
            Self::File(_) => "file",
        }
    }

    /// 객체 이름 부분 (S3 키 또는 파일 경로). 압축 확장자 판단에 사용합니다.
    pub fn object_name(&self) -> String {
        match self {
            Self::S3(loc) => loc.key.clone(),
            Self::File(loc) => loc.path.to_string_lossy().into_owned(),
        }
    }

    /// URI 문자열에서 소스를 파싱합니다.
    ///
    /// 지원 형식:
    /// - `s3://bucket/key` (리전은 인자로 지정)
    /// - `file:///var/log/app.log`
    /// - 스킴 없는 경로 (`/var/log/app.log`)
    pub fn parse_uri(uri: &str, region: &str) -> Result<Self, ConfigError> {
        if let Some(rest) = uri.strip_prefix("s3://") {
            let (bucket, key) = rest.split_once('/').unwrap_or((rest, ""));
            if bucket.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "source".to_owned(),
                    reason: format!("missing bucket in '{uri}'"),
                });
            }
            if region.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "region".to_owned(),
                    reason: format!("region is required for '{uri}'"),
                });
            }
            return Ok(Self::s3(region, bucket, key));
        }

        let path = uri.strip_prefix("file://").unwrap_or(uri);
        if path.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "source".to_owned(),
                reason: "empty source".to_owned(),
            });
        }
        if uri.contains("://") && !uri.starts_with("file://") {
            return Err(ConfigError::InvalidValue {
                field: "source".to_owned(),
                reason: format!("unsupported scheme in '{uri}' (expected s3:// or file://)"),
            });
        }
        Ok(Self::file(Path::new(path)))
    }
}

impl fmt::Display for LogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::S3(loc) => write!(f, "s3://{}/{}", loc.bucket, loc.key),
            Self::File(loc) => write!(f, "file://{}", loc.path.display()),
        }
    }
}
