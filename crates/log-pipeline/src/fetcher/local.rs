//! 로컬 파일시스템 fetcher
//!
//! - S3 소스: `root/bucket/key` 파일을 엽니다 (버킷/키의 경로 탈출 거부).
//!   루트 없이 만든 fetcher([`LocalFsFetcher::files_only`])는 S3 소스를
//!   `FetchError::Unsupported`로 거부합니다.
//! - File 소스: 경로를 그대로 엽니다.
//!
//! 오프라인 재처리나 S3 버킷을 로컬로 동기화해 둔 경우에 사용합니다.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use logfeed_core::error::FetchError;
use logfeed_core::pipeline::{FetchedObject, ObjectFetcher};
use logfeed_core::source::LogSource;

use super::fetch_error_from_io;

/// 로컬 디렉토리를 객체 스토리지처럼 다루는 [`ObjectFetcher`]
#[derive(Debug, Clone)]
pub struct LocalFsFetcher {
    root: Option<PathBuf>,
}

impl LocalFsFetcher {
    /// `root`를 버킷 디렉토리들의 상위 디렉토리로 사용합니다.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    /// File 소스만 처리하는 fetcher
    pub fn files_only() -> Self {
        Self { root: None }
    }

    /// S3 소스의 루트 디렉토리
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// 소스가 가리키는 로컬 경로를 계산합니다.
    pub fn resolve(&self, source: &LogSource) -> Result<PathBuf, FetchError> {
        match source {
            LogSource::S3(loc) => {
                let Some(root) = &self.root else {
                    return Err(FetchError::Unsupported(format!(
                        "{} (no storage root for {source})",
                        source.backend()
                    )));
                };
                let bucket = Path::new(&loc.bucket);
                let key = Path::new(&loc.key);
                if loc.key.is_empty() || !is_contained(bucket) || !is_contained(key) {
                    return Err(FetchError::AccessDenied(format!(
                        "object path escapes root: {source}"
                    )));
                }
                Ok(root.join(bucket).join(key))
            }
            LogSource::File(loc) => Ok(loc.path.clone()),
        }
    }
}

/// 상대 경로이며 `..` 컴포넌트가 없는지 확인합니다.
fn is_contained(path: &Path) -> bool {
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

#[async_trait]
impl ObjectFetcher for LocalFsFetcher {
    async fn fetch(&self, source: &LogSource) -> Result<FetchedObject, FetchError> {
        let path = self.resolve(source)?;
        let what = path.display().to_string();

        let file = tokio::fs::File::open(&path)
            .await
            .map_err(|e| fetch_error_from_io(&e, &what))?;
        let metadata = file
            .metadata()
            .await
            .map_err(|e| fetch_error_from_io(&e, &what))?;
        if metadata.is_dir() {
            return Err(FetchError::NotFound(format!("{what} is a directory")));
        }

        debug!(path = %what, size = metadata.len(), "opened local object");
        Ok(FetchedObject::new(file))
    }
}
