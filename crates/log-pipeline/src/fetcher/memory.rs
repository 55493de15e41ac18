//! 메모리 객체 저장소
//!
//! 소스별로 바이트와 메타데이터를 보관하고, 조회 실패나 전송 중 실패를
//! 주입할 수 있습니다.
//!
//! ```
//! use std::sync::Arc;
//! use logfeed_core::LogSource;
//! use logfeed_pipeline::fetcher::InMemoryFetcher;
//!
//! let fetcher = InMemoryFetcher::new()
//!     .with_object(LogSource::s3("r", "b", "k.log"), "blue\norange\nred\n");
//! let fetcher = Arc::new(fetcher);
//! ```

use std::collections::HashMap;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::{AsyncRead, ReadBuf};

use logfeed_core::error::FetchError;
use logfeed_core::pipeline::{FetchedObject, ObjectFetcher};
use logfeed_core::source::LogSource;

/// 저장된 객체
#[derive(Debug, Clone, Default)]
pub struct StoredObject {
    /// 본문
    pub data: Bytes,
    /// Content-Type 힌트
    pub content_type: Option<String>,
    /// Content-Encoding 힌트
    pub content_encoding: Option<String>,
    /// 이 바이트 수만큼 전달한 뒤 읽기 실패
    pub fail_after: Option<usize>,
}

impl StoredObject {
    /// 본문만으로 생성합니다.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            ..Self::default()
        }
    }

    /// Content-Type을 지정합니다.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Content-Encoding을 지정합니다.
    pub fn with_content_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.content_encoding = Some(encoding.into());
        self
    }

    /// `offset` 바이트를 전달한 뒤 연결이 끊긴 것처럼 실패하게 합니다.
    pub fn failing_after(mut self, offset: usize) -> Self {
        self.fail_after = Some(offset);
        self
    }
}

#[derive(Debug, Clone)]
enum Entry {
    Object(StoredObject),
    Failure(FetchError),
}

/// 메모리 기반 [`ObjectFetcher`]
///
/// 구성 후 `Arc`로 공유하며, 공유 이후에는 읽기 전용입니다.
#[derive(Debug, Default)]
pub struct InMemoryFetcher {
    entries: HashMap<LogSource, Entry>,
    fetches: AtomicUsize,
    bodies: Arc<BodyStats>,
}

/// 반환한 본문 스트림들의 공유 카운터
#[derive(Debug, Default)]
struct BodyStats {
    open: AtomicUsize,
    bytes_read: AtomicUsize,
}

impl InMemoryFetcher {
    /// 빈 저장소를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 객체를 추가합니다.
    pub fn with_object(mut self, source: LogSource, data: impl Into<Bytes>) -> Self {
        self.insert(source, StoredObject::new(data));
        self
    }

    /// 메타데이터가 있는 객체를 추가합니다.
    pub fn with_stored(mut self, source: LogSource, object: StoredObject) -> Self {
        self.insert(source, object);
        self
    }

    /// 조회 시 `error`로 실패하는 소스를 추가합니다.
    pub fn with_failure(mut self, source: LogSource, error: FetchError) -> Self {
        self.entries.insert(source, Entry::Failure(error));
        self
    }

    /// 객체를 추가하거나 교체합니다.
    pub fn insert(&mut self, source: LogSource, object: StoredObject) {
        self.entries.insert(source, Entry::Object(object));
    }

    /// 지금까지의 조회 호출 수
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }

    /// 아직 drop되지 않은 본문 스트림 수
    ///
    /// 로더 태스크가 끝나면 본문도 함께 drop되므로 0으로 돌아옵니다.
    pub fn open_bodies(&self) -> usize {
        self.bodies.open.load(Ordering::Acquire)
    }

    /// 모든 본문 스트림에서 지금까지 읽힌 바이트 수
    pub fn bytes_read(&self) -> usize {
        self.bodies.bytes_read.load(Ordering::Acquire)
    }
}

#[async_trait]
impl ObjectFetcher for InMemoryFetcher {
    async fn fetch(&self, source: &LogSource) -> Result<FetchedObject, FetchError> {
        self.fetches.fetch_add(1, Ordering::Relaxed);

        let object = match self.entries.get(source) {
            Some(Entry::Object(object)) => object,
            Some(Entry::Failure(err)) => return Err(err.clone()),
            None => return Err(FetchError::NotFound(source.to_string())),
        };

        self.bodies.open.fetch_add(1, Ordering::AcqRel);
        let mut fetched = FetchedObject::new(MemoryBody {
            data: object.data.clone(),
            pos: 0,
            fail_after: object.fail_after,
            stats: Arc::clone(&self.bodies),
        });
        fetched.content_type = object.content_type.clone();
        fetched.content_encoding = object.content_encoding.clone();
        Ok(fetched)
    }
}

/// 저장된 바이트를 읽는 본문 스트림
struct MemoryBody {
    data: Bytes,
    pos: usize,
    fail_after: Option<usize>,
    stats: Arc<BodyStats>,
}

impl Drop for MemoryBody {
    fn drop(&mut self) {
        self.stats.open.fetch_sub(1, Ordering::AcqRel);
    }
}

impl AsyncRead for MemoryBody {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let end = self.fail_after.unwrap_or(usize::MAX).min(self.data.len());
        if self.pos >= end {
            if self.fail_after.is_some() {
                return Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::ConnectionReset,
                    "connection reset while reading body",
                )));
            }
            return Poll::Ready(Ok(()));
        }

        let n = (end - self.pos).min(buf.remaining());
        let start = self.pos;
        buf.put_slice(&self.data[start..start + n]);
        self.pos += n;
        self.stats.bytes_read.fetch_add(n, Ordering::AcqRel);
        Poll::Ready(Ok(()))
    }
}
