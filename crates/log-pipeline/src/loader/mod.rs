//! 로더 — 소스를 원시 프레임 스트림으로 변환
//!
//! - [`ObjectLoader`]: 주입된 fetcher로 객체를 열고, 필요하면 gzip을 해제한 뒤
//!   프레이밍 정책에 따라 프레임을 스트리밍합니다.
//! - [`IgnoreLoader`]: 항상 `None`을 반환해 객체를 건너뜁니다.
//!
//! # 스트림 규약
//!
//! ```text
//! fetch -> (gunzip) -> BytesMut -> FrameDecoder -> mpsc (bounded) -> Pipeline
//! ```
//!
//! 프레임은 seq 0부터 오름차순으로 전달되고, 실패하면 에러 하나로 끝납니다.
//! 수신자가 drop되면 다음 전송에서 중단합니다.

pub mod compression;
pub mod framing;

use std::sync::Arc;

use bytes::BytesMut;
use metrics::counter;
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tokio_util::codec::Decoder;
use tracing::{debug, warn};

use logfeed_core::config::ReaderConfig;
use logfeed_core::error::{FetchError, LogfeedError};
use logfeed_core::metrics as m;
use logfeed_core::pipeline::{FrameReceiver, Loader, ObjectFetcher};
use logfeed_core::source::LogSource;
use logfeed_core::types::{Compression, Framing, RawFrame};

use crate::fetcher::fetch_error_from_io;

pub use compression::Inflater;
pub use framing::{FrameDecoder, FramingError};

/// 로더 버퍼/채널 설정
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderSettings {
    /// 프레이밍 버퍼 초기 크기 (바이트)
    pub initial_buffer_size: usize,
    /// 프레임 크기 상한 (바이트, 압축 해제 후)
    pub max_frame_size: usize,
    /// 본문 읽기 단위 (바이트)
    pub read_chunk_size: usize,
    /// 프레임 채널 용량
    pub frame_channel_capacity: usize,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self::from_reader_config(&ReaderConfig::default())
    }
}

impl LoaderSettings {
    /// 리더 설정에서 로더 설정을 만듭니다.
    pub fn from_reader_config(config: &ReaderConfig) -> Self {
        Self {
            initial_buffer_size: config.initial_buffer_size,
            max_frame_size: config.max_frame_size,
            read_chunk_size: config.read_chunk_size,
            frame_channel_capacity: config.frame_channel_capacity,
        }
    }

    /// 프레임 크기 상한을 지정합니다. 초기 버퍼는 상한을 넘지 않게 줄어듭니다.
    pub fn with_max_frame_size(mut self, max_frame_size: usize) -> Self {
        self.max_frame_size = max_frame_size;
        self.initial_buffer_size = self.initial_buffer_size.min(max_frame_size);
        self
    }
}

/// fetch + gunzip + 프레이밍 로더
#[derive(Clone)]
pub struct ObjectLoader {
    fetcher: Arc<dyn ObjectFetcher>,
    framing: Framing,
    compression: Compression,
    settings: LoaderSettings,
}

impl ObjectLoader {
    /// 새 로더를 생성합니다 (압축: `Auto`, 기본 설정).
    pub fn new(fetcher: Arc<dyn ObjectFetcher>, framing: Framing) -> Self {
        Self {
            fetcher,
            framing,
            compression: Compression::Auto,
            settings: LoaderSettings::default(),
        }
    }

    /// 라인 단위 로더
    pub fn lines(fetcher: Arc<dyn ObjectFetcher>) -> Self {
        Self::new(fetcher, Framing::Lines)
    }

    /// 객체 전체 로더
    pub fn whole_object(fetcher: Arc<dyn ObjectFetcher>) -> Self {
        Self::new(fetcher, Framing::WholeObject)
    }

    /// 압축 정책을 지정합니다.
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// 버퍼/채널 설정을 지정합니다.
    pub fn with_settings(mut self, settings: LoaderSettings) -> Self {
        self.settings = settings;
        self
    }
}

impl std::fmt::Debug for ObjectLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectLoader")
            .field("framing", &self.framing)
            .field("compression", &self.compression)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Loader for ObjectLoader {
    /// 로딩 태스크를 띄우고 프레임 수신자를 반환합니다.
    ///
    /// tokio 런타임 안에서 호출해야 합니다.
    fn load(&self, source: Arc<LogSource>) -> Option<FrameReceiver> {
        let (tx, rx) = mpsc::channel(self.settings.frame_channel_capacity.max(1));
        let job = LoadJob {
            fetcher: Arc::clone(&self.fetcher),
            framing: self.framing,
            compression: self.compression,
            settings: self.settings.clone(),
            location: source.to_string(),
            source,
        };
        tokio::spawn(job.run(tx));
        Some(rx)
    }
}

/// 객체를 건너뛰는 로더
#[derive(Debug, Clone, Copy, Default)]
pub struct IgnoreLoader;

impl Loader for IgnoreLoader {
    fn load(&self, source: Arc<LogSource>) -> Option<FrameReceiver> {
        debug!(location = %source, "ignoring object");
        None
    }
}

/// 로딩 중단 사유
enum Stop {
    /// 수신자가 drop됨
    Closed,
    /// 종료 에러
    Failed(LogfeedError),
}

impl From<LogfeedError> for Stop {
    fn from(err: LogfeedError) -> Self {
        Stop::Failed(err)
    }
}

/// 객체 하나의 로딩 작업
struct LoadJob {
    fetcher: Arc<dyn ObjectFetcher>,
    framing: Framing,
    compression: Compression,
    settings: LoaderSettings,
    source: Arc<LogSource>,
    location: String,
}

type FrameSender = mpsc::Sender<Result<RawFrame, LogfeedError>>;

impl LoadJob {
    async fn run(self, tx: FrameSender) {
        match self.stream(&tx).await {
            Ok(frames) => {
                debug!(location = %self.location, frames, framing = %self.framing, "object loaded");
            }
            Err(Stop::Closed) => {
                debug!(location = %self.location, "frame receiver dropped, stopping load");
            }
            Err(Stop::Failed(err)) => {
                warn!(location = %self.location, error = %err, "object load failed");
                // 수신자가 이미 없으면 보낼 곳이 없음
                let _ = tx.send(Err(err)).await;
            }
        }
    }

    async fn stream(&self, tx: &FrameSender) -> Result<u64, Stop> {
        let fetched = self
            .fetcher
            .fetch(&self.source)
            .await
            .map_err(|cause| self.fetch_error(cause))?;

        let gzip = compression::is_gzip(self.compression, &fetched, &self.source.object_name());
        debug!(
            location = %self.location,
            gzip,
            content_type = fetched.content_type.as_deref().unwrap_or(""),
            "fetched object"
        );

        let mut body = fetched.body;
        let mut inflater = gzip.then(Inflater::new);
        let mut decoder = FrameDecoder::new(self.framing, self.settings.max_frame_size);
        let mut buf = BytesMut::with_capacity(self.settings.initial_buffer_size);
        let mut chunk = BytesMut::with_capacity(self.settings.read_chunk_size);
        let mut seq: u64 = 0;

        loop {
            chunk.clear();
            chunk.reserve(self.settings.read_chunk_size);
            let read = body
                .read_buf(&mut chunk)
                .await
                .map_err(|e| self.fetch_error(fetch_error_from_io(&e, "object body")))?;
            let eof = read == 0;

            let added = match (inflater.as_mut(), eof) {
                (Some(inflater), false) => inflater
                    .inflate(&chunk, &mut buf)
                    .map_err(|e| self.decompress_error(&e))?,
                (Some(inflater), true) => inflater
                    .finish(&mut buf)
                    .map_err(|e| self.decompress_error(&e))?,
                (None, false) => {
                    buf.extend_from_slice(&chunk);
                    read
                }
                (None, true) => 0,
            };
            counter!(m::LOADED_BYTES).increment(added as u64);

            loop {
                let next = if eof {
                    decoder.decode_eof(&mut buf)
                } else {
                    decoder.decode(&mut buf)
                };
                let data = match next {
                    Ok(Some(data)) => data,
                    Ok(None) => break,
                    Err(FramingError::TooLarge { limit }) => {
                        return Err(LogfeedError::FrameTooLarge {
                            location: self.location.clone(),
                            seq,
                            limit,
                        }
                        .into());
                    }
                    Err(FramingError::Io(e)) => {
                        return Err(self.fetch_error(fetch_error_from_io(&e, "object body")).into());
                    }
                };

                let frame = RawFrame::new(seq, data, Arc::clone(&self.source));
                if tx.send(Ok(frame)).await.is_err() {
                    return Err(Stop::Closed);
                }
                counter!(m::FRAMES_LOADED_TOTAL).increment(1);
                seq += 1;
            }

            if eof {
                return Ok(seq);
            }
        }
    }

    fn fetch_error(&self, cause: FetchError) -> LogfeedError {
        LogfeedError::Fetch {
            location: self.location.clone(),
            cause,
        }
    }

    fn decompress_error(&self, err: &std::io::Error) -> LogfeedError {
        LogfeedError::Decompress {
            location: self.location.clone(),
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    use flate2::write::GzEncoder;

    use crate::fetcher::InMemoryFetcher;
    use crate::fetcher::memory::StoredObject;

    fn source(key: &str) -> LogSource {
        LogSource::s3("test-r", "test-b", key)
    }

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    async fn collect(mut rx: FrameReceiver) -> Vec<Result<RawFrame, LogfeedError>> {
        let mut items = Vec::new();
        while let Some(item) = rx.recv().await {
            items.push(item);
        }
        items
    }

    fn loader(fetcher: InMemoryFetcher, framing: Framing) -> ObjectLoader {
        ObjectLoader::new(Arc::new(fetcher), framing)
    }

    #[tokio::test]
    async fn lines_have_ascending_seq() {
        let fetcher = InMemoryFetcher::new().with_object(source("k"), "blue\norange\nred\n");
        let rx = loader(fetcher, Framing::Lines)
            .load(Arc::new(source("k")))
            .unwrap();

        let frames: Vec<RawFrame> = collect(rx)
            .await
            .into_iter()
            .map(|item| item.unwrap())
            .collect();
        assert_eq!(frames.len(), 3);
        for (i, frame) in frames.iter().enumerate() {
            assert_eq!(frame.seq, i as u64);
            assert_eq!(*frame.source, source("k"));
        }
        assert_eq!(&frames[1].data[..], b"orange");
    }

    #[tokio::test]
    async fn whole_object_single_frame() {
        let fetcher = InMemoryFetcher::new().with_object(source("k"), "blue\norange\nred\n");
        let rx = loader(fetcher, Framing::WholeObject)
            .load(Arc::new(source("k")))
            .unwrap();

        let items = collect(rx).await;
        assert_eq!(items.len(), 1);
        let frame = items.into_iter().next().unwrap().unwrap();
        assert_eq!(frame.seq, 0);
        assert_eq!(&frame.data[..], b"blue\norange\nred\n");
    }

    #[tokio::test]
    async fn small_read_chunks_do_not_change_frames() {
        let fetcher = InMemoryFetcher::new().with_object(source("k"), "alpha\nbeta\ngamma");
        let settings = LoaderSettings {
            initial_buffer_size: 2,
            read_chunk_size: 3,
            ..LoaderSettings::default()
        };
        let rx = loader(fetcher, Framing::Lines)
            .with_settings(settings)
            .load(Arc::new(source("k")))
            .unwrap();

        let data: Vec<Vec<u8>> = collect(rx)
            .await
            .into_iter()
            .map(|item| item.unwrap().data.to_vec())
            .collect();
        assert_eq!(data, vec![b"alpha".to_vec(), b"beta".to_vec(), b"gamma".to_vec()]);
    }

    #[tokio::test]
    async fn gzip_detected_by_suffix() {
        let fetcher = InMemoryFetcher::new()
            .with_object(source("k.log.gz"), gzip(b"blue\norange\nred\n"));
        let rx = loader(fetcher, Framing::Lines)
            .load(Arc::new(source("k.log.gz")))
            .unwrap();
        let items = collect(rx).await;
        assert_eq!(items.len(), 3);
        assert_eq!(&items[2].as_ref().unwrap().data[..], b"red");
    }

    #[tokio::test]
    async fn gzip_detected_by_content_type() {
        let fetcher = InMemoryFetcher::new().with_stored(
            source("k"),
            StoredObject::new(gzip(b"{}")).with_content_type("application/x-gzip"),
        );
        let rx = loader(fetcher, Framing::WholeObject)
            .load(Arc::new(source("k")))
            .unwrap();
        let items = collect(rx).await;
        assert_eq!(&items[0].as_ref().unwrap().data[..], b"{}");
    }

    #[tokio::test]
    async fn corrupt_gzip_is_decompress_error() {
        let fetcher = InMemoryFetcher::new().with_object(source("k.gz"), "plain text, not gzip");
        let rx = loader(fetcher, Framing::Lines)
            .load(Arc::new(source("k.gz")))
            .unwrap();
        let items = collect(rx).await;
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Err(LogfeedError::Decompress { .. })));
    }

    #[tokio::test]
    async fn oversized_line_stops_with_single_error() {
        let fetcher =
            InMemoryFetcher::new().with_object(source("k"), "short\nthis line is too long\nafter\n");
        let rx = loader(fetcher, Framing::Lines)
            .with_settings(LoaderSettings::default().with_max_frame_size(8))
            .load(Arc::new(source("k")))
            .unwrap();

        let items = collect(rx).await;
        assert_eq!(items.len(), 2);
        assert_eq!(&items[0].as_ref().unwrap().data[..], b"short");
        match &items[1] {
            Err(LogfeedError::FrameTooLarge { seq, limit, .. }) => {
                assert_eq!(*seq, 1);
                assert_eq!(*limit, 8);
            }
            other => panic!("expected FrameTooLarge, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn oversized_object_is_too_large() {
        let fetcher = InMemoryFetcher::new().with_object(source("k"), "0123456789");
        let rx = loader(fetcher, Framing::WholeObject)
            .with_settings(LoaderSettings::default().with_max_frame_size(4))
            .load(Arc::new(source("k")))
            .unwrap();
        let items = collect(rx).await;
        assert_eq!(items.len(), 1);
        assert!(matches!(
            items[0],
            Err(LogfeedError::FrameTooLarge { seq: 0, limit: 4, .. })
        ));
    }

    #[tokio::test]
    async fn fetch_failure_is_single_error() {
        let fetcher = InMemoryFetcher::new();
        let rx = loader(fetcher, Framing::Lines)
            .load(Arc::new(source("missing")))
            .unwrap();
        let items = collect(rx).await;
        assert_eq!(items.len(), 1);
        match &items[0] {
            Err(LogfeedError::Fetch { cause, .. }) => {
                assert!(matches!(cause, FetchError::NotFound(_)));
            }
            other => panic!("expected Fetch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn body_failure_after_frames_is_fetch_error() {
        let fetcher = InMemoryFetcher::new()
            .with_stored(source("k"), StoredObject::new("a\nb\nc\n").failing_after(4));
        let rx = loader(fetcher, Framing::Lines)
            .load(Arc::new(source("k")))
            .unwrap();
        let items = collect(rx).await;
        assert_eq!(items.len(), 3);
        assert_eq!(&items[0].as_ref().unwrap().data[..], b"a");
        assert_eq!(&items[1].as_ref().unwrap().data[..], b"b");
        assert!(matches!(
            &items[2],
            Err(LogfeedError::Fetch {
                cause: FetchError::Transient(_),
                ..
            })
        ));
    }

    #[tokio::test]
    async fn dropped_receiver_stops_loading() {
        let body: String = (0..10_000).map(|i| format!("line {i}\n")).collect();
        let total = body.len();
        let fetcher = Arc::new(InMemoryFetcher::new().with_object(source("k"), body));
        let settings = LoaderSettings {
            frame_channel_capacity: 1,
            read_chunk_size: 256,
            ..LoaderSettings::default()
        };
        let loader = ObjectLoader::lines(Arc::clone(&fetcher) as Arc<dyn ObjectFetcher>).with_settings(settings);

        let mut rx = loader.load(Arc::new(source("k"))).unwrap();
        let first = rx.recv().await.unwrap().unwrap();
        assert_eq!(first.seq, 0);
        assert_eq!(fetcher.open_bodies(), 1);
        drop(rx);

        // 로더 태스크가 끝나야 본문이 drop된다
        tokio::time::timeout(Duration::from_secs(5), async {
            while fetcher.open_bodies() > 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("loader task should stop after the receiver is dropped");
        assert!(fetcher.bytes_read() < total);
    }

    #[test]
    fn ignore_loader_skips() {
        assert!(IgnoreLoader.load(Arc::new(source("k"))).is_none());
    }

    #[test]
    fn settings_shrink_initial_buffer_to_ceiling() {
        let settings = LoaderSettings::default().with_max_frame_size(16);
        assert_eq!(settings.max_frame_size, 16);
        assert_eq!(settings.initial_buffer_size, 16);
    }
}
