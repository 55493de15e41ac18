//! 파이프라인 -- 로더 하나와 파서 하나를 묶어 객체 하나를 결과 스트림으로 변환합니다.
//!
//! # 실행 흐름
//! ```text
//! Loader -> FrameReceiver -> LogParser (실행마다 새 인스턴스) -> mpsc<ResultItem> -> consumer
//! ```
//!
//! # 상태 전이
//! ```text
//! Idle -> Loading -> Parsing* -> Done | Failed
//!            |                -> Cancelled (수신자 drop)
//!            +-> Skipped (로더가 None 반환)
//! ```
//!
//! 에러는 스트림의 마지막 항목으로 정확히 한 번 전달되고, 어느 경로로 끝나든
//! 송신자는 drop되어 스트림이 닫힙니다.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use logfeed_core::error::{LogfeedError, ParseFailure};
use logfeed_core::metrics as m;
use logfeed_core::pipeline::{FrameReceiver, LogParser, Loader, ParserFactory};
use logfeed_core::source::LogSource;
use logfeed_core::types::{RawFrame, ResultItem};

/// 파이프라인 실행 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// 시작 전
    Idle,
    /// 로더 준비 중
    Loading,
    /// 프레임 파싱 중
    Parsing,
    /// 모든 프레임을 처리함
    Done,
    /// 종료 에러를 전달함
    Failed,
    /// 로더가 객체를 건너뜀 (항목 없음)
    Skipped,
    /// 소비자가 수신자를 drop함
    Cancelled,
}

impl RunState {
    /// 상태 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Parsing => "parsing",
            Self::Done => "done",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
            Self::Cancelled => "cancelled",
        }
    }

    /// 더 이상 전이가 없는 상태인지 여부
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Done | Self::Failed | Self::Skipped | Self::Cancelled
        )
    }

    fn result_label(&self) -> &'static str {
        match self {
            Self::Failed => m::RESULT_FAILED,
            Self::Skipped => m::RESULT_SKIPPED,
            Self::Cancelled => m::RESULT_CANCELLED,
            _ => m::RESULT_DONE,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 로더 + 파서 팩토리 조합
///
/// 복제 비용이 작고 (`Arc` 두 개), 여러 실행이 동시에 같은 파이프라인을 공유할 수 있습니다.
///
/// # 사용 예시
/// ```ignore
/// let pipeline = Pipeline::new(ObjectLoader::lines(fetcher), || RawParser::default());
/// let (tx, mut rx) = mpsc::channel(128);
/// tokio::spawn(async move { pipeline.run(Arc::new(source), tx).await });
/// while let Some(item) = rx.recv().await { /* ... */ }
/// ```
#[derive(Clone)]
pub struct Pipeline {
    loader: Arc<dyn Loader>,
    parser: Arc<dyn ParserFactory>,
}

impl Pipeline {
    /// 로더와 파서 팩토리로 파이프라인을 생성합니다.
    pub fn new(loader: impl Loader + 'static, parser: impl ParserFactory + 'static) -> Self {
        Self::from_shared(Arc::new(loader), Arc::new(parser))
    }

    /// 이미 공유 중인 로더/팩토리로 생성합니다.
    pub fn from_shared(loader: Arc<dyn Loader>, parser: Arc<dyn ParserFactory>) -> Self {
        Self { loader, parser }
    }

    /// 소스 하나를 끝까지 처리하고 최종 상태를 반환합니다.
    ///
    /// 레코드는 (프레임 seq, 프레임 내 순서)대로 `tx`에 전송됩니다.
    /// 반환 시점에 `tx`는 drop됩니다.
    pub async fn run(&self, source: Arc<LogSource>, tx: mpsc::Sender<ResultItem>) -> RunState {
        let started = Instant::now();
        let mut run = Run {
            location: source.to_string(),
            state: RunState::Idle,
            records: 0,
            tx,
        };

        run.transition(RunState::Loading);
        let state = match self.loader.load(Arc::clone(&source)) {
            None => {
                debug!(location = %run.location, "loader skipped object");
                RunState::Skipped
            }
            Some(frames) => {
                let parser = self.parser.create();
                run.drive(frames, parser).await
            }
        };
        run.transition(state);

        counter!(m::OBJECTS_READ_TOTAL, m::LABEL_RESULT => state.result_label()).increment(1);
        histogram!(m::OBJECT_READ_DURATION_SECONDS).record(started.elapsed().as_secs_f64());
        info!(
            location = %run.location,
            state = %state,
            records = run.records,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "object read finished"
        );
        state
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline").finish_non_exhaustive()
    }
}

/// 실행 하나의 상태
struct Run {
    location: String,
    state: RunState,
    records: u64,
    tx: mpsc::Sender<ResultItem>,
}

impl Run {
    fn transition(&mut self, next: RunState) {
        if self.state != next {
            debug!(location = %self.location, from = %self.state, to = %next, "run state");
            self.state = next;
        }
    }

    async fn drive(&mut self, mut frames: FrameReceiver, mut parser: Box<dyn LogParser>) -> RunState {
        loop {
            // 프레임을 기다리는 동안에도 소비자 이탈을 감지한다
            let item = tokio::select! {
                biased;
                _ = self.tx.closed() => return RunState::Cancelled,
                item = frames.recv() => item,
            };
            let frame = match item {
                Some(Ok(frame)) => frame,
                Some(Err(err)) => return self.fail(err).await,
                None => return RunState::Done,
            };

            self.transition(RunState::Parsing);
            match parser.parse(&frame) {
                Ok(records) => {
                    let format = parser.format_name().to_owned();
                    for record in records {
                        if self.tx.send(Ok(record)).await.is_err() {
                            debug!(location = %self.location, seq = frame.seq, "result receiver dropped");
                            return RunState::Cancelled;
                        }
                        self.records += 1;
                        counter!(m::RECORDS_EMITTED_TOTAL, m::LABEL_PARSER_FORMAT => format.clone())
                            .increment(1);
                    }
                }
                Err(cause) => {
                    let failure = parse_failure(&self.location, &frame, cause);
                    return self.fail(failure.into()).await;
                }
            }
        }
    }

    async fn fail(&mut self, err: LogfeedError) -> RunState {
        warn!(location = %self.location, kind = err.kind(), error = %err, "object read failed");
        counter!(m::ERRORS_TOTAL, m::LABEL_KIND => err.kind()).increment(1);
        if self.tx.send(Err(err)).await.is_err() {
            return RunState::Cancelled;
        }
        RunState::Failed
    }
}

fn parse_failure(
    location: &str,
    frame: &RawFrame,
    cause: logfeed_core::error::ParseError,
) -> ParseFailure {
    ParseFailure {
        location: location.to_owned(),
        seq: frame.seq,
        raw: frame.data.clone(),
        cause,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{DateTime, Utc};
    use logfeed_core::error::{FetchError, ParseError};
    use logfeed_core::types::LogRecord;

    use crate::fetcher::InMemoryFetcher;
    use crate::loader::{IgnoreLoader, ObjectLoader};
    use crate::parser::{ColumnarParser, JsonParser, RawParser};

    fn source(key: &str) -> LogSource {
        LogSource::s3("test-r", "test-b", key)
    }

    async fn run_to_end(pipeline: &Pipeline, key: &str) -> (RunState, Vec<ResultItem>) {
        let (tx, mut rx) = mpsc::channel(16);
        let state = pipeline.run(Arc::new(source(key)), tx).await;
        let mut items = Vec::new();
        while let Some(item) = rx.recv().await {
            items.push(item);
        }
        (state, items)
    }

    fn values(items: &[ResultItem]) -> Vec<serde_json::Value> {
        items
            .iter()
            .map(|item| item.as_ref().unwrap().value.clone())
            .collect()
    }

    /// 프레임 하나를 레코드 두 개로 복제하는 파서
    struct Doubling;

    impl LogParser for Doubling {
        fn format_name(&self) -> &str {
            "doubling"
        }

        fn parse(&mut self, frame: &RawFrame) -> Result<Vec<LogRecord>, ParseError> {
            let text = String::from_utf8_lossy(&frame.data).into_owned();
            Ok(["a", "b"]
                .iter()
                .map(|suffix| {
                    LogRecord::from_frame(
                        frame,
                        "dup",
                        DateTime::<Utc>::UNIX_EPOCH,
                        serde_json::json!(format!("{text}-{suffix}")),
                    )
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn lines_with_raw_parser() {
        let fetcher = InMemoryFetcher::new().with_object(source("k"), "blue\norange\nred\n");
        let pipeline = Pipeline::new(ObjectLoader::lines(Arc::new(fetcher)), RawParser::default);

        let (state, items) = run_to_end(&pipeline, "k").await;
        assert_eq!(state, RunState::Done);
        assert_eq!(
            values(&items),
            vec![
                serde_json::json!("blue"),
                serde_json::json!("orange"),
                serde_json::json!("red")
            ]
        );
    }

    #[tokio::test]
    async fn in_frame_order_is_preserved() {
        let fetcher = InMemoryFetcher::new().with_object(source("k"), "x\ny");
        let pipeline = Pipeline::new(ObjectLoader::lines(Arc::new(fetcher)), || Doubling);

        let (_, items) = run_to_end(&pipeline, "k").await;
        assert_eq!(
            values(&items),
            vec![
                serde_json::json!("x-a"),
                serde_json::json!("x-b"),
                serde_json::json!("y-a"),
                serde_json::json!("y-b")
            ]
        );
        let seqs: Vec<u64> = items.iter().map(|i| i.as_ref().unwrap().seq).collect();
        assert_eq!(seqs, vec![0, 0, 1, 1]);
    }

    #[tokio::test]
    async fn skipped_object_closes_without_items() {
        let pipeline = Pipeline::new(IgnoreLoader, RawParser::default);
        let (state, items) = run_to_end(&pipeline, "k").await;
        assert_eq!(state, RunState::Skipped);
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn parse_error_is_last_item() {
        let fetcher = InMemoryFetcher::new()
            .with_object(source("k"), "{\"t\":1}\nnot json\n{\"t\":2}\n");
        let pipeline = Pipeline::new(ObjectLoader::lines(Arc::new(fetcher)), || {
            JsonParser::new(
                "app",
                logfeed_core::config::TimestampSpec::UnixSeconds {
                    field: "t".to_owned(),
                },
            )
        });

        let (state, items) = run_to_end(&pipeline, "k").await;
        assert_eq!(state, RunState::Failed);
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        match &items[1] {
            Err(LogfeedError::Parse(failure)) => {
                assert_eq!(failure.seq, 1);
                assert_eq!(&failure.raw[..], b"not json");
                assert_eq!(failure.location, "s3://test-b/k");
                assert!(matches!(failure.cause, ParseError::Malformed { .. }));
            }
            other => panic!("expected parse failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn loader_error_is_forwarded_once() {
        let fetcher = InMemoryFetcher::new()
            .with_failure(source("k"), FetchError::AccessDenied("k".to_owned()));
        let pipeline = Pipeline::new(ObjectLoader::lines(Arc::new(fetcher)), RawParser::default);

        let (state, items) = run_to_end(&pipeline, "k").await;
        assert_eq!(state, RunState::Failed);
        assert_eq!(items.len(), 1);
        assert!(matches!(
            items[0],
            Err(LogfeedError::Fetch {
                cause: FetchError::AccessDenied(_),
                ..
            })
        ));
    }

    #[tokio::test]
    async fn fresh_parser_per_run() {
        let fetcher = InMemoryFetcher::new().with_object(source("k"), "a b\n1 2\n");
        let pipeline = Pipeline::new(ObjectLoader::lines(Arc::new(fetcher)), || {
            ColumnarParser::new("t")
        });

        let (_, first) = run_to_end(&pipeline, "k").await;
        let (_, second) = run_to_end(&pipeline, "k").await;
        assert_eq!(first.len(), 1);
        assert_eq!(values(&first), values(&second));
    }

    #[tokio::test]
    async fn dropped_receiver_cancels_run() {
        let body: String = (0..1000).map(|i| format!("line {i}\n")).collect();
        let fetcher = InMemoryFetcher::new().with_object(source("k"), body);
        let pipeline = Pipeline::new(ObjectLoader::lines(Arc::new(fetcher)), RawParser::default);

        let (tx, mut rx) = mpsc::channel(1);
        let handle = {
            let pipeline = pipeline.clone();
            tokio::spawn(async move { pipeline.run(Arc::new(source("k")), tx).await })
        };
        assert!(rx.recv().await.unwrap().is_ok());
        drop(rx);

        assert_eq!(handle.await.unwrap(), RunState::Cancelled);
    }

    #[test]
    fn run_state_labels() {
        assert_eq!(RunState::Done.to_string(), "done");
        assert!(RunState::Cancelled.is_terminal());
        assert!(!RunState::Parsing.is_terminal());
        assert_eq!(RunState::Skipped.result_label(), m::RESULT_SKIPPED);
    }
}
