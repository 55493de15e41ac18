//! 파이프라인 trait — 로더와 파서, 객체 조회의 확장 포인트 정의
//!
//! - [`Loader`]: 소스 하나를 원시 프레임 스트림으로 변환
//! - [`LogParser`]: 프레임 하나를 0개 이상의 레코드로 변환
//! - [`ParserFactory`]: 실행(객체)마다 새 파서를 생성
//! - [`ObjectFetcher`]: 스토리지에서 객체 본문을 가져오는 주입 가능한 기능

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncRead;
use tokio::sync::mpsc;

use crate::error::{FetchError, LogfeedError, ParseError};
use crate::source::LogSource;
use crate::types::{LogRecord, RawFrame};

/// 로더가 반환하는 프레임 스트림
///
/// 프레임은 seq 오름차순으로 전달되며, 에러가 있으면 마지막 항목으로 한 번만 옵니다.
pub type FrameReceiver = mpsc::Receiver<Result<RawFrame, LogfeedError>>;

/// 로그 파서 trait
///
/// 새로운 로그 형식을 지원하려면 이 trait을 구현합니다.
/// 한 객체의 프레임을 순서대로 한 번씩 받으므로 상태(헤더 등)를 가질 수 있습니다.
pub trait LogParser: Send {
    /// 지원하는 로그 형식 이름
    fn format_name(&self) -> &str;

    /// 프레임 하나를 레코드로 파싱
    ///
    /// 헤더처럼 레코드가 없는 프레임은 빈 `Vec`을 반환합니다 (에러 아님).
    /// 실패 시 이 프레임에 대한 레코드는 생성하지 않습니다.
    fn parse(&mut self, frame: &RawFrame) -> Result<Vec<LogRecord>, ParseError>;
}

/// 파서 생성기
///
/// 파이프라인은 실행마다 새 파서를 만들어 객체 간 상태가 섞이지 않게 합니다.
/// `Fn() -> P` 클로저는 자동으로 구현됩니다.
pub trait ParserFactory: Send + Sync {
    /// 새 파서 인스턴스를 생성합니다.
    fn create(&self) -> Box<dyn LogParser>;
}

impl<F, P> ParserFactory for F
where
    F: Fn() -> P + Send + Sync,
    P: LogParser + 'static,
{
    fn create(&self) -> Box<dyn LogParser> {
        Box::new(self())
    }
}

/// 로더 trait
///
/// `None`은 "이 객체를 건너뛴다"는 정상 신호입니다.
pub trait Loader: Send + Sync {
    /// 소스를 프레임 스트림으로 로드합니다.
    ///
    /// 수신자가 drop되면 로딩 작업은 다음 전송 시점에 중단되어야 합니다.
    fn load(&self, source: Arc<LogSource>) -> Option<FrameReceiver>;
}

/// 조회된 객체 본문과 메타데이터
pub struct FetchedObject {
    /// 본문 스트림
    pub body: Pin<Box<dyn AsyncRead + Send>>,
    /// Content-Type 힌트 (예: "application/x-gzip")
    pub content_type: Option<String>,
    /// Content-Encoding 힌트 (예: "gzip")
    pub content_encoding: Option<String>,
}

impl FetchedObject {
    /// 메타데이터 없이 본문만으로 생성합니다.
    pub fn new(body: impl AsyncRead + Send + 'static) -> Self {
        Self {
            body: Box::pin(body),
            content_type: None,
            content_encoding: None,
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
}

impl fmt::Debug for FetchedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchedObject")
            .field("content_type", &self.content_type)
            .field("content_encoding", &self.content_encoding)
            .finish_non_exhaustive()
    }
}

/// 객체 스토리지 조회 기능
///
/// 로더 생성 시 주입됩니다. 구현체는 `Arc`로 공유되며 내부에서 커넥션 풀 등을
/// 가질 수 있습니다.
#[async_trait]
pub trait ObjectFetcher: Send + Sync {
    /// 소스의 객체 본문을 엽니다.
    async fn fetch(&self, source: &LogSource) -> Result<FetchedObject, FetchError>;
}
