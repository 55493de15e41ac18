//! 리더 -- 소스를 첫 번째로 일치하는 라우트의 파이프라인으로 보냅니다.
//!
//! 라우트는 등록 순서대로 검사하며, 순서 자체가 설정의 일부입니다.
//! 더 구체적인 패턴을 먼저 등록해야 합니다.
//!
//! ```text
//! read(source) -> [route 0] [route 1] ... 첫 일치 -> spawn(Pipeline::run) -> Receiver<ResultItem>
//!                                         불일치   -> Receiver { Err(NoMatchingRule) }
//! ```

use std::sync::Arc;

use metrics::counter;
use tokio::sync::mpsc;
use tracing::{Instrument, debug, info_span, warn};

use logfeed_core::config::{MAX_CHANNEL_CAPACITY, ReaderConfig};
use logfeed_core::error::LogfeedError;
use logfeed_core::metrics as m;
use logfeed_core::source::LogSource;
use logfeed_core::types::ResultItem;

use crate::error::LogPipelineError;
use crate::pipeline::Pipeline;

/// 기본 결과 채널 용량
pub const DEFAULT_CHANNEL_CAPACITY: usize = 128;

/// 패턴과 파이프라인의 조합
#[derive(Debug, Clone)]
pub struct Route {
    name: Option<String>,
    pattern: LogSource,
    pipeline: Pipeline,
    channel_capacity: Option<usize>,
}

impl Route {
    /// 새 라우트를 생성합니다.
    pub fn new(pattern: LogSource, pipeline: Pipeline) -> Self {
        Self {
            name: None,
            pattern,
            pipeline,
            channel_capacity: None,
        }
    }

    /// 표시용 이름을 지정합니다.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// 이 라우트의 결과 채널 용량을 지정합니다.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = Some(capacity);
        self
    }

    /// 이름이 없으면 패턴 문자열
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.pattern.to_string())
    }

    /// 매칭 패턴
    pub fn pattern(&self) -> &LogSource {
        &self.pattern
    }

    /// 라우트별 채널 용량
    pub fn channel_capacity(&self) -> Option<usize> {
        self.channel_capacity
    }
}

/// 라우팅 리더
///
/// 생성 후 라우트 목록은 변경되지 않습니다. `read` 호출마다 독립된 태스크가 실행됩니다.
#[derive(Debug, Clone)]
pub struct LogReader {
    routes: Arc<[Route]>,
    channel_capacity: usize,
}

impl LogReader {
    /// 빌더를 생성합니다.
    pub fn builder() -> LogReaderBuilder {
        LogReaderBuilder::new()
    }

    /// 소스를 읽어 결과 스트림을 반환합니다.
    ///
    /// tokio 런타임 안에서 호출해야 합니다. 일치하는 라우트가 없으면
    /// `NoMatchingRule` 에러 하나만 담긴 스트림을 반환합니다.
    pub fn read(&self, source: LogSource) -> mpsc::Receiver<ResultItem> {
        let Some(route) = self.find_route(&source) else {
            let err = LogfeedError::NoMatchingRule {
                location: source.to_string(),
            };
            warn!(location = %source, "no matching route");
            counter!(m::UNMATCHED_READS_TOTAL).increment(1);
            counter!(m::ERRORS_TOTAL, m::LABEL_KIND => err.kind()).increment(1);

            let (tx, rx) = mpsc::channel(1);
            // 용량 1의 새 채널이므로 항상 들어간다
            let _ = tx.try_send(Err(err));
            return rx;
        };

        let capacity = route
            .channel_capacity
            .unwrap_or(self.channel_capacity)
            .max(1);
        let (tx, rx) = mpsc::channel(capacity);
        let pipeline = route.pipeline.clone();
        let span = info_span!("read", route = %route.display_name(), location = %source);
        debug!(route = %route.display_name(), location = %source, capacity, "route matched");

        tokio::spawn(
            async move {
                pipeline.run(Arc::new(source), tx).await;
            }
            .instrument(span),
        );
        rx
    }

    /// 소스에 적용될 첫 번째 라우트를 찾습니다.
    pub fn find_route(&self, source: &LogSource) -> Option<&Route> {
        self.routes.iter().find(|route| route.pattern.contains(source))
    }

    /// 등록 순서대로의 라우트 목록
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// 기본 결과 채널 용량
    pub fn channel_capacity(&self) -> usize {
        self.channel_capacity
    }
}

/// [`LogReader`] 빌더
#[derive(Debug, Clone)]
pub struct LogReaderBuilder {
    routes: Vec<Route>,
    channel_capacity: usize,
}

impl LogReaderBuilder {
    /// 새 빌더를 생성합니다 (채널 용량 128).
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// 리더 설정의 채널 용량을 사용합니다.
    pub fn reader_config(mut self, config: &ReaderConfig) -> Self {
        self.channel_capacity = config.channel_capacity;
        self
    }

    /// 기본 결과 채널 용량을 지정합니다.
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// 라우트를 뒤에 추가합니다.
    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    /// 리더를 빌드합니다.
    pub fn build(self) -> Result<LogReader, LogPipelineError> {
        validate_capacity(self.channel_capacity).map_err(|reason| LogPipelineError::Config {
            field: "channel_capacity".to_owned(),
            reason,
        })?;
        for route in &self.routes {
            if let Some(capacity) = route.channel_capacity {
                validate_capacity(capacity).map_err(|reason| LogPipelineError::Route {
                    route: route.display_name(),
                    reason: format!("channel_capacity {reason}"),
                })?;
            }
        }

        Ok(LogReader {
            routes: self.routes.into(),
            channel_capacity: self.channel_capacity,
        })
    }
}

impl Default for LogReaderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_capacity(capacity: usize) -> Result<(), String> {
    if capacity == 0 || capacity > MAX_CHANNEL_CAPACITY {
        return Err(format!("must be between 1 and {MAX_CHANNEL_CAPACITY}"));
    }
    Ok(())
}
