//! 설정에서 리더 구성
//!
//! core의 [`LogfeedConfig`]를 실제 로더/파서/라우트로 변환합니다.
//! 객체 조회 기능은 설정에 없으므로 호출자가 주입합니다.
//!
//! # 사용 예시
//! ```ignore
//! use logfeed_core::config::LogfeedConfig;
//! use logfeed_pipeline::{LocalFsFetcher, LogReader};
//!
//! let config = LogfeedConfig::load("logfeed.toml").await?;
//! let reader = LogReader::from_config(&config, Arc::new(LocalFsFetcher::new("/data")))?;
//! ```

use std::sync::Arc;

use logfeed_core::config::{LoaderConfig, LoaderMode, LogfeedConfig, ParserConfig, ReaderConfig};
use logfeed_core::pipeline::{Loader, ObjectFetcher, ParserFactory};
use logfeed_core::types::Framing;

use crate::error::LogPipelineError;
use crate::loader::{IgnoreLoader, LoaderSettings, ObjectLoader};
use crate::parser::{CloudTrailParser, ColumnarParser, JsonParser, RawParser};
use crate::pipeline::Pipeline;
use crate::reader::{LogReader, Route};

impl LogReader {
    /// 설정의 라우트를 순서대로 등록한 리더를 생성합니다.
    pub fn from_config(
        config: &LogfeedConfig,
        fetcher: Arc<dyn ObjectFetcher>,
    ) -> Result<Self, LogPipelineError> {
        config.validate().map_err(|e| LogPipelineError::Config {
            field: "config".to_owned(),
            reason: e.to_string(),
        })?;

        let mut builder = LogReader::builder().reader_config(&config.reader);
        for route_config in &config.routes {
            let loader = build_loader(&route_config.loader, &config.reader, Arc::clone(&fetcher));
            let parser = build_parser_factory(&route_config.parser);
            let mut route = Route::new(
                route_config.pattern.clone(),
                Pipeline::from_shared(loader, parser),
            );
            if let Some(name) = &route_config.name {
                route = route.with_name(name.clone());
            }
            if let Some(capacity) = route_config.channel_capacity {
                route = route.with_channel_capacity(capacity);
            }
            builder = builder.route(route);
        }

        let reader = builder.build()?;
        tracing::info!(routes = reader.routes().len(), "log reader configured");
        Ok(reader)
    }
}

/// 로더 설정으로 로더를 생성합니다.
pub fn build_loader(
    config: &LoaderConfig,
    reader: &ReaderConfig,
    fetcher: Arc<dyn ObjectFetcher>,
) -> Arc<dyn Loader> {
    let framing = match config.mode {
        LoaderMode::Lines => Framing::Lines,
        LoaderMode::WholeObject => Framing::WholeObject,
        LoaderMode::Ignore => return Arc::new(IgnoreLoader),
    };

    let mut settings = LoaderSettings::from_reader_config(reader);
    if let Some(max) = config.max_frame_size {
        settings = settings.with_max_frame_size(max);
    }

    Arc::new(
        ObjectLoader::new(fetcher, framing)
            .with_compression(config.compression)
            .with_settings(settings),
    )
}

/// 파서 설정으로 파서 팩토리를 생성합니다.
pub fn build_parser_factory(config: &ParserConfig) -> Arc<dyn ParserFactory> {
    match config.clone() {
        ParserConfig::Raw { tag } => Arc::new(move || RawParser::new(tag.clone())),
        ParserConfig::Json {
            tag,
            timestamp,
            max_input_size,
        } => Arc::new(move || {
            let parser = JsonParser::new(tag.clone(), timestamp.clone());
            match max_input_size {
                Some(max) => parser.with_max_input_size(max),
                None => parser,
            }
        }),
        ParserConfig::Cloudtrail => Arc::new(CloudTrailParser::new),
        ParserConfig::Columnar {
            tag,
            known_columns,
            default_columns,
            timestamp_column,
        } => {
            let mut template = ColumnarParser::new(tag)
                .with_known_columns(known_columns)
                .with_default_columns(default_columns);
            if let Some(column) = timestamp_column {
                template = template.with_timestamp_column(column);
            }
            Arc::new(move || template.clone())
        }
        ParserConfig::VpcFlowLogs => Arc::new(ColumnarParser::vpc_flow_logs),
    }
}
