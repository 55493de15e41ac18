#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`fetcher`]: 객체 조회 구현체 (인메모리, 로컬 파일시스템)
//! - [`loader`]: fetch, gzip 해제, 라인/객체 프레이밍
//! - [`parser`]: 원시 문자열, JSON, CloudTrail, 컬럼(VPC Flow Logs) 파서
//! - [`pipeline`]: 로더 + 파서 실행 (객체 하나 -> 결과 스트림)
//! - [`reader`]: 첫 일치 라우팅과 실행 태스크 생성
//! - [`presets`]: 자주 쓰는 AWS 로그 파이프라인
//! - [`config`]: `LogfeedConfig`에서 리더 구성
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! LogReader::read(source)
//!     |  첫 일치 라우트
//!     v
//! Pipeline::run --- Loader (ObjectFetcher -> gunzip -> FrameDecoder) --- mpsc<RawFrame>
//!     |                                                                     |
//!     +--- LogParser (실행마다 새 인스턴스) <--------------------------------+
//!     v
//! mpsc<ResultItem> -> consumer
//! ```

pub mod config;
pub mod error;
pub mod fetcher;
pub mod loader;
pub mod parser;
pub mod pipeline;
pub mod presets;
pub mod reader;

// --- 주요 타입 re-export ---

// 리더 / 파이프라인
pub use pipeline::{Pipeline, RunState};
pub use reader::{LogReader, LogReaderBuilder, Route};

// 에러
pub use error::LogPipelineError;

// 로더
pub use loader::{IgnoreLoader, LoaderSettings, ObjectLoader};

// 파서
pub use parser::{CloudTrailParser, ColumnarParser, JsonParser, RawParser};

// fetcher
pub use fetcher::{InMemoryFetcher, LocalFsFetcher};
