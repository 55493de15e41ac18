//! 자주 쓰는 AWS 로그 조합
//!
//! | 프리셋 | 로더 | 파서 |
//! |--------|------|------|
//! | [`vpc_flow_logs`] | 라인 + gzip 자동 감지 | [`ColumnarParser::vpc_flow_logs`] |
//! | [`cloudtrail`] | 객체 전체 + gzip 자동 감지 | [`CloudTrailParser`] |
//! | [`ignore`] | [`IgnoreLoader`] | (없음) |

use std::sync::Arc;

use logfeed_core::pipeline::ObjectFetcher;

use crate::loader::{IgnoreLoader, ObjectLoader};
use crate::parser::{CloudTrailParser, ColumnarParser, RawParser};
use crate::pipeline::Pipeline;

/// VPC Flow Logs 파이프라인
pub fn vpc_flow_logs(fetcher: Arc<dyn ObjectFetcher>) -> Pipeline {
    Pipeline::new(ObjectLoader::lines(fetcher), ColumnarParser::vpc_flow_logs)
}

/// CloudTrail 파이프라인
pub fn cloudtrail(fetcher: Arc<dyn ObjectFetcher>) -> Pipeline {
    Pipeline::new(ObjectLoader::whole_object(fetcher), CloudTrailParser::new)
}

/// 객체를 건너뛰는 파이프라인 (다이제스트 파일 등)
pub fn ignore() -> Pipeline {
    Pipeline::new(IgnoreLoader, RawParser::default)
}
