#![no_main]

use std::sync::Arc;

use libfuzzer_sys::fuzz_target;
use logfeed_core::pipeline::LogParser;
use logfeed_core::source::LogSource;
use logfeed_core::types::RawFrame;
use logfeed_pipeline::parser::CloudTrailParser;

fuzz_target!(|data: &[u8]| {
    let source = Arc::new(LogSource::s3("us-east-1", "fuzz", "trail.json"));
    let mut parser = CloudTrailParser::new();

    if let Ok(records) = parser.parse(&RawFrame::new(0, data.to_vec(), source)) {
        // 모든 레코드는 같은 프레임에서 나온다
        assert!(records.iter().all(|r| r.seq == 0));
    }
});
