#![no_main]

use std::sync::Arc;

use libfuzzer_sys::fuzz_target;
use logfeed_core::config::TimestampSpec;
use logfeed_core::pipeline::LogParser;
use logfeed_core::source::LogSource;
use logfeed_core::types::RawFrame;
use logfeed_pipeline::parser::JsonParser;

fuzz_target!(|data: &[u8]| {
    let source = Arc::new(LogSource::s3("us-east-1", "fuzz", "app.log"));
    let mut parser = JsonParser::new(
        "fuzz",
        TimestampSpec::Rfc3339 {
            field: "meta.time".to_owned(),
        },
    );

    // 크래시나 패닉 없이 Ok 또는 Err을 반환해야 한다
    let _ = parser.parse(&RawFrame::new(0, data.to_vec(), source));
});
