#![no_main]

use std::sync::Arc;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use logfeed_core::pipeline::LogParser;
use logfeed_core::source::LogSource;
use logfeed_core::types::RawFrame;
use logfeed_pipeline::parser::ColumnarParser;

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    /// VPC Flow Logs 프리셋 사용 여부
    vpc: bool,
    /// 프레임 목록 (첫 프레임은 헤더 후보)
    rows: Vec<String>,
}

fuzz_target!(|input: FuzzInput| {
    let source = Arc::new(LogSource::s3("us-east-1", "fuzz", "flow.log"));
    let mut parser = if input.vpc {
        ColumnarParser::vpc_flow_logs()
    } else {
        ColumnarParser::new("fuzz").with_timestamp_column("start")
    };

    // 행 수 제한 (퍼징 성능)
    for (seq, row) in input.rows.into_iter().take(64).enumerate() {
        let frame = RawFrame::new(seq as u64, row.into_bytes(), Arc::clone(&source));
        if parser.parse(&frame).is_err() {
            break;
        }
    }
});
