//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::histogram!()`
//! 매크로를 호출합니다. 레코더(exporter) 설치는 실행 파일의 몫입니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `logfeed_`
//! - 접미어: `_total` (counter), `_seconds` (histogram), `_bytes` (byte counter)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(logfeed_core::metrics::RECORDS_EMITTED_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 파서 형식 레이블 키 (json, cloudtrail, vpc_flow_logs, ...)
pub const LABEL_PARSER_FORMAT: &str = "format";

/// 결과 레이블 키 (done, failed, skipped, cancelled)
pub const LABEL_RESULT: &str = "result";

/// 에러 종류 레이블 키 ([`LogfeedError::kind`](crate::error::LogfeedError::kind))
pub const LABEL_KIND: &str = "kind";

// ─── 결과 레이블 값 ────────────────────────────────────────────────

/// 객체를 끝까지 읽음
pub const RESULT_DONE: &str = "done";
/// 종료 에러로 중단
pub const RESULT_FAILED: &str = "failed";
/// 로더가 건너뜀
pub const RESULT_SKIPPED: &str = "skipped";
/// 소비자가 수신자를 drop
pub const RESULT_CANCELLED: &str = "cancelled";

// ─── 메트릭 이름 ───────────────────────────────────────────────────

/// 로더가 생성한 프레임 수 (counter)
pub const FRAMES_LOADED_TOTAL: &str = "logfeed_frames_loaded_total";

/// 로더가 읽은 (압축 해제 후) 바이트 수 (counter)
pub const LOADED_BYTES: &str = "logfeed_loaded_bytes";

/// 파이프라인이 내보낸 레코드 수 (counter, label: format)
pub const RECORDS_EMITTED_TOTAL: &str = "logfeed_records_emitted_total";

/// 실행이 끝난 객체 수 (counter, label: result)
pub const OBJECTS_READ_TOTAL: &str = "logfeed_objects_read_total";

/// 스트림으로 전달된 종료 에러 수 (counter, label: kind)
pub const ERRORS_TOTAL: &str = "logfeed_errors_total";

/// 규칙 매칭에 실패한 읽기 요청 수 (counter)
pub const UNMATCHED_READS_TOTAL: &str = "logfeed_unmatched_reads_total";

/// 객체 하나를 읽는 데 걸린 시간 (histogram, 초)
pub const OBJECT_READ_DURATION_SECONDS: &str = "logfeed_object_read_duration_seconds";

// ─── 히스토그램 버킷 정의 ────────────────────────────────────────────

/// 객체 처리 시간 히스토그램 버킷 (초)
///
/// 1ms ~ 300s 범위 (원격 스토리지 I/O 포함)
pub const OBJECT_READ_DURATION_BUCKETS: [f64; 10] =
    [0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 10.0, 60.0, 300.0];

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출합니다.
pub fn describe_all() {
    use metrics::{Unit, describe_counter, describe_histogram};

    describe_counter!(
        FRAMES_LOADED_TOTAL,
        "Total number of raw frames produced by loaders"
    );
    describe_counter!(
        LOADED_BYTES,
        Unit::Bytes,
        "Total bytes handed to framing after decompression"
    );
    describe_counter!(
        RECORDS_EMITTED_TOTAL,
        "Total number of log records delivered to consumers"
    );
    describe_counter!(
        OBJECTS_READ_TOTAL,
        "Total number of pipeline runs by outcome (done, failed, skipped, cancelled)"
    );
    describe_counter!(
        ERRORS_TOTAL,
        "Total number of terminal errors delivered on result streams"
    );
    describe_counter!(
        UNMATCHED_READS_TOTAL,
        "Total number of reads with no matching route"
    );
    describe_histogram!(
        OBJECT_READ_DURATION_SECONDS,
        Unit::Seconds,
        "Time to read and parse a single object in seconds"
    );
}
