//! 객체 조회 구현체
//!
//! [`ObjectFetcher`](logfeed_core::pipeline::ObjectFetcher) trait의 구현체를 제공합니다.
//!
//! - [`InMemoryFetcher`]: 메모리에 저장한 객체 (테스트, 벤치마크, 데모용)
//! - [`LocalFsFetcher`]: 로컬 디렉토리를 객체 스토리지처럼 사용
//!
//! 실제 클라우드 스토리지 클라이언트는 이 크레이트 밖에서 같은 trait을 구현해
//! 로더 생성 시 주입합니다.

pub mod local;
pub mod memory;

pub use local::LocalFsFetcher;
pub use memory::InMemoryFetcher;

use std::io;

use logfeed_core::error::FetchError;

/// I/O 에러를 조회 에러로 분류합니다.
pub(crate) fn fetch_error_from_io(err: &io::Error, what: &str) -> FetchError {
    match err.kind() {
        io::ErrorKind::NotFound => FetchError::NotFound(what.to_owned()),
        io::ErrorKind::PermissionDenied => FetchError::AccessDenied(what.to_owned()),
        _ => FetchError::Transient(format!("{what}: {err}")),
    }
}
