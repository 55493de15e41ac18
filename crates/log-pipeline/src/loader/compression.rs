//! 압축 판단과 스트리밍 gzip 해제
//!
//! `Compression::Auto`의 판단 순서:
//! 1. Content-Encoding이 `gzip` / `x-gzip`이면 gzip
//! 2. Content-Type이 gzip 계열이면 gzip, 텍스트/JSON 계열이면 비압축
//! 3. 그 외에는 객체 이름이 `.gz`로 끝나는지로 판단

use std::io::Write;

use bytes::BytesMut;
use flate2::write::MultiGzDecoder;

use logfeed_core::pipeline::FetchedObject;
use logfeed_core::types::Compression;

/// 객체 본문을 gzip으로 해제해야 하는지 결정합니다.
pub fn is_gzip(policy: Compression, fetched: &FetchedObject, object_name: &str) -> bool {
    match policy {
        Compression::Gzip => true,
        Compression::None => false,
        Compression::Auto => hint_from_metadata(
            fetched.content_type.as_deref(),
            fetched.content_encoding.as_deref(),
        )
        .unwrap_or_else(|| object_name.ends_with(".gz")),
    }
}

/// 메타데이터 힌트. 판단할 수 없으면 `None`.
fn hint_from_metadata(content_type: Option<&str>, content_encoding: Option<&str>) -> Option<bool> {
    if let Some(encoding) = content_encoding {
        let encoding = encoding.trim().to_ascii_lowercase();
        if encoding == "gzip" || encoding == "x-gzip" {
            return Some(true);
        }
    }

    let content_type = content_type?.trim().to_ascii_lowercase();
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim();
    match essence {
        "application/gzip" | "application/x-gzip" | "application/gzip-compressed" => Some(true),
        "application/json" | "application/x-ndjson" | "application/jsonl" => Some(false),
        t if t.starts_with("text/") => Some(false),
        // application/octet-stream 등은 판단 불가
        _ => None,
    }
}

/// 청크 단위로 밀어 넣는 gzip 해제기
///
/// 연결된(concatenated) gzip 멤버도 처리합니다.
pub struct Inflater {
    decoder: MultiGzDecoder<Vec<u8>>,
}

impl Inflater {
    /// 새 해제기를 생성합니다.
    pub fn new() -> Self {
        Self {
            decoder: MultiGzDecoder::new(Vec::new()),
        }
    }

    /// 압축 청크를 해제해 `out`에 덧붙입니다. 해제된 바이트 수를 반환합니다.
    pub fn inflate(&mut self, chunk: &[u8], out: &mut BytesMut) -> std::io::Result<usize> {
        self.decoder.write_all(chunk)?;
        Ok(self.drain(out))
    }

    /// 스트림 끝을 알리고 남은 데이터를 `out`에 덧붙입니다.
    ///
    /// 잘린 스트림은 여기서 에러가 됩니다.
    pub fn finish(&mut self, out: &mut BytesMut) -> std::io::Result<usize> {
        self.decoder.try_finish()?;
        Ok(self.drain(out))
    }

    fn drain(&mut self, out: &mut BytesMut) -> usize {
        let inflated = self.decoder.get_mut();
        let n = inflated.len();
        out.extend_from_slice(inflated);
        inflated.clear();
        n
    }
}

impl Default for Inflater {
    fn default() -> Self {
        Self::new()
    }
}
