//! 프레임 분할
//!
//! [`FrameDecoder`]는 압축 해제된 바이트 버퍼를 프레임으로 자릅니다.
//! `tokio_util::codec::Decoder`를 구현하므로 버퍼에 데이터를 채운 뒤
//! `decode` (스트림 중간) / `decode_eof` (스트림 끝)를 반복 호출합니다.
//!
//! - `Lines`: `\n` 단위. 구분자와 끝의 `\r`은 제거되고, 마지막 줄은 개행이 없어도 포함됩니다.
//! - `WholeObject`: 스트림 끝에서 전체 버퍼를 한 번 내보냅니다 (빈 객체도 한 프레임).
//!
//! 두 모드 모두 프레임 크기 상한을 넘으면 [`FramingError::TooLarge`]를 반환합니다.
//! 라인의 크기는 `\r`을 제거한 뒤의 길이입니다.

use std::io;

use bytes::{Bytes, BytesMut};
use tokio_util::codec::{AnyDelimiterCodec, AnyDelimiterCodecError, Decoder};

use logfeed_core::types::Framing;

/// 프레이밍 에러
#[derive(Debug, thiserror::Error)]
pub enum FramingError {
    /// 프레임이 상한을 초과
    #[error("frame exceeds {limit} bytes")]
    TooLarge {
        /// 상한 (바이트)
        limit: usize,
    },

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// 프레이밍 정책별 디코더
#[derive(Debug)]
pub enum FrameDecoder {
    /// 라인 단위. 코덱 상한은 끝의 `\r` 한 바이트를 위해 1 크다.
    Lines {
        codec: AnyDelimiterCodec,
        max_frame_size: usize,
    },
    /// 객체 전체
    WholeObject { max_frame_size: usize, emitted: bool },
}

impl FrameDecoder {
    /// 정책과 상한으로 디코더를 생성합니다.
    pub fn new(framing: Framing, max_frame_size: usize) -> Self {
        match framing {
            Framing::Lines => Self::Lines {
                codec: AnyDelimiterCodec::new_with_max_length(
                    b"\n".to_vec(),
                    b"\n".to_vec(),
                    max_frame_size.saturating_add(1),
                ),
                max_frame_size,
            },
            Framing::WholeObject => Self::WholeObject {
                max_frame_size,
                emitted: false,
            },
        }
    }
}

fn finish_line(line: Option<Bytes>, limit: usize) -> Result<Option<Bytes>, FramingError> {
    let Some(line) = line else {
        return Ok(None);
    };
    let line = match line.last() {
        Some(b'\r') => line.slice(..line.len() - 1),
        _ => line,
    };
    if line.len() > limit {
        return Err(FramingError::TooLarge { limit });
    }
    Ok(Some(line))
}

fn map_codec_error(err: AnyDelimiterCodecError, limit: usize) -> FramingError {
    match err {
        AnyDelimiterCodecError::MaxChunkLengthExceeded => FramingError::TooLarge { limit },
        AnyDelimiterCodecError::Io(e) => FramingError::Io(e),
    }
}

impl Decoder for FrameDecoder {
    type Item = Bytes;
    type Error = FramingError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Bytes>, FramingError> {
        match self {
            Self::Lines {
                codec,
                max_frame_size,
            } => {
                let line = codec
                    .decode(buf)
                    .map_err(|e| map_codec_error(e, *max_frame_size))?;
                finish_line(line, *max_frame_size)
            }
            Self::WholeObject { max_frame_size, .. } => {
                if buf.len() > *max_frame_size {
                    return Err(FramingError::TooLarge {
                        limit: *max_frame_size,
                    });
                }
                Ok(None)
            }
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Bytes>, FramingError> {
        match self {
            Self::Lines {
                codec,
                max_frame_size,
            } => {
                let line = codec
                    .decode_eof(buf)
                    .map_err(|e| map_codec_error(e, *max_frame_size))?;
                finish_line(line, *max_frame_size)
            }
            Self::WholeObject {
                max_frame_size,
                emitted,
            } => {
                if *emitted {
                    return Ok(None);
                }
                if buf.len() > *max_frame_size {
                    return Err(FramingError::TooLarge {
                        limit: *max_frame_size,
                    });
                }
                *emitted = true;
                Ok(Some(buf.split().freeze()))
            }
        }
    }
}
