#![no_main]

use arbitrary::Arbitrary;
use bytes::BytesMut;
use libfuzzer_sys::fuzz_target;
use logfeed_core::types::Framing;
use logfeed_pipeline::loader::FrameDecoder;
use tokio_util::codec::Decoder;

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    whole_object: bool,
    max_frame_size: u16,
    /// 스트림을 나눠 도착하는 청크들
    chunks: Vec<Vec<u8>>,
}

fuzz_target!(|input: FuzzInput| {
    let framing = if input.whole_object {
        Framing::WholeObject
    } else {
        Framing::Lines
    };
    let limit = usize::from(input.max_frame_size).max(1);
    let mut decoder = FrameDecoder::new(framing, limit);
    let mut buf = BytesMut::new();

    for chunk in &input.chunks {
        buf.extend_from_slice(chunk);
        loop {
            match decoder.decode(&mut buf) {
                Ok(Some(frame)) => assert!(frame.len() <= limit),
                Ok(None) => break,
                Err(_) => return,
            }
        }
    }

    while let Ok(Some(frame)) = decoder.decode_eof(&mut buf) {
        // 프레임은 상한을 넘지 않는다
        assert!(frame.len() <= limit);
    }
});
