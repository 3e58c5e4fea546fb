use crate::{Codec, Encoding, Error, ReplacementFallback, Result};

pub(super) const TESTS: u64 = 500;

/// Maps an arbitrary byte onto one of the registered encodings
pub(super) fn pick(index: u8) -> Encoding {
    let all = Encoding::all();
    all[usize::from(index) % all.len()]
}

/// A codec whose replacement is three units long, to exercise the `m`
/// factor of the worst-case bounds and partly drained fallback output
pub(super) fn wide_replacement(index: u8) -> Codec {
    let replacement = ReplacementFallback::new("<?>").unwrap();
    Codec::builder(pick(index))
        .encoder_fallback(replacement.clone())
        .decoder_fallback(replacement)
        .build()
}

/// Cuts `data` into non-empty pieces whose sizes are derived from `splits`
pub(super) fn pieces<'a, T>(data: &'a [T], splits: &[usize]) -> Vec<&'a [T]> {
    let mut out = Vec::new();
    let mut idx = 0;
    for &s in splits {
        let remaining = data.len() - idx;
        if remaining == 0 {
            break;
        }
        let size = 1 + (s % remaining);
        out.push(&data[idx..idx + size]);
        idx += size;
    }
    if idx < data.len() {
        out.push(&data[idx..]);
    }
    out
}

pub(super) fn decode_streamed(codec: &Codec, bytes: &[u8], splits: &[usize]) -> Result<Vec<u16>> {
    let mut decoder = codec.decoder();
    let mut out = Vec::new();
    for piece in pieces(bytes, splits) {
        decoder.decode_into(piece, &mut out, false)?;
    }
    decoder.decode_into(&[], &mut out, true)?;
    Ok(out)
}

pub(super) fn encode_streamed(codec: &Codec, chars: &[u16], splits: &[usize]) -> Result<Vec<u8>> {
    let mut encoder = codec.encoder();
    let mut out = Vec::new();
    for piece in pieces(chars, splits) {
        encoder.encode_into(piece, &mut out, false)?;
    }
    encoder.encode_into(&[], &mut out, true)?;
    Ok(out)
}

/// Drives `Decoder::convert` through a buffer of `room` units, doubling it
/// only when a single step cannot fit
pub(super) fn decode_converted(codec: &Codec, bytes: &[u8], room: usize) -> Result<Vec<u16>> {
    let mut decoder = codec.decoder();
    let mut buf = vec![0; room.max(1)];
    let mut out = Vec::new();
    let mut rest = bytes;
    loop {
        match decoder.convert(rest, &mut buf, true) {
            Ok(c) => {
                out.extend_from_slice(&buf[..c.written]);
                rest = &rest[c.consumed..];
                if c.completed {
                    return Ok(out);
                }
            }
            Err(Error::DestinationTooSmall { .. }) => buf.resize(buf.len() * 2, 0),
            Err(err) => return Err(err),
        }
    }
}

/// Drives `Encoder::convert` through a buffer of `room` bytes, doubling it
/// only when a single step cannot fit
pub(super) fn encode_converted(codec: &Codec, chars: &[u16], room: usize) -> Result<Vec<u8>> {
    let mut encoder = codec.encoder();
    let mut buf = vec![0; room.max(1)];
    let mut out = Vec::new();
    let mut rest = chars;
    loop {
        match encoder.convert(rest, &mut buf, true) {
            Ok(c) => {
                out.extend_from_slice(&buf[..c.written]);
                rest = &rest[c.consumed..];
                if c.completed {
                    return Ok(out);
                }
            }
            Err(Error::DestinationTooSmall { .. }) => buf.resize(buf.len() * 2, 0),
            Err(err) => return Err(err),
        }
    }
}

#[test]
fn test_pieces_cover_input() {
    let data = [1, 2, 3, 4, 5, 6, 7];
    let cut = pieces(&data, &[0, 2, 100]);
    assert_eq!(cut, [&data[..1], &data[1..4], &data[4..]]);
    assert!(pieces::<u8>(&[], &[3]).is_empty());
}
