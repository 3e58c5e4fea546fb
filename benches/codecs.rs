//! Benchmark – one-shot and chunked throughput of every codec
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use fast_transcode::{Encoding, Translator};

/// Deterministic text of exactly `len` UTF-16 units; `ascii_only` keeps the
/// fast paths busy, otherwise every eighth unit is non-ASCII.
fn make_text(len: usize, ascii_only: bool) -> Vec<u16> {
    let pattern: Vec<u16> = if ascii_only {
        "The quick brown fox jumps over the lazy dog. ".encode_utf16().collect()
    } else {
        "Caf\u{e9} na\u{ef}ve \u{65e5}\u{672c} \u{20ac}5 ".encode_utf16().collect()
    };
    pattern.iter().copied().cycle().take(len).collect()
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");

    for ascii_only in [true, false] {
        let text = make_text(64 * 1024, ascii_only);
        group.throughput(Throughput::Elements(text.len() as u64));
        let label = if ascii_only { "ascii" } else { "mixed" };

        for &encoding in Encoding::all() {
            let codec = encoding.codec();
            let mut dest = vec![0u8; codec.max_byte_count(text.len()).unwrap()];
            group.bench_with_input(BenchmarkId::new(encoding.name(), label), &text, |b, text| {
                b.iter(|| black_box(codec.encode(black_box(text), &mut dest).unwrap()));
            });
        }
    }

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for ascii_only in [true, false] {
        let text = make_text(64 * 1024, ascii_only);
        let label = if ascii_only { "ascii" } else { "mixed" };

        for &encoding in Encoding::all() {
            let codec = encoding.codec();
            let bytes = codec.encode_to_vec(&text).unwrap();
            let mut dest = vec![0u16; codec.max_char_count(bytes.len()).unwrap()];
            group.throughput(Throughput::Bytes(bytes.len() as u64));
            group.bench_with_input(BenchmarkId::new(encoding.name(), label), &bytes, |b, bytes| {
                b.iter(|| black_box(codec.decode(black_box(bytes), &mut dest).unwrap()));
            });
        }
    }

    group.finish();
}

/// Feeds the decoder in `parts` chunks to measure the cost of carried state
fn bench_chunked_decode(c: &mut Criterion) {
    let text = make_text(16 * 1024, false);
    let mut group = c.benchmark_group("decode_chunked");

    for encoding in [Encoding::UTF8, Encoding::UTF16LE, Encoding::UTF7] {
        let codec = encoding.codec();
        let bytes = codec.encode_to_vec(&text).unwrap();
        group.throughput(Throughput::Bytes(bytes.len() as u64));

        for &parts in &[1usize, 64, 4_096] {
            let chunk_size = bytes.len().div_ceil(parts);
            group.bench_with_input(
                BenchmarkId::new(encoding.name(), parts),
                &chunk_size,
                |b, &chunk_size| {
                    b.iter(|| {
                        let mut decoder = codec.decoder();
                        let mut out = Vec::with_capacity(text.len());
                        for chunk in bytes.chunks(chunk_size) {
                            decoder.decode_into(chunk, &mut out, false).unwrap();
                        }
                        decoder.decode_into(&[], &mut out, true).unwrap();
                        black_box(out.len())
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_translate(c: &mut Criterion) {
    let text: String = String::from_utf16_lossy(&make_text(64 * 1024, false));
    let mut group = c.benchmark_group("translate");
    group.throughput(Throughput::Bytes(text.len() as u64));

    for to in [Encoding::UTF16LE, Encoding::UTF32BE, Encoding::ISO_8859_1] {
        let translator = Translator::new(Encoding::UTF8, to);
        group.bench_function(BenchmarkId::new("UTF-8", to.name()), |b| {
            b.iter(|| black_box(translator.convert(black_box(text.as_bytes())).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode, bench_chunked_decode, bench_translate);
criterion_main!(benches);
