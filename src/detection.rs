//! Encoding detection from byte order marks and byte-level heuristics
//!
//! Detection is a guess. A byte order mark settles it; otherwise every
//! supported encoding that plausibly produced the sample is scored and the
//! best one wins, with ISO-8859-1 (which accepts any byte) as the fallback.

use serde::Serialize;

use crate::{Codec, Encoding};

/// Result of encoding detection with confidence score
#[derive(Debug, Clone, Serialize)]
pub struct DetectionResult {
    /// Most likely encoding
    pub encoding: Encoding,
    /// Confidence score (0.0 to 1.0)
    pub confidence: f64,
    /// Whether a BOM was detected
    pub bom_detected: bool,
    /// Length of the detected BOM, 0 without one
    pub bom_len: usize,
    /// All candidate encodings with their scores, best first
    pub candidates: Vec<(Encoding, f64)>,
}

/// Encoding detector using multiple detection methods
#[derive(Debug, Clone)]
pub struct EncodingDetector {
    /// Maximum bytes to analyze for detection
    max_sample_size: usize,
}

impl Default for EncodingDetector {
    fn default() -> Self {
        Self {
            max_sample_size: 8192,
        }
    }
}

impl EncodingDetector {
    /// Create a new encoding detector
    pub fn new() -> Self {
        Self::default()
    }

    /// Create detector with custom sample size
    pub fn with_sample_size(max_sample_size: usize) -> Self {
        Self { max_sample_size }
    }

    /// Detect encoding of the given data
    pub fn detect(&self, data: &[u8]) -> DetectionResult {
        let sample = &data[..data.len().min(self.max_sample_size)];

        if let Some((encoding, bom_len)) = detect_bom(sample) {
            return DetectionResult {
                encoding,
                confidence: 1.0,
                bom_detected: true,
                bom_len,
                candidates: vec![(encoding, 1.0)],
            };
        }

        let mut candidates = Vec::new();

        if let Some(confidence) = detect_utf8(sample) {
            candidates.push((Encoding::UTF8, confidence));
        }
        if let Some(candidate) = detect_utf32(sample) {
            candidates.push(candidate);
        }
        if let Some(candidate) = detect_utf16(sample) {
            candidates.push(candidate);
        }
        if let Some(confidence) = detect_ascii(sample) {
            candidates.push((Encoding::ASCII, confidence));
        }
        if let Some(confidence) = detect_utf7(sample) {
            candidates.push((Encoding::UTF7, confidence));
        }
        if sample.iter().any(|&b| b >= 0xA0) {
            candidates.push((Encoding::ISO_8859_1, 0.4));
        }

        // stable, so earlier detectors win ties
        candidates.sort_by(|a, b| b.1.total_cmp(&a.1));

        let (encoding, confidence) = candidates
            .first()
            .copied()
            .unwrap_or((Encoding::ISO_8859_1, 0.2));

        DetectionResult {
            encoding,
            confidence,
            bom_detected: false,
            bom_len: 0,
            candidates,
        }
    }
}

/// UTF-32LE starts with the UTF-16LE mark, so it is tried first
fn detect_bom(data: &[u8]) -> Option<(Encoding, usize)> {
    [
        Encoding::UTF32LE,
        Encoding::UTF16LE,
        Encoding::UTF32BE,
        Encoding::UTF8,
        Encoding::UTF16BE,
    ]
    .into_iter()
    .find_map(|encoding| {
        encoding
            .bom()
            .filter(|bom| data.starts_with(bom))
            .map(|bom| (encoding, bom.len()))
    })
}

fn is_strictly_decodable(encoding: Encoding, data: &[u8]) -> bool {
    // without flush a sequence cut off by the sample boundary is not an error
    Codec::builder(encoding)
        .strict()
        .build()
        .decoder()
        .char_count(data, false)
        .is_ok()
}

fn detect_utf8(data: &[u8]) -> Option<f64> {
    if !is_strictly_decodable(Encoding::UTF8, data) {
        return None;
    }
    let leads = data.iter().filter(|&&b| b >= 0xC0).count();
    if leads == 0 {
        // all ASCII, could be UTF-8
        return Some(0.5);
    }
    let multibyte_ratio = leads as f64 / data.len() as f64;
    Some((0.9 + multibyte_ratio).min(0.99))
}

fn detect_utf16(data: &[u8]) -> Option<(Encoding, f64)> {
    if data.len() < 2 || data.len() % 2 != 0 {
        return None;
    }

    let units = data.len() / 2;
    let even_zeros = data.iter().step_by(2).filter(|&&b| b == 0).count();
    let odd_zeros = data.iter().skip(1).step_by(2).filter(|&&b| b == 0).count();

    // Latin text has its zero bytes on one side only
    let (encoding, zeros, other) = if odd_zeros >= even_zeros {
        (Encoding::UTF16LE, odd_zeros, even_zeros)
    } else {
        (Encoding::UTF16BE, even_zeros, odd_zeros)
    };
    let score = (zeros - other) as f64 / units as f64;
    if score < 0.3 || !is_strictly_decodable(encoding, data) {
        return None;
    }
    Some((encoding, 0.5 + score * 0.4))
}

fn detect_utf32(data: &[u8]) -> Option<(Encoding, f64)> {
    if data.len() < 4 || data.len() % 4 != 0 {
        return None;
    }

    let quads = data.chunks_exact(4);
    let total = quads.len();
    let le = quads
        .clone()
        .filter(|q| q[3] == 0 && q[2] <= 0x10 && q[0] != 0)
        .count();
    let be = quads
        .filter(|q| q[0] == 0 && q[1] <= 0x10 && q[3] != 0)
        .count();

    let (encoding, hits) = if le >= be {
        (Encoding::UTF32LE, le)
    } else {
        (Encoding::UTF32BE, be)
    };
    let score = hits as f64 / total as f64;
    if score < 0.5 || !is_strictly_decodable(encoding, data) {
        return None;
    }
    Some((encoding, 0.6 + score * 0.35))
}

fn detect_ascii(data: &[u8]) -> Option<f64> {
    if data.iter().all(|&b| b < 0x80) {
        Some(0.8)
    } else {
        None
    }
}

/// Pure 7-bit text containing at least one `+` followed by base64
fn detect_utf7(data: &[u8]) -> Option<f64> {
    if data.iter().any(|&b| b >= 0x80) {
        return None;
    }
    let shifts = data
        .windows(2)
        .filter(|w| w[0] == b'+' && (w[1].is_ascii_alphanumeric() || w[1] == b'/'))
        .count();
    if shifts == 0 {
        return None;
    }
    Some(0.85)
}
