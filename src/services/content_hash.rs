//! Content fingerprinting for cycle detection.
//!
//! Text is hashed directly over its UTF-8 bytes. Images are decoded and
//! re-encoded to baseline JPEG at a fixed low quality before hashing, so two
//! images with identical pixel content hash identically even when their
//! original byte encodings differ. This canonicalizes re-serialization, not
//! perceptual similarity: pixel-identical images only.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use sha2::{Digest, Sha256};

use crate::domain::models::ModelOutput;

/// JPEG quality used to canonicalize image bytes before hashing.
const HASH_JPEG_QUALITY: u8 = 30;

/// Deterministic hex digest of an invocation's output.
///
/// Pure function: same content, same digest. Image bytes that fail to
/// decode are hashed as-is; the fingerprint is only consumed by cycle
/// detection, so a stable value matters more than a canonical one.
pub fn output_hash(output: &ModelOutput) -> String {
    match output {
        ModelOutput::Text { text } => hex_digest(text.as_bytes()),
        ModelOutput::Image { bytes } => match canonical_image_bytes(bytes) {
            Some(canonical) => hex_digest(&canonical),
            None => hex_digest(bytes),
        },
    }
}

/// Re-encode arbitrary image bytes to baseline JPEG at the fixed quality.
fn canonical_image_bytes(bytes: &[u8]) -> Option<Vec<u8>> {
    let decoded = image::load_from_memory(bytes).ok()?;
    let rgb = decoded.to_rgb8();
    let mut buffer = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buffer, HASH_JPEG_QUALITY);
    rgb.write_with_encoder(encoder).ok()?;
    Some(buffer.into_inner())
}

fn hex_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
