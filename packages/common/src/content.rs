//! Content identity: digest, sniffed media type, and the resolved type.
//!
//! Everything here is a pure function of the payload bytes and the
//! client-declared type. Deduplication depends on that: the same bytes must
//! always produce the same digest and storage key.

use crate::storage::ContentDigest;

/// Number of leading bytes inspected when sniffing a media type.
pub const SNIFF_LEN: usize = 512;

/// Fallback media type when nothing better is known.
pub const GENERIC_MEDIA_TYPE: &str = "application/octet-stream";

const PLAIN_TEXT: &str = "text/plain; charset=utf-8";

/// The identity of a payload as seen by the blob catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentIdentity {
    pub digest: ContentDigest,
    pub size: u64,
    /// Type detected from the leading bytes alone.
    pub sniffed_type: String,
    /// Type to record for the blob (see [`resolve_media_type`]).
    pub media_type: String,
}

impl ContentIdentity {
    /// Hash and sniff a payload.
    pub fn analyze(data: &[u8], declared_type: Option<&str>) -> Self {
        let sniffed_type = sniff_media_type(data);
        let media_type = resolve_media_type(&sniffed_type, declared_type);
        Self {
            digest: ContentDigest::compute(data),
            size: data.len() as u64,
            sniffed_type,
            media_type,
        }
    }

    pub fn storage_key(&self) -> String {
        self.digest.storage_key()
    }
}

/// Best-effort media type from the first [`SNIFF_LEN`] bytes.
///
/// Known binary signatures win; otherwise a sample without binary control
/// bytes that decodes as UTF-8 is plain text, and anything else falls back
/// to [`GENERIC_MEDIA_TYPE`].
pub fn sniff_media_type(data: &[u8]) -> String {
    let sample = &data[..data.len().min(SNIFF_LEN)];

    if let Some(kind) = infer::get(sample) {
        return kind.mime_type().to_string();
    }

    if looks_like_text(sample) {
        PLAIN_TEXT.to_string()
    } else {
        GENERIC_MEDIA_TYPE.to_string()
    }
}

/// Pick the type to record: the declared type only replaces a generic sniff.
pub fn resolve_media_type(sniffed: &str, declared: Option<&str>) -> String {
    match declared.map(str::trim).filter(|d| !d.is_empty()) {
        Some(declared) if sniffed == GENERIC_MEDIA_TYPE => declared.to_string(),
        _ => sniffed.to_string(),
    }
}

fn looks_like_text(sample: &[u8]) -> bool {
    let has_binary_byte = sample
        .iter()
        .any(|&b| matches!(b, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F));
    if has_binary_byte {
        return false;
    }
    match std::str::from_utf8(sample) {
        Ok(_) => true,
        // A multi-byte character cut off by the sample boundary is still text.
        Err(e) => e.error_len().is_none(),
    }
}
