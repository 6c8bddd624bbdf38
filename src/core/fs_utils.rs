//! File system utility helpers (BOM-aware readers, etc.)
use encoding_rs::UTF_8;
use std::fs;
use std::path::Path;

/// Read a TMDL file as text. A UTF-8 or UTF-16 BOM selects the encoding and is stripped;
/// without a BOM the bytes are decoded as UTF-8 with replacement of invalid sequences.
pub fn read_tmdl_file(path: &Path) -> std::io::Result<String> {
    let bytes = fs::read(path)?;
    Ok(decode_tmdl_bytes(&bytes))
}

/// Decode raw TMDL bytes, sniffing the BOM
pub fn decode_tmdl_bytes(bytes: &[u8]) -> String {
    let (text, encoding, had_errors) = UTF_8.decode(bytes);
    if had_errors {
        tracing::warn!("Invalid {} sequences replaced while decoding", encoding.name());
    }
    text.into_owned()
}
