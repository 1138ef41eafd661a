use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::{EditorError, Result};

pub const PNG_MIME: &str = "image/png";

pub fn encode_png_data_url(png: &[u8]) -> String {
    format!("data:{PNG_MIME};base64,{}", STANDARD.encode(png))
}

/// Splits a base64 `data:` URL into its MIME type and decoded payload.
pub fn decode_data_url(url: &str) -> Result<(String, Vec<u8>)> {
    let rest = url
        .trim()
        .strip_prefix("data:")
        .ok_or_else(|| EditorError::DataUrl("missing data: scheme".to_string()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| EditorError::DataUrl("missing ',' separator".to_string()))?;
    let mime = meta
        .strip_suffix(";base64")
        .ok_or_else(|| EditorError::DataUrl("only base64 payloads are supported".to_string()))?;
    let bytes = STANDARD
        .decode(payload)
        .map_err(|err| EditorError::DataUrl(err.to_string()))?;
    Ok((mime.to_string(), bytes))
}
