//! Image attachments stored on log entries as data URLs

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// MIME type guessed from the file extension. Camera captures default to JPEG.
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "image/jpeg",
    }
}

/// Encode image bytes as `data:<mime>;base64,<payload>`
pub fn image_data_url(bytes: &[u8], mime: &str) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}
