//! Encoded file payloads carried by `file` fields.
//!
//! A freshly attached file travels as a `data:<mime>;base64,<payload>` URL.
//! Any other non-empty string is a reference to a file the backend already
//! stores (edit flows) and is not re-checked.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::FileConstraintError;

/// A parsed `data:` URL.
#[derive(Debug, Clone, PartialEq)]
pub struct DataUrl {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl DataUrl {
    /// Build the `data:` URL for raw bytes.
    pub fn encode(mime: &str, bytes: &[u8]) -> String {
        format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
    }

    /// Parse a `data:` URL. Returns `Ok(None)` when the string is not a data
    /// URL at all.
    pub fn parse(value: &str) -> Result<Option<DataUrl>, FileConstraintError> {
        let Some(rest) = value.strip_prefix("data:") else {
            return Ok(None);
        };
        let (header, payload) = rest.split_once(',').ok_or_else(|| malformed("missing ','"))?;
        let Some(mime) = header.strip_suffix(";base64") else {
            return Err(malformed("payload is not base64 encoded"));
        };
        // Drop parameters such as `;name=photo.jpg` that precede `;base64`.
        let mime = mime.split(';').next().unwrap_or_default().trim();
        if mime.is_empty() {
            return Err(malformed("missing MIME type"));
        }
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| malformed(&e.to_string()))?;
        Ok(Some(DataUrl {
            mime: mime.to_ascii_lowercase(),
            bytes,
        }))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

fn malformed(detail: &str) -> FileConstraintError {
    FileConstraintError::Malformed {
        detail: detail.to_string(),
    }
}

/// Whether `mime` satisfies an accept list. An empty list accepts anything.
///
/// Entries may be exact (`image/png`), wildcards (`image/*`), or extensions
/// (`.jpg`), which match the MIME types conventionally used for them.
pub fn mime_accepted(mime: &str, accept: &[String]) -> bool {
    if accept.is_empty() {
        return true;
    }
    let mime = mime.to_ascii_lowercase();
    accept.iter().any(|entry| {
        let entry = entry.trim().to_ascii_lowercase();
        if let Some(ext) = entry.strip_prefix('.') {
            return mime_for_extension(ext).is_some_and(|m| m == mime);
        }
        if let Some(major) = entry.strip_suffix("/*") {
            return mime
                .split_once('/')
                .is_some_and(|(candidate, _)| candidate == major);
        }
        entry == "*/*" || entry == mime
    })
}

/// MIME type for a few common upload extensions.
pub fn mime_for_extension(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "pdf" => Some("application/pdf"),
        "csv" => Some("text/csv"),
        "txt" => Some("text/plain"),
        _ => None,
    }
}

/// Check a file value against its accept list and byte limit.
pub fn check_file_value(
    value: &str,
    accept: &[String],
    max_bytes: u64,
) -> Result<(), FileConstraintError> {
    let Some(data) = DataUrl::parse(value)? else {
        return Ok(());
    };
    if !mime_accepted(&data.mime, accept) {
        return Err(FileConstraintError::UnacceptedType {
            mime: data.mime,
            accepted: accept.to_vec(),
        });
    }
    if data.size() > max_bytes {
        return Err(FileConstraintError::TooLarge {
            size: data.size(),
            max_bytes,
        });
    }
    Ok(())
}
