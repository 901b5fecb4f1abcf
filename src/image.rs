//! Image payload intake and content identity.
//!
//! Payloads arrive as data URIs from the input surface (file picker or
//! drag-drop). Only `image/*` payloads are accepted; anything else is
//! silently ignored by returning `None`. Identity for the stale-response
//! guard and for history matching is a SHA-256 fingerprint of the decoded
//! bytes, so large payloads are never compared byte-for-byte.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// An accepted image, owned wholesale by one session or history entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePayload {
    /// Full `data:image/...;base64,...` URI as produced by the input surface
    pub data_uri: String,

    /// Mime type, always `image/*`
    pub mime: String,

    /// SHA-256 hex of the decoded bytes; the payload's identity
    pub fingerprint: String,
}

impl ImagePayload {
    /// Parse a data URI. Returns `None` for anything that is not a valid
    /// base64 data URI with an `image/*` mime type.
    pub fn from_data_uri(data_uri: &str) -> Option<Self> {
        let rest = data_uri.strip_prefix("data:")?;
        let (mime, encoded) = rest.split_once(";base64,")?;

        if !mime.starts_with("image/") {
            tracing::debug!(mime, "ignoring non-image payload");
            return None;
        }

        let bytes = BASE64.decode(encoded).ok()?;

        Some(Self {
            data_uri: data_uri.to_string(),
            mime: mime.to_string(),
            fingerprint: fingerprint_of(&bytes),
        })
    }

    /// Build a payload from raw bytes, e.g. a file read by the CLI.
    pub fn from_bytes(mime: &str, bytes: &[u8]) -> Option<Self> {
        if !mime.starts_with("image/") {
            tracing::debug!(mime, "ignoring non-image payload");
            return None;
        }

        Some(Self {
            data_uri: format!("data:{};base64,{}", mime, BASE64.encode(bytes)),
            mime: mime.to_string(),
            fingerprint: fingerprint_of(bytes),
        })
    }

    /// The base64 body without the data-URI envelope, as providers want it.
    pub fn base64_data(&self) -> &str {
        self.data_uri
            .split_once(";base64,")
            .map(|(_, data)| data)
            .unwrap_or("")
    }
}

fn fingerprint_of(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_URI: &str = "data:image/png;base64,aGVsbG8=";

    #[test]
    fn test_accepts_image_data_uri() {
        let payload = ImagePayload::from_data_uri(PNG_URI).unwrap();
        assert_eq!(payload.mime, "image/png");
        assert_eq!(payload.base64_data(), "aGVsbG8=");
        // SHA-256 of "hello"
        assert_eq!(
            payload.fingerprint,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_ignores_non_image_payloads() {
        assert!(ImagePayload::from_data_uri("data:text/plain;base64,aGVsbG8=").is_none());
        assert!(ImagePayload::from_data_uri("data:application/pdf;base64,aGVsbG8=").is_none());
        assert!(ImagePayload::from_bytes("text/html", b"<html>").is_none());
    }

    #[test]
    fn test_rejects_malformed_uris() {
        assert!(ImagePayload::from_data_uri("not a data uri").is_none());
        assert!(ImagePayload::from_data_uri("data:image/png,unencoded").is_none());
        assert!(ImagePayload::from_data_uri("data:image/png;base64,!!!not-base64!!!").is_none());
    }

    #[test]
    fn test_fingerprint_tracks_content_not_mime() {
        let a = ImagePayload::from_bytes("image/png", b"same bytes").unwrap();
        let b = ImagePayload::from_bytes("image/jpeg", b"same bytes").unwrap();
        let c = ImagePayload::from_bytes("image/png", b"other bytes").unwrap();
        assert_eq!(a.fingerprint, b.fingerprint);
        assert_ne!(a.fingerprint, c.fingerprint);
    }

    #[test]
    fn test_bytes_roundtrip_through_data_uri() {
        let from_bytes = ImagePayload::from_bytes("image/png", b"hello").unwrap();
        let reparsed = ImagePayload::from_data_uri(&from_bytes.data_uri).unwrap();
        assert_eq!(from_bytes, reparsed);
    }
}
