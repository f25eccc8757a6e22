//! Image payloads and `data:` URI conversion.

use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::error::{PalaceError, Result};

/// Raw image bytes plus their mime type.
#[derive(Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub mime_type: String,
    pub data: Vec<u8>,
}

// Payloads are megabytes of bytes; keep Debug output readable.
impl std::fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImagePayload")
            .field("mime_type", &self.mime_type)
            .field("len", &self.data.len())
            .finish()
    }
}

impl ImagePayload {
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Read an uploaded photo from disk, inferring the mime type from its extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let mime_type = mime_for_path(path).ok_or_else(|| {
            PalaceError::Validation(format!(
                "Unsupported image type: {}. Use a PNG, JPEG, WEBP or GIF file.",
                path.display()
            ))
        })?;
        let data = std::fs::read(path).map_err(|e| {
            PalaceError::Validation(format!("Could not read {}: {e}", path.display()))
        })?;
        Ok(Self::new(mime_type, data))
    }

    pub fn base64(&self) -> String {
        BASE64.encode(&self.data)
    }

    /// `data:<mime>;base64,<payload>`
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64())
    }

    /// Parse a `data:<mime>;base64,<payload>` URI.
    pub fn from_data_url(url: &str) -> Result<Self> {
        let invalid = || PalaceError::Validation("Invalid data URL format".into());

        let rest = url.strip_prefix("data:").ok_or_else(invalid)?;
        let (header, payload) = rest.split_once(',').ok_or_else(invalid)?;
        let mime_type = header.strip_suffix(";base64").ok_or_else(invalid)?;
        if mime_type.is_empty() || payload.is_empty() {
            return Err(invalid());
        }
        let data = BASE64.decode(payload.trim()).map_err(|_| invalid())?;
        Ok(Self::new(mime_type, data))
    }

    /// File extension matching the mime type, for exporting images.
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "png",
        }
    }
}

pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_url_parses_mime_and_bytes() {
        let image = ImagePayload::new("image/jpeg", vec![1, 2, 3, 250]);
        let url = image.to_data_url();
        assert!(url.starts_with("data:image/jpeg;base64,"));
        assert_eq!(ImagePayload::from_data_url(&url).unwrap(), image);
    }

    #[test]
    fn malformed_data_urls_are_rejected() {
        for url in [
            "https://example.com/a.png",
            "data:image/png;base64",
            "data:;base64,AAAA",
            "data:image/png,AAAA",
            "data:image/png;base64,",
            "data:image/png;base64,@@@",
        ] {
            let err = ImagePayload::from_data_url(url).unwrap_err();
            assert!(matches!(err, PalaceError::Validation(_)), "{url}");
        }
    }

    #[test]
    fn mime_detection_by_extension() {
        assert_eq!(mime_for_path(Path::new("a/b.PNG")), Some("image/png"));
        assert_eq!(mime_for_path(Path::new("photo.jpeg")), Some("image/jpeg"));
        assert_eq!(mime_for_path(Path::new("notes.txt")), None);
        assert_eq!(mime_for_path(Path::new("noext")), None);
    }

    #[test]
    fn from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("desk.png");
        std::fs::write(&path, [137, 80, 78, 71]).unwrap();

        let image = ImagePayload::from_path(&path).unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data, vec![137, 80, 78, 71]);
        assert_eq!(image.extension(), "png");
    }
}
