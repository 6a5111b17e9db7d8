//! Local image files selected for upload.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

/// Content type used when the extension is not a known image type.
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Normalizes user-provided file paths.
///
/// Handles drag-and-drop shell escaping (`\ `, `\(`, `\)`) and expands `~/`
/// to the home directory when available.
#[must_use]
pub fn normalize_input_path(path: &str) -> PathBuf {
    let unescaped = path
        .trim()
        .replace("\\ ", " ")
        .replace("\\(", "(")
        .replace("\\)", ")");

    if let Some(rest) = unescaped.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }

    PathBuf::from(unescaped)
}

/// Image MIME type inferred from the file extension.
#[must_use]
pub fn content_type_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension().and_then(|e| e.to_str())?;

    match ext.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

/// An image read from disk, ready to upload.
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    /// Reads an image from a user-supplied path.
    ///
    /// # Errors
    /// Returns an error if the path is not a readable, non-empty file.
    pub async fn load(input: &str) -> Result<Self> {
        let path = normalize_input_path(input);
        let bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("Failed to read image {}", path.display()))?;
        if bytes.is_empty() {
            bail!("Image {} is empty", path.display());
        }
        Ok(Self::from_bytes(&path, bytes))
    }

    pub fn from_bytes(path: &Path, bytes: Vec<u8>) -> Self {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("image")
            .to_string();
        let content_type = content_type_for_path(path)
            .unwrap_or(FALLBACK_CONTENT_TYPE)
            .to_string();
        Self {
            file_name,
            content_type,
            bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_normalize_unescapes_shell_characters() {
        assert_eq!(
            normalize_input_path(r"/tmp/my\ photo\ \(1\).png"),
            PathBuf::from("/tmp/my photo (1).png")
        );
    }

    #[test]
    fn test_normalize_expands_home() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(normalize_input_path("~/a.png"), home.join("a.png"));
        }
    }

    #[test]
    fn test_content_type_for_path() {
        assert_eq!(content_type_for_path(Path::new("a.PNG")), Some("image/png"));
        assert_eq!(content_type_for_path(Path::new("a.jpeg")), Some("image/jpeg"));
        assert_eq!(content_type_for_path(Path::new("a.txt")), None);
        assert_eq!(content_type_for_path(Path::new("noext")), None);
    }

    #[tokio::test]
    async fn test_load_reads_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("avatar.webp");
        std::fs::write(&path, b"RIFF").unwrap();

        let image = ImageFile::load(path.to_str().unwrap()).await.unwrap();
        assert_eq!(image.file_name, "avatar.webp");
        assert_eq!(image.content_type, "image/webp");
        assert_eq!(image.bytes, b"RIFF");
    }

    #[tokio::test]
    async fn test_load_rejects_empty_and_missing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.png");
        std::fs::write(&path, b"").unwrap();
        assert!(ImageFile::load(path.to_str().unwrap()).await.is_err());
        assert!(ImageFile::load("/definitely/not/here.png").await.is_err());
    }
}
