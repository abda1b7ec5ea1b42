use std::path::{Path, PathBuf};

use anyhow::Context;
use time::OffsetDateTime;
use tokio::fs;

use crate::error::AppError;

pub const PROFILE_DIR: &str = "profiles";
pub const QR_DIR: &str = "qr_codes";
pub const PAGE_DIR: &str = "pages";

pub const MAX_PROFILE_PIC_BYTES: usize = 2 * 1024 * 1024;

/// Filesystem store rooted at the configured upload directory.
///
/// Layout: `profiles/` for avatars, `qr_codes/` for generated PNG/SVG,
/// `pages/` for generated landing pages; uploaded videos land directly
/// under the root with a timestamp-prefixed name.
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn ensure_layout(&self) -> anyhow::Result<()> {
        for dir in [PROFILE_DIR, QR_DIR, PAGE_DIR] {
            fs::create_dir_all(self.root.join(dir))
                .await
                .with_context(|| format!("create upload dir {dir}"))?;
        }
        Ok(())
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    pub async fn write(&self, relative: &str, data: &[u8]) -> anyhow::Result<()> {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, data)
            .await
            .with_context(|| format!("write {relative}"))
    }

    pub async fn read(&self, relative: &str) -> std::io::Result<Vec<u8>> {
        fs::read(self.path(relative)).await
    }

    pub async fn remove(&self, relative: &str) -> std::io::Result<()> {
        fs::remove_file(self.path(relative)).await
    }

    /// Stores an uploaded video under the root, keyed by a millisecond
    /// timestamp so repeated uploads of the same file never collide.
    /// Returns the stored filename.
    pub async fn save_video(&self, original_name: &str, data: &[u8]) -> anyhow::Result<String> {
        let filename = format!("{}_{}", now_millis(), sanitize_filename(original_name));
        self.write(&filename, data).await?;
        Ok(filename)
    }

    /// Stores a profile picture. Only `image/*` content types are
    /// accepted and the payload is capped at 2 MB. Returns the path
    /// relative to the upload root.
    pub async fn save_profile_pic(
        &self,
        content_type: &str,
        data: &[u8],
    ) -> Result<String, AppError> {
        if !content_type.starts_with("image/") {
            return Err(AppError::UnsupportedMediaType(format!(
                "expected an image, got {content_type}"
            )));
        }
        if data.len() > MAX_PROFILE_PIC_BYTES {
            return Err(AppError::PayloadTooLarge(
                "profile picture exceeds 2 MB".into(),
            ));
        }
        let ext = ext_from_mime(content_type).unwrap_or("bin");
        let relative = format!("{PROFILE_DIR}/{}.{ext}", now_millis());
        self.write(&relative, data).await?;
        Ok(relative)
    }
}

fn now_millis() -> i128 {
    OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

/// Keeps uploaded names safe to embed in paths and URLs.
fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "upload".into()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ext_from_mime() {
        assert_eq!(ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/png"), Some("png"));
        assert_eq!(ext_from_mime("video/mp4"), None);
    }

    #[test]
    fn sanitize_strips_path_separators() {
        // Dots are kept (extensions survive); separators become dashes.
        let cleaned = sanitize_filename("../../etc/passwd");
        assert_eq!(cleaned, "..-..-etc-passwd");
        assert!(!cleaned.contains('/'));
        assert_eq!(sanitize_filename("clip one.mp4"), "clip-one.mp4");
        assert_eq!(sanitize_filename("a\\b..mp4"), "a-b..mp4");
        assert_eq!(sanitize_filename(""), "upload");
    }

    #[tokio::test]
    async fn save_video_prefixes_timestamp_and_keeps_extension() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path());
        let name = storage.save_video("clip.mp4", b"not really mp4").await.unwrap();
        assert!(name.ends_with("_clip.mp4"));
        let (stamp, _) = name.split_once('_').unwrap();
        assert!(stamp.parse::<i128>().is_ok());
        assert!(storage.path(&name).exists());
    }

    #[tokio::test]
    async fn profile_pic_rejects_non_image() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path());
        let err = storage
            .save_profile_pic("video/mp4", b"data")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UnsupportedMediaType(_)));
    }

    #[tokio::test]
    async fn profile_pic_rejects_oversized_payload() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path());
        let big = vec![0u8; MAX_PROFILE_PIC_BYTES + 1];
        let err = storage.save_profile_pic("image/png", &big).await.unwrap_err();
        assert!(matches!(err, AppError::PayloadTooLarge(_)));
    }

    #[tokio::test]
    async fn profile_pic_lands_under_profiles_dir() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path());
        let rel = storage
            .save_profile_pic("image/png", b"png bytes")
            .await
            .unwrap();
        assert!(rel.starts_with("profiles/"));
        assert!(rel.ends_with(".png"));
        assert!(storage.path(&rel).exists());
    }

    #[tokio::test]
    async fn remove_missing_file_reports_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path());
        let err = storage.remove("pages/nope.html").await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
