//! Filesystem image storage.
//!
//! Uploaded images live under the public directory in a fixed folder
//! convention: property images in `images/properties`, review author photos
//! in `images/reviews/users`. Records persist the assigned filename only;
//! deletion is keyed by filename and is best-effort.

use std::path::PathBuf;

use chrono::Utc;

use crate::{AppError, AppResult};

/// Destination folder for a stored image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFolder {
    /// Property listing images (also review photos uploaded with a property).
    Properties,
    /// Review author photos uploaded through the standalone review route.
    ReviewUsers,
}

impl ImageFolder {
    /// Path of this folder relative to the public directory.
    #[must_use]
    pub const fn as_path(self) -> &'static str {
        match self {
            Self::Properties => "images/properties",
            Self::ReviewUsers => "images/reviews/users",
        }
    }
}

/// Local filesystem image store.
#[derive(Debug, Clone)]
pub struct ImageStore {
    public_dir: PathBuf,
}

impl ImageStore {
    /// Create a new store rooted at the public directory.
    pub fn new(public_dir: impl Into<PathBuf>) -> Self {
        Self {
            public_dir: public_dir.into(),
        }
    }

    /// Store an uploaded image and return the assigned filename.
    ///
    /// Only MIME types beginning with `image/` are accepted; anything else
    /// is a validation error surfaced to the caller. Collisions are avoided
    /// by the millisecond timestamp in the filename, not by content hashing.
    pub async fn save(
        &self,
        folder: ImageFolder,
        original_name: &str,
        content_type: &str,
        data: &[u8],
    ) -> AppResult<String> {
        if !content_type.starts_with("image/") {
            return Err(AppError::Validation("Only images are allowed!".to_string()));
        }

        let dir = self.public_dir.join(folder.as_path());
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create directory: {e}")))?;

        let filename = storage_filename(original_name, Utc::now().timestamp_millis());
        tokio::fs::write(dir.join(&filename), data)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to write file: {e}")))?;

        Ok(filename)
    }

    /// Delete a stored image by filename, best-effort.
    ///
    /// A missing file or any other unlink failure is logged and swallowed;
    /// read-only-filesystem errors are not even logged. Orphaned files on
    /// disk are an accepted failure mode.
    pub async fn delete(&self, folder: ImageFolder, filename: &str) {
        let path = self.public_dir.join(folder.as_path()).join(filename);
        if let Err(err) = tokio::fs::remove_file(&path).await {
            if err.kind() != std::io::ErrorKind::ReadOnlyFilesystem {
                tracing::error!(path = %path.display(), error = %err, "Failed to delete image");
            }
        }
    }

}

/// Build the stored filename: sanitized base name, `-`, upload timestamp,
/// original extension.
fn storage_filename(original_name: &str, timestamp_millis: i64) -> String {
    // Drop any client-supplied directory components.
    let name = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original_name);

    let (base, ext) = match name.rfind('.') {
        Some(pos) if pos > 0 => (&name[..pos], &name[pos..]),
        _ => (name, ""),
    };

    let base = base.split_whitespace().collect::<Vec<_>>().join("-");

    format!("{base}-{timestamp_millis}{ext}")
}
