//! Filesystem image store for user and game pictures.
//!
//! Images are stored flat under a single directory with deterministic names
//! (`user_{id}.{ext}`, `game_{id}.{ext}`); the database keeps only the filename.

use std::io;
use std::path::PathBuf;

/// Supported image encodings, keyed by their declared MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
    Gif,
}

impl ImageKind {
    /// Map a `Content-Type` header value to an image kind. Parameters after `;` are ignored.
    #[must_use]
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let mime = content_type.split(';').next().unwrap_or("").trim();
        match mime.to_ascii_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" => Some(Self::Jpeg),
            "image/gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Infer the kind from a stored filename's extension.
    #[must_use]
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, ext) = filename.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }

    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Gif => "gif",
        }
    }

    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
        }
    }
}

/// Which entity an image belongs to; decides the filename prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageOwner {
    User,
    Game,
}

impl ImageOwner {
    const fn prefix(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Game => "game",
        }
    }
}

/// Directory-backed image store.
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Deterministic filename for an owner's image of the given kind.
    #[must_use]
    pub fn filename(owner: ImageOwner, id: i32, kind: ImageKind) -> String {
        format!("{}_{id}.{}", owner.prefix(), kind.extension())
    }

    /// Write `bytes` under `filename`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file cannot be written.
    pub async fn write(&self, filename: &str, bytes: &[u8]) -> io::Result<()> {
        let path = self.path_for(filename)?;
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(&path, bytes).await?;
        tracing::debug!(path = %path.display(), size = bytes.len(), "Image written");
        Ok(())
    }

    /// Read the file stored under `filename`, or `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error for any I/O failure other than the file being absent.
    pub async fn read(&self, filename: &str) -> io::Result<Option<Vec<u8>>> {
        let path = self.path_for(filename)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Remove the file stored under `filename`. Removing a missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error for any I/O failure other than the file being absent.
    pub async fn remove(&self, filename: &str) -> io::Result<()> {
        let path = self.path_for(filename)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn path_for(&self, filename: &str) -> io::Result<PathBuf> {
        if filename.is_empty()
            || filename.contains(['/', '\\'])
            || filename.starts_with('.')
        {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid image filename: {filename:?}"),
            ));
        }
        Ok(self.root.join(filename))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn content_type_mapping() {
        assert_eq!(ImageKind::from_content_type("image/png"), Some(ImageKind::Png));
        assert_eq!(
            ImageKind::from_content_type("image/jpeg; charset=binary"),
            Some(ImageKind::Jpeg)
        );
        assert_eq!(ImageKind::from_content_type("IMAGE/GIF"), Some(ImageKind::Gif));
        assert_eq!(ImageKind::from_content_type("image/webp"), None);
        assert_eq!(ImageKind::from_content_type("text/plain"), None);
    }

    #[test]
    fn filename_round_trips_kind() {
        let name = ImageStore::filename(ImageOwner::Game, 7, ImageKind::Jpeg);
        assert_eq!(name, "game_7.jpg");
        assert_eq!(ImageKind::from_filename(&name), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::from_filename("user_3.jpeg"), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::from_filename("noext"), None);
    }

    #[tokio::test]
    async fn write_read_remove() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ImageStore::new(dir.path().join("images"));

        assert_eq!(store.read("user_1.png").await.ok().flatten(), None);

        store
            .write("user_1.png", b"\x89PNG")
            .await
            .expect("write image");
        assert_eq!(
            store.read("user_1.png").await.ok().flatten(),
            Some(b"\x89PNG".to_vec())
        );

        assert!(store.remove("user_1.png").await.is_ok());
        assert!(store.remove("user_1.png").await.is_ok());
        assert_eq!(store.read("user_1.png").await.ok().flatten(), None);
    }

    #[tokio::test]
    async fn rejects_path_traversal() {
        let store = ImageStore::new("unused");
        assert!(store.read("../secret").await.is_err());
        assert!(store.write(".hidden", b"x").await.is_err());
    }
}
