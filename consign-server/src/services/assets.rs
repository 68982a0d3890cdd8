//! Asset storage collaborator
//!
//! Photo bytes live outside the document store. The store only keeps
//! `PhotoRef` pairs, so the storage backend is swappable behind the
//! `AssetStorage` trait. The bundled implementation writes to the
//! local filesystem under the configured work directory.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::db::models::PhotoRef;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("Asset io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Asset backend error: {0}")]
    Backend(String),
}

/// A file received from a client, ready to be persisted
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait AssetStorage: Send + Sync {
    /// Persist the files, returning one `PhotoRef` per file in order
    async fn upload(&self, files: Vec<UploadFile>) -> Result<Vec<PhotoRef>, AssetError>;

    /// Remove assets by id. Deleting an already-deleted asset is not
    /// an error.
    async fn delete(&self, asset_ids: &[String]) -> Result<(), AssetError>;
}

/// Filesystem-backed storage. Asset ids are `{uuid}.{ext}` file names
/// relative to the storage root.
pub struct LocalAssetStorage {
    root: PathBuf,
    public_base: String,
}

impl LocalAssetStorage {
    pub fn new(root: impl Into<PathBuf>, public_base: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base: public_base.into(),
        }
    }

    pub async fn ensure_root(&self) -> Result<(), AssetError> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    fn extension_of(file_name: &str) -> &str {
        file_name.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("bin")
    }
}

#[async_trait]
impl AssetStorage for LocalAssetStorage {
    async fn upload(&self, files: Vec<UploadFile>) -> Result<Vec<PhotoRef>, AssetError> {
        let mut refs = Vec::with_capacity(files.len());
        for file in files {
            let ext = Self::extension_of(&file.file_name);
            let asset_id = format!("{}.{}", Uuid::new_v4(), ext);
            tokio::fs::write(self.root.join(&asset_id), &file.bytes).await?;
            refs.push(PhotoRef {
                url: format!("{}/{}", self.public_base, asset_id),
                asset_id,
            });
        }
        Ok(refs)
    }

    async fn delete(&self, asset_ids: &[String]) -> Result<(), AssetError> {
        for asset_id in asset_ids {
            match tokio::fs::remove_file(self.root.join(asset_id)).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upload_then_delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalAssetStorage::new(dir.path(), "/assets");

        let refs = storage
            .upload(vec![UploadFile {
                file_name: "chair.jpg".to_string(),
                content_type: "image/jpeg".to_string(),
                bytes: vec![1, 2, 3],
            }])
            .await
            .unwrap();
        assert_eq!(refs.len(), 1);
        assert!(refs[0].asset_id.ends_with(".jpg"));
        assert!(dir.path().join(&refs[0].asset_id).exists());

        let ids = vec![refs[0].asset_id.clone()];
        storage.delete(&ids).await.unwrap();
        assert!(!dir.path().join(&refs[0].asset_id).exists());
        // Second delete of the same asset must succeed
        storage.delete(&ids).await.unwrap();
    }
}
