//! Recording fakes for the collaborator traits

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use uuid::Uuid;

use crate::db::models::PhotoRef;
use crate::services::assets::{AssetError, AssetStorage, UploadFile};
use crate::services::mailer::{MailTemplate, Mailer};

/// Asset storage that keeps nothing and records everything
pub struct MockAssets {
    uploaded: AtomicUsize,
    deleted: Mutex<Vec<Vec<String>>>,
    fail_upload: bool,
    fail_delete: bool,
}

impl MockAssets {
    pub fn new() -> Self {
        Self {
            uploaded: AtomicUsize::new(0),
            deleted: Mutex::new(Vec::new()),
            fail_upload: false,
            fail_delete: false,
        }
    }

    pub fn failing_upload() -> Self {
        Self {
            fail_upload: true,
            ..Self::new()
        }
    }

    pub fn failing_delete() -> Self {
        Self {
            fail_delete: true,
            ..Self::new()
        }
    }

    pub fn uploaded_count(&self) -> usize {
        self.uploaded.load(Ordering::SeqCst)
    }

    /// Number of delete calls attempted, including failed ones
    pub fn deleted_count(&self) -> usize {
        self.deleted.lock().unwrap().len()
    }

    pub fn deleted_ids(&self) -> Vec<String> {
        self.deleted.lock().unwrap().iter().flatten().cloned().collect()
    }
}

#[async_trait]
impl AssetStorage for MockAssets {
    async fn upload(&self, files: Vec<UploadFile>) -> Result<Vec<PhotoRef>, AssetError> {
        if self.fail_upload {
            return Err(AssetError::Backend("upload unavailable".to_string()));
        }
        self.uploaded.fetch_add(files.len(), Ordering::SeqCst);
        Ok(files
            .iter()
            .map(|f| {
                let asset_id = format!("{}-{}", Uuid::new_v4(), f.file_name);
                PhotoRef {
                    url: format!("/assets/{asset_id}"),
                    asset_id,
                }
            })
            .collect())
    }

    async fn delete(&self, asset_ids: &[String]) -> Result<(), AssetError> {
        self.deleted.lock().unwrap().push(asset_ids.to_vec());
        if self.fail_delete {
            return Err(AssetError::Backend("delete unavailable".to_string()));
        }
        Ok(())
    }
}

/// Mailer that records sends instead of delivering
pub struct MockMailer {
    sent: Mutex<Vec<(String, MailTemplate, String)>>,
}

impl MockMailer {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
        }
    }

    /// (recipient, template, product name) triples in send order
    pub fn sent(&self) -> Vec<(String, MailTemplate, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for MockMailer {
    async fn send(&self, to: &str, template: MailTemplate, product_name: &str) {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), template, product_name.to_string()));
    }
}
