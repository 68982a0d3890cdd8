//! Multipart form parsing for photo-carrying endpoints

use std::collections::HashMap;

use axum::extract::Multipart;

use crate::services::UploadFile;
use crate::utils::{AppError, AppResult};

/// A parsed multipart form: text fields by name plus the uploaded
/// photo files in submission order.
pub struct PhotoForm {
    fields: HashMap<String, String>,
    pub photos: Vec<UploadFile>,
}

impl PhotoForm {
    pub async fn parse(mut multipart: Multipart) -> AppResult<Self> {
        let mut fields = HashMap::new();
        let mut photos = Vec::new();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            if name == "photos" {
                let file_name = field.file_name().unwrap_or("photo.bin").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await?.to_vec();
                photos.push(UploadFile {
                    file_name,
                    content_type,
                    bytes,
                });
            } else {
                fields.insert(name, field.text().await?);
            }
        }
        Ok(Self { fields, photos })
    }

    pub fn text(&self, name: &str) -> AppResult<&str> {
        self.fields
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| AppError::Validation(format!("Missing field: {name}")))
    }

    /// Deserialize a JSON-encoded field
    pub fn json<T: serde::de::DeserializeOwned>(&self, name: &str) -> AppResult<T> {
        serde_json::from_str(self.text(name)?)
            .map_err(|e| AppError::Validation(format!("Invalid {name}: {e}")))
    }

    /// Deserialize a JSON-encoded field if present, default otherwise
    pub fn json_or_default<T>(&self, name: &str) -> AppResult<T>
    where
        T: serde::de::DeserializeOwned + Default,
    {
        match self.fields.get(name) {
            Some(raw) => serde_json::from_str(raw)
                .map_err(|e| AppError::Validation(format!("Invalid {name}: {e}"))),
            None => Ok(T::default()),
        }
    }
}
