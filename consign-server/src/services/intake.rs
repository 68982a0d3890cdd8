//! Intake query lifecycle
//!
//! Users submit candidate products, admins drive each submission
//! through pending → approved → success or reject it outright.
//! Owner edits and deletes are locked to the `pending` state; once an
//! admin has advanced a query its photo set and details are frozen
//! until promotion or rejection.

use std::sync::Arc;

use tracing::{info, warn};

use crate::db::models::{
    IntakeQuery, PhotoRef, PickupDetails, PickupPatch, ProductDetails, ProductPatch, QueryStatus,
    now_millis,
};
use crate::db::repository::IntakeQueryRepository;
use crate::services::assets::{AssetStorage, UploadFile};
use crate::services::mailer::{MailTemplate, Mailer};
use crate::utils::{
    AppError, AppResult, MAX_ADDRESS_LEN, MAX_DESCRIPTION_LEN, MAX_NAME_LEN, validate_email,
    validate_photo_count, validate_positive_amount, validate_required_text,
};

/// Product fields supplied at submission, photos uploaded separately
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub category: String,
    pub description: String,
    pub price: f64,
    pub stock: i64,
}

#[derive(Debug, Clone)]
pub struct SubmitQuery {
    pub owner_user_id: String,
    pub owner_email: String,
    pub product: ProductDraft,
    pub pickup: PickupDetails,
}

#[derive(Clone)]
pub struct IntakeService {
    queries: IntakeQueryRepository,
    assets: Arc<dyn AssetStorage>,
    mailer: Arc<dyn Mailer>,
}

impl IntakeService {
    pub fn new(
        queries: IntakeQueryRepository,
        assets: Arc<dyn AssetStorage>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            queries,
            assets,
            mailer,
        }
    }

    fn validate_product(details: &ProductDetails) -> AppResult<()> {
        validate_required_text(&details.name, "name", MAX_NAME_LEN)?;
        validate_required_text(&details.category, "category", MAX_NAME_LEN)?;
        validate_required_text(&details.description, "description", MAX_DESCRIPTION_LEN)?;
        validate_positive_amount(details.price, "price")?;
        if details.stock < 1 {
            return Err(AppError::Validation(
                "Stock must be at least 1".to_string(),
            ));
        }
        validate_photo_count(details.photos.len())?;
        Ok(())
    }

    fn validate_pickup(pickup: &PickupDetails) -> AppResult<()> {
        validate_required_text(&pickup.address, "address", MAX_ADDRESS_LEN)?;
        validate_required_text(&pickup.city, "city", MAX_NAME_LEN)?;
        validate_required_text(&pickup.postal_code, "postal code", 20)?;
        Ok(())
    }

    fn cleanup_assets(&self, refs: &[PhotoRef]) {
        let assets = Arc::clone(&self.assets);
        let ids: Vec<String> = refs.iter().map(|p| p.asset_id.clone()).collect();
        tokio::spawn(async move {
            if let Err(e) = assets.delete(&ids).await {
                warn!(error = %e, ?ids, "Photo asset cleanup failed");
            }
        });
    }

    /// Submit a new query with its photo files. Photos are uploaded
    /// first so the persisted document only ever references stored
    /// assets.
    pub async fn submit(&self, req: SubmitQuery, photos: Vec<UploadFile>) -> AppResult<IntakeQuery> {
        validate_required_text(&req.owner_user_id, "user id", MAX_NAME_LEN)?;
        validate_email(&req.owner_email, "email")?;
        validate_photo_count(photos.len())?;

        let refs = self.assets.upload(photos).await?;
        let now = now_millis();
        let query = IntakeQuery {
            id: None,
            owner_user_id: req.owner_user_id,
            owner_email: req.owner_email,
            product_details: ProductDetails {
                name: req.product.name,
                category: req.product.category,
                description: req.product.description,
                price: req.product.price,
                stock: req.product.stock,
                photos: refs.clone(),
            },
            pickup_details: req.pickup,
            status: QueryStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        if let Err(e) = Self::validate_product(&query.product_details)
            .and_then(|()| Self::validate_pickup(&query.pickup_details))
        {
            self.cleanup_assets(&refs);
            return Err(e);
        }

        match self.queries.create(query).await {
            Ok(created) => {
                info!(query_id = ?created.id, "Intake query submitted");
                Ok(created)
            }
            Err(e) => {
                // Orphaned uploads are reclaimed so storage does not leak
                self.cleanup_assets(&refs);
                Err(e.into())
            }
        }
    }

    /// Admin advance. Advancing a `success` query is a no-op success.
    pub async fn advance(&self, query_id: &str) -> AppResult<IntakeQuery> {
        let query = self
            .queries
            .find_by_id(query_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Query {query_id} not found")))?;
        if query.status == QueryStatus::Success {
            return Ok(query);
        }
        let updated = self
            .queries
            .update_status(query_id, query.status.next())
            .await?;
        info!(query_id, status = %updated.status, "Intake query advanced");
        Ok(updated)
    }

    /// Admin rejection: allowed from any state. The query is removed
    /// first, then the rejection email and asset cleanup are both
    /// attempted regardless of each other's outcome.
    pub async fn reject(&self, query_id: &str) -> AppResult<()> {
        let deleted = self
            .queries
            .delete(query_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Query {query_id} not found")))?;

        self.mailer
            .send(
                &deleted.owner_email,
                MailTemplate::QueryRejected,
                &deleted.product_details.name,
            )
            .await;
        self.cleanup_assets(&deleted.product_details.photos);
        info!(query_id, "Intake query rejected");
        Ok(())
    }

    /// Owner edit, `pending` only. New photos are stored before the
    /// old ones are removed so a failed write never loses the old set.
    pub async fn edit_by_owner(
        &self,
        query_id: &str,
        owner_user_id: &str,
        product_patch: ProductPatch,
        pickup_patch: PickupPatch,
        new_photos: Vec<UploadFile>,
    ) -> AppResult<IntakeQuery> {
        let mut query = self
            .queries
            .find_by_id(query_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Query {query_id} not found")))?;
        if query.owner_user_id != owner_user_id {
            return Err(AppError::Forbidden(
                "Not allowed to update this query".to_string(),
            ));
        }
        if query.status != QueryStatus::Pending {
            return Err(AppError::Conflict(
                "Cannot update a query after it has been approved".to_string(),
            ));
        }

        let old_photos = if new_photos.is_empty() {
            Vec::new()
        } else {
            validate_photo_count(new_photos.len())?;
            let refs = self.assets.upload(new_photos).await?;
            std::mem::replace(&mut query.product_details.photos, refs)
        };
        let new_refs = query.product_details.photos.clone();

        product_patch.apply(&mut query.product_details);
        pickup_patch.apply(&mut query.pickup_details);
        if let Err(e) = Self::validate_product(&query.product_details)
            .and_then(|()| Self::validate_pickup(&query.pickup_details))
        {
            if !old_photos.is_empty() {
                self.cleanup_assets(&new_refs);
            }
            return Err(e);
        }

        match self.queries.replace(query_id, query).await {
            Ok(updated) => {
                self.cleanup_assets(&old_photos);
                Ok(updated)
            }
            Err(e) => {
                if !old_photos.is_empty() {
                    self.cleanup_assets(&new_refs);
                }
                Err(e.into())
            }
        }
    }

    /// Owner delete, `pending` only. No notification email.
    pub async fn delete_by_owner(&self, query_id: &str, owner_user_id: &str) -> AppResult<()> {
        let query = self
            .queries
            .find_by_id(query_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Query {query_id} not found")))?;
        if query.owner_user_id != owner_user_id {
            return Err(AppError::Forbidden(
                "Not allowed to delete this query".to_string(),
            ));
        }
        if query.status != QueryStatus::Pending {
            return Err(AppError::Conflict(
                "Cannot delete a query after it has been approved".to_string(),
            ));
        }
        if self.queries.delete(query_id).await?.is_some() {
            self.cleanup_assets(&query.product_details.photos);
        }
        Ok(())
    }

    pub async fn get(&self, query_id: &str) -> AppResult<IntakeQuery> {
        self.queries
            .find_by_id(query_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Query {query_id} not found")))
    }

    pub async fn list_by_owner(&self, owner_user_id: &str) -> AppResult<Vec<IntakeQuery>> {
        Ok(self.queries.find_by_owner(owner_user_id).await?)
    }

    pub async fn list_by_status(&self, status: QueryStatus) -> AppResult<Vec<IntakeQuery>> {
        Ok(self.queries.find_by_status(status).await?)
    }
}
