//! Listing Repository
//!
//! Owns the two operations with real invariants:
//! - `promote_from_query`: listing creation and query deletion inside
//!   one storage transaction, deduplicated on `promoted_from` so a
//!   retried promotion can never create a second listing.
//! - `decrement_stock`: a single conditional update so two concurrent
//!   sales of the last unit cannot both succeed against a stale read.

use surrealdb::{RecordId, Surreal};
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoError, RepoResult, strip_table_prefix};
use crate::db::models::{Listing, now_millis};
use crate::db::repository::intake_query::QUERY_TABLE;

pub const LISTING_TABLE: &str = "listing";

/// Price sort direction for listing search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Search parameters for the public listing catalog
#[derive(Debug, Clone, Default)]
pub struct ListingSearch {
    /// Case-insensitive substring match on the product name
    pub search: Option<String>,
    /// Exact category match (lower-cased)
    pub category: Option<String>,
    /// Upper bound on the seller price
    pub max_price: Option<f64>,
    /// Optional price sort; newest first when absent
    pub sort: Option<SortOrder>,
    /// 1-based page number
    pub page: usize,
    pub per_page: usize,
}

#[derive(Clone)]
pub struct ListingRepository {
    base: BaseRepository,
}

impl ListingRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    fn record_id(id: &str) -> RecordId {
        RecordId::from_table_key(LISTING_TABLE, strip_table_prefix(LISTING_TABLE, id))
    }

    // =========================================================================
    // Promotion
    // =========================================================================

    /// Promote a `success`-status intake query into a listing.
    ///
    /// Runs as one transaction: guard on query existence and status,
    /// dedup on `promoted_from`, create the listing (category
    /// lower-cased), delete the query. Either everything commits or
    /// nothing does.
    pub async fn promote_from_query(
        &self,
        query_id: &str,
        commission: f64,
    ) -> RepoResult<Listing> {
        let pure_id = strip_table_prefix(QUERY_TABLE, query_id).to_string();
        let now = now_millis();

        let result = self
            .base
            .db()
            .query(
                r#"
                BEGIN TRANSACTION;
                LET $q = (SELECT * FROM ONLY type::thing('intake_query', $qid));
                IF $q == NONE { THROW "query not found" };
                IF $q.status != 'success' { THROW "query not ready" };
                LET $dup = (SELECT VALUE id FROM listing WHERE promoted_from = $qid LIMIT 1);
                IF array::len($dup) > 0 { THROW "already promoted" };
                CREATE listing CONTENT {
                    seller_user_id: $q.owner_user_id,
                    seller_email: $q.owner_email,
                    product_details: {
                        name: $q.product_details.name,
                        category: string::lowercase($q.product_details.category),
                        description: $q.product_details.description,
                        price: $q.product_details.price,
                        stock: $q.product_details.stock,
                        photos: $q.product_details.photos
                    },
                    commission: $commission,
                    promoted_from: $qid,
                    created_at: $now,
                    updated_at: $now
                };
                DELETE type::thing('intake_query', $qid);
                COMMIT TRANSACTION;
                "#,
            )
            .bind(("qid", pure_id.clone()))
            .bind(("commission", commission))
            .bind(("now", now))
            .await?
            .check();

        if let Err(e) = result {
            let msg = e.to_string();
            return Err(if msg.contains("query not found") {
                RepoError::NotFound(format!("Intake query {} not found", query_id))
            } else if msg.contains("query not ready") {
                RepoError::Conflict(format!(
                    "Intake query {} is not in success status",
                    query_id
                ))
            } else if msg.contains("already promoted") {
                RepoError::Conflict(format!("Intake query {} was already promoted", query_id))
            } else {
                RepoError::Database(msg)
            });
        }

        self.find_by_promoted_from(&pure_id)
            .await?
            .ok_or_else(|| RepoError::Database("Promoted listing missing after commit".to_string()))
    }

    pub async fn find_by_promoted_from(&self, query_id: &str) -> RepoResult<Option<Listing>> {
        let pure_id = strip_table_prefix(QUERY_TABLE, query_id).to_string();
        let listings: Vec<Listing> = self
            .base
            .db()
            .query("SELECT * FROM listing WHERE promoted_from = $qid")
            .bind(("qid", pure_id))
            .await?
            .take(0)?;
        Ok(listings.into_iter().next())
    }

    // =========================================================================
    // Stock
    // =========================================================================

    /// Atomically decrement stock if enough units remain.
    ///
    /// The condition and the decrement execute as one statement, so
    /// concurrent calls serialize on the store: at most one caller
    /// wins the last unit. Returns the post-decrement record.
    pub async fn decrement_stock(&self, id: &str, quantity: i64) -> RepoResult<Listing> {
        let thing = Self::record_id(id);
        let mut result = self
            .base
            .db()
            .query(
                "UPDATE $thing SET product_details.stock -= $qty, updated_at = $now \
                 WHERE product_details.stock >= $qty RETURN AFTER",
            )
            .bind(("thing", thing))
            .bind(("qty", quantity))
            .bind(("now", now_millis()))
            .await?;
        let listings: Vec<Listing> = result.take(0)?;

        match listings.into_iter().next() {
            Some(listing) => Ok(listing),
            // Empty result: either the record is gone or the guard failed
            None => match self.find_by_id(id).await? {
                Some(listing) => Err(RepoError::InsufficientStock(format!(
                    "Listing {} has {} units, requested {}",
                    id, listing.product_details.stock, quantity
                ))),
                None => Err(RepoError::NotFound(format!("Listing {} not found", id))),
            },
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Listing>> {
        let listing: Option<Listing> = self.base.db().select(Self::record_id(id)).await?;
        Ok(listing)
    }

    pub async fn find_all(&self) -> RepoResult<Vec<Listing>> {
        let listings: Vec<Listing> = self
            .base
            .db()
            .query("SELECT * FROM listing ORDER BY created_at DESC")
            .await?
            .take(0)?;
        Ok(listings)
    }

    pub async fn find_by_seller(&self, seller_user_id: &str) -> RepoResult<Vec<Listing>> {
        let listings: Vec<Listing> = self
            .base
            .db()
            .query("SELECT * FROM listing WHERE seller_user_id = $seller ORDER BY created_at DESC")
            .bind(("seller", seller_user_id.to_string()))
            .await?
            .take(0)?;
        Ok(listings)
    }

    /// Newest listings for the storefront strip
    pub async fn find_latest(&self, limit: usize) -> RepoResult<Vec<Listing>> {
        let listings: Vec<Listing> = self
            .base
            .db()
            .query(format!(
                "SELECT * FROM listing ORDER BY created_at DESC LIMIT {limit}"
            ))
            .await?
            .take(0)?;
        Ok(listings)
    }

    /// All categories currently listed (deduplicated, sorted)
    pub async fn categories(&self) -> RepoResult<Vec<String>> {
        let mut categories: Vec<String> = self
            .base
            .db()
            .query("SELECT VALUE product_details.category FROM listing")
            .await?
            .take(0)?;
        categories.sort();
        categories.dedup();
        Ok(categories)
    }

    /// Filtered, sorted, paginated search plus the total page count
    pub async fn search(&self, params: &ListingSearch) -> RepoResult<(Vec<Listing>, usize)> {
        let mut conditions: Vec<&str> = Vec::new();
        if params.search.is_some() {
            conditions.push(
                "string::contains(string::lowercase(product_details.name), string::lowercase($search))",
            );
        }
        if params.category.is_some() {
            conditions.push("product_details.category = string::lowercase($category)");
        }
        if params.max_price.is_some() {
            conditions.push("product_details.price <= $max_price");
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let order_clause = match params.sort {
            Some(SortOrder::Asc) => "ORDER BY product_details.price ASC",
            Some(SortOrder::Desc) => "ORDER BY product_details.price DESC",
            None => "ORDER BY created_at DESC",
        };

        let per_page = params.per_page.max(1);
        let page = params.page.max(1);
        let start = (page - 1) * per_page;

        let page_query = format!(
            "SELECT * FROM listing {where_clause} {order_clause} LIMIT {per_page} START {start}"
        );
        let count_query = format!("SELECT count() AS total FROM listing {where_clause} GROUP ALL");

        let mut page_q = self.base.db().query(page_query);
        if let Some(v) = &params.search {
            page_q = page_q.bind(("search", v.clone()));
        }
        if let Some(v) = &params.category {
            page_q = page_q.bind(("category", v.clone()));
        }
        if let Some(v) = params.max_price {
            page_q = page_q.bind(("max_price", v));
        }
        let listings: Vec<Listing> = page_q.await?.take(0)?;

        #[derive(serde::Deserialize)]
        struct CountRow {
            total: i64,
        }
        let mut count_q = self.base.db().query(count_query);
        if let Some(v) = &params.search {
            count_q = count_q.bind(("search", v.clone()));
        }
        if let Some(v) = &params.category {
            count_q = count_q.bind(("category", v.clone()));
        }
        if let Some(v) = params.max_price {
            count_q = count_q.bind(("max_price", v));
        }
        let counts: Vec<CountRow> = count_q.await?.take(0)?;
        let total = counts.first().map(|c| c.total).unwrap_or(0) as usize;
        let total_pages = total.div_ceil(per_page);

        Ok((listings, total_pages))
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Replace the whole document (admin edits)
    pub async fn replace(&self, id: &str, mut listing: Listing) -> RepoResult<Listing> {
        listing.id = None;
        listing.updated_at = now_millis();
        let updated: Option<Listing> = self
            .base
            .db()
            .update(Self::record_id(id))
            .content(listing)
            .await?;
        updated.ok_or_else(|| RepoError::NotFound(format!("Listing {} not found", id)))
    }

    /// Delete, returning the removed record if it existed
    pub async fn delete(&self, id: &str) -> RepoResult<Option<Listing>> {
        let deleted: Option<Listing> = self.base.db().delete(Self::record_id(id)).await?;
        Ok(deleted)
    }
}
