//! Saved-listing accessor: a renter's bookmarks.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use rt_api::Backend;
use rt_core::constants::tables;
use rt_core::error::RtResult;
use rt_models::query::Query;
use rt_models::schema;
use rt_models::SavedListing;

use crate::accessor::{decode_rows, decode_single, require_principal, Accessor};

#[derive(Clone)]
pub struct SavedListingService {
    backend: Arc<dyn Backend>,
}

impl SavedListingService {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    pub async fn save_listing(&self, listing_id: Uuid) -> RtResult<SavedListing> {
        let caller = require_principal(self.backend.as_ref()).await?;
        let query = Query::table(tables::SAVED_LISTINGS);
        let rows = self
            .backend
            .insert(&query, SavedListing::new_row(caller.id, listing_id))
            .await?;
        decode_single(rows)
    }

    pub async fn unsave_listing(&self, listing_id: Uuid) -> RtResult<()> {
        let caller = require_principal(self.backend.as_ref()).await?;
        let query = Query::table(tables::SAVED_LISTINGS)
            .eq("renter_id", caller.id)
            .eq("listing_id", listing_id);
        self.backend.delete(&query).await
    }

    /// The caller's bookmarks with listing and homeowner, newest first.
    pub async fn get_saved_listings(&self) -> RtResult<Vec<SavedListing>> {
        let caller = require_principal(self.backend.as_ref()).await?;
        let query = Query::table(tables::SAVED_LISTINGS)
            .select(schema::SAVED_LISTING_WITH_LISTING)
            .eq("renter_id", caller.id)
            .order("created_at", false);
        decode_rows(self.backend.select(&query).await?)
    }

    /// Whether the caller has bookmarked `listing_id`. Signed out is `false`.
    pub async fn is_listing_saved(&self, listing_id: Uuid) -> RtResult<bool> {
        let Some(caller) = self.backend.current_user().await? else {
            debug!("is_listing_saved without a caller");
            return Ok(false);
        };
        let query = Query::table(tables::SAVED_LISTINGS)
            .select(schema::ID_ONLY)
            .eq("renter_id", caller.id)
            .eq("listing_id", listing_id);
        let rows = self.backend.select(&query).await?;
        Ok(rt_api::maybe_single(rows)?.is_some())
    }
}

impl Accessor for SavedListingService {
    fn name(&self) -> &'static str {
        "saved_listings"
    }
}
