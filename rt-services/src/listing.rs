//! Listing accessor: listing CRUD, search, view counting, and stats.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use rt_api::Backend;
use rt_core::constants::{rpc, tables};
use rt_core::error::RtResult;
use rt_models::query::Query;
use rt_models::schema;
use rt_models::{
    ApplicationStatus, Listing, ListingFilters, ListingStats, ListingUpdate, ListingViews,
    NewListing,
};

use crate::accessor::{decode_maybe_single, decode_rows, decode_single, require_principal, Accessor};

/// Reads and writes room listings.
#[derive(Clone)]
pub struct ListingService {
    backend: Arc<dyn Backend>,
}

impl ListingService {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Create a listing owned by the caller.
    pub async fn create_listing(&self, data: NewListing) -> RtResult<Listing> {
        let caller = require_principal(self.backend.as_ref()).await?;
        let query = Query::table(tables::ROOM_LISTINGS);
        let rows = self.backend.insert(&query, data.into_row(caller.id)).await?;
        let listing: Listing = decode_single(rows)?;
        info!("created listing {} for {}", listing.id, caller.id);
        Ok(listing)
    }

    pub async fn update_listing(&self, listing_id: Uuid, updates: &ListingUpdate) -> RtResult<Listing> {
        let query = Query::table(tables::ROOM_LISTINGS).eq("id", listing_id);
        let rows = self.backend.update(&query, serde_json::to_value(updates)?).await?;
        decode_single(rows)
    }

    pub async fn delete_listing(&self, listing_id: Uuid) -> RtResult<()> {
        let query = Query::table(tables::ROOM_LISTINGS).eq("id", listing_id);
        self.backend.delete(&query).await?;
        info!("deleted listing {listing_id}");
        Ok(())
    }

    /// One listing with its homeowner card, or `None`.
    pub async fn get_listing(&self, listing_id: Uuid) -> RtResult<Option<Listing>> {
        let query = Query::table(tables::ROOM_LISTINGS)
            .select(schema::LISTING_WITH_HOMEOWNER)
            .eq("id", listing_id);
        decode_maybe_single(self.backend.select(&query).await?)
    }

    /// Active listings, newest first, narrowed by `filters`.
    pub async fn get_all_listings(&self, filters: &ListingFilters) -> RtResult<Vec<Listing>> {
        let query = Query::table(tables::ROOM_LISTINGS)
            .select(schema::LISTING_SEARCH)
            .eq("is_active", true)
            .order("created_at", false);
        let query = filters.apply(query);
        decode_rows(self.backend.select(&query).await?)
    }

    /// The caller's own listings, newest first.
    pub async fn get_my_listings(&self) -> RtResult<Vec<Listing>> {
        let caller = require_principal(self.backend.as_ref()).await?;
        let query = Query::table(tables::ROOM_LISTINGS)
            .eq("homeowner_id", caller.id)
            .order("created_at", false);
        decode_rows(self.backend.select(&query).await?)
    }

    pub async fn increment_view_count(&self, listing_id: Uuid) -> RtResult<()> {
        self.backend
            .rpc(rpc::INCREMENT_LISTING_VIEWS, json!({ "listing_uuid": listing_id }))
            .await?;
        Ok(())
    }

    /// Views and application counts across a homeowner's listings.
    ///
    /// Three separate reads; the numbers may come from different moments.
    pub async fn get_listing_stats(&self, homeowner_id: Uuid) -> RtResult<ListingStats> {
        let query = Query::table(tables::ROOM_LISTINGS)
            .select(schema::LISTING_VIEWS)
            .eq("homeowner_id", homeowner_id);
        let listings: Vec<ListingViews> = decode_rows(self.backend.select(&query).await?)?;

        if listings.is_empty() {
            debug!("homeowner {homeowner_id} has no listings");
            return Ok(ListingStats::default());
        }

        let total_views = listings.iter().map(|l| l.view_count.unwrap_or(0)).sum();
        let ids: Vec<Uuid> = listings.iter().map(|l| l.id).collect();

        let applications = Query::table(tables::APPLICATIONS).in_list("listing_id", &ids);
        let total_applications = self.backend.count(&applications).await?.unwrap_or(0);

        let pending = applications.eq("status", ApplicationStatus::Pending);
        let new_applications = self.backend.count(&pending).await?.unwrap_or(0);

        Ok(ListingStats {
            total_views,
            total_applications,
            new_applications,
        })
    }
}

impl Accessor for ListingService {
    fn name(&self) -> &'static str {
        "listings"
    }
}
