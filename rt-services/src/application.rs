//! Application accessor: rental applications, scoped by who is asking.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use rt_api::Backend;
use rt_core::constants::tables;
use rt_core::error::RtResult;
use rt_models::query::Query;
use rt_models::schema;
use rt_models::{Application, ApplicationStatus};

use crate::accessor::{decode_rows, decode_single, require_principal, Accessor};

/// Reads and writes rental applications.
#[derive(Clone)]
pub struct ApplicationService {
    backend: Arc<dyn Backend>,
}

impl ApplicationService {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Apply to a listing as the caller. The application starts `pending`;
    /// a blank message is stored as null.
    pub async fn create_application(
        &self,
        listing_id: Uuid,
        message: Option<String>,
    ) -> RtResult<Application> {
        let caller = require_principal(self.backend.as_ref()).await?;
        let query = Query::table(tables::APPLICATIONS).select(schema::APPLICATION_CREATED);
        let rows = self
            .backend
            .insert(&query, Application::new_row(listing_id, caller.id, message))
            .await?;
        let application: Application = decode_single(rows)?;
        info!("{} applied to listing {listing_id}", caller.id);
        Ok(application)
    }

    pub async fn update_application_status(
        &self,
        application_id: Uuid,
        status: ApplicationStatus,
    ) -> RtResult<Application> {
        let query = Query::table(tables::APPLICATIONS).eq("id", application_id);
        let rows = self
            .backend
            .update(&query, Application::status_patch(status))
            .await?;
        let application: Application = decode_single(rows)?;
        info!("application {application_id} is now {}", application.status);
        Ok(application)
    }

    /// Applications the caller has submitted, newest first.
    pub async fn get_my_applications(&self) -> RtResult<Vec<Application>> {
        let caller = require_principal(self.backend.as_ref()).await?;
        let query = Query::table(tables::APPLICATIONS)
            .select(schema::APPLICATION_FOR_RENTER)
            .eq("renter_id", caller.id)
            .order("created_at", false);
        decode_rows(self.backend.select(&query).await?)
    }

    /// Applications to any listing the caller owns, newest first.
    pub async fn get_applications_for_my_listings(&self) -> RtResult<Vec<Application>> {
        let caller = require_principal(self.backend.as_ref()).await?;
        let query = Query::table(tables::APPLICATIONS)
            .select(schema::APPLICATION_FOR_HOMEOWNER)
            .eq("listing.homeowner_id", caller.id)
            .order("created_at", false);
        decode_rows(self.backend.select(&query).await?)
    }

    pub async fn get_applications_for_listing(&self, listing_id: Uuid) -> RtResult<Vec<Application>> {
        let query = Query::table(tables::APPLICATIONS)
            .select(schema::APPLICATION_FOR_LISTING)
            .eq("listing_id", listing_id)
            .order("created_at", false);
        decode_rows(self.backend.select(&query).await?)
    }
}

impl Accessor for ApplicationService {
    fn name(&self) -> &'static str {
        "applications"
    }
}
