//! Profile accessor: base profiles and their renter/homeowner extensions.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use rt_api::Backend;
use rt_core::constants::tables;
use rt_core::error::RtResult;
use rt_models::query::Query;
use rt_models::{
    ExtendedProfile, FullProfile, HomeownerProfile, HomeownerProfileUpdate, NewHomeownerProfile,
    NewRenterProfile, Profile, ProfileUpdate, RenterProfile, RenterProfileUpdate, UserType,
};

use crate::accessor::{decode_maybe_single, decode_single, Accessor};

/// Reads and writes profile records.
#[derive(Clone)]
pub struct ProfileService {
    backend: Arc<dyn Backend>,
}

impl ProfileService {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    pub async fn get_profile(&self, user_id: Uuid) -> RtResult<Option<Profile>> {
        let query = Query::table(tables::PROFILES).eq("id", user_id);
        decode_maybe_single(self.backend.select(&query).await?)
    }

    pub async fn update_profile(&self, user_id: Uuid, updates: &ProfileUpdate) -> RtResult<Profile> {
        let query = Query::table(tables::PROFILES).eq("id", user_id);
        let rows = self.backend.update(&query, serde_json::to_value(updates)?).await?;
        decode_single(rows)
    }

    pub async fn create_renter_profile(
        &self,
        profile_id: Uuid,
        data: NewRenterProfile,
    ) -> RtResult<RenterProfile> {
        let query = Query::table(tables::RENTER_PROFILES);
        let rows = self.backend.insert(&query, data.into_row(profile_id)).await?;
        decode_single(rows)
    }

    pub async fn get_renter_profile(&self, profile_id: Uuid) -> RtResult<Option<RenterProfile>> {
        let query = Query::table(tables::RENTER_PROFILES).eq("profile_id", profile_id);
        decode_maybe_single(self.backend.select(&query).await?)
    }

    pub async fn update_renter_profile(
        &self,
        profile_id: Uuid,
        updates: &RenterProfileUpdate,
    ) -> RtResult<RenterProfile> {
        let query = Query::table(tables::RENTER_PROFILES).eq("profile_id", profile_id);
        let rows = self.backend.update(&query, serde_json::to_value(updates)?).await?;
        decode_single(rows)
    }

    pub async fn create_homeowner_profile(
        &self,
        profile_id: Uuid,
        data: NewHomeownerProfile,
    ) -> RtResult<HomeownerProfile> {
        let query = Query::table(tables::HOMEOWNER_PROFILES);
        let rows = self.backend.insert(&query, data.into_row(profile_id)).await?;
        decode_single(rows)
    }

    pub async fn get_homeowner_profile(&self, profile_id: Uuid) -> RtResult<Option<HomeownerProfile>> {
        let query = Query::table(tables::HOMEOWNER_PROFILES).eq("profile_id", profile_id);
        decode_maybe_single(self.backend.select(&query).await?)
    }

    pub async fn update_homeowner_profile(
        &self,
        profile_id: Uuid,
        updates: &HomeownerProfileUpdate,
    ) -> RtResult<HomeownerProfile> {
        let query = Query::table(tables::HOMEOWNER_PROFILES).eq("profile_id", profile_id);
        let rows = self.backend.update(&query, serde_json::to_value(updates)?).await?;
        decode_single(rows)
    }

    /// The profile plus the extension its `user_type` calls for.
    ///
    /// A missing profile is `None`; a profile without a role, or whose
    /// extension row does not exist yet, has no extended profile.
    pub async fn get_full_profile(&self, user_id: Uuid) -> RtResult<Option<FullProfile>> {
        let Some(profile) = self.get_profile(user_id).await? else {
            debug!("no profile for {user_id}");
            return Ok(None);
        };

        let extended_profile = match profile.user_type {
            Some(UserType::Renter) => self
                .get_renter_profile(user_id)
                .await?
                .map(ExtendedProfile::Renter),
            Some(UserType::Homeowner) => self
                .get_homeowner_profile(user_id)
                .await?
                .map(ExtendedProfile::Homeowner),
            None => None,
        };

        Ok(Some(FullProfile {
            profile,
            extended_profile,
        }))
    }
}

impl Accessor for ProfileService {
    fn name(&self) -> &'static str {
        "profiles"
    }
}
