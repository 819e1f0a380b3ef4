//! The composition root.
//!
//! `RoomThere` is built once at startup and handed to consumers. It holds
//! one instance of every accessor, all sharing the same backend and
//! realtime client, and performs no logic of its own.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::info;

use rt_api::{ApiClient, Backend};
use rt_core::config::AppConfig;
use rt_core::error::RtResult;
use rt_realtime::RealtimeClient;

use crate::accessor::Accessor;
use crate::application::ApplicationService;
use crate::auth::AuthService;
use crate::contact::ContactService;
use crate::listing::ListingService;
use crate::message::MessageService;
use crate::profile::ProfileService;
use crate::saved_listing::SavedListingService;

/// Every accessor, wired to one backend.
#[derive(Clone)]
pub struct RoomThere {
    pub auth: AuthService,
    pub profiles: ProfileService,
    pub listings: ListingService,
    pub applications: ApplicationService,
    pub messages: MessageService,
    pub saved_listings: SavedListingService,
    pub contact: ContactService,
    backend: Arc<dyn Backend>,
    realtime: RealtimeClient,
}

impl RoomThere {
    /// Assemble the accessors around an existing backend and realtime client.
    pub fn new(backend: Arc<dyn Backend>, realtime: RealtimeClient) -> Self {
        Self {
            auth: AuthService::new(backend.clone(), realtime.clone()),
            profiles: ProfileService::new(backend.clone()),
            listings: ListingService::new(backend.clone()),
            applications: ApplicationService::new(backend.clone()),
            messages: MessageService::new(backend.clone(), realtime.clone()),
            saved_listings: SavedListingService::new(backend.clone()),
            contact: ContactService::new(backend.clone()),
            backend,
            realtime,
        }
    }

    /// Build the HTTP backend and realtime client from configuration.
    ///
    /// The returned receiver yields outbound realtime frames for the
    /// websocket transport to send.
    pub fn connect(config: &AppConfig) -> RtResult<(Self, mpsc::UnboundedReceiver<String>)> {
        let backend_config = config.require_backend()?;
        let client = ApiClient::new(backend_config)?;
        let (realtime, outbound) = RealtimeClient::new(backend_config, &config.realtime);
        info!("connected to {}", client.origin());
        Ok((Self::new(Arc::new(client), realtime), outbound))
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    pub fn realtime(&self) -> &RealtimeClient {
        &self.realtime
    }

    /// Names of the registered accessors, in registration order.
    pub fn accessor_names(&self) -> Vec<&'static str> {
        let accessors: [&dyn Accessor; 7] = [
            &self.auth,
            &self.profiles,
            &self.listings,
            &self.applications,
            &self.messages,
            &self.saved_listings,
            &self.contact,
        ];
        accessors.iter().map(|a| a.name()).collect()
    }
}
