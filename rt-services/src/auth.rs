//! Auth accessor: who is signed in, and signing in and out.

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use rt_api::{Backend, Session, SignUp};
use rt_core::error::RtResult;
use rt_models::Principal;
use rt_realtime::RealtimeClient;

use crate::accessor::Accessor;

/// Resolves the current principal and manages the session.
///
/// Session changes are forwarded to the realtime client so channel joins
/// carry the caller's token.
#[derive(Clone)]
pub struct AuthService {
    backend: Arc<dyn Backend>,
    realtime: RealtimeClient,
}

impl AuthService {
    pub fn new(backend: Arc<dyn Backend>, realtime: RealtimeClient) -> Self {
        Self { backend, realtime }
    }

    /// The signed-in principal, or `None`.
    pub async fn get_current_user(&self) -> RtResult<Option<Principal>> {
        self.backend.current_user().await
    }

    /// The current session, if any.
    pub async fn session(&self) -> Option<Session> {
        self.backend.session().await
    }

    /// Adopt a previously issued session (e.g. one persisted by a client).
    pub async fn restore_session(&self, session: Option<Session>) -> RtResult<()> {
        let token = session.as_ref().map(|s| s.access_token.clone());
        self.backend.set_session(session).await;
        self.realtime.set_access_token(token).await
    }

    /// Register an account; `metadata` is stored as the user's metadata.
    pub async fn sign_up(&self, email: &str, password: &str, metadata: Value) -> RtResult<SignUp> {
        let signup = self.backend.sign_up(email, password, metadata).await?;
        if let Some(session) = &signup.session {
            self.sync_realtime_token(Some(session.access_token.clone())).await;
        }
        Ok(signup)
    }

    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> RtResult<Session> {
        let session = self.backend.sign_in_with_password(email, password).await?;
        self.sync_realtime_token(Some(session.access_token.clone())).await;
        info!("signed in as {}", session.user.id);
        Ok(session)
    }

    pub async fn sign_out(&self) -> RtResult<()> {
        self.backend.sign_out().await?;
        self.sync_realtime_token(None).await;
        Ok(())
    }

    async fn sync_realtime_token(&self, token: Option<String>) {
        if let Err(e) = self.realtime.set_access_token(token).await {
            warn!("realtime token not updated: {e}");
        }
    }
}

impl Accessor for AuthService {
    fn name(&self) -> &'static str {
        "auth"
    }
}
