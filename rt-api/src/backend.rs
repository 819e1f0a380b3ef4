//! The seam between accessors and the remote store.
//!
//! Accessors talk to a `dyn Backend`; `ApiClient` is the real one and tests
//! substitute an in-memory fake.

use async_trait::async_trait;
use serde_json::Value;

use rt_core::error::RtResult;
use rt_models::{Principal, Query};

use crate::client::ApiClient;
use crate::endpoints::auth::{Session, SignUp};

/// Everything the accessors need from the backend.
#[async_trait]
pub trait Backend: Send + Sync {
    /// The signed-in principal, or `None` when there is no valid session.
    async fn current_user(&self) -> RtResult<Option<Principal>>;

    async fn session(&self) -> Option<Session>;

    async fn set_session(&self, session: Option<Session>);

    async fn sign_up(&self, email: &str, password: &str, metadata: Value) -> RtResult<SignUp>;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> RtResult<Session>;

    async fn sign_out(&self) -> RtResult<()>;

    /// Rows matching the query.
    async fn select(&self, query: &Query) -> RtResult<Vec<Value>>;

    /// Insert `row` into `query.table`; returns the inserted rows shaped by
    /// `query.columns`.
    async fn insert(&self, query: &Query, row: Value) -> RtResult<Vec<Value>>;

    /// Patch the rows matched by `query.filters`; returns them.
    async fn update(&self, query: &Query, patch: Value) -> RtResult<Vec<Value>>;

    async fn delete(&self, query: &Query) -> RtResult<()>;

    /// Exact count of matching rows; `None` when the backend reports no total.
    async fn count(&self, query: &Query) -> RtResult<Option<u64>>;

    async fn rpc(&self, function: &str, args: Value) -> RtResult<Value>;
}

#[async_trait]
impl Backend for ApiClient {
    async fn current_user(&self) -> RtResult<Option<Principal>> {
        self.get_user().await
    }

    async fn session(&self) -> Option<Session> {
        ApiClient::session(self).await
    }

    async fn set_session(&self, session: Option<Session>) {
        ApiClient::set_session(self, session).await
    }

    async fn sign_up(&self, email: &str, password: &str, metadata: Value) -> RtResult<SignUp> {
        self.signup(email, password, metadata).await
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> RtResult<Session> {
        self.token_with_password(email, password).await
    }

    async fn sign_out(&self) -> RtResult<()> {
        self.logout().await
    }

    async fn select(&self, query: &Query) -> RtResult<Vec<Value>> {
        self.select_rows(query).await
    }

    async fn insert(&self, query: &Query, row: Value) -> RtResult<Vec<Value>> {
        self.insert_rows(query, &row).await
    }

    async fn update(&self, query: &Query, patch: Value) -> RtResult<Vec<Value>> {
        self.update_rows(query, &patch).await
    }

    async fn delete(&self, query: &Query) -> RtResult<()> {
        self.delete_rows(query).await
    }

    async fn count(&self, query: &Query) -> RtResult<Option<u64>> {
        self.count_rows(query).await
    }

    async fn rpc(&self, function: &str, args: Value) -> RtResult<Value> {
        self.call_rpc(function, &args).await
    }
}
