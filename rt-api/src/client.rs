//! HTTP client for the hosted backend.
//!
//! Handles the `apikey`/bearer header pair, custom headers, schema
//! selection, timeouts, the auth session, and turning non-success
//! responses into `BackendError`. Every call maps to exactly one request;
//! nothing is retried.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use rt_core::config::{AppConfig, BackendConfig};
use rt_core::constants;
use rt_core::error::{RtError, RtResult};

use crate::endpoints::auth::Session;
use crate::response::backend_error;

/// HTTP client for the REST, RPC, and auth endpoints of one project.
///
/// Cloning is cheap and clones share the auth session.
#[derive(Clone)]
pub struct ApiClient {
    inner: Client,
    /// Project origin (e.g. "https://abcd.supabase.co").
    origin: String,
    /// Base URL for table and RPC requests.
    rest_root: String,
    /// Base URL for auth requests.
    auth_root: String,
    /// Public anon key, sent as `apikey` on every request.
    anon_key: String,
    /// Custom headers from config.
    custom_headers: Vec<(String, String)>,
    /// Schema named in `Accept-Profile`/`Content-Profile`.
    schema: String,
    /// Current auth session, if signed in.
    session: Arc<RwLock<Option<Session>>>,
}

impl ApiClient {
    /// Create a new ApiClient from backend configuration.
    pub fn new(config: &BackendConfig) -> RtResult<Self> {
        let origin = AppConfig::sanitize_project_url(&config.url);
        if origin.is_empty() {
            return Err(RtError::MissingConfig("backend.url".into()));
        }

        let inner = Client::builder()
            .timeout(Duration::from_millis(config.api_timeout_ms))
            .connect_timeout(Duration::from_secs(15))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| RtError::Http(format!("failed to build HTTP client: {e}")))?;

        let mut custom_headers: Vec<(String, String)> = config
            .custom_headers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        custom_headers.sort();

        Ok(Self {
            inner,
            rest_root: format!("{origin}{}", constants::REST_PATH),
            auth_root: format!("{origin}{}", constants::AUTH_PATH),
            origin,
            anon_key: config.anon_key.clone(),
            custom_headers,
            schema: config.schema.clone(),
            session: Arc::new(RwLock::new(None)),
        })
    }

    /// Get the project origin.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn rest_root(&self) -> &str {
        &self.rest_root
    }

    pub fn auth_root(&self) -> &str {
        &self.auth_root
    }

    pub fn anon_key(&self) -> &str {
        &self.anon_key
    }

    /// The current session, if any.
    pub async fn session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    /// Replace the current session (e.g. one restored from disk).
    pub async fn set_session(&self, session: Option<Session>) {
        let mut guard = self.session.write().await;
        match &session {
            Some(s) => debug!("session set for user {}", s.user.id),
            None => debug!("session cleared"),
        }
        *guard = session;
    }

    /// Token for the `Authorization` header: the session's access token,
    /// or the anon key when signed out.
    pub async fn bearer_token(&self) -> String {
        self.session
            .read()
            .await
            .as_ref()
            .map(|s| s.access_token.clone())
            .unwrap_or_else(|| self.anon_key.clone())
    }

    /// URL of a table or `rpc/<fn>` path.
    pub(crate) fn rest_url(&self, path: &str) -> String {
        format!("{}/{}", self.rest_root, path.trim_start_matches('/'))
    }

    pub(crate) fn auth_url(&self, path: &str) -> String {
        format!("{}/{}", self.auth_root, path.trim_start_matches('/'))
    }

    /// Apply key, bearer, schema, and custom headers to a request builder.
    fn apply_headers(&self, mut builder: RequestBuilder, bearer: &str) -> RequestBuilder {
        builder = builder
            .header("apikey", self.anon_key.as_str())
            .header("Authorization", format!("Bearer {bearer}"))
            .header("Accept-Profile", self.schema.as_str())
            .header("Content-Profile", self.schema.as_str());
        for (key, value) in &self.custom_headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        builder
    }

    /// Send one request and check its status.
    ///
    /// `bearer` overrides the session token; auth calls pass the token they
    /// are acting on.
    pub(crate) async fn send(
        &self,
        method: Method,
        url: &str,
        query: &[(String, String)],
        body: Option<&Value>,
        prefer: Option<&str>,
        bearer: Option<&str>,
    ) -> RtResult<Response> {
        debug!("{} {} {:?}", method, url, query);

        let token = match bearer {
            Some(t) => t.to_string(),
            None => self.bearer_token().await,
        };

        let mut builder = self.inner.request(method, url);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(b) = body {
            builder = builder.json(b);
        }
        if let Some(p) = prefer {
            builder = builder.header("Prefer", p);
        }
        let builder = self.apply_headers(builder, &token);

        let response = builder.send().await.map_err(Self::classify_error)?;
        Self::check_status(response).await
    }

    /// Deserialize a JSON response body.
    pub async fn parse_json<T: DeserializeOwned>(response: Response) -> RtResult<T> {
        let text = Self::response_text(response).await?;
        serde_json::from_str(&text)
            .map_err(|e| RtError::Serialization(format!("failed to parse response: {e}")))
    }

    /// Deserialize a JSON body that may be empty; empty reads as `null`.
    pub async fn parse_optional_json(response: Response) -> RtResult<Value> {
        let text = Self::response_text(response).await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text)
            .map_err(|e| RtError::Serialization(format!("failed to parse response: {e}")))
    }

    async fn response_text(response: Response) -> RtResult<String> {
        response
            .text()
            .await
            .map_err(|e| RtError::Http(format!("failed to read response body: {e}")))
    }

    /// Convert any non-success status into `RtError::Backend`.
    async fn check_status(response: Response) -> RtResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = backend_error(status.as_u16(), &body, reason(status));
        debug!("backend rejected request: {err}");
        Err(err.into())
    }

    /// Classify a reqwest error into an RtError variant.
    fn classify_error(e: reqwest::Error) -> RtError {
        if e.is_timeout() {
            RtError::Timeout(e.to_string())
        } else if e.is_connect() {
            RtError::Http(format!("connection failed: {e}"))
        } else {
            RtError::Http(e.to_string())
        }
    }
}

fn reason(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("request failed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rt_models::Principal;
    use uuid::Uuid;

    fn test_config() -> BackendConfig {
        BackendConfig {
            url: "abcd.supabase.co/".into(),
            anon_key: "anon-key".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_roots_derive_from_project_url() {
        let client = ApiClient::new(&test_config()).unwrap();
        assert_eq!(client.origin(), "https://abcd.supabase.co");
        assert_eq!(client.rest_root(), "https://abcd.supabase.co/rest/v1");
        assert_eq!(client.auth_root(), "https://abcd.supabase.co/auth/v1");
        assert_eq!(
            client.rest_url("/rpc/increment_listing_views"),
            "https://abcd.supabase.co/rest/v1/rpc/increment_listing_views"
        );
        assert_eq!(client.auth_url("token"), "https://abcd.supabase.co/auth/v1/token");
    }

    #[test]
    fn test_missing_url_is_rejected() {
        let config = BackendConfig {
            url: "  ".into(),
            ..test_config()
        };
        assert!(matches!(ApiClient::new(&config), Err(RtError::MissingConfig(_))));
    }

    #[tokio::test]
    async fn test_bearer_follows_session() {
        let client = ApiClient::new(&test_config()).unwrap();
        assert_eq!(client.bearer_token().await, "anon-key");

        let session = Session {
            access_token: "jwt-1".into(),
            refresh_token: Some("refresh".into()),
            token_type: "bearer".into(),
            expires_in: Some(3600),
            expires_at: None,
            user: Principal::new(Uuid::nil()),
        };
        client.set_session(Some(session)).await;

        // Clones share the session.
        let clone = client.clone();
        assert_eq!(clone.bearer_token().await, "jwt-1");

        clone.set_session(None).await;
        assert_eq!(client.bearer_token().await, "anon-key");
    }
}
