//! Auth endpoints (`/auth/v1/...`).

use std::time::{Duration, Instant};

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use rt_core::error::{RtError, RtResult};
use rt_models::Principal;

use crate::client::ApiClient;

/// A signed-in session as issued by the token endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Lifetime in seconds from issue.
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// Expiry as a unix timestamp.
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: Principal,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl Session {
    /// Whether `expires_at` has passed at unix time `now`.
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at.map_or(false, |at| at <= now)
    }
}

/// Outcome of a sign-up. `session` is absent when the project requires
/// email confirmation before the first sign-in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignUp {
    pub user: Principal,
    pub session: Option<Session>,
}

impl SignUp {
    /// Interpret a `/signup` body, which is either a session or a bare user.
    pub fn from_body(body: Value) -> RtResult<Self> {
        if body.get("access_token").is_some() {
            let session: Session = serde_json::from_value(body)?;
            return Ok(Self {
                user: session.user.clone(),
                session: Some(session),
            });
        }
        let user = match body.get("user") {
            Some(user) if user.is_object() => user.clone(),
            _ => body,
        };
        Ok(Self {
            user: serde_json::from_value(user)?,
            session: None,
        })
    }
}

impl ApiClient {
    /// Register a new account. A returned session becomes the current one.
    pub async fn signup(&self, email: &str, password: &str, metadata: Value) -> RtResult<SignUp> {
        let url = self.auth_url("signup");
        let body = json!({ "email": email, "password": password, "data": metadata });
        let anon = self.anon_key().to_string();
        let response = self
            .send(Method::POST, &url, &[], Some(&body), None, Some(&anon))
            .await?;
        let signup = SignUp::from_body(Self::parse_json(response).await?)?;

        if let Some(session) = &signup.session {
            self.set_session(Some(session.clone())).await;
        }
        info!("signed up user {}", signup.user.id);
        Ok(signup)
    }

    /// Exchange email and password for a session, which becomes the current one.
    pub async fn token_with_password(&self, email: &str, password: &str) -> RtResult<Session> {
        let url = self.auth_url("token");
        let params = vec![("grant_type".to_string(), "password".to_string())];
        let body = json!({ "email": email, "password": password });
        let anon = self.anon_key().to_string();
        let response = self
            .send(Method::POST, &url, &params, Some(&body), None, Some(&anon))
            .await?;
        let session: Session = Self::parse_json(response).await?;

        self.set_session(Some(session.clone())).await;
        info!("signed in as {}", session.user.id);
        Ok(session)
    }

    /// Revoke the current session. The local session is cleared even when
    /// the server rejects the call; without a session this is a no-op.
    pub async fn logout(&self) -> RtResult<()> {
        let Some(session) = self.session().await else {
            debug!("logout without a session");
            return Ok(());
        };
        self.set_session(None).await;

        let url = self.auth_url("logout");
        let result = self
            .send(Method::POST, &url, &[], None, None, Some(&session.access_token))
            .await;
        match result {
            Ok(_) => {
                info!("signed out {}", session.user.id);
                Ok(())
            }
            // An expired or revoked token is already signed out.
            Err(RtError::Backend(e)) if e.status == 401 || e.status == 403 => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// The user behind the current session, as the auth server sees it.
    ///
    /// No session means no request and `None`; a rejected token is also `None`.
    pub async fn get_user(&self) -> RtResult<Option<Principal>> {
        let Some(session) = self.session().await else {
            return Ok(None);
        };

        let url = self.auth_url("user");
        let result = self
            .send(Method::GET, &url, &[], None, None, Some(&session.access_token))
            .await;
        match result {
            Ok(response) => Ok(Some(Self::parse_json(response).await?)),
            Err(RtError::Backend(e)) if e.status == 401 || e.status == 403 => {
                debug!("access token rejected: {}", e.message);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Check the auth server is reachable. Returns the round-trip latency.
    pub async fn health_check(&self) -> RtResult<Duration> {
        let start = Instant::now();
        let url = self.auth_url("health");
        let anon = self.anon_key().to_string();
        self.send(Method::GET, &url, &[], None, None, Some(&anon)).await?;
        Ok(start.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER_ID: &str = "6f1c3c1e-6d2a-4f7b-9a55-2f6f4d3c2b1a";

    #[test]
    fn test_session_from_token_body() {
        let body = json!({
            "access_token": "jwt",
            "token_type": "bearer",
            "expires_in": 3600,
            "expires_at": 1700003600,
            "refresh_token": "r1",
            "user": {"id": USER_ID, "email": "sam@example.edu"}
        });
        let session: Session = serde_json::from_value(body).unwrap();
        assert_eq!(session.user.email.as_deref(), Some("sam@example.edu"));
        assert!(session.is_expired_at(1700003600));
        assert!(!session.is_expired_at(1700000000));
    }

    #[test]
    fn test_signup_with_confirmation_pending() {
        let body = json!({"id": USER_ID, "email": "new@example.edu", "confirmation_sent_at": "2024-01-01T00:00:00Z"});
        let signup = SignUp::from_body(body).unwrap();
        assert!(signup.session.is_none());
        assert_eq!(signup.user.email.as_deref(), Some("new@example.edu"));
    }

    #[test]
    fn test_signup_with_session() {
        let body = json!({
            "access_token": "jwt",
            "user": {"id": USER_ID}
        });
        let signup = SignUp::from_body(body).unwrap();
        let session = signup.session.unwrap();
        assert_eq!(session.token_type, "bearer");
        assert_eq!(signup.user.id, session.user.id);
    }
}
