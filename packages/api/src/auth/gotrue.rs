//! # GoTrue password authentication
//!
//! Implements [`store::AuthBackend`] for [`SupabaseClient`]:
//!
//! 1. **sign up** — `POST /auth/v1/signup`. When the project requires email
//!    confirmation the response carries only the user, and the outcome is
//!    [`SignUpOutcome::ConfirmationRequired`]. Otherwise it carries tokens and
//!    the client is signed in immediately.
//! 2. **sign in** — `POST /auth/v1/token?grant_type=password`.
//! 3. **get session** — returns the persisted session after renewing it with
//!    `grant_type=refresh_token`. A refused refresh clears the session; a
//!    network failure keeps the stored one.
//! 4. **sign out** — `POST /auth/v1/logout`. The local session is cleared
//!    before the call, so a failing logout still signs the user out here.
//!
//! Every change of session is broadcast as an [`AuthEvent`].

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use store::{
    AuthBackend, AuthError, AuthEvent, AuthSession, AuthSubscription, Credentials, Identity,
    SignUpOutcome,
};

use super::session::StoredSession;
use crate::SupabaseClient;

#[derive(Debug, Clone, Deserialize)]
struct UserBody {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

/// Token or user response from the auth API.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    user: Option<UserBody>,
    // Sign-up with confirmation returns the user at the top level.
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

impl AuthResponse {
    /// The session carried by this response, if tokens were issued.
    pub fn into_session(self, fallback_email: &str) -> Option<StoredSession> {
        let access_token = self.access_token?;
        let user = self.user.or(self.id.map(|id| UserBody {
            id,
            email: self.email,
        }))?;
        Some(StoredSession {
            session: AuthSession {
                identity: Identity {
                    id: user.id,
                    email: user.email.unwrap_or_else(|| fallback_email.to_string()),
                },
                access_token,
            },
            refresh_token: self.refresh_token,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct AuthErrorBody {
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Which call produced the error; a 400 means different things for each.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AuthCall {
    SignUp,
    Password,
    Refresh,
    Logout,
}

/// Map a non-success status from the auth API to an [`AuthError`].
pub fn map_auth_status(status: StatusCode, body: &str, password_grant: bool) -> AuthError {
    let call = if password_grant {
        AuthCall::Password
    } else {
        AuthCall::SignUp
    };
    map_status(status, body, call)
}

fn map_status(status: StatusCode, body: &str, call: AuthCall) -> AuthError {
    let parsed: AuthErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .error_description
        .or(parsed.msg)
        .or(parsed.message)
        .unwrap_or_else(|| status.to_string());

    if status.is_server_error() {
        return AuthError::Network(message);
    }
    match (call, status) {
        (AuthCall::Password | AuthCall::Refresh, StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED) => {
            AuthError::InvalidCredentials
        }
        (AuthCall::Logout, StatusCode::UNAUTHORIZED) => AuthError::InvalidCredentials,
        _ => AuthError::Rejected(message),
    }
}

fn network(err: reqwest::Error) -> AuthError {
    AuthError::Network(err.to_string())
}

impl SupabaseClient {
    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.base_url)
    }

    async fn post_auth(
        &self,
        path: &str,
        body: serde_json::Value,
        call: AuthCall,
    ) -> Result<AuthResponse, AuthError> {
        let response = self
            .http
            .post(self.auth_url(path))
            .header("apikey", &self.anon_key)
            .json(&body)
            .send()
            .await
            .map_err(network)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status(status, &body, call));
        }
        response.json::<AuthResponse>().await.map_err(network)
    }

    /// Renew the stored session with its refresh token.
    async fn refresh(&self, stored: StoredSession) -> Result<Option<AuthSession>, AuthError> {
        let Some(refresh_token) = stored.refresh_token.clone() else {
            return Ok(Some(stored.session));
        };
        let email = stored.session.identity.email.clone();
        match self
            .post_auth(
                "token?grant_type=refresh_token",
                json!({ "refresh_token": refresh_token }),
                AuthCall::Refresh,
            )
            .await
        {
            Ok(response) => {
                let Some(renewed) = response.into_session(&email) else {
                    return Ok(Some(stored.session));
                };
                let session = renewed.session.clone();
                self.set_session(Some(renewed));
                self.emit(AuthEvent::TokenRefreshed(session.clone()));
                Ok(Some(session))
            }
            Err(AuthError::Network(e)) => {
                tracing::warn!("Session refresh failed, keeping stored session: {}", e);
                Ok(Some(stored.session))
            }
            Err(e) => {
                tracing::info!("Stored session no longer valid: {}", e);
                self.set_session(None);
                Ok(None)
            }
        }
    }
}

impl AuthBackend for SupabaseClient {
    async fn sign_up(&self, credentials: &Credentials) -> Result<SignUpOutcome, AuthError> {
        let response = self
            .post_auth(
                "signup",
                json!({ "email": credentials.email, "password": credentials.password }),
                AuthCall::SignUp,
            )
            .await?;
        match response.into_session(&credentials.email) {
            Some(stored) => {
                let session = stored.session.clone();
                self.set_session(Some(stored));
                self.emit(AuthEvent::SignedIn(session.clone()));
                Ok(SignUpOutcome::SignedIn(session))
            }
            None => Ok(SignUpOutcome::ConfirmationRequired),
        }
    }

    async fn sign_in_with_password(&self, credentials: &Credentials) -> Result<AuthSession, AuthError> {
        let response = self
            .post_auth(
                "token?grant_type=password",
                json!({ "email": credentials.email, "password": credentials.password }),
                AuthCall::Password,
            )
            .await?;
        let stored = response
            .into_session(&credentials.email)
            .ok_or_else(|| AuthError::Rejected("Sign-in response carried no session".to_string()))?;
        let session = stored.session.clone();
        self.set_session(Some(stored));
        self.emit(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let token = self
            .lock_session()
            .as_ref()
            .map(|stored| stored.session.access_token.clone());
        self.set_session(None);
        self.emit(AuthEvent::SignedOut);

        let Some(token) = token else {
            return Ok(());
        };
        let response = self
            .http
            .post(self.auth_url("logout"))
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(network)?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(map_status(status, &body, AuthCall::Logout))
    }

    async fn get_session(&self) -> Result<Option<AuthSession>, AuthError> {
        let stored = self.lock_session().clone();
        match stored {
            Some(stored) => self.refresh(stored).await,
            None => Ok(None),
        }
    }

    fn subscribe(&self) -> AuthSubscription {
        AuthSubscription::new(self.events.subscribe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_response_becomes_session() {
        let response: AuthResponse = serde_json::from_str(
            r#"{"access_token":"jwt","token_type":"bearer","expires_in":3600,"refresh_token":"r1",
                "user":{"id":"u1","email":"ada@example.com"}}"#,
        )
        .unwrap();
        let stored = response.into_session("fallback@example.com").unwrap();
        assert_eq!(stored.session.identity.id, "u1");
        assert_eq!(stored.session.identity.email, "ada@example.com");
        assert_eq!(stored.session.access_token, "jwt");
        assert_eq!(stored.refresh_token.as_deref(), Some("r1"));
    }

    #[test]
    fn test_confirmation_response_has_no_session() {
        let response: AuthResponse =
            serde_json::from_str(r#"{"id":"u2","email":"new@example.com","confirmation_sent_at":"x"}"#)
                .unwrap();
        assert!(response.into_session("new@example.com").is_none());
    }

    #[test]
    fn test_bad_password_is_invalid_credentials() {
        let err = map_auth_status(
            StatusCode::BAD_REQUEST,
            r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#,
            true,
        );
        assert_eq!(err, AuthError::InvalidCredentials);
    }

    #[test]
    fn test_sign_up_refusal_keeps_message() {
        let err = map_auth_status(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"code":422,"msg":"User already registered"}"#,
            false,
        );
        assert_eq!(err, AuthError::Rejected("User already registered".to_string()));
    }

    #[test]
    fn test_server_errors_are_network_errors() {
        let err = map_auth_status(StatusCode::BAD_GATEWAY, "", true);
        assert!(matches!(err, AuthError::Network(_)));
    }
}
