//! Client for the identity service
//!
//! Accounts are email/password pairs held by an external identity
//! service. Sign-up and sign-in both answer with a session: the account
//! id (which profile documents are keyed by), a short-lived bearer token
//! and a refresh token.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::config::AuthConfig;
use crate::error::{CoreError, Result};

/// An authenticated session returned by sign-up and sign-in
#[derive(Debug, Clone)]
pub struct AuthSession {
    /// Backend account id; profile documents are keyed by this
    pub user_id: String,
    /// Email the session was issued for
    pub email: String,
    /// Short-lived bearer token
    pub id_token: SecretString,
    /// Token for renewing the session
    pub refresh_token: SecretString,
    /// Seconds until the bearer token expires
    pub expires_in: u64,
}

/// Client for the identity service
#[derive(Debug, Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    config: AuthConfig,
}

impl AuthClient {
    /// Build a client for the configured identity service
    pub fn new(config: AuthConfig) -> Result<Self> {
        Ok(Self {
            http: reqwest::Client::builder().build()?,
            config,
        })
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "{}/v1/accounts:{action}?key={}",
            self.config.base_url.trim_end_matches('/'),
            self.config.api_key.expose_secret()
        )
    }

    /// Create a new account
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession> {
        self.request("signUp", email, password).await
    }

    /// Sign in to an existing account
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        self.request("signInWithPassword", email, password).await
    }

    async fn request(&self, action: &str, email: &str, password: &str) -> Result<AuthSession> {
        let response = self
            .http
            .post(self.endpoint(action))
            .json(&json!({
                "email": email,
                "password": password,
                "returnSecureToken": true,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status.as_u16(), &body));
        }

        let body: SessionResponse = response.json().await?;
        debug!(action, user_id = %body.local_id, "identity request succeeded");
        Ok(AuthSession {
            user_id: body.local_id,
            email: body.email,
            id_token: SecretString::from(body.id_token),
            refresh_token: SecretString::from(body.refresh_token),
            expires_in: body.expires_in.parse().unwrap_or(0),
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionResponse {
    local_id: String,
    email: String,
    id_token: String,
    #[serde(default)]
    refresh_token: String,
    /// Seconds, string-encoded on the wire
    #[serde(default)]
    expires_in: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Map an identity service failure to a typed error.
///
/// The service signals the cause through an upper-case code at the start
/// of the error message, sometimes followed by " : " and free-form
/// detail. The code is matched exactly first; a substring check catches
/// responses that wrap the code in extra text. Anything unrecognized is
/// surfaced with the backend message unmodified.
fn classify_failure(status: u16, body: &str) -> CoreError {
    let message = match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.error.message,
        Err(_) => {
            return CoreError::RemoteError {
                status,
                message: body.to_string(),
            };
        }
    };

    let (code, detail) = match message.split_once(" : ") {
        Some((code, detail)) => (code.trim(), detail.trim()),
        None => (message.trim(), ""),
    };

    match code {
        "EMAIL_EXISTS" => CoreError::DuplicateAccount,
        "WEAK_PASSWORD" => {
            let detail = if detail.is_empty() { code } else { detail };
            CoreError::WeakPassword(detail.to_string())
        }
        "EMAIL_NOT_FOUND" => CoreError::UnknownUser,
        "INVALID_EMAIL" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
            CoreError::InvalidCredentials
        }
        _ => classify_by_substring(status, &message),
    }
}

fn classify_by_substring(status: u16, message: &str) -> CoreError {
    if message.contains("EMAIL_EXISTS") {
        return CoreError::DuplicateAccount;
    }
    if message.contains("WEAK_PASSWORD") {
        return CoreError::WeakPassword(message.to_string());
    }
    if message.contains("EMAIL_NOT_FOUND") {
        return CoreError::UnknownUser;
    }
    if message.contains("INVALID_EMAIL")
        || message.contains("INVALID_PASSWORD")
        || message.contains("INVALID_LOGIN_CREDENTIALS")
    {
        return CoreError::InvalidCredentials;
    }
    CoreError::RemoteError {
        status,
        message: message.to_string(),
    }
}
