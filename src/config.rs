//! Configuration for the remote service clients
//!
//! Every client is built from an explicit config value handed in by the
//! embedding app. Nothing in this crate reads the environment or keeps
//! global state; tests point `base_url` at a local server.

use secrecy::SecretString;

/// Cloud document database configuration
#[derive(Debug, Clone)]
pub struct CloudConfig {
    /// Base URL of the document store REST endpoint
    pub base_url: String,
    /// Project the document tree lives under
    pub project_id: String,
}

impl CloudConfig {
    /// Configuration against the production endpoint
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            base_url: crate::CLOUD_BASE_URL.to_string(),
            project_id: project_id.into(),
        }
    }

    /// Root path of the project's documents tree
    pub(crate) fn documents_root(&self) -> String {
        format!(
            "{}/v1/projects/{}/databases/(default)/documents",
            self.base_url.trim_end_matches('/'),
            self.project_id
        )
    }
}

/// Identity service configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Base URL of the identity service REST endpoint
    pub base_url: String,
    /// API key passed as the `key` query parameter
    pub api_key: SecretString,
}

impl AuthConfig {
    /// Configuration against the production endpoint
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: crate::AUTH_BASE_URL.to_string(),
            api_key: SecretString::from(api_key.into()),
        }
    }
}

/// External municipal service directory configuration
#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    /// Base URL of the directory API
    pub base_url: String,
    /// Static bearer token the endpoint requires
    pub bearer_token: SecretString,
    /// Fixed credential field sent in the request body
    pub email: String,
    /// Fixed credential field sent in the request body
    pub password: SecretString,
}

impl DirectoryConfig {
    /// Configuration against the production endpoint
    pub fn new(
        bearer_token: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: crate::DIRECTORY_BASE_URL.to_string(),
            bearer_token: SecretString::from(bearer_token.into()),
            email: email.into(),
            password: SecretString::from(password.into()),
        }
    }
}
