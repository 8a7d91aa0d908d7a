//! Account registration and sign-in
//!
//! Ties the identity service and the profile store together.
//! Registration is a two-step flow: create the account, then write the
//! profile document keyed by the new account id. Sign-in loads the
//! profile alongside the session when one exists.

use tracing::{info, warn};

use crate::auth::{AuthClient, AuthSession};
use crate::error::Result;
use crate::remote::{NewUserProfile, UserDirectory, UserProfile};

/// A signed-in account
#[derive(Debug, Clone)]
pub struct Account {
    /// Session issued by the identity service
    pub session: AuthSession,
    /// Stored profile, when the profile document exists
    pub profile: Option<UserProfile>,
}

/// Registration and sign-in built on the identity service and the
/// profile store
#[derive(Debug, Clone)]
pub struct AccountService {
    auth: AuthClient,
    users: UserDirectory,
}

impl AccountService {
    pub fn new(auth: AuthClient, users: UserDirectory) -> Self {
        Self { auth, users }
    }

    /// Register a new account and write its profile.
    ///
    /// The profile is validated before the account is created, so a bad
    /// form never leaves a profile-less account behind. A profile write
    /// failure after the account exists is surfaced as-is.
    pub async fn register(&self, profile: &NewUserProfile, password: &str) -> Result<Account> {
        profile.validate()?;

        let session = self.auth.sign_up(&profile.email, password).await?;
        info!(user_id = %session.user_id, "account created");

        let stored = self.users.save_profile(&session.user_id, profile).await?;
        Ok(Account {
            session,
            profile: Some(stored),
        })
    }

    /// Sign in to an existing account.
    ///
    /// A missing or unreadable profile does not block sign-in; the
    /// session is still returned.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Account> {
        let session = self.auth.sign_in(email, password).await?;

        let profile = match self.users.get_profile(&session.user_id).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!(user_id = %session.user_id, error = %e, "failed to load profile after sign-in");
                None
            }
        };

        Ok(Account { session, profile })
    }
}
