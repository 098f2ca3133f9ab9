//! Who is logged in on this client.
//!
//! The identity lives in memory only and is passed by reference to whatever
//! needs it. Logging out clears it.

use tracing::info;

use crate::api::{validate_username, UserServiceClient};
use crate::error::{BattleshipError, Result};
use crate::protocol::PlayerName;

#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    username: Option<PlayerName>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.username.is_some()
    }

    /// The logged-in username, or [`BattleshipError::NotLoggedIn`].
    pub fn require_user(&self) -> Result<&str> {
        self.username().ok_or(BattleshipError::NotLoggedIn)
    }

    /// Record `username` as logged in without asking the user service.
    pub fn set_user(&mut self, username: &str) -> Result<()> {
        let username = validate_username(username)?;
        self.username = Some(username.to_string());
        Ok(())
    }

    /// Log in through the user service. On success the trimmed name becomes
    /// the current user and the service's message is returned.
    pub async fn login(&mut self, users: &UserServiceClient, username: &str) -> Result<String> {
        let username = validate_username(username)?;
        let message = users.login(username).await?;
        info!(player = %username, "logged in");
        self.username = Some(username.to_string());
        Ok(message)
    }

    /// Register, then log in as the new user.
    pub async fn register(
        &mut self,
        users: &UserServiceClient,
        username: &str,
    ) -> Result<String> {
        let username = validate_username(username)?;
        let message = users.register(username).await?;
        info!(player = %username, "registered");
        self.username = Some(username.to_string());
        Ok(message)
    }

    pub fn logout(&mut self) {
        if let Some(username) = self.username.take() {
            info!(player = %username, "logged out");
        }
    }
}
