//! User and profile endpoints.

use reqwest::Method;
use tracing::{info, instrument};

use super::types::{Profile, ProfileUpdate, UserList, UserSummary};
use super::{ApiClient, ApiError};

impl ApiClient<'_> {
    /// Every user account (admin only; used to assign agents).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the session is rejected.
    #[instrument(skip(self))]
    pub async fn list_users(&self) -> Result<Vec<UserSummary>, ApiError> {
        let list: UserList = self.fetch(self.request(Method::GET, "/users")?).await?;
        Ok(list.users)
    }

    /// The logged-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the session is rejected.
    #[instrument(skip(self))]
    pub async fn profile(&self) -> Result<Profile, ApiError> {
        self.fetch(self.request(Method::GET, "/profile")?).await
    }

    /// Update the logged-in user's profile.
    ///
    /// The API answers a wrong old password with 401, which ends the session
    /// like any other rejection.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidInput` if the update fails local checks, or
    /// an error if the request fails or the session is rejected.
    #[instrument(skip(self, update))]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<(), ApiError> {
        let body = update.to_body()?;
        self.execute(self.request(Method::PUT, "/profile")?.json(&body))
            .await?;
        info!("Profile updated");
        Ok(())
    }
}
