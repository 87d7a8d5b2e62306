//! Seam between connections and provider API bindings.

use crate::error::ApiError;
use crate::profile::UserProfile;

/// Profile values a connection caches and persists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionValues {
    pub provider_user_id: Option<String>,
    pub display_name: Option<String>,
    pub profile_url: Option<String>,
    pub image_url: Option<String>,
}

/// Maps a provider API binding of type `A` onto the connection model.
///
/// Implemented once per provider; connections call it and never talk to the
/// provider API directly.
pub trait ApiAdapter<A>: Send + Sync {
    /// Liveness probe. An error means the connection does not work.
    fn test(&self, api: &A) -> Result<(), ApiError>;

    /// Fill `values` from the provider's view of the connected user.
    fn set_connection_values(&self, api: &A, values: &mut ConnectionValues) -> Result<(), ApiError>;

    /// Fetch the user's profile.
    fn fetch_user_profile(&self, api: &A) -> Result<UserProfile, ApiError>;

    /// Post a status message on the user's behalf.
    fn update_status(&self, api: &A, message: &str) -> Result<(), ApiError>;
}
