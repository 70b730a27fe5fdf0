//! Staff profiles: the signed-in professional's own profile, the list of
//! professionals offered when booking, and avatar uploads.

use shared::{AuthUser, Profile, ProfileUpdate};
use tracing::{info, warn};

use super::error::{AgendaError, AgendaResult};
use crate::backend::remote::{AuthProvider, Connection, ObjectStorage, ProfileStorage};

const AVATAR_CONTENT_TYPE: &str = "image/jpeg";

#[derive(Clone)]
pub struct ProfileService<C: Connection> {
    profile_repository: C::ProfileRepository,
    auth: C::Auth,
    storage: C::Storage,
    avatar_bucket: String,
}

impl<C: Connection> ProfileService<C> {
    pub fn new(connection: &C, avatar_bucket: &str) -> Self {
        Self {
            profile_repository: connection.create_profile_repository(),
            auth: connection.auth(),
            storage: connection.storage(),
            avatar_bucket: avatar_bucket.to_string(),
        }
    }

    async fn session_user(&self) -> AgendaResult<Option<AuthUser>> {
        let session = self.auth.get_session().await.map_err(AgendaError::auth)?;
        Ok(session.map(|session| session.user))
    }

    /// Profile of the signed-in user, `None` when signed out
    pub async fn current_profile(&self) -> AgendaResult<Option<Profile>> {
        let Some(user) = self.session_user().await? else {
            return Ok(None);
        };
        self.profile_repository
            .get_profile(&user.id)
            .await
            .map_err(|e| {
                warn!(component = "profiles", user_id = %user.id, "Failed to load profile: {:#}", e);
                AgendaError::fetch(e)
            })
    }

    /// Every professional, for the booking picker
    pub async fn list_professionals(&self) -> AgendaResult<Vec<Profile>> {
        self.profile_repository.list_profiles().await.map_err(|e| {
            warn!(component = "profiles", "Failed to load professionals: {:#}", e);
            AgendaError::fetch(e)
        })
    }

    /// Update the signed-in user's profile row
    pub async fn update_profile(&self, update: &ProfileUpdate) -> AgendaResult<()> {
        let user = self.session_user().await?.ok_or(AgendaError::NoSession)?;
        self.profile_repository
            .update_profile(&user.id, update)
            .await
            .map_err(|e| {
                warn!(component = "profiles", user_id = %user.id, "Failed to update profile: {:#}", e);
                AgendaError::write(e)
            })?;
        info!(component = "profiles", user_id = %user.id, "Updated profile");
        Ok(())
    }

    /// Upload (replacing) the user's avatar and return its public URL
    pub async fn upload_avatar(&self, bytes: Vec<u8>) -> AgendaResult<String> {
        let user = self.session_user().await?.ok_or(AgendaError::NoSession)?;
        let key = format!("{}.jpg", user.id);
        self.storage
            .upload(&self.avatar_bucket, &key, bytes, AVATAR_CONTENT_TYPE)
            .await
            .map_err(|e| {
                warn!(component = "profiles", bucket = %self.avatar_bucket, key, "Avatar upload failed: {:#}", e);
                AgendaError::write(e)
            })?;
        Ok(self.storage.public_url(&self.avatar_bucket, &key))
    }
}
