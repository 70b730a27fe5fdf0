//! Profile screen: edit the signed-in professional's profile, change the
//! avatar, log out.

use shared::{Alert, ProfileUpdate, Route};
use tracing::{info, warn};

use super::AlertSlot;
use crate::backend::domain::{AuthService, ProfileService};
use crate::backend::remote::Connection;
use crate::backend::AppState;

/// Result of the gallery picker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvatarPick {
    PermissionDenied,
    Cancelled,
    /// JPEG bytes of the chosen image
    Picked(Vec<u8>),
}

pub struct ProfileScreen<C: Connection> {
    profile_service: ProfileService<C>,
    auth_service: AuthService<C>,
    pub form: ProfileUpdate,
    alerts: AlertSlot,
}

impl<C: Connection> ProfileScreen<C> {
    pub fn new(state: &AppState<C>) -> Self {
        Self {
            profile_service: state.profile_service.clone(),
            auth_service: state.auth_service.clone(),
            form: ProfileUpdate::default(),
            alerts: AlertSlot::default(),
        }
    }

    /// Fill the form from the stored profile
    pub async fn load(&mut self) {
        match self.profile_service.current_profile().await {
            Ok(Some(profile)) => {
                self.form = ProfileUpdate {
                    name: profile.name,
                    email: profile.email.unwrap_or_default(),
                    photo_url: profile.photo_url.unwrap_or_default(),
                    role: profile.role.unwrap_or_default(),
                    phone: profile.phone.unwrap_or_default(),
                };
            }
            Ok(None) => info!(component = "screens", "Profile opened without a session"),
            Err(e) => warn!(component = "screens", "Profile unavailable: {}", e),
        }
    }

    pub async fn save(&mut self) {
        let alert = match self.profile_service.update_profile(&self.form).await {
            Ok(()) => Alert::success("Perfil atualizado com sucesso!"),
            Err(_) => Alert::error("Não foi possível atualizar o perfil."),
        };
        self.alerts.show(alert);
    }

    /// Upload the picked image and point the form's photo at it
    ///
    /// The new URL is only stored on the next save.
    pub async fn choose_avatar(&mut self, pick: AvatarPick) {
        let bytes = match pick {
            AvatarPick::Picked(bytes) => bytes,
            AvatarPick::Cancelled => return,
            AvatarPick::PermissionDenied => {
                self.alerts.show(Alert::new(
                    "Permissão negada",
                    "Você precisa permitir o acesso à galeria.",
                ));
                return;
            }
        };
        match self.profile_service.upload_avatar(bytes).await {
            Ok(url) => self.form.photo_url = url,
            Err(_) => self.alerts.show(Alert::error("Erro ao fazer upload da imagem.")),
        }
    }

    /// Sign out and go to the login screen
    pub async fn logout(&mut self) -> Route {
        if let Err(e) = self.auth_service.sign_out().await {
            warn!(component = "screens", "Sign-out reported an error: {}", e);
        }
        Route::Login
    }

    pub fn take_alert(&mut self) -> Option<Alert> {
        self.alerts.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::remote::memory::test_utils::SalonFixture;
    use crate::backend::remote::memory::RemoteOperation;
    use crate::backend::remote::MemoryConnection;
    use crate::backend::test_support::app_state;

    fn screen(fixture: &SalonFixture) -> ProfileScreen<MemoryConnection> {
        ProfileScreen::new(&app_state(fixture))
    }

    #[tokio::test]
    async fn test_load_edit_save() {
        let fixture = SalonFixture::new();
        let mut screen = screen(&fixture);
        screen.load().await;
        assert_eq!(screen.form.name, "Carla");
        assert_eq!(screen.form.role, "Cabeleireira");

        screen.form.phone = "11911110000".to_string();
        screen.save().await;
        assert_eq!(screen.take_alert(), Some(Alert::success("Perfil atualizado com sucesso!")));
        let row = fixture.connection.profile(&fixture.professional.id).unwrap();
        assert_eq!(row.telefone.as_deref(), Some("11911110000"));
    }

    #[tokio::test]
    async fn test_save_failure_alert() {
        let fixture = SalonFixture::new();
        fixture.connection.fail(RemoteOperation::UpdateProfile, "JWT expired");
        let mut screen = screen(&fixture);
        screen.save().await;
        assert_eq!(
            screen.take_alert(),
            Some(Alert::new("Erro", "Não foi possível atualizar o perfil."))
        );
    }

    #[tokio::test]
    async fn test_avatar_flow() {
        let fixture = SalonFixture::new();
        let mut screen = screen(&fixture);

        screen.choose_avatar(AvatarPick::PermissionDenied).await;
        assert_eq!(
            screen.take_alert().map(|alert| alert.title),
            Some("Permissão negada".to_string())
        );

        screen.choose_avatar(AvatarPick::Picked(vec![0xFF, 0xD8])).await;
        assert_eq!(
            screen.form.photo_url,
            format!("memory://avatars/{}.jpg", fixture.professional.id)
        );

        fixture.connection.fail(RemoteOperation::Upload, "too large");
        screen.choose_avatar(AvatarPick::Picked(vec![1])).await;
        assert_eq!(screen.take_alert(), Some(Alert::error("Erro ao fazer upload da imagem.")));
    }

    #[tokio::test]
    async fn test_logout_routes_to_login() {
        let fixture = SalonFixture::new();
        let mut screen = screen(&fixture);
        assert_eq!(screen.logout().await, Route::Login);
        assert!(fixture.connection.session().is_none());
    }
}
