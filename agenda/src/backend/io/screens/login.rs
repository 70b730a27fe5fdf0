//! Login screen: credentials form, password visibility and reset requests.

use shared::{Alert, Route};
use tracing::info;

use super::AlertSlot;
use crate::backend::domain::{AgendaError, AuthService};
use crate::backend::remote::Connection;
use crate::backend::AppState;

pub struct LoginScreen<C: Connection> {
    auth_service: AuthService<C>,
    pub email: String,
    pub password: String,
    password_visible: bool,
    alerts: AlertSlot,
}

impl<C: Connection> LoginScreen<C> {
    pub fn new(state: &AppState<C>) -> Self {
        Self {
            auth_service: state.auth_service.clone(),
            email: String::new(),
            password: String::new(),
            password_visible: false,
            alerts: AlertSlot::default(),
        }
    }

    /// Skip the form when a session already exists
    pub async fn open(&self) -> Option<Route> {
        match self.auth_service.start_route().await {
            Route::Home => Some(Route::Home),
            Route::Login => None,
        }
    }

    pub fn toggle_password_visibility(&mut self) {
        self.password_visible = !self.password_visible;
    }

    pub fn password_visible(&self) -> bool {
        self.password_visible
    }

    /// Sign in; `Some(Route::Home)` on success, an alert otherwise
    pub async fn submit(&mut self) -> Option<Route> {
        info!(component = "screens", "Login submitted");
        match self.auth_service.sign_in(&self.email, &self.password).await {
            Ok(_) => Some(Route::Home),
            Err(e) => {
                self.alerts.show(Alert::notice(format!("Erro: {}", e)));
                None
            }
        }
    }

    pub async fn request_password_reset(&mut self) {
        let alert = match self.auth_service.request_password_reset(&self.email).await {
            Ok(()) => Alert::notice("E-mail enviado!"),
            Err(AgendaError::Validation(e)) => Alert::notice(e.to_string()),
            Err(e) => Alert::notice(format!("Erro: {}", e)),
        };
        self.alerts.show(alert);
    }

    pub fn take_alert(&mut self) -> Option<Alert> {
        self.alerts.take()
    }
}
