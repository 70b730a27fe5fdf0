//! Session routing, sign-in/out and password reset requests.

use shared::{AuthUser, Route, Session};
use tracing::{info, warn};

use super::error::{AgendaError, AgendaResult, ValidationError};
use crate::backend::remote::{AuthProvider, Connection};

#[derive(Clone)]
pub struct AuthService<C: Connection> {
    auth: C::Auth,
    password_reset_redirect: String,
}

impl<C: Connection> AuthService<C> {
    pub fn new(connection: &C, password_reset_redirect: &str) -> Self {
        Self {
            auth: connection.auth(),
            password_reset_redirect: password_reset_redirect.to_string(),
        }
    }

    /// Home when a session exists, Login otherwise (also on lookup errors)
    pub async fn start_route(&self) -> Route {
        match self.auth.get_session().await {
            Ok(Some(_)) => Route::Home,
            Ok(None) => Route::Login,
            Err(e) => {
                warn!(component = "auth", "Session lookup failed: {:#}", e);
                Route::Login
            }
        }
    }

    pub async fn current_user(&self) -> AgendaResult<Option<AuthUser>> {
        self.auth.current_user().await.map_err(AgendaError::auth)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> AgendaResult<Session> {
        let session = self
            .auth
            .sign_in_with_password(email.trim(), password)
            .await
            .map_err(|e| {
                warn!(component = "auth", "Sign-in failed: {:#}", e);
                AgendaError::auth(e)
            })?;
        info!(component = "auth", user_id = %session.user.id, "User signed in");
        Ok(session)
    }

    pub async fn sign_out(&self) -> AgendaResult<()> {
        self.auth.sign_out().await.map_err(|e| {
            warn!(component = "auth", "Sign-out failed: {:#}", e);
            AgendaError::auth(e)
        })
    }

    /// Ask for a password reset e-mail; an empty address never reaches the
    /// backend
    pub async fn request_password_reset(&self, email: &str) -> AgendaResult<()> {
        let email = email.trim();
        if email.is_empty() {
            return Err(ValidationError::MissingEmail.into());
        }
        self.auth
            .reset_password_for_email(email, &self.password_reset_redirect)
            .await
            .map_err(|e| {
                warn!(component = "auth", "Password reset request failed: {:#}", e);
                AgendaError::auth(e)
            })
    }
}
