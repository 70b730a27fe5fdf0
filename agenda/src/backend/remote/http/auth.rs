use anyhow::Result;
use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use shared::{AuthUser, Session};
use std::sync::Arc;
use tracing::{debug, info};

use super::connection::{error_message, HttpCore};
use crate::backend::remote::traits::AuthProvider;

#[derive(Debug, Deserialize)]
struct UserBody {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

impl From<UserBody> for AuthUser {
    fn from(body: UserBody) -> Self {
        AuthUser {
            id: body.id,
            email: body.email,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenBody {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    user: UserBody,
}

/// GoTrue session collaborator; the session itself lives on the connection
#[derive(Debug, Clone)]
pub struct HttpAuth {
    core: Arc<HttpCore>,
}

impl HttpAuth {
    pub(super) fn new(core: Arc<HttpCore>) -> Self {
        Self { core }
    }
}

#[async_trait]
impl AuthProvider for HttpAuth {
    async fn get_session(&self) -> Result<Option<Session>> {
        Ok(self.core.session())
    }

    async fn current_user(&self) -> Result<Option<AuthUser>> {
        if self.core.session().is_none() {
            return Ok(None);
        }
        let url = self.core.auth_url("user");
        let response = self.core.request(Method::GET, &url).send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            debug!(component = "auth", "Session token rejected");
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!(error_message(status, &body));
        }
        let user: UserBody = response.json().await?;
        Ok(Some(user.into()))
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        let url = self.core.auth_url("token");
        let builder = self
            .core
            .request(Method::POST, &url)
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }));
        let body: TokenBody = self.core.send(builder).await?.json().await?;

        let session = Session {
            access_token: body.access_token,
            refresh_token: body.refresh_token,
            user: body.user.into(),
        };
        self.core.set_session(Some(session.clone()));
        info!(component = "auth", user_id = %session.user.id, "Signed in");
        Ok(session)
    }

    async fn sign_out(&self) -> Result<()> {
        let url = self.core.auth_url("logout");
        let result = self
            .core
            .send(self.core.request(Method::POST, &url))
            .await
            .map(|_| ());
        // The local session is dropped even when the server call fails
        self.core.set_session(None);
        result
    }

    async fn reset_password_for_email(&self, email: &str, redirect_to: &str) -> Result<()> {
        let url = self.core.auth_url("recover");
        let builder = self
            .core
            .request(Method::POST, &url)
            .query(&[("redirect_to", redirect_to)])
            .json(&json!({ "email": email }));
        self.core.send(builder).await?;
        Ok(())
    }
}
