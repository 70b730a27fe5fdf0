use anyhow::{bail, Result};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use shared::Session;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tokio::sync::oneshot;
use tracing::{debug, info};

use super::auth::HttpAuth;
use super::realtime::HttpChangeFeed;
use super::rest::HttpRepository;
use super::storage::HttpObjectStorage;
use crate::backend::remote::traits::{ChannelId, Connection};
use crate::config::AppConfig;

/// Base URL, API key and session shared by every HTTP collaborator
#[derive(Debug)]
pub(super) struct HttpCore {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
    session: RwLock<Option<Session>>,
}

impl HttpCore {
    pub fn anon_key(&self) -> &str {
        &self.anon_key
    }

    pub fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    pub fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    pub fn storage_url(&self, path: &str) -> String {
        format!("{}/storage/v1/{}", self.base_url, path)
    }

    /// WebSocket endpoint of the realtime service
    pub fn realtime_url(&self) -> String {
        let socket_base = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            self.base_url.clone()
        };
        format!(
            "{}/realtime/v1/websocket?apikey={}&vsn=1.0.0",
            socket_base, self.anon_key
        )
    }

    pub fn session(&self) -> Option<Session> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_session(&self, session: Option<Session>) {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = session;
    }

    /// Session access token, or the anon key when signed out
    pub fn bearer_token(&self) -> String {
        self.session()
            .map(|session| session.access_token)
            .unwrap_or_else(|| self.anon_key.clone())
    }

    /// Request carrying the `apikey` header and bearer token
    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer_token())
    }

    /// Send a request, turning non-2xx answers into an error carrying the
    /// backend's own message
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        debug!(component = "http", %status, "Backend rejected request");
        bail!(error_message(status, &body))
    }
}

/// Error text from a backend error body
///
/// PostgREST answers `message`, GoTrue `msg` or `error_description`, storage
/// `error`; anything else falls back to the raw body.
pub fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        for key in ["message", "msg", "error_description", "error"] {
            if let Some(Value::String(text)) = value.get(key) {
                return text.clone();
            }
        }
    }
    let body = body.trim();
    if body.is_empty() {
        status.to_string()
    } else {
        body.to_string()
    }
}

/// Open realtime channels, each holding the signal that makes its socket
/// task leave and close
pub(super) type ChannelRegistry = Arc<Mutex<HashMap<ChannelId, oneshot::Sender<()>>>>;

pub(super) fn lock_channels(
    channels: &ChannelRegistry,
) -> MutexGuard<'_, HashMap<ChannelId, oneshot::Sender<()>>> {
    channels.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Connection to a Supabase-compatible backend over HTTP and WebSocket
#[derive(Debug, Clone)]
pub struct HttpConnection {
    core: Arc<HttpCore>,
    channels: ChannelRegistry,
}

impl HttpConnection {
    pub fn new(base_url: &str, anon_key: &str) -> Self {
        Self {
            core: Arc::new(HttpCore {
                client: reqwest::Client::new(),
                base_url: base_url.trim_end_matches('/').to_string(),
                anon_key: anon_key.to_string(),
                session: RwLock::new(None),
            }),
            channels: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        info!(component = "http", url = %config.supabase_url, "Creating backend connection");
        Self::new(&config.supabase_url, &config.supabase_anon_key)
    }

    /// Install a previously obtained session (e.g. restored by the shell)
    pub fn restore_session(&self, session: Session) {
        self.core.set_session(Some(session));
    }
}

impl Connection for HttpConnection {
    type AppointmentRepository = HttpRepository;
    type ClientRepository = HttpRepository;
    type ProfileRepository = HttpRepository;
    type Auth = HttpAuth;
    type Realtime = HttpChangeFeed;
    type Storage = HttpObjectStorage;

    fn create_appointment_repository(&self) -> Self::AppointmentRepository {
        HttpRepository::new(self.core.clone())
    }

    fn create_client_repository(&self) -> Self::ClientRepository {
        HttpRepository::new(self.core.clone())
    }

    fn create_profile_repository(&self) -> Self::ProfileRepository {
        HttpRepository::new(self.core.clone())
    }

    fn auth(&self) -> Self::Auth {
        HttpAuth::new(self.core.clone())
    }

    fn realtime(&self) -> Self::Realtime {
        HttpChangeFeed::new(self.core.clone(), self.channels.clone())
    }

    fn storage(&self) -> Self::Storage {
        HttpObjectStorage::new(self.core.clone())
    }
}
