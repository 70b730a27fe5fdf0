use anyhow::{anyhow, Result};
use serde_json::Value;
use shared::{AuthUser, ChangeEvent, ChangeFilter, ChangeNotification, Client, Profile, Session};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use super::collaborators::{MemoryAuth, MemoryChangeFeed, MemoryObjectStorage};
use super::repositories::MemoryRepository;
use crate::backend::remote::mappers::{
    value_as_text, AppointmentRecord, ClientMapper, ClientRow, ProfileRow,
};
use crate::backend::remote::traits::{ChannelId, Connection};

/// A collaborator call that can be made to fail or slow down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteOperation {
    ListAppointments,
    GetAppointment,
    InsertAppointment,
    DeleteAppointment,
    SearchClients,
    ClientsWithBirthday,
    InsertClient,
    UpdateClient,
    GetProfile,
    ListProfiles,
    UpdateProfile,
    GetSession,
    CurrentUser,
    SignIn,
    SignOut,
    ResetPassword,
    Subscribe,
    Upload,
}

/// Call counters exposed to tests
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallStats {
    pub list_appointment_calls: usize,
    pub insert_appointment_calls: usize,
    pub delete_appointment_calls: usize,
    pub subscribe_calls: usize,
    pub remove_channel_calls: usize,
    pub open_channels: usize,
    pub max_open_channels: usize,
}

#[derive(Debug, Default)]
pub(super) struct Tables {
    pub appointments: Vec<AppointmentRecord>,
    pub clients: Vec<ClientRow>,
    pub profiles: Vec<ProfileRow>,
}

impl Tables {
    pub fn client_name(&self, client_id: &str) -> Option<String> {
        self.clients
            .iter()
            .find(|client| client.id == client_id)
            .and_then(|client| client.nome.clone())
    }

    pub fn professional_name(&self, profile_id: &str) -> Option<String> {
        self.profiles
            .iter()
            .find(|profile| profile.id == profile_id)
            .and_then(|profile| profile.nome.clone())
    }
}

#[derive(Debug)]
pub(super) struct MemoryUser {
    pub user: AuthUser,
    pub password: String,
}

#[derive(Debug, Default)]
pub(super) struct AuthState {
    /// Registered users keyed by e-mail
    pub users: HashMap<String, MemoryUser>,
    pub session: Option<Session>,
    pub reset_requests: Vec<(String, String)>,
}

#[derive(Debug)]
pub(super) struct OpenChannel {
    pub name: String,
    pub filter: ChangeFilter,
    pub sender: mpsc::UnboundedSender<ChangeNotification>,
}

impl OpenChannel {
    fn wants(&self, notification: &ChangeNotification) -> bool {
        if self.filter.table != notification.table || !self.filter.event.accepts(notification.event)
        {
            return false;
        }
        let column = self.filter.column.as_str();
        [&notification.record, &notification.old_record]
            .iter()
            .filter_map(|row| row.get(column))
            .filter_map(value_as_text)
            .any(|value| value == self.filter.value)
    }
}

#[derive(Debug, Clone)]
pub(super) struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Everything the in-memory backend holds, shared by every handle
#[derive(Debug, Default)]
pub(super) struct MemoryState {
    pub tables: Mutex<Tables>,
    pub auth: Mutex<AuthState>,
    pub channels: Mutex<HashMap<ChannelId, OpenChannel>>,
    pub objects: Mutex<HashMap<String, StoredObject>>,
    faults: Mutex<HashMap<RemoteOperation, String>>,
    latencies: Mutex<HashMap<RemoteOperation, Duration>>,
    pub stats: Mutex<CallStats>,
    pub unordered: AtomicBool,
}

/// Lock a std mutex, recovering the data if a panicking test poisoned it
pub(super) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryState {
    /// Apply configured latency, then fail if a fault is injected for `operation`
    pub async fn enter(&self, operation: RemoteOperation) -> Result<()> {
        let latency = lock(&self.latencies).get(&operation).copied();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        match lock(&self.faults).get(&operation) {
            Some(message) => Err(anyhow!(message.clone())),
            None => Ok(()),
        }
    }

    pub fn record_stats(&self, update: impl FnOnce(&mut CallStats)) {
        update(&mut lock(&self.stats));
    }

    /// Deliver a row change to every open channel whose filter matches it
    pub fn publish(&self, notification: ChangeNotification) {
        let channels = lock(&self.channels);
        for (channel_id, channel) in channels.iter() {
            if channel.wants(&notification) {
                trace!(component = "memory", channel = %channel_id, "Delivering change");
                // A closed receiver means the listener is already gone
                let _ = channel.sender.send(notification.clone());
            }
        }
    }

    pub fn publish_appointment(&self, event: ChangeEvent, record: Value, old_record: Value) {
        self.publish(ChangeNotification {
            table: crate::backend::remote::APPOINTMENTS_TABLE.to_string(),
            event,
            record,
            old_record,
        });
    }
}

/// In-process backend with the same collaborator surface as the HTTP binding
///
/// Cloning is cheap; every clone sees the same tables, session and channels.
#[derive(Debug, Clone, Default)]
pub struct MemoryConnection {
    state: Arc<MemoryState>,
}

impl MemoryConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call to `operation` fail with `message` until recovered
    pub fn fail(&self, operation: RemoteOperation, message: &str) {
        debug!(component = "memory", ?operation, "Injecting failure");
        lock(&self.state.faults).insert(operation, message.to_string());
    }

    pub fn recover(&self, operation: RemoteOperation) {
        lock(&self.state.faults).remove(&operation);
    }

    /// Delay every call to `operation`
    pub fn set_latency(&self, operation: RemoteOperation, latency: Duration) {
        lock(&self.state.latencies).insert(operation, latency);
    }

    /// Return appointment rows in insertion order instead of by time
    pub fn set_return_unordered(&self, unordered: bool) {
        self.state.unordered.store(unordered, Ordering::SeqCst);
    }

    pub fn stats(&self) -> CallStats {
        lock(&self.state.stats).clone()
    }

    /// Register a user that can sign in with `email` / `password`
    pub fn add_user(&self, email: &str, password: &str) -> AuthUser {
        let user = AuthUser {
            id: uuid::Uuid::new_v4().to_string(),
            email: Some(email.to_string()),
        };
        lock(&self.state.auth).users.insert(
            email.to_string(),
            MemoryUser {
                user: user.clone(),
                password: password.to_string(),
            },
        );
        user
    }

    /// Install a session for `user` without going through sign-in
    pub fn sign_in_as(&self, user: &AuthUser) {
        lock(&self.state.auth).session = Some(Session {
            access_token: format!("memory-token-{}", user.id),
            refresh_token: None,
            user: user.clone(),
        });
    }

    pub fn session(&self) -> Option<Session> {
        lock(&self.state.auth).session.clone()
    }

    /// Password reset requests received so far as (email, redirect) pairs
    pub fn reset_requests(&self) -> Vec<(String, String)> {
        lock(&self.state.auth).reset_requests.clone()
    }

    pub fn seed_profile(&self, profile: Profile) {
        lock(&self.state.tables).profiles.push(ProfileRow {
            id: profile.id,
            nome: Some(profile.name),
            email: profile.email,
            photo_url: profile.photo_url,
            cargo: profile.role,
            telefone: profile.phone,
        });
    }

    pub fn profile(&self, profile_id: &str) -> Option<ProfileRow> {
        lock(&self.state.tables)
            .profiles
            .iter()
            .find(|profile| profile.id == profile_id)
            .cloned()
    }

    /// Seed a client and return its id
    pub fn seed_client(&self, name: &str, phone: &str, birth_date: &str) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        lock(&self.state.tables).clients.push(ClientRow {
            id: id.clone(),
            nome: Some(name.to_string()),
            email: None,
            telefone: Some(phone.to_string()),
            data_nascimento: Some(birth_date.to_string()),
        });
        id
    }

    pub fn clients(&self) -> Vec<Client> {
        ClientMapper::to_dto_list(lock(&self.state.tables).clients.clone())
    }

    /// Seed an appointment row without emitting a change
    pub fn seed_appointment(&self, record: AppointmentRecord) {
        lock(&self.state.tables).appointments.push(record);
    }

    pub fn appointments(&self) -> Vec<AppointmentRecord> {
        lock(&self.state.tables).appointments.clone()
    }

    /// Emit a change as if another device had written the row
    pub fn emit_change(&self, notification: ChangeNotification) {
        self.state.publish(notification);
    }

    /// Stored bytes and content type of an uploaded object
    pub fn object(&self, bucket: &str, key: &str) -> Option<(Vec<u8>, String)> {
        lock(&self.state.objects)
            .get(&format!("{}/{}", bucket, key))
            .map(|object| (object.bytes.clone(), object.content_type.clone()))
    }

    pub fn open_channel_names(&self) -> Vec<String> {
        lock(&self.state.channels)
            .values()
            .map(|channel| channel.name.clone())
            .collect()
    }
}

impl Connection for MemoryConnection {
    type AppointmentRepository = MemoryRepository;
    type ClientRepository = MemoryRepository;
    type ProfileRepository = MemoryRepository;
    type Auth = MemoryAuth;
    type Realtime = MemoryChangeFeed;
    type Storage = MemoryObjectStorage;

    fn create_appointment_repository(&self) -> Self::AppointmentRepository {
        MemoryRepository::new(self.state.clone())
    }

    fn create_client_repository(&self) -> Self::ClientRepository {
        MemoryRepository::new(self.state.clone())
    }

    fn create_profile_repository(&self) -> Self::ProfileRepository {
        MemoryRepository::new(self.state.clone())
    }

    fn auth(&self) -> Self::Auth {
        MemoryAuth::new(self.state.clone())
    }

    fn realtime(&self) -> Self::Realtime {
        MemoryChangeFeed::new(self.state.clone())
    }

    fn storage(&self) -> Self::Storage {
        MemoryObjectStorage::new(self.state.clone())
    }
}
