//! # Remote Collaborator Traits
//!
//! This module defines the abstraction traits over the managed backend so that
//! different bindings (the HTTP/WebSocket binding, the in-memory backend) can be
//! used interchangeably by the domain layer.

use anyhow::Result;
use async_trait::async_trait;
use shared::{
    Appointment, AuthUser, CalendarDay, ChangeFilter, ChangeNotification, Client, ClientDraft,
    NewAppointment, Profile, ProfileUpdate, Session,
};
use std::fmt;
use tokio::sync::mpsc;

/// Trait defining the interface for appointment row operations
///
/// Rows come back joined with the client's and the professional's display
/// names.
#[async_trait]
pub trait AppointmentStorage: Send + Sync {
    /// List appointments on `day`, optionally scoped to one professional
    /// Returns appointments ordered by time ascending
    async fn list_appointments(
        &self,
        day: &CalendarDay,
        professional_id: Option<&str>,
    ) -> Result<Vec<Appointment>>;

    /// Retrieve a specific appointment by ID
    async fn get_appointment(&self, appointment_id: &str) -> Result<Option<Appointment>>;

    /// Store a new appointment
    async fn insert_appointment(&self, appointment: &NewAppointment) -> Result<()>;

    /// Delete exactly one appointment by ID
    async fn delete_appointment(&self, appointment_id: &str) -> Result<()>;
}

/// How a client name search matches
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamePattern {
    /// Case-insensitive "starts with"
    Prefix(String),
    /// Case-insensitive "contains"
    Contains(String),
}

impl NamePattern {
    pub fn matches(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        match self {
            NamePattern::Prefix(text) => name.starts_with(&text.to_lowercase()),
            NamePattern::Contains(text) => name.contains(&text.to_lowercase()),
        }
    }
}

/// Trait defining the interface for client row operations
#[async_trait]
pub trait ClientStorage: Send + Sync {
    /// Search clients by name
    async fn search_clients(&self, pattern: &NamePattern) -> Result<Vec<Client>>;

    /// Clients whose birth date falls on the given month/day of any year
    async fn clients_with_birthday(&self, month: u32, day: u32) -> Result<Vec<Client>>;

    /// Store a new client
    async fn insert_client(&self, client: &ClientDraft) -> Result<()>;

    /// Update an existing client by ID
    async fn update_client(&self, client_id: &str, client: &ClientDraft) -> Result<()>;
}

/// Trait defining the interface for staff profile row operations
#[async_trait]
pub trait ProfileStorage: Send + Sync {
    /// Retrieve a profile by user ID
    async fn get_profile(&self, profile_id: &str) -> Result<Option<Profile>>;

    /// List every profile (the salon's professionals)
    async fn list_profiles(&self) -> Result<Vec<Profile>>;

    /// Update a profile by user ID
    async fn update_profile(&self, profile_id: &str, update: &ProfileUpdate) -> Result<()>;
}

/// Trait defining the interface for the session/auth collaborator
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// The locally held session, if any
    async fn get_session(&self) -> Result<Option<Session>>;

    /// The authenticated user as confirmed by the collaborator
    async fn current_user(&self) -> Result<Option<AuthUser>>;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session>;

    async fn sign_out(&self) -> Result<()>;

    async fn reset_password_for_email(&self, email: &str, redirect_to: &str) -> Result<()>;
}

/// Identifier of an open realtime channel
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelId(pub String);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An open, confirmed change subscription
///
/// Notifications arrive on `notifications` until the channel is removed.
#[derive(Debug)]
pub struct ChangeSubscription {
    pub channel_id: ChannelId,
    pub notifications: mpsc::UnboundedReceiver<ChangeNotification>,
}

/// Trait defining the interface for the change-notification collaborator
#[async_trait]
pub trait ChangeFeed: Send + Sync {
    /// Open a named channel and wait for the collaborator to confirm it
    async fn subscribe(&self, channel: &str, filter: &ChangeFilter) -> Result<ChangeSubscription>;

    /// Release a channel; unknown or already released channels are ignored
    fn remove_channel(&self, channel_id: &ChannelId);
}

/// Trait defining the interface for the object storage collaborator
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Upload (or replace) an object under `key`
    async fn upload(&self, bucket: &str, key: &str, bytes: Vec<u8>, content_type: &str)
        -> Result<()>;

    /// Public URL for an object
    fn public_url(&self, bucket: &str, key: &str) -> String;
}

/// Trait defining the interface for backend connections
///
/// A connection is the single injected handle to the backend; services ask it
/// for the collaborator they need instead of reaching for a global client.
pub trait Connection: Send + Sync + Clone + 'static {
    type AppointmentRepository: AppointmentStorage + Clone + 'static;
    type ClientRepository: ClientStorage + Clone + 'static;
    type ProfileRepository: ProfileStorage + Clone + 'static;
    type Auth: AuthProvider + Clone + 'static;
    type Realtime: ChangeFeed + Clone + 'static;
    type Storage: ObjectStorage + Clone + 'static;

    fn create_appointment_repository(&self) -> Self::AppointmentRepository;

    fn create_client_repository(&self) -> Self::ClientRepository;

    fn create_profile_repository(&self) -> Self::ProfileRepository;

    fn auth(&self) -> Self::Auth;

    fn realtime(&self) -> Self::Realtime;

    fn storage(&self) -> Self::Storage;
}
