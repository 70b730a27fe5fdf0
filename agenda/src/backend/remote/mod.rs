//! # Remote Module
//!
//! Everything the salon agenda keeps lives in a managed backend-as-a-service:
//! rows (appointments, clients, staff profiles), the session, realtime row
//! change notifications and avatar images.
//!
//! This module hides the concrete binding behind the collaborator traits in
//! [`traits`], bundled into a single injected [`Connection`]. The domain layer
//! never talks to a global client.
//!
//! ## Implementations
//!
//! - **http**: REST/WebSocket binding against a Supabase-compatible backend
//!   (PostgREST rows, GoTrue auth, storage buckets, Phoenix realtime channels)
//! - **memory**: in-process backend used by the test suite, with fault
//!   injection and call counters
//!
//! ## Design Principles
//!
//! - **Repository Pattern**: per-table traits, created by the connection
//! - **Dependency Inversion**: services are generic over `C: Connection`
//! - **Wire Isolation**: Portuguese column names stay inside [`mappers`]

pub mod http;
pub mod mappers;
pub mod memory;
pub mod traits;

pub use http::HttpConnection;
pub use memory::MemoryConnection;
pub use traits::{
    AppointmentStorage, AuthProvider, ChangeFeed, ChangeSubscription, ChannelId, ClientStorage,
    Connection, NamePattern, ObjectStorage, ProfileStorage,
};

/// Appointment table
pub const APPOINTMENTS_TABLE: &str = "agendamentos";
/// Client table
pub const CLIENTS_TABLE: &str = "clientes";
/// Staff profile table
pub const PROFILES_TABLE: &str = "profiles";
/// Column that ties an appointment to its professional
pub const PROFESSIONAL_COLUMN: &str = "profissional_id";
