//! # Backend Module
//!
//! Contains all non-UI logic of the salon agenda.
//!
//! This module serves as the orchestration layer that brings together:
//! - **Domain**: Business rules for days, appointments, clients and profiles
//! - **Remote**: The hosted backend binding and its in-memory counterpart
//! - **IO**: Screen controllers that turn user actions into domain calls
//!
//! The backend is UI-agnostic: a mobile shell, a desktop UI or the bundled
//! CLI drive the same screen controllers.
//!
//! ## Architecture
//!
//! ```text
//! UI Layer (shell, CLI)
//!     ↓
//! IO Layer (screen controllers)
//!     ↓
//! Domain Layer (services, cursor, snapshots, live refresh)
//!     ↓
//! Remote Layer (REST, auth, realtime, storage)
//! ```
//!
//! ## Key Responsibilities
//!
//! - Build the application state from an injected connection
//! - Share one set of services between all screens

pub mod domain;
pub mod io;
pub mod remote;

use tracing::info;

use crate::config::AppConfig;
use domain::{AppointmentQueryService, AuthService, ClientService, ProfileService};
use remote::Connection;

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState<C: Connection> {
    pub connection: C,
    pub config: AppConfig,
    pub appointment_service: AppointmentQueryService<C>,
    pub client_service: ClientService<C>,
    pub profile_service: ProfileService<C>,
    pub auth_service: AuthService<C>,
}

/// Initialize the backend with all required services
pub fn initialize_backend<C: Connection>(connection: C, config: AppConfig) -> AppState<C> {
    info!(component = "backend", "Setting up domain services");
    let appointment_service = AppointmentQueryService::new(&connection);
    let client_service = ClientService::new(&connection);
    let profile_service = ProfileService::new(&connection, &config.avatar_bucket);
    let auth_service = AuthService::new(&connection, &config.password_reset_redirect);

    info!(component = "backend", "Setting up application state");
    AppState {
        connection,
        config,
        appointment_service,
        client_service,
        profile_service,
        auth_service,
    }
}

#[cfg(test)]
pub mod test_support {
    use super::*;
    use crate::backend::remote::memory::test_utils::SalonFixture;
    use crate::backend::remote::MemoryConnection;

    /// Application state over the fixture's memory backend
    pub fn app_state(fixture: &SalonFixture) -> AppState<MemoryConnection> {
        initialize_backend(
            fixture.connection.clone(),
            AppConfig::for_backend("memory://", "anon"),
        )
    }
}
