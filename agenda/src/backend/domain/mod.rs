//! # Domain Module
//!
//! Contains the business logic of the salon agenda.
//!
//! This module models the working day of a salon professional: which day is
//! being looked at, which appointments fall on it, who the clients are and
//! who is signed in. It talks to the backend only through the collaborator
//! traits in [`crate::backend::remote`], so every service runs unchanged
//! against the hosted backend or the in-memory one used in tests.
//!
//! ## Module Organization
//!
//! - **calendar**: Date cursor (today, displayed month, selected day) and pt-BR labels
//! - **day_strip**: Month and week day strips with centring scroll requests
//! - **appointment_service**: Day queries, single fetch, delete and booking
//! - **snapshot** / **appointment_sync**: Sequence-numbered list snapshots
//! - **live_refresh**: Realtime subscription lifecycle for a screen
//! - **appointment_list**: Rendering of a snapshot and the delete confirmation
//! - **client_service**: Client search, registration and birthdays
//! - **profile_service**: Staff profiles and avatars
//! - **auth_service**: Session routing, sign-in/out and password reset
//!
//! ## Business Rules
//!
//! - Tapping the selected day again goes back to today
//! - Day lists are always ordered by time, earliest first
//! - A failed fetch shows an empty list; nothing is retried
//! - A stale fetch response never replaces a newer one
//! - Deletes need an explicit confirmation and are never optimistic
//! - Bookings need a client, a date, a time and a professional

pub mod appointment_list;
pub mod appointment_service;
pub mod appointment_sync;
pub mod auth_service;
pub mod calendar;
pub mod client_service;
pub mod commands;
pub mod day_strip;
pub mod error;
pub mod live_refresh;
pub mod profile_service;
pub mod snapshot;

pub use appointment_list::{AppointmentListView, DeleteConfirmation, PromptChoice};
pub use appointment_service::AppointmentQueryService;
pub use appointment_sync::AppointmentSync;
pub use auth_service::AuthService;
pub use calendar::DateCursor;
pub use client_service::ClientService;
pub use day_strip::{DayStrip, DayStripRenderer, ScrollGeometry};
pub use error::{AgendaError, AgendaResult, ValidationError};
pub use live_refresh::{ListenerState, LiveRefreshListener};
pub use profile_service::ProfileService;
pub use snapshot::{AppointmentListSnapshot, ApplyOutcome};
