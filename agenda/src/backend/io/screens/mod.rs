//! Screen controllers, one per app screen.

pub mod agenda;
pub mod booking;
pub mod client_registration;
pub mod details;
pub mod home;
pub mod login;
pub mod profile;
pub mod start;

pub use agenda::AgendaScreen;
pub use booking::BookingScreen;
pub use client_registration::ClientRegistrationScreen;
pub use details::AppointmentDetailsScreen;
pub use home::HomeScreen;
pub use login::LoginScreen;
pub use profile::ProfileScreen;
pub use start::StartScreen;

use shared::Alert;
use tracing::warn;

use crate::backend::domain::{AppointmentSync, LiveRefreshListener};
use crate::backend::remote::Connection;
use crate::backend::AppState;

/// Holds at most one pending alert until the UI takes it
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AlertSlot(Option<Alert>);

impl AlertSlot {
    pub fn show(&mut self, alert: Alert) {
        self.0 = Some(alert);
    }

    pub fn pending(&self) -> Option<&Alert> {
        self.0.as_ref()
    }

    pub fn take(&mut self) -> Option<Alert> {
        self.0.take()
    }
}

/// New listener that re-fetches `sync`'s current query on every change
///
/// A listener that could not subscribe is still returned; it simply never
/// fires.
pub(crate) async fn attach_live_refresh<C: Connection>(
    state: &AppState<C>,
    sync: &AppointmentSync<C>,
) -> LiveRefreshListener<C> {
    let mut listener = LiveRefreshListener::new(&state.connection, &state.config.realtime_channel);
    let sync = sync.clone();
    let activated = listener
        .activate(move |_| {
            let sync = sync.clone();
            async move {
                if let Some(Err(e)) = sync.refresh_current().await {
                    warn!(component = "screens", "Live re-fetch failed: {}", e);
                }
            }
        })
        .await;
    if let Err(e) = activated {
        warn!(component = "screens", "Live refresh unavailable: {}", e);
    }
    listener
}
