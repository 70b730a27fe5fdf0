//! Live refresh listener.
//!
//! Subscribes to row changes of the signed-in professional's appointments
//! and runs a callback (normally a full re-fetch) for every notification.
//!
//! ```text
//! Unsubscribed --activate--> Subscribing --confirmed--> Subscribed
//!      ^                         |                          |
//!      +------ no user / fail ---+                      release / drop
//!                                                           v
//!                                                        Released
//! ```
//!
//! A listener is single-use: screens create a new one on every activation.

use shared::{ChangeFilter, ChangeNotification};
use std::future::Future;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::error::{AgendaError, AgendaResult};
use crate::backend::remote::{
    AuthProvider, ChangeFeed, ChannelId, Connection, APPOINTMENTS_TABLE, PROFESSIONAL_COLUMN,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Unsubscribed,
    Subscribing,
    Subscribed,
    Released,
}

pub struct LiveRefreshListener<C: Connection> {
    auth: C::Auth,
    realtime: C::Realtime,
    channel_name: String,
    state: ListenerState,
    channel_id: Option<ChannelId>,
    pump: Option<JoinHandle<()>>,
}

impl<C: Connection> LiveRefreshListener<C> {
    pub fn new(connection: &C, channel_name: &str) -> Self {
        Self {
            auth: connection.auth(),
            realtime: connection.realtime(),
            channel_name: channel_name.to_string(),
            state: ListenerState::Unsubscribed,
            channel_id: None,
            pump: None,
        }
    }

    pub fn state(&self) -> ListenerState {
        self.state
    }

    pub fn channel_id(&self) -> Option<&ChannelId> {
        self.channel_id.as_ref()
    }

    /// Subscribe for the current user and call `on_change` per notification
    ///
    /// Without a signed-in user the listener stays `Unsubscribed` and no
    /// error is reported. A subscribe failure also leaves it `Unsubscribed`.
    pub async fn activate<F, Fut>(&mut self, on_change: F) -> AgendaResult<ListenerState>
    where
        F: Fn(ChangeNotification) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if self.state != ListenerState::Unsubscribed {
            debug!(component = "live_refresh", state = ?self.state, "Listener already activated");
            return Ok(self.state);
        }

        let user = match self.auth.current_user().await {
            Ok(Some(user)) => user,
            Ok(None) => {
                debug!(component = "live_refresh", "No signed-in user, not subscribing");
                return Ok(self.state);
            }
            Err(e) => {
                warn!(component = "live_refresh", "Could not resolve user: {:#}", e);
                return Err(AgendaError::auth(e));
            }
        };

        self.state = ListenerState::Subscribing;
        let filter = ChangeFilter::equals(APPOINTMENTS_TABLE, PROFESSIONAL_COLUMN, &user.id);
        let subscription = match self.realtime.subscribe(&self.channel_name, &filter).await {
            Ok(subscription) => subscription,
            Err(e) => {
                self.state = ListenerState::Unsubscribed;
                warn!(component = "live_refresh", channel = %self.channel_name, "Subscribe failed: {:#}", e);
                return Err(AgendaError::subscribe(e));
            }
        };

        let mut notifications = subscription.notifications;
        self.pump = Some(tokio::spawn(async move {
            while let Some(notification) = notifications.recv().await {
                debug!(component = "live_refresh", event = notification.event.as_str(), "Change received");
                on_change(notification).await;
            }
        }));
        info!(component = "live_refresh", channel = %subscription.channel_id, user_id = %user.id, "Live refresh active");
        self.channel_id = Some(subscription.channel_id);
        self.state = ListenerState::Subscribed;
        Ok(self.state)
    }

    /// Stop the notification pump and release the channel; runs once
    pub fn release(&mut self) {
        if self.state == ListenerState::Released {
            return;
        }
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
        if let Some(channel_id) = self.channel_id.take() {
            self.realtime.remove_channel(&channel_id);
            debug!(component = "live_refresh", channel = %channel_id, "Live refresh released");
        }
        self.state = ListenerState::Released;
    }
}

impl<C: Connection> Drop for LiveRefreshListener<C> {
    fn drop(&mut self) {
        self.release();
    }
}
