use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::{AuthUser, ChangeFilter, Session};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

use super::connection::{lock, MemoryState, OpenChannel, RemoteOperation, StoredObject};
use crate::backend::remote::traits::{
    AuthProvider, ChangeFeed, ChangeSubscription, ChannelId, ObjectStorage,
};

/// Session/auth collaborator over the in-memory user table
#[derive(Debug, Clone)]
pub struct MemoryAuth {
    state: Arc<MemoryState>,
}

impl MemoryAuth {
    pub(super) fn new(state: Arc<MemoryState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl AuthProvider for MemoryAuth {
    async fn get_session(&self) -> Result<Option<Session>> {
        self.state.enter(RemoteOperation::GetSession).await?;
        Ok(lock(&self.state.auth).session.clone())
    }

    async fn current_user(&self) -> Result<Option<AuthUser>> {
        self.state.enter(RemoteOperation::CurrentUser).await?;
        Ok(lock(&self.state.auth)
            .session
            .as_ref()
            .map(|session| session.user.clone()))
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        self.state.enter(RemoteOperation::SignIn).await?;
        let mut auth = lock(&self.state.auth);
        let user = match auth.users.get(email) {
            Some(registered) if registered.password == password => registered.user.clone(),
            _ => return Err(anyhow!("Invalid login credentials")),
        };
        let session = Session {
            access_token: format!("memory-token-{}", user.id),
            refresh_token: Some(uuid::Uuid::new_v4().to_string()),
            user,
        };
        auth.session = Some(session.clone());
        Ok(session)
    }

    async fn sign_out(&self) -> Result<()> {
        self.state.enter(RemoteOperation::SignOut).await?;
        lock(&self.state.auth).session = None;
        Ok(())
    }

    async fn reset_password_for_email(&self, email: &str, redirect_to: &str) -> Result<()> {
        self.state.enter(RemoteOperation::ResetPassword).await?;
        lock(&self.state.auth)
            .reset_requests
            .push((email.to_string(), redirect_to.to_string()));
        Ok(())
    }
}

/// Change-notification collaborator fanning out in-memory row changes
#[derive(Debug, Clone)]
pub struct MemoryChangeFeed {
    state: Arc<MemoryState>,
}

impl MemoryChangeFeed {
    pub(super) fn new(state: Arc<MemoryState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl ChangeFeed for MemoryChangeFeed {
    async fn subscribe(&self, channel: &str, filter: &ChangeFilter) -> Result<ChangeSubscription> {
        self.state.record_stats(|stats| stats.subscribe_calls += 1);
        self.state.enter(RemoteOperation::Subscribe).await?;

        let channel_id = ChannelId(format!("{}:{}", channel, uuid::Uuid::new_v4()));
        let (sender, notifications) = mpsc::unbounded_channel();
        let open = {
            let mut channels = lock(&self.state.channels);
            channels.insert(
                channel_id.clone(),
                OpenChannel {
                    name: channel.to_string(),
                    filter: filter.clone(),
                    sender,
                },
            );
            channels.len()
        };
        self.state.record_stats(|stats| {
            stats.open_channels = open;
            stats.max_open_channels = stats.max_open_channels.max(open);
        });
        debug!(component = "memory", channel = %channel_id, filter = %filter.expression(), "Channel opened");

        Ok(ChangeSubscription {
            channel_id,
            notifications,
        })
    }

    fn remove_channel(&self, channel_id: &ChannelId) {
        let open = {
            let mut channels = lock(&self.state.channels);
            channels.remove(channel_id);
            channels.len()
        };
        self.state.record_stats(|stats| {
            stats.remove_channel_calls += 1;
            stats.open_channels = open;
        });
        debug!(component = "memory", channel = %channel_id, "Channel removed");
    }
}

/// Object storage collaborator keeping uploads in a map
#[derive(Debug, Clone)]
pub struct MemoryObjectStorage {
    state: Arc<MemoryState>,
}

impl MemoryObjectStorage {
    pub(super) fn new(state: Arc<MemoryState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl ObjectStorage for MemoryObjectStorage {
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<()> {
        self.state.enter(RemoteOperation::Upload).await?;
        lock(&self.state.objects).insert(
            format!("{}/{}", bucket, key),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("memory://{}/{}", bucket, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::remote::memory::MemoryConnection;
    use crate::backend::remote::traits::{AppointmentStorage, Connection};
    use shared::{CalendarDay, NewAppointment};

    #[tokio::test]
    async fn test_sign_in_checks_password() {
        let connection = MemoryConnection::new();
        let user = connection.add_user("ana@salao.com", "segredo");
        let auth = connection.auth();

        assert!(auth
            .sign_in_with_password("ana@salao.com", "errada")
            .await
            .is_err());
        assert!(auth.get_session().await.unwrap().is_none());

        let session = auth
            .sign_in_with_password("ana@salao.com", "segredo")
            .await
            .unwrap();
        assert_eq!(session.user, user);
        assert_eq!(auth.current_user().await.unwrap(), Some(user));

        auth.sign_out().await.unwrap();
        assert!(auth.current_user().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_channel_receives_only_matching_professional() {
        let connection = MemoryConnection::new();
        let feed = connection.realtime();
        let filter = ChangeFilter::equals("agendamentos", "profissional_id", "p-1");
        let mut subscription = feed.subscribe("realtime-agendamentos", &filter).await.unwrap();

        let repo = connection.create_appointment_repository();
        let day = CalendarDay::from_ymd(2024, 3, 15).unwrap();
        for professional in ["p-2", "p-1"] {
            repo.insert_appointment(&NewAppointment {
                client_id: "c-1".to_string(),
                professional_id: professional.to_string(),
                date: day,
                time: "10:00".to_string(),
                note: String::new(),
            })
            .await
            .unwrap();
        }

        let notification = subscription.notifications.recv().await.unwrap();
        assert_eq!(notification.record["profissional_id"], "p-1");
        assert!(subscription.notifications.try_recv().is_err());

        feed.remove_channel(&subscription.channel_id);
        let stats = connection.stats();
        assert_eq!(stats.subscribe_calls, 1);
        assert_eq!(stats.remove_channel_calls, 1);
        assert_eq!(stats.open_channels, 0);
    }

    #[tokio::test]
    async fn test_upload_and_public_url() {
        let connection = MemoryConnection::new();
        let storage = connection.storage();
        storage
            .upload("avatars", "u-1.jpg", vec![1, 2, 3], "image/jpeg")
            .await
            .unwrap();

        assert_eq!(
            connection.object("avatars", "u-1.jpg"),
            Some((vec![1, 2, 3], "image/jpeg".to_string()))
        );
        assert_eq!(storage.public_url("avatars", "u-1.jpg"), "memory://avatars/u-1.jpg");
    }
}
