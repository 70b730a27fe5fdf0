//! Realtime change feed over the Phoenix channel protocol.
//!
//! Each subscription owns one WebSocket. The socket task forwards
//! `postgres_changes` messages, keeps the connection alive with heartbeats and
//! leaves the channel when its leave signal fires (or is dropped).

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shared::{ChangeEvent, ChangeFilter, ChangeNotification};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use super::connection::{lock_channels, ChannelRegistry, HttpCore};
use crate::backend::remote::traits::{ChangeFeed, ChangeSubscription, ChannelId};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
const JOIN_REF: &str = "1";

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// One Phoenix protocol frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhoenixMessage {
    pub topic: String,
    pub event: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(rename = "ref", default)]
    pub reference: Option<String>,
}

impl PhoenixMessage {
    fn to_text(&self) -> Result<Message> {
        Ok(Message::Text(serde_json::to_string(self)?))
    }
}

/// `phx_join` asking for row changes matching `filter`
pub fn join_message(topic: &str, filter: &ChangeFilter, access_token: &str) -> PhoenixMessage {
    PhoenixMessage {
        topic: topic.to_string(),
        event: "phx_join".to_string(),
        payload: json!({
            "config": {
                "broadcast": { "self": false },
                "presence": { "key": "" },
                "postgres_changes": [{
                    "event": filter.event.as_str(),
                    "schema": filter.schema,
                    "table": filter.table,
                    "filter": filter.expression(),
                }]
            },
            "access_token": access_token,
        }),
        reference: Some(JOIN_REF.to_string()),
    }
}

fn heartbeat_message(reference: u64) -> PhoenixMessage {
    PhoenixMessage {
        topic: "phoenix".to_string(),
        event: "heartbeat".to_string(),
        payload: json!({}),
        reference: Some(reference.to_string()),
    }
}

fn leave_message(topic: &str, reference: u64) -> PhoenixMessage {
    PhoenixMessage {
        topic: topic.to_string(),
        event: "phx_leave".to_string(),
        payload: json!({}),
        reference: Some(reference.to_string()),
    }
}

/// Outcome of the join, `None` while the frame is not the join reply
pub fn join_outcome(message: &PhoenixMessage, topic: &str) -> Option<Result<(), String>> {
    if message.event != "phx_reply"
        || message.topic != topic
        || message.reference.as_deref() != Some(JOIN_REF)
    {
        return None;
    }
    match message.payload.get("status").and_then(Value::as_str) {
        Some("ok") => Some(Ok(())),
        _ => {
            let reason = message
                .payload
                .pointer("/response/reason")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| message.payload.to_string());
            Some(Err(reason))
        }
    }
}

/// Row change carried by a `postgres_changes` frame
pub fn change_from_message(message: &PhoenixMessage) -> Option<ChangeNotification> {
    if message.event != "postgres_changes" {
        return None;
    }
    let data = message.payload.get("data")?;
    let event: ChangeEvent = serde_json::from_value(data.get("type")?.clone()).ok()?;
    Some(ChangeNotification {
        table: data.get("table")?.as_str()?.to_string(),
        event,
        record: data.get("record").cloned().unwrap_or(Value::Null),
        old_record: data.get("old_record").cloned().unwrap_or(Value::Null),
    })
}

/// Realtime collaborator; channels are tracked on the connection
#[derive(Debug, Clone)]
pub struct HttpChangeFeed {
    core: Arc<HttpCore>,
    channels: ChannelRegistry,
}

impl HttpChangeFeed {
    pub(super) fn new(core: Arc<HttpCore>, channels: ChannelRegistry) -> Self {
        Self { core, channels }
    }
}

#[async_trait]
impl ChangeFeed for HttpChangeFeed {
    async fn subscribe(&self, channel: &str, filter: &ChangeFilter) -> Result<ChangeSubscription> {
        let topic = format!("realtime:{}", channel);
        let (socket, _) = connect_async(self.core.realtime_url())
            .await
            .context("Failed to open realtime socket")?;
        let (mut write, mut read) = socket.split();

        let join = join_message(&topic, filter, &self.core.bearer_token());
        write.send(join.to_text()?).await?;

        loop {
            match read.next().await {
                Some(Ok(Message::Text(text))) => {
                    let Ok(message) = serde_json::from_str::<PhoenixMessage>(&text) else {
                        continue;
                    };
                    match join_outcome(&message, &topic) {
                        Some(Ok(())) => break,
                        Some(Err(reason)) => bail!(reason),
                        None => continue,
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    bail!("Realtime socket closed before the channel was confirmed")
                }
                Some(Err(e)) => return Err(anyhow!(e)),
                Some(Ok(_)) => {}
            }
        }

        let channel_id = ChannelId(format!("{}#{}", topic, uuid::Uuid::new_v4()));
        let (sender, notifications) = mpsc::unbounded_channel();
        let (leave_tx, leave_rx) = oneshot::channel();
        lock_channels(&self.channels).insert(channel_id.clone(), leave_tx);
        tokio::spawn(run_channel(write, read, topic, sender, leave_rx));

        info!(component = "realtime", channel = %channel_id, filter = %filter.expression(), "Channel subscribed");
        Ok(ChangeSubscription {
            channel_id,
            notifications,
        })
    }

    fn remove_channel(&self, channel_id: &ChannelId) {
        match lock_channels(&self.channels).remove(channel_id) {
            Some(leave) => {
                // The socket task may already have stopped on its own
                let _ = leave.send(());
                debug!(component = "realtime", channel = %channel_id, "Channel removed");
            }
            None => debug!(component = "realtime", channel = %channel_id, "Channel already removed"),
        }
    }
}

async fn run_channel(
    mut write: SplitSink<Socket, Message>,
    mut read: SplitStream<Socket>,
    topic: String,
    sender: mpsc::UnboundedSender<ChangeNotification>,
    mut leave: oneshot::Receiver<()>,
) {
    let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
    heartbeat.tick().await;
    let mut next_ref: u64 = 2;

    loop {
        tokio::select! {
            _ = &mut leave => break,
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    let message = match serde_json::from_str::<PhoenixMessage>(&text) {
                        Ok(message) => message,
                        Err(e) => {
                            debug!(component = "realtime", "Ignoring unparseable frame: {}", e);
                            continue;
                        }
                    };
                    if let Some(notification) = change_from_message(&message) {
                        if sender.send(notification).is_err() {
                            debug!(component = "realtime", %topic, "Listener gone");
                            break;
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    warn!(component = "realtime", %topic, "Realtime socket closed by server");
                    return;
                }
                Some(Err(e)) => {
                    warn!(component = "realtime", %topic, "Realtime socket error: {}", e);
                    return;
                }
                Some(Ok(_)) => {}
            },
            _ = heartbeat.tick() => {
                let sent = match heartbeat_message(next_ref).to_text() {
                    Ok(frame) => write.send(frame).await.is_ok(),
                    Err(_) => false,
                };
                next_ref += 1;
                if !sent {
                    warn!(component = "realtime", %topic, "Heartbeat failed");
                    return;
                }
            }
        }
    }

    if let Ok(frame) = leave_message(&topic, next_ref).to_text() {
        let _ = write.send(frame).await;
    }
    let _ = write.close().await;
    debug!(component = "realtime", %topic, "Left channel");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::remote::http::HttpConnection;
    use crate::backend::remote::traits::Connection;
    use tokio::net::TcpListener;

    fn filter() -> ChangeFilter {
        ChangeFilter::equals("agendamentos", "profissional_id", "u-1")
    }

    #[test]
    fn test_join_message_scopes_to_professional() {
        let message = join_message("realtime:realtime-agendamentos", &filter(), "jwt");
        assert_eq!(message.event, "phx_join");
        assert_eq!(message.reference.as_deref(), Some("1"));

        let change = &message.payload["config"]["postgres_changes"][0];
        assert_eq!(change["event"], "*");
        assert_eq!(change["schema"], "public");
        assert_eq!(change["table"], "agendamentos");
        assert_eq!(change["filter"], "profissional_id=eq.u-1");
        assert_eq!(message.payload["access_token"], "jwt");
    }

    #[test]
    fn test_join_outcome() {
        let topic = "realtime:agenda";
        let reply = |status: &str| PhoenixMessage {
            topic: topic.to_string(),
            event: "phx_reply".to_string(),
            payload: json!({ "status": status, "response": { "reason": "unmatched topic" } }),
            reference: Some("1".to_string()),
        };

        assert_eq!(join_outcome(&reply("ok"), topic), Some(Ok(())));
        assert_eq!(
            join_outcome(&reply("error"), topic),
            Some(Err("unmatched topic".to_string()))
        );

        let mut heartbeat_reply = reply("ok");
        heartbeat_reply.reference = Some("7".to_string());
        assert_eq!(join_outcome(&heartbeat_reply, topic), None);
    }

    #[test]
    fn test_change_from_postgres_changes_frame() {
        let frame: PhoenixMessage = serde_json::from_value(json!({
            "topic": "realtime:agenda",
            "event": "postgres_changes",
            "ref": null,
            "payload": {
                "ids": [1],
                "data": {
                    "type": "DELETE",
                    "table": "agendamentos",
                    "schema": "public",
                    "old_record": { "id": 42 },
                    "commit_timestamp": "2024-03-15T10:00:00Z"
                }
            }
        }))
        .unwrap();

        let notification = change_from_message(&frame).unwrap();
        assert_eq!(notification.event, ChangeEvent::Delete);
        assert_eq!(notification.table, "agendamentos");
        assert_eq!(notification.record, Value::Null);
        assert_eq!(notification.old_record["id"], 42);

        let presence = PhoenixMessage {
            event: "presence_state".to_string(),
            ..frame
        };
        assert!(change_from_message(&presence).is_none());
    }

    /// Minimal realtime server: confirms the join, pushes one change, then
    /// reports the frames it saw after that
    async fn spawn_realtime_server() -> (String, oneshot::Receiver<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let (report_tx, report_rx) = oneshot::channel();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut socket = tokio_tungstenite::accept_async(stream).await.unwrap();

            let join = match socket.next().await {
                Some(Ok(Message::Text(text))) => {
                    serde_json::from_str::<PhoenixMessage>(&text).unwrap()
                }
                other => panic!("expected join, got {:?}", other),
            };
            let reply = json!({
                "topic": join.topic,
                "event": "phx_reply",
                "payload": { "status": "ok", "response": {} },
                "ref": "1"
            });
            socket.send(Message::Text(reply.to_string())).await.unwrap();

            let change = json!({
                "topic": join.topic,
                "event": "postgres_changes",
                "payload": { "data": {
                    "type": "INSERT",
                    "table": "agendamentos",
                    "record": { "id": 9, "profissional_id": "u-1" }
                }},
                "ref": null
            });
            socket.send(Message::Text(change.to_string())).await.unwrap();

            let mut seen = Vec::new();
            while let Some(Ok(frame)) = socket.next().await {
                if let Message::Text(text) = frame {
                    let message: PhoenixMessage = serde_json::from_str(&text).unwrap();
                    seen.push(message.event);
                }
            }
            let _ = report_tx.send(seen);
        });

        (format!("http://{}", address), report_rx)
    }

    #[tokio::test]
    async fn test_subscribe_forwards_changes_and_leaves_on_remove() {
        let (url, report) = spawn_realtime_server().await;
        let connection = HttpConnection::new(&url, "anon");
        let feed = connection.realtime();

        let mut subscription = feed
            .subscribe("realtime-agendamentos", &filter())
            .await
            .unwrap();
        let notification = subscription.notifications.recv().await.unwrap();
        assert_eq!(notification.event, ChangeEvent::Insert);
        assert_eq!(notification.record["id"], 9);

        feed.remove_channel(&subscription.channel_id);
        feed.remove_channel(&subscription.channel_id);

        let seen = report.await.unwrap();
        assert_eq!(seen, vec!["phx_leave".to_string()]);
    }
}
