//! Fetch-and-replace of a screen's appointment list.
//!
//! User-triggered fetches and live-refresh fetches are not serialised; the
//! shared [`SnapshotStore`] decides which response wins by sequence number.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::appointment_service::AppointmentQueryService;
use super::commands::appointments::AppointmentQuery;
use super::error::AgendaResult;
use super::snapshot::{AppointmentListSnapshot, ApplyOutcome, FetchTicket, SnapshotStore};
use crate::backend::remote::Connection;

#[derive(Clone)]
pub struct AppointmentSync<C: Connection> {
    service: AppointmentQueryService<C>,
    store: Arc<Mutex<SnapshotStore>>,
}

impl<C: Connection> AppointmentSync<C> {
    pub fn new(service: AppointmentQueryService<C>) -> Self {
        Self {
            service,
            store: Arc::new(Mutex::new(SnapshotStore::new())),
        }
    }

    pub fn service(&self) -> &AppointmentQueryService<C> {
        &self.service
    }

    /// Make `query` current and fetch it
    ///
    /// On failure the list is replaced by an empty one and the error is
    /// returned for logging.
    pub async fn refresh(&self, query: AppointmentQuery) -> AgendaResult<ApplyOutcome> {
        let ticket = self.store.lock().await.begin_fetch(query);
        self.run(ticket).await
    }

    /// Re-run the current query; `None` before the first fetch
    pub async fn refresh_current(&self) -> Option<AgendaResult<ApplyOutcome>> {
        let ticket = self.store.lock().await.begin_refetch();
        match ticket {
            Some(ticket) => Some(self.run(ticket).await),
            None => {
                debug!(component = "sync", "Nothing to refresh yet");
                None
            }
        }
    }

    async fn run(&self, ticket: FetchTicket) -> AgendaResult<ApplyOutcome> {
        let result = self.service.fetch_for_day(&ticket.query).await;
        let error = result.as_ref().err().cloned();
        let outcome = self.store.lock().await.apply(&ticket, result);
        match error {
            Some(error) => Err(error),
            None => Ok(outcome),
        }
    }

    pub async fn snapshot(&self) -> Option<AppointmentListSnapshot> {
        self.store.lock().await.snapshot().cloned()
    }

    pub async fn current_query(&self) -> Option<AppointmentQuery> {
        self.store.lock().await.current_query().cloned()
    }

    /// Delete one appointment, then re-fetch the current list
    ///
    /// A failed delete leaves the current snapshot untouched.
    pub async fn delete_and_refresh(&self, appointment_id: &str) -> AgendaResult<()> {
        self.service.delete_appointment(appointment_id).await?;
        if let Some(Err(e)) = self.refresh_current().await {
            warn!(component = "sync", "Refresh after delete failed: {}", e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::domain::error::AgendaError;
    use crate::backend::remote::memory::test_utils::{march_15, SalonFixture};
    use crate::backend::remote::memory::RemoteOperation;
    use crate::backend::remote::MemoryConnection;
    use std::time::Duration;

    fn sync(fixture: &SalonFixture) -> AppointmentSync<MemoryConnection> {
        AppointmentSync::new(AppointmentQueryService::new(&fixture.connection))
    }

    #[tokio::test]
    async fn test_failed_fetch_yields_empty_snapshot() {
        let fixture = SalonFixture::new();
        fixture.add_appointment("1", march_15(), "10:00");
        let sync = sync(&fixture);
        sync.refresh(AppointmentQuery::for_day(march_15())).await.unwrap();
        assert_eq!(sync.snapshot().await.unwrap().appointments.len(), 1);

        fixture.connection.fail(RemoteOperation::ListAppointments, "offline");
        let result = sync.refresh_current().await.unwrap();
        assert_eq!(result, Err(AgendaError::RemoteFetch("offline".to_string())));
        assert!(sync.snapshot().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_previous_snapshot() {
        let fixture = SalonFixture::new();
        fixture.add_appointment("42", march_15(), "10:00");
        let sync = sync(&fixture);
        sync.refresh(AppointmentQuery::for_day(march_15())).await.unwrap();
        let before = sync.snapshot().await.unwrap();

        fixture.connection.fail(RemoteOperation::DeleteAppointment, "permission denied");
        let error = sync.delete_and_refresh("42").await.unwrap_err();

        assert_eq!(error, AgendaError::RemoteWrite("permission denied".to_string()));
        assert_eq!(sync.snapshot().await.unwrap(), before);
        assert_eq!(fixture.connection.stats().list_appointment_calls, 1);
    }

    #[tokio::test]
    async fn test_delete_then_refetch_drops_row() {
        let fixture = SalonFixture::new();
        fixture.add_appointment("42", march_15(), "10:00");
        fixture.add_appointment("43", march_15(), "11:00");
        let sync = sync(&fixture);
        sync.refresh(AppointmentQuery::for_day(march_15())).await.unwrap();

        sync.delete_and_refresh("42").await.unwrap();

        let snapshot = sync.snapshot().await.unwrap();
        assert!(!snapshot.contains("42"));
        assert!(snapshot.contains("43"));
    }

    #[tokio::test]
    async fn test_slow_older_fetch_does_not_win() {
        let fixture = SalonFixture::new();
        fixture.add_appointment("old", march_15(), "10:00");
        let next_day = march_15().add_days(1);
        fixture.add_appointment("new", next_day, "10:00");
        let sync = sync(&fixture);

        fixture
            .connection
            .set_latency(RemoteOperation::ListAppointments, Duration::from_millis(80));
        let slow = {
            let sync = sync.clone();
            tokio::spawn(async move { sync.refresh(AppointmentQuery::for_day(march_15())).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        fixture
            .connection
            .set_latency(RemoteOperation::ListAppointments, Duration::ZERO);
        let fast = sync.refresh(AppointmentQuery::for_day(next_day)).await.unwrap();
        assert_eq!(fast, ApplyOutcome::Applied);

        let slow = slow.await.unwrap().unwrap();
        assert_eq!(slow, ApplyOutcome::Stale);

        let snapshot = sync.snapshot().await.unwrap();
        assert_eq!(snapshot.day, next_day);
        assert!(snapshot.contains("new"));
    }
}
