//! Appointment list snapshots with sequence numbering.
//!
//! Every fetch takes a ticket with a monotonically increasing sequence
//! number. A response is applied only if its ticket is newer than the last
//! applied one, so a slow response to an older query can never overwrite
//! a newer list.

use shared::{Appointment, CalendarDay};
use tracing::debug;

use super::commands::appointments::AppointmentQuery;
use super::error::AgendaResult;

/// The list a screen currently shows, fully replaced on every fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppointmentListSnapshot {
    pub day: CalendarDay,
    /// Time ascending
    pub appointments: Vec<Appointment>,
    pub sequence: u64,
}

impl AppointmentListSnapshot {
    pub fn empty(day: CalendarDay) -> Self {
        Self {
            day,
            appointments: Vec::new(),
            sequence: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.appointments.is_empty()
    }

    pub fn contains(&self, appointment_id: &str) -> bool {
        self.appointments.iter().any(|appointment| appointment.id == appointment_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub sequence: u64,
    pub query: AppointmentQuery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// A newer response was already applied
    Stale,
}

#[derive(Debug, Default)]
pub struct SnapshotStore {
    current_query: Option<AppointmentQuery>,
    last_issued: u64,
    last_applied: u64,
    snapshot: Option<AppointmentListSnapshot>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `query` current and issue a ticket for it
    pub fn begin_fetch(&mut self, query: AppointmentQuery) -> FetchTicket {
        self.last_issued += 1;
        self.current_query = Some(query.clone());
        FetchTicket {
            sequence: self.last_issued,
            query,
        }
    }

    /// Ticket for re-running the current query, `None` before the first fetch
    pub fn begin_refetch(&mut self) -> Option<FetchTicket> {
        let query = self.current_query.clone()?;
        Some(self.begin_fetch(query))
    }

    /// Apply a fetch result; a failure replaces the list with an empty one
    pub fn apply(
        &mut self,
        ticket: &FetchTicket,
        result: AgendaResult<Vec<Appointment>>,
    ) -> ApplyOutcome {
        if ticket.sequence <= self.last_applied {
            debug!(
                component = "snapshot",
                sequence = ticket.sequence,
                applied = self.last_applied,
                "Discarding stale appointment list"
            );
            return ApplyOutcome::Stale;
        }

        let appointments = result.unwrap_or_default();
        self.last_applied = ticket.sequence;
        self.snapshot = Some(AppointmentListSnapshot {
            day: ticket.query.day,
            appointments,
            sequence: ticket.sequence,
        });
        ApplyOutcome::Applied
    }

    pub fn snapshot(&self) -> Option<&AppointmentListSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn current_query(&self) -> Option<&AppointmentQuery> {
        self.current_query.as_ref()
    }
}
