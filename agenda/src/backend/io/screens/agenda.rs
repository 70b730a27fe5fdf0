//! Agenda screen: month strip, the selected day's appointments for every
//! professional, per-item delete and live refresh.

use shared::{Alert, CalendarDay};
use tracing::{info, warn};

use super::{attach_live_refresh, AlertSlot};
use crate::backend::domain::appointment_list::{ConfirmationPrompt, AGENDA_PLACEHOLDER};
use crate::backend::domain::calendar::month_name;
use crate::backend::domain::commands::appointments::AppointmentQuery;
use crate::backend::domain::day_strip::SelectionChanged;
use crate::backend::domain::{
    AppointmentListView, AppointmentSync, DateCursor, DayStrip, DayStripRenderer, DeleteConfirmation,
    ListenerState, LiveRefreshListener, PromptChoice, ScrollGeometry,
};
use crate::backend::remote::Connection;
use crate::backend::AppState;

pub struct AgendaScreen<C: Connection> {
    state: AppState<C>,
    cursor: DateCursor,
    strip: DayStripRenderer,
    sync: AppointmentSync<C>,
    listener: Option<LiveRefreshListener<C>>,
    pending_delete: Option<DeleteConfirmation>,
    alerts: AlertSlot,
}

impl<C: Connection> AgendaScreen<C> {
    pub fn new(state: &AppState<C>, viewport_width: f64) -> Self {
        Self::with_today(state, CalendarDay::today(), viewport_width)
    }

    pub fn with_today(state: &AppState<C>, today: CalendarDay, viewport_width: f64) -> Self {
        Self {
            state: state.clone(),
            cursor: DateCursor::new(today),
            strip: DayStripRenderer::month(ScrollGeometry::agenda(viewport_width)),
            sync: AppointmentSync::new(state.appointment_service.clone()),
            listener: None,
            pending_delete: None,
            alerts: AlertSlot::default(),
        }
    }

    /// Fetch the selected day and start live refresh
    ///
    /// Every activation gets a fresh listener; the previous one is released
    /// first so two subscriptions never overlap.
    pub async fn activate(&mut self) {
        self.deactivate();
        self.fetch_selected_day().await;
        self.listener = Some(attach_live_refresh(&self.state, &self.sync).await);
    }

    pub fn deactivate(&mut self) {
        if let Some(mut listener) = self.listener.take() {
            listener.release();
        }
    }

    async fn fetch_selected_day(&self) {
        let query = AppointmentQuery::for_day(self.cursor.selected_day());
        if let Err(e) = self.sync.refresh(query).await {
            warn!(component = "screens", "Agenda fetch failed: {}", e);
        }
    }

    /// Capitalised month name shown above the strip
    pub fn header(&self) -> &'static str {
        month_name(self.cursor.displayed_month().month)
    }

    pub fn cursor(&self) -> &DateCursor {
        &self.cursor
    }

    pub fn strip(&self) -> DayStrip {
        self.strip.render(&self.cursor)
    }

    pub fn previous_month(&mut self) -> DayStrip {
        self.cursor.previous_month();
        self.strip()
    }

    pub fn next_month(&mut self) -> DayStrip {
        self.cursor.next_month();
        self.strip()
    }

    /// Tap on a chip: toggle the selection and fetch the new day
    pub async fn select_day(&mut self, day: CalendarDay) -> SelectionChanged {
        let changed = self.strip.select(&mut self.cursor, day);
        info!(component = "screens", day = %changed.selected, "Agenda day selected");
        self.fetch_selected_day().await;
        changed
    }

    pub async fn appointments(&self) -> AppointmentListView {
        AppointmentListView::render(self.sync.snapshot().await.as_ref(), AGENDA_PLACEHOLDER)
    }

    /// Ask before deleting; returns the prompt to show
    pub fn request_delete(&mut self, appointment_id: &str) -> &ConfirmationPrompt {
        let pending = self
            .pending_delete
            .insert(DeleteConfirmation::new(appointment_id));
        &pending.prompt
    }

    pub fn pending_delete(&self) -> Option<&DeleteConfirmation> {
        self.pending_delete.as_ref()
    }

    /// Apply the user's answer to the pending delete
    ///
    /// On confirmation the row is deleted and the day re-fetched. A failed
    /// delete keeps the current list and raises an alert.
    pub async fn resolve_delete(&mut self, choice: PromptChoice) {
        let Some(pending) = self.pending_delete.take() else {
            return;
        };
        let Some(appointment_id) = pending.resolve(choice) else {
            return;
        };
        if let Err(e) = self.sync.delete_and_refresh(&appointment_id).await {
            self.alerts.show(Alert::error(e.to_string()));
        }
    }

    pub fn take_alert(&mut self) -> Option<Alert> {
        self.alerts.take()
    }

    pub fn listener_state(&self) -> ListenerState {
        self.listener
            .as_ref()
            .map_or(ListenerState::Unsubscribed, LiveRefreshListener::state)
    }
}
