//! Booking screen: pick a day, a client, a professional and a time, then
//! book.

use chrono::{Local, Weekday};
use shared::{Alert, CalendarDay, Client, Profile};
use tracing::{info, warn};

use super::AlertSlot;
use crate::backend::domain::calendar::month_name;
use crate::backend::domain::client_service::MIN_SEARCH_LENGTH;
use crate::backend::domain::commands::appointments::BookAppointmentCommand;
use crate::backend::domain::day_strip::SelectionChanged;
use crate::backend::domain::{AgendaError, DateCursor, DayStrip, DayStripRenderer, ScrollGeometry};
use crate::backend::remote::Connection;
use crate::backend::AppState;

/// Chip width of the booking strips
const BOOKING_ITEM_WIDTH: f64 = 60.0;
/// pt-BR weeks start on Sunday
const FIRST_WEEKDAY: Weekday = Weekday::Sun;

pub struct BookingScreen<C: Connection> {
    state: AppState<C>,
    cursor: DateCursor,
    month_strip: DayStripRenderer,
    week_strip: DayStripRenderer,
    search: String,
    suggestions: Vec<Client>,
    selected_client: Option<Client>,
    professionals: Vec<Profile>,
    selected_professional: Option<String>,
    time: Option<String>,
    pub note: String,
    alerts: AlertSlot,
}

impl<C: Connection> BookingScreen<C> {
    /// Screen on today with the time picker at the current time
    pub fn new(state: &AppState<C>, viewport_width: f64) -> Self {
        let mut screen = Self::with_today(state, CalendarDay::today(), viewport_width);
        screen.time = Some(Local::now().format("%H:%M").to_string());
        screen
    }

    /// Screen on `today` with no time picked yet
    pub fn with_today(state: &AppState<C>, today: CalendarDay, viewport_width: f64) -> Self {
        let geometry = ScrollGeometry::new(BOOKING_ITEM_WIDTH, viewport_width);
        Self {
            state: state.clone(),
            cursor: DateCursor::new(today),
            month_strip: DayStripRenderer::month(geometry),
            week_strip: DayStripRenderer::week(FIRST_WEEKDAY, geometry),
            search: String::new(),
            suggestions: Vec::new(),
            selected_client: None,
            professionals: Vec::new(),
            selected_professional: None,
            time: None,
            note: String::new(),
            alerts: AlertSlot::default(),
        }
    }

    /// Load the professional picker
    pub async fn activate(&mut self) {
        match self.state.profile_service.list_professionals().await {
            Ok(professionals) => self.professionals = professionals,
            Err(e) => warn!(component = "screens", "Professionals unavailable: {}", e),
        }
    }

    pub fn header(&self) -> &'static str {
        month_name(self.cursor.displayed_month().month)
    }

    pub fn cursor(&self) -> &DateCursor {
        &self.cursor
    }

    pub fn month_strip(&self) -> DayStrip {
        self.month_strip.render(&self.cursor)
    }

    pub fn week_strip(&self) -> DayStrip {
        self.week_strip.render(&self.cursor)
    }

    pub fn previous_month(&mut self) {
        self.cursor.previous_month();
    }

    pub fn next_month(&mut self) {
        self.cursor.next_month();
    }

    pub fn select_day(&mut self, day: CalendarDay) -> SelectionChanged {
        self.month_strip.select(&mut self.cursor, day)
    }

    /// Client search as the user types (prefix match)
    pub async fn search_clients(&mut self, text: &str) {
        self.search = text.to_string();
        if text.chars().count() < MIN_SEARCH_LENGTH {
            self.suggestions.clear();
            return;
        }
        match self.state.client_service.search_by_prefix(text).await {
            Ok(clients) => self.suggestions = clients,
            Err(e) => warn!(component = "screens", "Client search failed: {}", e),
        }
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn suggestions(&self) -> &[Client] {
        &self.suggestions
    }

    pub fn select_client(&mut self, client: Client) {
        self.search = client.name.clone();
        self.suggestions.clear();
        self.selected_client = Some(client);
    }

    pub fn selected_client(&self) -> Option<&Client> {
        self.selected_client.as_ref()
    }

    pub fn professionals(&self) -> &[Profile] {
        &self.professionals
    }

    pub fn select_professional(&mut self, professional_id: &str) {
        self.selected_professional = Some(professional_id.to_string());
    }

    pub fn selected_professional(&self) -> Option<&str> {
        self.selected_professional.as_deref()
    }

    /// Time from the picker, "HH:MM"
    pub fn set_time(&mut self, time: &str) {
        self.time = Some(time.to_string());
    }

    pub fn time(&self) -> Option<&str> {
        self.time.as_deref()
    }

    /// Book with the current form; on success the client, professional and
    /// note are cleared while day and time stay
    pub async fn submit(&mut self) {
        let command = BookAppointmentCommand {
            client_id: self.selected_client.as_ref().map(|client| client.id.clone()),
            date: Some(self.cursor.selected_day()),
            time: self.time.clone(),
            professional_id: self.selected_professional.clone(),
            note: self.note.clone(),
        };
        let alert = match self.state.appointment_service.book_appointment(&command).await {
            Ok(()) => {
                info!(component = "screens", day = %self.cursor.selected_day(), "Appointment booked");
                self.reset_form();
                Alert::notice("Agendamento realizado com sucesso!")
            }
            Err(AgendaError::Validation(e)) => Alert::notice(e.to_string()),
            Err(e) => Alert::notice(format!("Erro ao agendar: {}", e)),
        };
        self.alerts.show(alert);
    }

    fn reset_form(&mut self) {
        self.search.clear();
        self.suggestions.clear();
        self.selected_client = None;
        self.note.clear();
        self.selected_professional = None;
    }

    pub fn take_alert(&mut self) -> Option<Alert> {
        self.alerts.take()
    }
}
