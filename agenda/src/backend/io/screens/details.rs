//! Appointment details screen and its shareable summary.

use shared::Appointment;
use tracing::warn;

use crate::backend::domain::AppointmentQueryService;
use crate::backend::remote::Connection;
use crate::backend::AppState;

pub const SHARE_TITLE: &str = "Agendamento Confirmado!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailsState {
    Loading,
    Loaded(Appointment),
    NotFound,
}

pub struct AppointmentDetailsScreen<C: Connection> {
    appointment_service: AppointmentQueryService<C>,
    appointment_id: String,
    state: DetailsState,
}

impl<C: Connection> AppointmentDetailsScreen<C> {
    pub fn new(state: &AppState<C>, appointment_id: &str) -> Self {
        Self {
            appointment_service: state.appointment_service.clone(),
            appointment_id: appointment_id.to_string(),
            state: DetailsState::Loading,
        }
    }

    /// Fetch the appointment; a failed fetch keeps the screen loading
    pub async fn load(&mut self) -> &DetailsState {
        match self.appointment_service.get_appointment(&self.appointment_id).await {
            Ok(Some(appointment)) => self.state = DetailsState::Loaded(appointment),
            Ok(None) => self.state = DetailsState::NotFound,
            Err(e) => warn!(component = "screens", appointment_id = %self.appointment_id, "Details unavailable: {}", e),
        }
        &self.state
    }

    pub fn state(&self) -> &DetailsState {
        &self.state
    }

    /// Text shared from the details card
    pub fn share_text(&self) -> Option<String> {
        let DetailsState::Loaded(appointment) = &self.state else {
            return None;
        };
        Some(format!(
            "{}\nCliente: {}\nProfissional: {}\nData: {}\nHora: {}\nOBS: {}",
            SHARE_TITLE,
            appointment.client_name.as_deref().unwrap_or_default(),
            appointment.professional_name.as_deref().unwrap_or_default(),
            appointment.date,
            appointment.time,
            appointment.note,
        ))
    }
}
