//! Appointment query service.
//!
//! Fetches the appointments of one day (optionally one professional's),
//! deletes single appointments and books new ones. Results are always ordered
//! by time ascending, whatever order the backend returned them in.

use shared::{parse_time_of_day, Appointment, NewAppointment};
use tracing::{info, warn};

use super::commands::appointments::{AppointmentQuery, BookAppointmentCommand};
use super::error::{AgendaError, AgendaResult, ValidationError};
use crate::backend::remote::{AppointmentStorage, Connection};

#[derive(Clone)]
pub struct AppointmentQueryService<C: Connection> {
    appointment_repository: C::AppointmentRepository,
}

impl<C: Connection> AppointmentQueryService<C> {
    pub fn new(connection: &C) -> Self {
        Self {
            appointment_repository: connection.create_appointment_repository(),
        }
    }

    /// Appointments for the query's day, ordered by time ascending
    pub async fn fetch_for_day(&self, query: &AppointmentQuery) -> AgendaResult<Vec<Appointment>> {
        let mut appointments = self
            .appointment_repository
            .list_appointments(&query.day, query.professional_id.as_deref())
            .await
            .map_err(|e| {
                warn!(component = "appointments", day = %query.day, "Failed to fetch appointments: {:#}", e);
                AgendaError::fetch(e)
            })?;

        sort_by_time(&mut appointments);
        info!(
            component = "appointments",
            day = %query.day,
            count = appointments.len(),
            "Fetched appointments"
        );
        Ok(appointments)
    }

    pub async fn get_appointment(&self, appointment_id: &str) -> AgendaResult<Option<Appointment>> {
        self.appointment_repository
            .get_appointment(appointment_id)
            .await
            .map_err(|e| {
                warn!(component = "appointments", appointment_id, "Failed to load appointment: {:#}", e);
                AgendaError::fetch(e)
            })
    }

    /// Delete exactly one appointment
    pub async fn delete_appointment(&self, appointment_id: &str) -> AgendaResult<()> {
        self.appointment_repository
            .delete_appointment(appointment_id)
            .await
            .map_err(|e| {
                warn!(component = "appointments", appointment_id, "Failed to delete appointment: {:#}", e);
                AgendaError::write(e)
            })?;
        info!(component = "appointments", appointment_id, "Deleted appointment");
        Ok(())
    }

    /// Validate and insert a new appointment
    pub async fn book_appointment(&self, command: &BookAppointmentCommand) -> AgendaResult<()> {
        let appointment = validate_booking(command)?;
        self.appointment_repository
            .insert_appointment(&appointment)
            .await
            .map_err(|e| {
                warn!(component = "appointments", "Failed to book appointment: {:#}", e);
                AgendaError::write(e)
            })?;
        info!(
            component = "appointments",
            day = %appointment.date,
            time = %appointment.time,
            professional_id = %appointment.professional_id,
            "Booked appointment"
        );
        Ok(())
    }
}

/// Stable sort by time of day; unparseable times sort last
pub fn sort_by_time(appointments: &mut [Appointment]) {
    appointments.sort_by_key(|appointment| {
        let time = appointment.time_of_day();
        (time.is_none(), time)
    });
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|value| !value.is_empty())
}

/// Check a booking in the order the form asks for its fields
pub fn validate_booking(command: &BookAppointmentCommand) -> Result<NewAppointment, ValidationError> {
    let client_id = non_empty(&command.client_id).ok_or(ValidationError::MissingClient)?;
    let date = command.date.ok_or(ValidationError::MissingDate)?;
    let time = non_empty(&command.time).ok_or(ValidationError::MissingTime)?;
    let professional_id =
        non_empty(&command.professional_id).ok_or(ValidationError::MissingProfessional)?;

    let parsed = parse_time_of_day(time).ok_or_else(|| ValidationError::InvalidTime(time.to_string()))?;

    Ok(NewAppointment {
        client_id: client_id.to_string(),
        professional_id: professional_id.to_string(),
        date,
        time: parsed.format("%H:%M").to_string(),
        note: command.note.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::remote::memory::test_utils::{march_15, SalonFixture};
    use crate::backend::remote::memory::RemoteOperation;

    fn service(fixture: &SalonFixture) -> AppointmentQueryService<crate::backend::remote::MemoryConnection> {
        AppointmentQueryService::new(&fixture.connection)
    }

    fn booking(fixture: &SalonFixture) -> BookAppointmentCommand {
        BookAppointmentCommand {
            client_id: Some(fixture.ana_id.clone()),
            date: Some(march_15()),
            time: Some("16:30".to_string()),
            professional_id: Some(fixture.professional.id.clone()),
            note: " Coloração ".to_string(),
        }
    }

    #[tokio::test]
    async fn test_fetch_orders_by_time_even_when_backend_does_not() {
        let fixture = SalonFixture::new();
        fixture.connection.set_return_unordered(true);
        fixture.add_appointment("1", march_15(), "14:00");
        fixture.add_appointment("2", march_15(), "09:30");
        fixture.add_appointment("3", march_15(), "11:00");

        let appointments = service(&fixture)
            .fetch_for_day(&AppointmentQuery::for_day(march_15()))
            .await
            .unwrap();

        let times: Vec<_> = appointments.iter().map(|a| a.time.as_str()).collect();
        assert_eq!(times, vec!["09:30", "11:00", "14:00"]);
    }

    #[tokio::test]
    async fn test_fetch_scoped_to_professional() {
        let fixture = SalonFixture::new();
        fixture.add_appointment("1", march_15(), "10:00");
        fixture.add_appointment_for("2", &fixture.other_professional_id, march_15(), "11:00");

        let query = AppointmentQuery::for_professional(march_15(), &fixture.professional.id);
        let appointments = service(&fixture).fetch_for_day(&query).await.unwrap();

        assert_eq!(appointments.len(), 1);
        assert_eq!(appointments[0].id, "1");
        assert_eq!(appointments[0].professional_name.as_deref(), Some("Carla"));
        assert_eq!(appointments[0].client_name.as_deref(), Some("Ana Souza"));
    }

    #[tokio::test]
    async fn test_fetch_failure_carries_raw_text() {
        let fixture = SalonFixture::new();
        fixture
            .connection
            .fail(RemoteOperation::ListAppointments, "Failed to fetch");

        let error = service(&fixture)
            .fetch_for_day(&AppointmentQuery::for_day(march_15()))
            .await
            .unwrap_err();
        assert_eq!(error, AgendaError::RemoteFetch("Failed to fetch".to_string()));
    }

    #[tokio::test]
    async fn test_deleted_appointment_is_gone_from_next_fetch() {
        let fixture = SalonFixture::new();
        fixture.add_appointment("42", march_15(), "10:00");
        fixture.add_appointment("43", march_15(), "11:00");
        let service = service(&fixture);

        service.delete_appointment("42").await.unwrap();

        let appointments = service
            .fetch_for_day(&AppointmentQuery::for_day(march_15()))
            .await
            .unwrap();
        assert!(appointments.iter().all(|a| a.id != "42"));
        assert_eq!(appointments.len(), 1);
    }

    #[tokio::test]
    async fn test_booking_without_client_or_professional_never_inserts() {
        let fixture = SalonFixture::new();
        let service = service(&fixture);

        let mut command = booking(&fixture);
        command.client_id = None;
        let error = service.book_appointment(&command).await.unwrap_err();
        assert_eq!(error, AgendaError::Validation(ValidationError::MissingClient));

        let mut command = booking(&fixture);
        command.professional_id = Some("  ".to_string());
        let error = service.book_appointment(&command).await.unwrap_err();
        assert_eq!(error, AgendaError::Validation(ValidationError::MissingProfessional));

        assert_eq!(fixture.connection.stats().insert_appointment_calls, 0);
    }

    #[tokio::test]
    async fn test_booking_inserts_normalised_row() {
        let fixture = SalonFixture::new();
        service(&fixture).book_appointment(&booking(&fixture)).await.unwrap();

        let rows = fixture.connection.appointments();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].data, "2024-03-15");
        assert_eq!(rows[0].hora, "16:30");
        assert_eq!(rows[0].comentario.as_deref(), Some("Coloração"));
    }

    #[test]
    fn test_validation_order() {
        let empty = BookAppointmentCommand::default();
        assert_eq!(validate_booking(&empty), Err(ValidationError::MissingClient));

        let command = BookAppointmentCommand {
            client_id: Some("c".to_string()),
            ..Default::default()
        };
        assert_eq!(validate_booking(&command), Err(ValidationError::MissingDate));

        let command = BookAppointmentCommand {
            client_id: Some("c".to_string()),
            date: Some(march_15()),
            ..Default::default()
        };
        assert_eq!(validate_booking(&command), Err(ValidationError::MissingTime));

        let command = BookAppointmentCommand {
            client_id: Some("c".to_string()),
            date: Some(march_15()),
            time: Some("25:00".to_string()),
            professional_id: Some("p".to_string()),
            note: String::new(),
        };
        assert_eq!(
            validate_booking(&command),
            Err(ValidationError::InvalidTime("25:00".to_string()))
        );
    }
}
