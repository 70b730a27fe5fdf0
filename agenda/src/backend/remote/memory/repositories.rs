use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use shared::{
    Appointment, CalendarDay, ChangeEvent, Client, ClientDraft, NewAppointment, Profile,
    ProfileUpdate,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::debug;

use super::connection::{lock, MemoryState, RemoteOperation};
use crate::backend::remote::mappers::{
    AppointmentMapper, ClientMapper, ClientRow, ProfileMapper,
};
use crate::backend::remote::traits::{
    AppointmentStorage, ClientStorage, NamePattern, ProfileStorage,
};

/// Row repository over the in-memory tables
#[derive(Debug, Clone)]
pub struct MemoryRepository {
    state: Arc<MemoryState>,
}

impl MemoryRepository {
    pub(super) fn new(state: Arc<MemoryState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl AppointmentStorage for MemoryRepository {
    async fn list_appointments(
        &self,
        day: &CalendarDay,
        professional_id: Option<&str>,
    ) -> Result<Vec<Appointment>> {
        self.state
            .record_stats(|stats| stats.list_appointment_calls += 1);
        self.state.enter(RemoteOperation::ListAppointments).await?;

        let iso = day.iso_string();
        let tables = lock(&self.state.tables);
        let mut records: Vec<_> = tables
            .appointments
            .iter()
            .filter(|record| record.data == iso)
            .filter(|record| professional_id.map_or(true, |id| record.profissional_id == id))
            .collect();
        if !self.state.unordered.load(Ordering::SeqCst) {
            records.sort_by(|a, b| a.hora.cmp(&b.hora));
        }

        records
            .into_iter()
            .map(|record| {
                AppointmentMapper::record_to_dto(
                    record,
                    tables.client_name(&record.cliente_id),
                    tables.professional_name(&record.profissional_id),
                )
            })
            .collect()
    }

    async fn get_appointment(&self, appointment_id: &str) -> Result<Option<Appointment>> {
        self.state.enter(RemoteOperation::GetAppointment).await?;
        let tables = lock(&self.state.tables);
        tables
            .appointments
            .iter()
            .find(|record| record.id == appointment_id)
            .map(|record| {
                AppointmentMapper::record_to_dto(
                    record,
                    tables.client_name(&record.cliente_id),
                    tables.professional_name(&record.profissional_id),
                )
            })
            .transpose()
    }

    async fn insert_appointment(&self, appointment: &NewAppointment) -> Result<()> {
        self.state
            .record_stats(|stats| stats.insert_appointment_calls += 1);
        self.state.enter(RemoteOperation::InsertAppointment).await?;

        let record = AppointmentMapper::to_record(uuid::Uuid::new_v4().to_string(), appointment);
        let payload = serde_json::to_value(&record)?;
        lock(&self.state.tables).appointments.push(record);
        self.state
            .publish_appointment(ChangeEvent::Insert, payload, Value::Null);
        Ok(())
    }

    async fn delete_appointment(&self, appointment_id: &str) -> Result<()> {
        self.state
            .record_stats(|stats| stats.delete_appointment_calls += 1);
        self.state.enter(RemoteOperation::DeleteAppointment).await?;

        let removed = {
            let mut tables = lock(&self.state.tables);
            let position = tables
                .appointments
                .iter()
                .position(|record| record.id == appointment_id);
            position.map(|index| tables.appointments.remove(index))
        };

        match removed {
            Some(record) => {
                let old_record = serde_json::to_value(&record)?;
                self.state
                    .publish_appointment(ChangeEvent::Delete, Value::Null, old_record);
            }
            None => debug!(component = "memory", appointment_id, "Delete matched no rows"),
        }
        Ok(())
    }
}

#[async_trait]
impl ClientStorage for MemoryRepository {
    async fn search_clients(&self, pattern: &NamePattern) -> Result<Vec<Client>> {
        self.state.enter(RemoteOperation::SearchClients).await?;
        let tables = lock(&self.state.tables);
        let rows = tables
            .clients
            .iter()
            .filter(|row| pattern.matches(row.nome.as_deref().unwrap_or_default()))
            .cloned()
            .collect();
        Ok(ClientMapper::to_dto_list(rows))
    }

    async fn clients_with_birthday(&self, month: u32, day: u32) -> Result<Vec<Client>> {
        self.state.enter(RemoteOperation::ClientsWithBirthday).await?;
        let suffix = format!("-{:02}-{:02}", month, day);
        let tables = lock(&self.state.tables);
        let rows = tables
            .clients
            .iter()
            .filter(|row| {
                row.data_nascimento
                    .as_deref()
                    .is_some_and(|birth_date| birth_date.ends_with(&suffix))
            })
            .cloned()
            .collect();
        Ok(ClientMapper::to_dto_list(rows))
    }

    async fn insert_client(&self, client: &ClientDraft) -> Result<()> {
        self.state.enter(RemoteOperation::InsertClient).await?;
        let row = ClientMapper::to_write_row(client);
        lock(&self.state.tables).clients.push(ClientRow {
            id: uuid::Uuid::new_v4().to_string(),
            nome: Some(row.nome),
            email: Some(row.email),
            telefone: Some(row.telefone),
            data_nascimento: Some(row.data_nascimento),
        });
        Ok(())
    }

    async fn update_client(&self, client_id: &str, client: &ClientDraft) -> Result<()> {
        self.state.enter(RemoteOperation::UpdateClient).await?;
        let row = ClientMapper::to_write_row(client);
        let mut tables = lock(&self.state.tables);
        match tables.clients.iter_mut().find(|existing| existing.id == client_id) {
            Some(existing) => {
                existing.nome = Some(row.nome);
                existing.email = Some(row.email);
                existing.telefone = Some(row.telefone);
                existing.data_nascimento = Some(row.data_nascimento);
            }
            None => debug!(component = "memory", client_id, "Update matched no clients"),
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileStorage for MemoryRepository {
    async fn get_profile(&self, profile_id: &str) -> Result<Option<Profile>> {
        self.state.enter(RemoteOperation::GetProfile).await?;
        let tables = lock(&self.state.tables);
        Ok(tables
            .profiles
            .iter()
            .find(|row| row.id == profile_id)
            .cloned()
            .map(ProfileMapper::to_dto))
    }

    async fn list_profiles(&self) -> Result<Vec<Profile>> {
        self.state.enter(RemoteOperation::ListProfiles).await?;
        let rows = lock(&self.state.tables).profiles.clone();
        let mut profiles = ProfileMapper::to_dto_list(rows);
        profiles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(profiles)
    }

    async fn update_profile(&self, profile_id: &str, update: &ProfileUpdate) -> Result<()> {
        self.state.enter(RemoteOperation::UpdateProfile).await?;
        let row = ProfileMapper::to_write_row(update);
        let mut tables = lock(&self.state.tables);
        match tables.profiles.iter_mut().find(|existing| existing.id == profile_id) {
            Some(existing) => {
                existing.nome = Some(row.nome);
                existing.email = Some(row.email);
                existing.photo_url = Some(row.photo_url);
                existing.cargo = Some(row.cargo);
                existing.telefone = Some(row.telefone);
            }
            None => debug!(component = "memory", profile_id, "Update matched no profiles"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::remote::mappers::AppointmentRecord;
    use crate::backend::remote::memory::MemoryConnection;
    use crate::backend::remote::traits::Connection;

    fn record(id: &str, professional: &str, day: &str, time: &str) -> AppointmentRecord {
        AppointmentRecord {
            id: id.to_string(),
            cliente_id: "c-1".to_string(),
            profissional_id: professional.to_string(),
            data: day.to_string(),
            hora: time.to_string(),
            comentario: None,
        }
    }

    #[tokio::test]
    async fn test_list_filters_by_day_and_professional() {
        let connection = MemoryConnection::new();
        connection.seed_appointment(record("1", "p-1", "2024-03-15", "10:00"));
        connection.seed_appointment(record("2", "p-2", "2024-03-15", "09:00"));
        connection.seed_appointment(record("3", "p-1", "2024-03-16", "08:00"));
        let repo = connection.create_appointment_repository();
        let day = CalendarDay::from_ymd(2024, 3, 15).unwrap();

        let all = repo.list_appointments(&day, None).await.unwrap();
        let ids: Vec<_> = all.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1"]);

        let scoped = repo.list_appointments(&day, Some("p-1")).await.unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].id, "1");
    }

    #[tokio::test]
    async fn test_names_are_joined() {
        let connection = MemoryConnection::new();
        let client_id = connection.seed_client("Ana", "11999998888", "1990-03-15");
        connection.seed_profile(Profile {
            id: "p-1".to_string(),
            name: "Bia".to_string(),
            ..Profile::default()
        });
        let mut row = record("1", "p-1", "2024-03-15", "10:00");
        row.cliente_id = client_id;
        connection.seed_appointment(row);

        let repo = connection.create_appointment_repository();
        let appointment = repo.get_appointment("1").await.unwrap().unwrap();
        assert_eq!(appointment.client_name.as_deref(), Some("Ana"));
        assert_eq!(appointment.professional_name.as_deref(), Some("Bia"));
    }

    #[tokio::test]
    async fn test_injected_fault_surfaces_message() {
        let connection = MemoryConnection::new();
        connection.fail(RemoteOperation::ListAppointments, "network down");
        let repo = connection.create_appointment_repository();
        let day = CalendarDay::from_ymd(2024, 3, 15).unwrap();

        let error = repo.list_appointments(&day, None).await.unwrap_err();
        assert_eq!(error.to_string(), "network down");

        connection.recover(RemoteOperation::ListAppointments);
        assert!(repo.list_appointments(&day, None).await.is_ok());
    }

    #[tokio::test]
    async fn test_birthday_match_ignores_year() {
        let connection = MemoryConnection::new();
        connection.seed_client("Ana", "1", "1990-03-15");
        connection.seed_client("Bia", "2", "1985-03-16");
        let repo = connection.create_client_repository();

        let clients = repo.clients_with_birthday(3, 15).await.unwrap();
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].name, "Ana");
    }
}
