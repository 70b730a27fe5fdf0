use anyhow::Result;
use async_trait::async_trait;
use reqwest::Method;
use shared::{Appointment, CalendarDay, Client, ClientDraft, NewAppointment, Profile, ProfileUpdate};
use std::sync::Arc;
use tracing::debug;

use super::connection::HttpCore;
use crate::backend::remote::mappers::{
    AppointmentMapper, AppointmentRow, ClientMapper, ClientRow, ProfileMapper, ProfileRow,
    APPOINTMENT_SELECT, CLIENT_SELECT, PROFILE_SELECT,
};
use crate::backend::remote::traits::{
    AppointmentStorage, ClientStorage, NamePattern, ProfileStorage,
};
use crate::backend::remote::{APPOINTMENTS_TABLE, CLIENTS_TABLE, PROFESSIONAL_COLUMN, PROFILES_TABLE};

/// PostgREST row repository
#[derive(Debug, Clone)]
pub struct HttpRepository {
    core: Arc<HttpCore>,
}

impl HttpRepository {
    pub(super) fn new(core: Arc<HttpCore>) -> Self {
        Self { core }
    }

    async fn select<T>(&self, table: &str, query: &[(&str, String)]) -> Result<Vec<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        let url = self.core.rest_url(table);
        let builder = self.core.request(Method::GET, &url).query(query);
        let response = self.core.send(builder).await?;
        Ok(response.json::<Vec<T>>().await?)
    }

    async fn insert<T: serde::Serialize>(&self, table: &str, row: &T) -> Result<()> {
        let url = self.core.rest_url(table);
        let builder = self
            .core
            .request(Method::POST, &url)
            .header("Prefer", "return=minimal")
            .json(row);
        self.core.send(builder).await?;
        Ok(())
    }

    async fn update_by_id<T: serde::Serialize>(&self, table: &str, id: &str, row: &T) -> Result<()> {
        let url = self.core.rest_url(table);
        let builder = self
            .core
            .request(Method::PATCH, &url)
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=minimal")
            .json(row);
        self.core.send(builder).await?;
        Ok(())
    }
}

/// PostgREST `ilike` operand for a name pattern (`*` is the URL-safe wildcard)
fn ilike_operand(pattern: &NamePattern) -> String {
    match pattern {
        NamePattern::Prefix(text) => format!("ilike.{}*", text),
        NamePattern::Contains(text) => format!("ilike.*{}*", text),
    }
}

#[async_trait]
impl AppointmentStorage for HttpRepository {
    async fn list_appointments(
        &self,
        day: &CalendarDay,
        professional_id: Option<&str>,
    ) -> Result<Vec<Appointment>> {
        let mut query = vec![
            ("select", APPOINTMENT_SELECT.to_string()),
            ("data", format!("eq.{}", day.iso_string())),
        ];
        if let Some(professional_id) = professional_id {
            query.push((PROFESSIONAL_COLUMN, format!("eq.{}", professional_id)));
        }
        query.push(("order", "hora.asc".to_string()));

        let rows: Vec<AppointmentRow> = self.select(APPOINTMENTS_TABLE, &query).await?;
        debug!(component = "http", day = %day, count = rows.len(), "Fetched appointments");
        AppointmentMapper::to_dto_list(rows)
    }

    async fn get_appointment(&self, appointment_id: &str) -> Result<Option<Appointment>> {
        let query = [
            ("select", APPOINTMENT_SELECT.to_string()),
            ("id", format!("eq.{}", appointment_id)),
        ];
        let rows: Vec<AppointmentRow> = self.select(APPOINTMENTS_TABLE, &query).await?;
        rows.into_iter().next().map(AppointmentMapper::to_dto).transpose()
    }

    async fn insert_appointment(&self, appointment: &NewAppointment) -> Result<()> {
        self.insert(APPOINTMENTS_TABLE, &AppointmentMapper::to_insert_row(appointment))
            .await
    }

    async fn delete_appointment(&self, appointment_id: &str) -> Result<()> {
        let url = self.core.rest_url(APPOINTMENTS_TABLE);
        let builder = self
            .core
            .request(Method::DELETE, &url)
            .query(&[("id", format!("eq.{}", appointment_id))]);
        self.core.send(builder).await?;
        Ok(())
    }
}

#[async_trait]
impl ClientStorage for HttpRepository {
    async fn search_clients(&self, pattern: &NamePattern) -> Result<Vec<Client>> {
        let query = [
            ("select", CLIENT_SELECT.to_string()),
            ("nome", ilike_operand(pattern)),
        ];
        let rows: Vec<ClientRow> = self.select(CLIENTS_TABLE, &query).await?;
        Ok(ClientMapper::to_dto_list(rows))
    }

    async fn clients_with_birthday(&self, month: u32, day: u32) -> Result<Vec<Client>> {
        let query = [
            ("select", CLIENT_SELECT.to_string()),
            ("data_nascimento", format!("like.*-{:02}-{:02}", month, day)),
        ];
        let rows: Vec<ClientRow> = self.select(CLIENTS_TABLE, &query).await?;
        Ok(ClientMapper::to_dto_list(rows))
    }

    async fn insert_client(&self, client: &ClientDraft) -> Result<()> {
        self.insert(CLIENTS_TABLE, &ClientMapper::to_write_row(client))
            .await
    }

    async fn update_client(&self, client_id: &str, client: &ClientDraft) -> Result<()> {
        self.update_by_id(CLIENTS_TABLE, client_id, &ClientMapper::to_write_row(client))
            .await
    }
}

#[async_trait]
impl ProfileStorage for HttpRepository {
    async fn get_profile(&self, profile_id: &str) -> Result<Option<Profile>> {
        let query = [
            ("select", PROFILE_SELECT.to_string()),
            ("id", format!("eq.{}", profile_id)),
        ];
        let rows: Vec<ProfileRow> = self.select(PROFILES_TABLE, &query).await?;
        Ok(rows.into_iter().next().map(ProfileMapper::to_dto))
    }

    async fn list_profiles(&self) -> Result<Vec<Profile>> {
        let query = [
            ("select", PROFILE_SELECT.to_string()),
            ("order", "nome.asc".to_string()),
        ];
        let rows: Vec<ProfileRow> = self.select(PROFILES_TABLE, &query).await?;
        Ok(ProfileMapper::to_dto_list(rows))
    }

    async fn update_profile(&self, profile_id: &str, update: &ProfileUpdate) -> Result<()> {
        self.update_by_id(PROFILES_TABLE, profile_id, &ProfileMapper::to_write_row(update))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::remote::http::HttpConnection;
    use crate::backend::remote::traits::Connection;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_list_appointments_sends_filters_and_maps_rows() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/rest/v1/agendamentos")
            .match_header("apikey", "anon")
            .match_header("authorization", "Bearer anon")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("data".into(), "eq.2024-03-15".into()),
                Matcher::UrlEncoded("profissional_id".into(), "eq.p-1".into()),
                Matcher::UrlEncoded("order".into(), "hora.asc".into()),
                Matcher::UrlEncoded("select".into(), APPOINTMENT_SELECT.into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[{"id":7,"cliente_id":"c-1","profissional_id":"p-1","data":"2024-03-15",
                     "hora":"09:30:00","comentario":"Escova",
                     "clientes":{"nome":"Ana"},"profissional":{"nome":"Carla"}}]"#,
            )
            .create_async()
            .await;

        let connection = HttpConnection::new(&server.url(), "anon");
        let repo = connection.create_appointment_repository();
        let day = CalendarDay::from_ymd(2024, 3, 15).unwrap();
        let appointments = repo.list_appointments(&day, Some("p-1")).await.unwrap();

        mock.assert_async().await;
        assert_eq!(appointments.len(), 1);
        assert_eq!(appointments[0].id, "7");
        assert_eq!(appointments[0].client_name.as_deref(), Some("Ana"));
        assert_eq!(appointments[0].time_label(), "09:30");
    }

    #[tokio::test]
    async fn test_failed_query_carries_backend_message() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/rest/v1/agendamentos")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message":"JWT expired"}"#)
            .create_async()
            .await;

        let connection = HttpConnection::new(&server.url(), "anon");
        let repo = connection.create_appointment_repository();
        let day = CalendarDay::from_ymd(2024, 3, 15).unwrap();
        let error = repo.list_appointments(&day, None).await.unwrap_err();

        assert_eq!(error.to_string(), "JWT expired");
    }

    #[tokio::test]
    async fn test_insert_appointment_posts_wire_row() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/rest/v1/agendamentos")
            .match_header("prefer", "return=minimal")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "cliente_id": "c-1",
                "profissional_id": "p-1",
                "data": "2024-03-20",
                "hora": "14:00"
            })))
            .with_status(201)
            .create_async()
            .await;

        let connection = HttpConnection::new(&server.url(), "anon");
        let repo = connection.create_appointment_repository();
        repo.insert_appointment(&NewAppointment {
            client_id: "c-1".to_string(),
            professional_id: "p-1".to_string(),
            date: CalendarDay::from_ymd(2024, 3, 20).unwrap(),
            time: "14:00".to_string(),
            note: String::new(),
        })
        .await
        .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_targets_single_id() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/rest/v1/agendamentos")
            .match_query(Matcher::UrlEncoded("id".into(), "eq.42".into()))
            .with_status(204)
            .create_async()
            .await;

        let connection = HttpConnection::new(&server.url(), "anon");
        let repo = connection.create_appointment_repository();
        repo.delete_appointment("42").await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_client_search_uses_prefix_wildcard() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/rest/v1/clientes")
            .match_query(Matcher::UrlEncoded("nome".into(), "ilike.An*".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"id":"c-1","nome":"Ana Souza","telefone":"11999998888"}]"#)
            .create_async()
            .await;

        let connection = HttpConnection::new(&server.url(), "anon");
        let repo = connection.create_client_repository();
        let clients = repo
            .search_clients(&NamePattern::Prefix("An".to_string()))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(clients[0].name, "Ana Souza");
        assert_eq!(clients[0].birth_date, "");
    }

    #[test]
    fn test_ilike_operands() {
        assert_eq!(ilike_operand(&NamePattern::Prefix("an".into())), "ilike.an*");
        assert_eq!(ilike_operand(&NamePattern::Contains("an".into())), "ilike.*an*");
    }
}
