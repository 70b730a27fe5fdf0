//! Wire rows for the backend tables and their mapping to shared DTOs.
//!
//! Column names are the backend's (`cliente_id`, `hora`, `nome`, ...); nothing
//! outside this module sees them.

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use shared::{Appointment, CalendarDay, Client, ClientDraft, NewAppointment, Profile, ProfileUpdate};

/// Column list for appointment queries, with the client and professional
/// names embedded
pub const APPOINTMENT_SELECT: &str =
    "id,cliente_id,profissional_id,data,hora,comentario,clientes(nome),profissional:profiles(nome)";

/// Column list for client queries
pub const CLIENT_SELECT: &str = "id,nome,email,telefone,data_nascimento";

/// Column list for profile queries
pub const PROFILE_SELECT: &str = "id,nome,email,photo_url,cargo,telefone";

/// Ids arrive as strings (uuid) or numbers (bigint identity) depending on
/// the table
fn flexible_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_as_text(&value).unwrap_or_default())
}

/// Textual form of a scalar JSON value, `None` for null/arrays/objects
pub fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// Embedded `{ "nome": ... }` object from a PostgREST join
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmbeddedName {
    #[serde(default)]
    pub nome: Option<String>,
}

/// One `agendamentos` row as stored, without embeds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentRecord {
    #[serde(deserialize_with = "flexible_id")]
    pub id: String,
    #[serde(deserialize_with = "flexible_id")]
    pub cliente_id: String,
    #[serde(deserialize_with = "flexible_id")]
    pub profissional_id: String,
    pub data: String,
    pub hora: String,
    #[serde(default)]
    pub comentario: Option<String>,
}

/// One `agendamentos` row as returned by the joined select
#[derive(Debug, Clone, Deserialize)]
pub struct AppointmentRow {
    #[serde(deserialize_with = "flexible_id")]
    pub id: String,
    #[serde(deserialize_with = "flexible_id")]
    pub cliente_id: String,
    #[serde(deserialize_with = "flexible_id")]
    pub profissional_id: String,
    pub data: String,
    #[serde(default)]
    pub hora: String,
    #[serde(default)]
    pub comentario: Option<String>,
    #[serde(default)]
    pub clientes: Option<EmbeddedName>,
    #[serde(default)]
    pub profissional: Option<EmbeddedName>,
}

/// Insert payload for `agendamentos`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppointmentInsertRow {
    pub cliente_id: String,
    pub profissional_id: String,
    pub data: String,
    pub hora: String,
    pub comentario: String,
}

pub struct AppointmentMapper;

impl AppointmentMapper {
    /// Convert a joined wire row to the shared Appointment DTO
    pub fn to_dto(row: AppointmentRow) -> Result<Appointment> {
        let date = CalendarDay::parse_iso(&row.data)
            .with_context(|| format!("Appointment {} has an invalid date", row.id))?;
        Ok(Appointment {
            id: row.id,
            client_id: row.cliente_id,
            professional_id: row.profissional_id,
            date,
            time: row.hora,
            note: row.comentario.unwrap_or_default(),
            client_name: row.clientes.and_then(|embed| embed.nome),
            professional_name: row.profissional.and_then(|embed| embed.nome),
        })
    }

    pub fn to_dto_list(rows: Vec<AppointmentRow>) -> Result<Vec<Appointment>> {
        rows.into_iter().map(Self::to_dto).collect()
    }

    /// Convert a stored record plus looked-up names to the shared DTO
    pub fn record_to_dto(
        record: &AppointmentRecord,
        client_name: Option<String>,
        professional_name: Option<String>,
    ) -> Result<Appointment> {
        let date = CalendarDay::parse_iso(&record.data)
            .with_context(|| format!("Appointment {} has an invalid date", record.id))?;
        Ok(Appointment {
            id: record.id.clone(),
            client_id: record.cliente_id.clone(),
            professional_id: record.profissional_id.clone(),
            date,
            time: record.hora.clone(),
            note: record.comentario.clone().unwrap_or_default(),
            client_name,
            professional_name,
        })
    }

    pub fn to_insert_row(appointment: &NewAppointment) -> AppointmentInsertRow {
        AppointmentInsertRow {
            cliente_id: appointment.client_id.clone(),
            profissional_id: appointment.professional_id.clone(),
            data: appointment.date.iso_string(),
            hora: appointment.time.clone(),
            comentario: appointment.note.clone(),
        }
    }

    /// Build the stored record for a freshly inserted appointment
    pub fn to_record(id: String, appointment: &NewAppointment) -> AppointmentRecord {
        let row = Self::to_insert_row(appointment);
        AppointmentRecord {
            id,
            cliente_id: row.cliente_id,
            profissional_id: row.profissional_id,
            data: row.data,
            hora: row.hora,
            comentario: Some(row.comentario),
        }
    }
}

/// One `clientes` row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientRow {
    #[serde(deserialize_with = "flexible_id")]
    pub id: String,
    #[serde(default)]
    pub nome: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub telefone: Option<String>,
    #[serde(default)]
    pub data_nascimento: Option<String>,
}

/// Insert/update payload for `clientes`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientWriteRow {
    pub nome: String,
    pub email: String,
    pub telefone: String,
    pub data_nascimento: String,
}

pub struct ClientMapper;

impl ClientMapper {
    pub fn to_dto(row: ClientRow) -> Client {
        Client {
            id: row.id,
            name: row.nome.unwrap_or_default(),
            email: row.email.unwrap_or_default(),
            phone: row.telefone.unwrap_or_default(),
            birth_date: row.data_nascimento.unwrap_or_default(),
        }
    }

    pub fn to_dto_list(rows: Vec<ClientRow>) -> Vec<Client> {
        rows.into_iter().map(Self::to_dto).collect()
    }

    pub fn to_write_row(draft: &ClientDraft) -> ClientWriteRow {
        ClientWriteRow {
            nome: draft.name.clone(),
            email: draft.email.clone(),
            telefone: draft.phone.clone(),
            data_nascimento: draft.birth_date.clone(),
        }
    }
}

/// One `profiles` row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRow {
    #[serde(deserialize_with = "flexible_id")]
    pub id: String,
    #[serde(default)]
    pub nome: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub cargo: Option<String>,
    #[serde(default)]
    pub telefone: Option<String>,
}

/// Update payload for `profiles`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileWriteRow {
    pub nome: String,
    pub email: String,
    pub photo_url: String,
    pub cargo: String,
    pub telefone: String,
}

pub struct ProfileMapper;

impl ProfileMapper {
    pub fn to_dto(row: ProfileRow) -> Profile {
        Profile {
            id: row.id,
            name: row.nome.unwrap_or_default(),
            email: row.email,
            photo_url: row.photo_url,
            role: row.cargo,
            phone: row.telefone,
        }
    }

    pub fn to_dto_list(rows: Vec<ProfileRow>) -> Vec<Profile> {
        rows.into_iter().map(Self::to_dto).collect()
    }

    pub fn to_write_row(update: &ProfileUpdate) -> ProfileWriteRow {
        ProfileWriteRow {
            nome: update.name.clone(),
            email: update.email.clone(),
            photo_url: update.photo_url.clone(),
            cargo: update.role.clone(),
            telefone: update.phone.clone(),
        }
    }
}
