//! Client search, registration and birthday lookup, plus the input masks used
//! by the registration form.

use chrono::NaiveDate;
use shared::{CalendarDay, Client, ClientDraft};
use tracing::{info, warn};

use super::commands::clients::{SaveClientCommand, SaveOutcome};
use super::error::{AgendaError, AgendaResult, ValidationError};
use crate::backend::remote::{ClientStorage, Connection, NamePattern};

/// Searches shorter than this return nothing without a remote call
pub const MIN_SEARCH_LENGTH: usize = 2;

#[derive(Clone)]
pub struct ClientService<C: Connection> {
    client_repository: C::ClientRepository,
}

impl<C: Connection> ClientService<C> {
    pub fn new(connection: &C) -> Self {
        Self {
            client_repository: connection.create_client_repository(),
        }
    }

    /// Clients whose name starts with `text` (booking suggestions)
    pub async fn search_by_prefix(&self, text: &str) -> AgendaResult<Vec<Client>> {
        self.search(text, NamePattern::Prefix(text.to_string())).await
    }

    /// Clients whose name contains `text` (registration suggestions)
    pub async fn search_by_name(&self, text: &str) -> AgendaResult<Vec<Client>> {
        self.search(text, NamePattern::Contains(text.to_string())).await
    }

    async fn search(&self, text: &str, pattern: NamePattern) -> AgendaResult<Vec<Client>> {
        if text.chars().count() < MIN_SEARCH_LENGTH {
            return Ok(Vec::new());
        }
        self.client_repository
            .search_clients(&pattern)
            .await
            .map_err(|e| {
                warn!(component = "clients", "Client search failed: {:#}", e);
                AgendaError::fetch(e)
            })
    }

    /// Insert a new client or update the selected one
    pub async fn save(&self, command: &SaveClientCommand) -> AgendaResult<SaveOutcome> {
        let draft = validate_client(command)?;
        match command.client_id.as_deref() {
            Some(client_id) => {
                self.client_repository
                    .update_client(client_id, &draft)
                    .await
                    .map_err(|e| {
                        warn!(component = "clients", client_id, "Failed to update client: {:#}", e);
                        AgendaError::write(e)
                    })?;
                info!(component = "clients", client_id, "Updated client");
                Ok(SaveOutcome::Updated)
            }
            None => {
                self.client_repository
                    .insert_client(&draft)
                    .await
                    .map_err(|e| {
                        warn!(component = "clients", "Failed to create client: {:#}", e);
                        AgendaError::write(e)
                    })?;
                info!(component = "clients", "Created client");
                Ok(SaveOutcome::Created)
            }
        }
    }

    /// Clients born on `day`'s month and day, any year
    pub async fn birthdays_on(&self, day: CalendarDay) -> AgendaResult<Vec<Client>> {
        self.client_repository
            .clients_with_birthday(day.month(), day.day())
            .await
            .map_err(|e| {
                warn!(component = "clients", "Birthday lookup failed: {:#}", e);
                AgendaError::fetch(e)
            })
    }
}

/// Required fields present, phone reduced to digits, birth date in ISO form
pub fn validate_client(command: &SaveClientCommand) -> Result<ClientDraft, ValidationError> {
    let name = command.name.trim();
    let phone = phone_digits(&command.phone);
    let birth_date = command.birth_date.trim();
    if name.is_empty() || phone.is_empty() || birth_date.is_empty() {
        return Err(ValidationError::MissingClientFields);
    }

    Ok(ClientDraft {
        name: name.to_string(),
        email: command.email.trim().to_string(),
        phone,
        birth_date: parse_birth_date(birth_date)?,
    })
}

pub fn phone_digits(input: &str) -> String {
    input.chars().filter(char::is_ascii_digit).collect()
}

/// Progressive "(DD) DDDDD-DDDD" mask over whatever digits were typed
pub fn format_phone(input: &str) -> String {
    let digits = phone_digits(input);
    match digits.len() {
        0..=2 => digits,
        3..=7 => format!("({}) {}", &digits[..2], &digits[2..]),
        len => format!(
            "({}) {}-{}",
            &digits[..2],
            &digits[2..7],
            &digits[7..len.min(11)]
        ),
    }
}

/// Progressive "DD/MM/YYYY" mask over whatever digits were typed
pub fn format_birth_date(input: &str) -> String {
    let digits = phone_digits(input);
    match digits.len() {
        0..=2 => digits,
        3..=4 => format!("{}/{}", &digits[..2], &digits[2..]),
        len => format!(
            "{}/{}/{}",
            &digits[..2],
            &digits[2..4],
            &digits[4..len.min(8)]
        ),
    }
}

/// "YYYY-MM-DD" as stored to "DD/MM/YYYY" for the form; empty stays empty
pub fn display_birth_date(stored: &str) -> String {
    let mut parts = stored.trim().splitn(3, '-');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(year), Some(month), Some(day)) if !year.is_empty() => {
            format!("{}/{}/{}", day, month, year)
        }
        _ => String::new(),
    }
}

/// "DD/MM/YYYY" from the form to the stored "YYYY-MM-DD"
pub fn parse_birth_date(input: &str) -> Result<String, ValidationError> {
    NaiveDate::parse_from_str(input.trim(), "%d/%m/%Y")
        .map(|date| date.format("%Y-%m-%d").to_string())
        .map_err(|_| ValidationError::InvalidDate(input.to_string()))
}
