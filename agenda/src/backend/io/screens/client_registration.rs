//! Client registration screen: search-as-you-type on the name field, pick a
//! suggestion to edit it, or fill the form to create a new client.

use shared::{Alert, Client};
use tracing::warn;

use super::AlertSlot;
use crate::backend::domain::client_service::{display_birth_date, format_birth_date, format_phone};
use crate::backend::domain::commands::clients::{SaveClientCommand, SaveOutcome};
use crate::backend::domain::{AgendaError, ClientService};
use crate::backend::remote::Connection;
use crate::backend::AppState;

pub struct ClientRegistrationScreen<C: Connection> {
    client_service: ClientService<C>,
    form: SaveClientCommand,
    suggestions: Vec<Client>,
    alerts: AlertSlot,
}

impl<C: Connection> ClientRegistrationScreen<C> {
    pub fn new(state: &AppState<C>) -> Self {
        Self {
            client_service: state.client_service.clone(),
            form: SaveClientCommand::default(),
            suggestions: Vec::new(),
            alerts: AlertSlot::default(),
        }
    }

    pub fn form(&self) -> &SaveClientCommand {
        &self.form
    }

    pub fn suggestions(&self) -> &[Client] {
        &self.suggestions
    }

    /// Name typed; an empty name clears the whole form and the selection
    pub async fn set_name(&mut self, text: &str) {
        self.form.name = text.to_string();
        if text.trim().is_empty() {
            self.form = SaveClientCommand::default();
            self.suggestions.clear();
            return;
        }
        match self.client_service.search_by_name(text).await {
            Ok(clients) => self.suggestions = clients,
            Err(e) => warn!(component = "screens", "Client search failed: {}", e),
        }
    }

    pub fn set_email(&mut self, text: &str) {
        self.form.email = text.to_string();
    }

    pub fn set_phone(&mut self, text: &str) {
        self.form.phone = format_phone(text);
    }

    pub fn set_birth_date(&mut self, text: &str) {
        self.form.birth_date = format_birth_date(text);
    }

    /// Fill the form from a suggestion; saving then updates that client
    pub fn select_client(&mut self, client: &Client) {
        self.form = SaveClientCommand {
            client_id: Some(client.id.clone()),
            name: client.name.clone(),
            email: client.email.clone(),
            phone: format_phone(&client.phone),
            birth_date: display_birth_date(&client.birth_date),
        };
        self.suggestions.clear();
    }

    pub fn is_editing(&self) -> bool {
        self.form.client_id.is_some()
    }

    pub async fn save(&mut self) {
        let alert = match self.client_service.save(&self.form).await {
            Ok(SaveOutcome::Updated) => Alert::notice("Cliente atualizado com sucesso!"),
            Ok(SaveOutcome::Created) => {
                self.form = SaveClientCommand::default();
                Alert::notice("Cliente cadastrado com sucesso!")
            }
            Err(AgendaError::Validation(e)) => Alert::notice(e.to_string()),
            Err(e) => Alert::error(e.to_string()),
        };
        self.alerts.show(alert);
    }

    pub fn take_alert(&mut self) -> Option<Alert> {
        self.alerts.take()
    }
}
