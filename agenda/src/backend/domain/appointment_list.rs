//! Rendering of an appointment list snapshot and the delete confirmation.

use serde::Serialize;

use super::snapshot::AppointmentListSnapshot;

pub const HOME_PLACEHOLDER: &str = "Nenhum agendamento para hoje.";
pub const AGENDA_PLACEHOLDER: &str = "Nenhum agendamento para este dia.";

/// One rendered list row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppointmentRow {
    pub appointment_id: String,
    /// "HH:MM"
    pub time: String,
    pub client_name: String,
    pub professional_name: String,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AppointmentListView {
    Placeholder(String),
    Rows(Vec<AppointmentRow>),
}

impl AppointmentListView {
    /// Render a snapshot in its stored order
    pub fn render(snapshot: Option<&AppointmentListSnapshot>, placeholder: &str) -> Self {
        let Some(snapshot) = snapshot.filter(|snapshot| !snapshot.is_empty()) else {
            return AppointmentListView::Placeholder(placeholder.to_string());
        };
        let rows = snapshot
            .appointments
            .iter()
            .map(|appointment| AppointmentRow {
                appointment_id: appointment.id.clone(),
                time: appointment.time_label().to_string(),
                client_name: appointment.client_name.clone().unwrap_or_default(),
                professional_name: appointment.professional_name.clone().unwrap_or_default(),
                note: appointment.note.clone(),
            })
            .collect();
        AppointmentListView::Rows(rows)
    }

    pub fn rows(&self) -> &[AppointmentRow] {
        match self {
            AppointmentListView::Rows(rows) => rows,
            AppointmentListView::Placeholder(_) => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptChoice {
    Cancel,
    ConfirmDestructive,
}

/// Two-choice prompt shown before a destructive action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationPrompt {
    pub title: String,
    pub message: String,
    pub cancel_label: String,
    pub confirm_label: String,
}

impl ConfirmationPrompt {
    pub fn delete_appointment() -> Self {
        Self {
            title: "Excluir Agendamento".to_string(),
            message: "Tem certeza que deseja excluir este agendamento?".to_string(),
            cancel_label: "Cancelar".to_string(),
            confirm_label: "Excluir".to_string(),
        }
    }
}

/// A delete waiting for the user's answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteConfirmation {
    pub appointment_id: String,
    pub prompt: ConfirmationPrompt,
}

impl DeleteConfirmation {
    pub fn new(appointment_id: &str) -> Self {
        Self {
            appointment_id: appointment_id.to_string(),
            prompt: ConfirmationPrompt::delete_appointment(),
        }
    }

    /// The id to delete, only when the user confirmed
    pub fn resolve(self, choice: PromptChoice) -> Option<String> {
        match choice {
            PromptChoice::ConfirmDestructive => Some(self.appointment_id),
            PromptChoice::Cancel => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{Appointment, CalendarDay};

    fn snapshot(times: &[&str]) -> AppointmentListSnapshot {
        let day = CalendarDay::from_ymd(2024, 3, 15).unwrap();
        AppointmentListSnapshot {
            day,
            appointments: times
                .iter()
                .enumerate()
                .map(|(index, time)| Appointment {
                    id: index.to_string(),
                    client_id: "c".to_string(),
                    professional_id: "p".to_string(),
                    date: day,
                    time: time.to_string(),
                    note: "Corte".to_string(),
                    client_name: Some("Ana".to_string()),
                    professional_name: None,
                })
                .collect(),
            sequence: 1,
        }
    }

    #[test]
    fn test_empty_snapshot_renders_placeholder() {
        let view = AppointmentListView::render(Some(&snapshot(&[])), HOME_PLACEHOLDER);
        assert_eq!(
            view,
            AppointmentListView::Placeholder("Nenhum agendamento para hoje.".to_string())
        );
        assert!(AppointmentListView::render(None, AGENDA_PLACEHOLDER).rows().is_empty());
    }

    #[test]
    fn test_rows_keep_order_and_trim_seconds() {
        let view = AppointmentListView::render(Some(&snapshot(&["09:30:00", "14:00:00"])), HOME_PLACEHOLDER);
        let times: Vec<_> = view.rows().iter().map(|row| row.time.as_str()).collect();
        assert_eq!(times, vec!["09:30", "14:00"]);
        assert_eq!(view.rows()[0].professional_name, "");
    }

    #[test]
    fn test_delete_requires_confirmation() {
        let pending = DeleteConfirmation::new("42");
        assert_eq!(pending.prompt.title, "Excluir Agendamento");
        assert_eq!(pending.clone().resolve(PromptChoice::Cancel), None);
        assert_eq!(
            pending.resolve(PromptChoice::ConfirmDestructive),
            Some("42".to_string())
        );
    }
}
