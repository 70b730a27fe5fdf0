//! Domain-level command and query types.
//!
//! Screens build these from their form state; services validate and turn
//! them into the payloads the remote layer writes.

pub mod appointments {
    use shared::CalendarDay;

    /// Which appointments a list shows
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct AppointmentQuery {
        pub day: CalendarDay,
        /// Only this professional's rows when set
        pub professional_id: Option<String>,
    }

    impl AppointmentQuery {
        pub fn for_day(day: CalendarDay) -> Self {
            Self {
                day,
                professional_id: None,
            }
        }

        pub fn for_professional(day: CalendarDay, professional_id: &str) -> Self {
            Self {
                day,
                professional_id: Some(professional_id.to_string()),
            }
        }
    }

    /// Input for booking a new appointment; every field may still be empty
    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    pub struct BookAppointmentCommand {
        pub client_id: Option<String>,
        pub date: Option<CalendarDay>,
        /// "HH:MM"
        pub time: Option<String>,
        pub professional_id: Option<String>,
        pub note: String,
    }
}

pub mod clients {
    /// Client registration form as typed, with masked inputs
    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    pub struct SaveClientCommand {
        /// Set when an existing client was picked from the suggestions
        pub client_id: Option<String>,
        pub name: String,
        pub email: String,
        /// "(DD) DDDDD-DDDD" or any partial form of it
        pub phone: String,
        /// "DD/MM/YYYY"
        pub birth_date: String,
    }

    /// Whether a save created or changed a row
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum SaveOutcome {
        Created,
        Updated,
    }
}
