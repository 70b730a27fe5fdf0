/// Test fixture for the salon agenda
///
/// Seeds a memory backend with a signed-in professional, a second
/// professional and two clients, so tests only add the appointments they
/// care about.
use shared::{AuthUser, CalendarDay, Profile};

use super::connection::MemoryConnection;
use crate::backend::remote::mappers::AppointmentRecord;

pub const PROFESSIONAL_EMAIL: &str = "carla@salao.com";
pub const PROFESSIONAL_PASSWORD: &str = "segredo123";

pub struct SalonFixture {
    pub connection: MemoryConnection,
    /// Signed in unless the fixture was built with `signed_out`
    pub professional: AuthUser,
    pub other_professional_id: String,
    pub ana_id: String,
    pub bruno_id: String,
}

impl SalonFixture {
    /// Fixture with the professional signed in
    pub fn new() -> Self {
        let fixture = Self::signed_out();
        fixture.connection.sign_in_as(&fixture.professional);
        fixture
    }

    /// Fixture with no session
    pub fn signed_out() -> Self {
        let connection = MemoryConnection::new();
        let professional = connection.add_user(PROFESSIONAL_EMAIL, PROFESSIONAL_PASSWORD);
        connection.seed_profile(Profile {
            id: professional.id.clone(),
            name: "Carla".to_string(),
            email: Some(PROFESSIONAL_EMAIL.to_string()),
            photo_url: Some("https://cdn.example.com/carla.jpg".to_string()),
            role: Some("Cabeleireira".to_string()),
            phone: Some("11987654321".to_string()),
        });

        let other_professional_id = "p-outro".to_string();
        connection.seed_profile(Profile {
            id: other_professional_id.clone(),
            name: "Diego".to_string(),
            ..Profile::default()
        });

        let ana_id = connection.seed_client("Ana Souza", "11999998888", "1990-03-15");
        let bruno_id = connection.seed_client("Bruno Lima", "11977776666", "1985-07-02");

        Self {
            connection,
            professional,
            other_professional_id,
            ana_id,
            bruno_id,
        }
    }

    /// Seed an appointment for Ana with the signed-in professional
    pub fn add_appointment(&self, id: &str, day: CalendarDay, time: &str) {
        self.add_appointment_for(id, &self.professional.id, day, time);
    }

    pub fn add_appointment_for(&self, id: &str, professional_id: &str, day: CalendarDay, time: &str) {
        self.connection.seed_appointment(AppointmentRecord {
            id: id.to_string(),
            cliente_id: self.ana_id.clone(),
            profissional_id: professional_id.to_string(),
            data: day.iso_string(),
            hora: time.to_string(),
            comentario: Some(format!("nota {}", id)),
        });
    }
}

/// 2024-03-15, the reference "today" used across tests
pub fn march_15() -> CalendarDay {
    CalendarDay::from_ymd(2024, 3, 15).unwrap()
}
