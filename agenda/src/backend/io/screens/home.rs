//! Home screen: greeting, today's birthdays and the signed-in professional's
//! appointments for today, kept live.

use shared::{CalendarDay, Client};
use tracing::{info, warn};

use super::attach_live_refresh;
use crate::backend::domain::appointment_list::HOME_PLACEHOLDER;
use crate::backend::domain::commands::appointments::AppointmentQuery;
use crate::backend::domain::{AppointmentListView, AppointmentSync, ListenerState, LiveRefreshListener};
use crate::backend::remote::Connection;
use crate::backend::AppState;

pub const BIRTHDAY_PLACEHOLDER: &str = "Nenhum aniversariante hoje.";

pub struct HomeScreen<C: Connection> {
    state: AppState<C>,
    today: CalendarDay,
    user_name: String,
    photo_url: Option<String>,
    birthdays: Vec<Client>,
    sync: AppointmentSync<C>,
    listener: Option<LiveRefreshListener<C>>,
}

impl<C: Connection> HomeScreen<C> {
    pub fn new(state: &AppState<C>) -> Self {
        Self::with_today(state, CalendarDay::today())
    }

    pub fn with_today(state: &AppState<C>, today: CalendarDay) -> Self {
        Self {
            state: state.clone(),
            today,
            user_name: String::new(),
            photo_url: None,
            birthdays: Vec::new(),
            sync: AppointmentSync::new(state.appointment_service.clone()),
            listener: None,
        }
    }

    /// Load everything and start live refresh; replaces any earlier listener
    pub async fn activate(&mut self) {
        self.deactivate();
        self.load_profile().await;
        self.load_birthdays().await;

        let user = match self.state.auth_service.current_user().await {
            Ok(Some(user)) => user,
            Ok(None) => {
                info!(component = "screens", "Home opened without a signed-in user");
                return;
            }
            Err(e) => {
                warn!(component = "screens", "Could not resolve user: {}", e);
                return;
            }
        };

        let query = AppointmentQuery::for_professional(self.today, &user.id);
        if let Err(e) = self.sync.refresh(query).await {
            warn!(component = "screens", "Today's appointments unavailable: {}", e);
        }
        self.listener = Some(attach_live_refresh(&self.state, &self.sync).await);
    }

    /// Release live refresh
    pub fn deactivate(&mut self) {
        if let Some(mut listener) = self.listener.take() {
            listener.release();
        }
    }

    async fn load_profile(&mut self) {
        match self.state.profile_service.current_profile().await {
            Ok(Some(profile)) => {
                self.user_name = profile.name;
                self.photo_url = profile.photo_url;
            }
            Ok(None) => {}
            Err(e) => warn!(component = "screens", "Profile unavailable: {}", e),
        }
    }

    async fn load_birthdays(&mut self) {
        self.birthdays = match self.state.client_service.birthdays_on(self.today).await {
            Ok(clients) => clients,
            Err(e) => {
                warn!(component = "screens", "Birthdays unavailable: {}", e);
                Vec::new()
            }
        };
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn photo_url(&self) -> Option<&str> {
        self.photo_url.as_deref()
    }

    pub fn birthdays(&self) -> &[Client] {
        &self.birthdays
    }

    /// Placeholder text when nobody has a birthday today
    pub fn birthday_placeholder(&self) -> Option<&'static str> {
        self.birthdays.is_empty().then_some(BIRTHDAY_PLACEHOLDER)
    }

    pub async fn appointments(&self) -> AppointmentListView {
        AppointmentListView::render(self.sync.snapshot().await.as_ref(), HOME_PLACEHOLDER)
    }

    pub fn listener_state(&self) -> ListenerState {
        self.listener
            .as_ref()
            .map_or(ListenerState::Unsubscribed, LiveRefreshListener::state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::remote::memory::test_utils::{march_15, SalonFixture};
    use crate::backend::remote::memory::RemoteOperation;
    use crate::backend::test_support::app_state;
    use shared::{ChangeEvent, ChangeNotification};
    use std::time::Duration;

    async fn wait_for_rows(screen: &HomeScreen<crate::backend::remote::MemoryConnection>, count: usize) {
        for _ in 0..50 {
            if screen.appointments().await.rows().len() == count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("list never reached {} rows", count);
    }

    #[tokio::test]
    async fn test_home_shows_profile_birthdays_and_own_appointments() {
        let fixture = SalonFixture::new();
        fixture.add_appointment("1", march_15(), "14:00:00");
        fixture.add_appointment("2", march_15(), "09:30:00");
        fixture.add_appointment_for("3", &fixture.other_professional_id, march_15(), "10:00:00");

        let mut screen = HomeScreen::with_today(&app_state(&fixture), march_15());
        screen.activate().await;

        assert_eq!(screen.user_name(), "Carla");
        assert!(screen.photo_url().is_some());
        assert_eq!(screen.birthdays().len(), 1);
        assert_eq!(screen.birthday_placeholder(), None);

        let view = screen.appointments().await;
        let ids: Vec<_> = view.rows().iter().map(|row| row.appointment_id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1"]);
        assert_eq!(screen.listener_state(), ListenerState::Subscribed);
    }

    #[tokio::test]
    async fn test_change_notification_refetches() {
        let fixture = SalonFixture::new();
        let mut screen = HomeScreen::with_today(&app_state(&fixture), march_15());
        screen.activate().await;
        assert_eq!(
            screen.appointments().await,
            AppointmentListView::Placeholder(HOME_PLACEHOLDER.to_string())
        );

        fixture.add_appointment("7", march_15(), "11:00:00");
        fixture.connection.emit_change(ChangeNotification {
            table: "agendamentos".to_string(),
            event: ChangeEvent::Insert,
            record: serde_json::json!({ "id": "7", "profissional_id": fixture.professional.id }),
            old_record: serde_json::Value::Null,
        });

        wait_for_rows(&screen, 1).await;
        screen.deactivate();
        assert_eq!(fixture.connection.stats().open_channels, 0);
    }

    #[tokio::test]
    async fn test_signed_out_home_is_empty_and_not_live() {
        let fixture = SalonFixture::signed_out();
        fixture.connection.fail(RemoteOperation::ClientsWithBirthday, "offline");
        let mut screen = HomeScreen::with_today(&app_state(&fixture), march_15());
        screen.activate().await;

        assert_eq!(screen.user_name(), "");
        assert_eq!(screen.birthday_placeholder(), Some("Nenhum aniversariante hoje."));
        assert!(screen.appointments().await.rows().is_empty());
        assert_eq!(screen.listener_state(), ListenerState::Unsubscribed);
        assert_eq!(fixture.connection.stats().subscribe_calls, 0);
    }
}
