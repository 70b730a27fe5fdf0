use std::time::Duration;

use anyhow::{Context, Result};
use shared::{CalendarDay, DisplayedMonth, Route};
use tracing::{info, warn};

use salon_agenda::backend::domain::calendar::month_label;
use salon_agenda::backend::domain::AppointmentListView;
use salon_agenda::backend::io::{HomeScreen, StartScreen};
use salon_agenda::backend::remote::HttpConnection;
use salon_agenda::backend::{initialize_backend, AppState};
use salon_agenda::config::AppConfig;
use salon_agenda::logging::init_logging;

const POLL_INTERVAL: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let config = AppConfig::from_env().context("Failed to load configuration")?;
    let connection = HttpConnection::from_config(&config);
    let state = initialize_backend(connection, config.clone());

    if let (Some(email), Some(password)) = (&config.email, &config.password) {
        state
            .auth_service
            .sign_in(email, password)
            .await
            .context("Sign-in failed")?;
    }

    if StartScreen::new(&state).resolve().await == Route::Login {
        warn!("No session; set AGENDA_EMAIL and AGENDA_PASSWORD to sign in");
        return Ok(());
    }

    follow_today(&state).await
}

/// Print today's agenda and reprint it whenever live refresh changes it
async fn follow_today(state: &AppState<HttpConnection>) -> Result<()> {
    let mut home = HomeScreen::new(state);
    home.activate().await;
    print_header(&home);

    let mut shown = home.appointments().await;
    print_appointments(&shown);

    info!(state = ?home.listener_state(), "Following live updates, press Ctrl-C to stop");
    let mut ticker = tokio::time::interval(POLL_INTERVAL);
    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl-C")?;
                break;
            }
            _ = ticker.tick() => {
                let current = home.appointments().await;
                if current != shown {
                    print_appointments(&current);
                    shown = current;
                }
            }
        }
    }

    home.deactivate();
    info!("Live refresh released");
    Ok(())
}

fn print_header(home: &HomeScreen<HttpConnection>) {
    let today = CalendarDay::today();
    println!("Olá, {}!", home.user_name());
    println!("{} {}", today.day(), month_label(DisplayedMonth::containing(today)));
    match home.birthday_placeholder() {
        Some(placeholder) => println!("{}", placeholder),
        None => {
            for client in home.birthdays() {
                println!("Aniversário: {}", client.name);
            }
        }
    }
}

fn print_appointments(view: &AppointmentListView) {
    println!();
    match view {
        AppointmentListView::Placeholder(text) => println!("{}", text),
        AppointmentListView::Rows(rows) => {
            for row in rows {
                println!("{}  {}  {}", row.time, row.client_name, row.note);
            }
        }
    }
}
