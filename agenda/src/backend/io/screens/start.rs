//! Entry screen: decides between login and home.

use shared::Route;
use tracing::info;

use crate::backend::domain::AuthService;
use crate::backend::remote::Connection;
use crate::backend::AppState;

pub struct StartScreen<C: Connection> {
    auth_service: AuthService<C>,
}

impl<C: Connection> StartScreen<C> {
    pub fn new(state: &AppState<C>) -> Self {
        Self {
            auth_service: state.auth_service.clone(),
        }
    }

    pub async fn resolve(&self) -> Route {
        let route = self.auth_service.start_route().await;
        info!(component = "screens", ?route, "Start route resolved");
        route
    }
}
