use axum::routing::{get, post};
use axum::Router;

use crate::auth::handlers;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/auth/signup/",
            get(handlers::signup_page).post(handlers::signup),
        )
        .route(
            "/auth/login/",
            get(handlers::login_page).post(handlers::login),
        )
        .route("/auth/logout/", post(handlers::logout))
}
