use askama::Template;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;

use crate::auth::{password, safe_next, session};
use crate::db::models::UserCredentials;
use crate::error::{AppError, AppResult};
use crate::extractors::{cookie_value, MaybeUser};
use crate::posts::repository::RepositoryError;
use crate::routes::Html;
use crate::state::AppState;

const BAD_CREDENTIALS: &str = "Please enter a correct username and password.";

// -- Templates --

#[derive(Template)]
#[template(path = "users/login.html")]
pub struct LoginTemplate {
    pub viewer: Option<String>,
    pub username: String,
    pub next: String,
    pub error: Option<&'static str>,
}

#[derive(Template)]
#[template(path = "users/signup.html")]
pub struct SignupTemplate {
    pub viewer: Option<String>,
    pub username: String,
    pub errors: Vec<&'static str>,
}

// -- Request types --

#[derive(Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub next: Option<String>,
}

#[derive(Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirmation: String,
}

/// Redirect that also starts a session for `user_id`.
fn signed_in_redirect(state: &AppState, user_id: i64, target: &str) -> AppResult<Response> {
    let token = session::create_session(&state.db, user_id, state.config.auth.session_hours)?;
    let cookie = session::session_cookie(&state.config.auth, &token);
    Ok(([(header::SET_COOKIE, cookie)], Redirect::to(target)).into_response())
}

// -- Login --

/// GET /auth/login/: render login form
pub async fn login_page(
    maybe_user: MaybeUser,
    Query(query): Query<NextQuery>,
) -> AppResult<Response> {
    Ok(Html(LoginTemplate {
        viewer: maybe_user.username(),
        username: String::new(),
        next: safe_next(query.next.as_deref()),
        error: None,
    })
    .into_response())
}

/// POST /auth/login/: check credentials and start a session
pub async fn login(
    State(state): State<AppState>,
    maybe_user: MaybeUser,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let username = form.username.trim().to_string();
    let next = safe_next(form.next.as_deref());

    let credentials = state.blog.find_user_credentials(&username).await?;
    let user = match credentials {
        Some(UserCredentials {
            user,
            password_hash: Some(hash),
        }) => password::verify_password(&form.password, &hash).then_some(user),
        _ => {
            password::verify_without_account(&form.password, state.config.auth.password_cost);
            None
        }
    };

    match user {
        Some(user) => {
            tracing::info!("User {} logged in", user.username);
            signed_in_redirect(&state, user.id, &next)
        }
        None => {
            tracing::debug!("Failed login for {}", username);
            Ok(Html(LoginTemplate {
                viewer: maybe_user.username(),
                username,
                next,
                error: Some(BAD_CREDENTIALS),
            })
            .into_response())
        }
    }
}

/// POST /auth/logout/: end the session, if any
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    if let Some(token) = cookie_value(&headers, &state.config.auth.cookie_name) {
        session::delete_session(&state.db, token)?;
    }
    let cookie = session::clear_session_cookie(&state.config.auth);
    Ok(([(header::SET_COOKIE, cookie)], Redirect::to("/")).into_response())
}

// -- Signup --

/// GET /auth/signup/: render signup form
pub async fn signup_page(maybe_user: MaybeUser) -> AppResult<Response> {
    Ok(Html(SignupTemplate {
        viewer: maybe_user.username(),
        username: String::new(),
        errors: Vec::new(),
    })
    .into_response())
}

/// POST /auth/signup/: create the account and sign it in
pub async fn signup(
    State(state): State<AppState>,
    maybe_user: MaybeUser,
    Form(form): Form<SignupForm>,
) -> AppResult<Response> {
    let username = form.username.trim().to_string();

    let mut errors = Vec::new();
    if let Err(e) = password::validate_username(&username) {
        errors.push(e);
    }
    if let Err(e) = password::validate_password(&form.password, &form.password_confirmation) {
        errors.push(e);
    }

    if errors.is_empty() {
        let hash = password::hash_password(&form.password, state.config.auth.password_cost)?;
        match state.blog.create_user(&username, Some(&hash)).await {
            Ok(user) => {
                tracing::info!("Created account {}", user.username);
                return signed_in_redirect(&state, user.id, "/");
            }
            Err(RepositoryError::Conflict(_)) => {
                errors.push("A user with that username already exists.");
            }
            Err(e) => return Err(AppError::from(e)),
        }
    }

    Ok(Html(SignupTemplate {
        viewer: maybe_user.username(),
        username,
        errors,
    })
    .into_response())
}
