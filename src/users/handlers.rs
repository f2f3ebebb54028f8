use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use tracing::{info, instrument, warn};
use tower_sessions::Session;
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    auth::session::current_user,
    error::AppError,
    state::AppState,
    users::dto::{parse_birthdate, ProfileForm},
    users::repo::StoreError,
    views,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/profile", get(own_profile))
        .route("/profile/:user_id", get(profile))
        .route("/profile-image/:user_id", get(profile_image))
        .route("/edit-profile", get(edit_profile))
        .route("/update-profile", post(update_profile))
        .route("/cgv", get(terms))
}

#[instrument(skip(state, session))]
pub async fn home(
    State(state): State<AppState>,
    session: Session,
) -> Result<Html<String>, AppError> {
    let users = state.users.list_all().await?;
    let viewer = current_user(&session).await?;
    Ok(Html(views::home_page(&users, viewer.as_ref())))
}

/// Renders the login-time snapshot held in the session, the way the site
/// has always done; a fresh read happens on /profile/:user_id instead.
pub async fn own_profile(AuthUser(user): AuthUser) -> Html<String> {
    Html(views::session_profile_page(&user))
}

#[instrument(skip(state, session))]
pub async fn profile(
    State(state): State<AppState>,
    session: Session,
    Path(user_id): Path<Uuid>,
) -> Result<Html<String>, AppError> {
    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found."))?;
    let viewer = current_user(&session).await?;
    let is_same_user = viewer
        .as_ref()
        .map(|v| v.id == user.id)
        .unwrap_or(false);
    Ok(Html(views::profile_page(&user, is_same_user)))
}

#[instrument(skip(state))]
pub async fn profile_image(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let image = state
        .users
        .load_image(user_id)
        .await?
        .ok_or_else(|| AppError::not_found("Image not found."))?;

    let content_type = HeaderValue::from_str(&image.content_type)
        .unwrap_or(HeaderValue::from_static("application/octet-stream"));
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, content_type);
    Ok((headers, image.data).into_response())
}

#[instrument(skip(state))]
pub async fn edit_profile(
    State(state): State<AppState>,
    AuthUser(viewer): AuthUser,
) -> Result<Html<String>, AppError> {
    let user = state
        .users
        .find_by_id(viewer.id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found."))?;
    Ok(Html(views::edit_profile_page(
        &user.username,
        &crate::users::dto::format_birthdate(user.birthdate),
        None,
    )))
}

fn edit_error(form: &ProfileForm, msg: &str) -> Response {
    Html(views::edit_profile_page(&form.username, &form.birthdate, Some(msg))).into_response()
}

#[instrument(skip(state, form))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(viewer): AuthUser,
    Form(form): Form<ProfileForm>,
) -> Result<Response, AppError> {
    let username = form.username.trim().to_string();
    if username.is_empty() {
        return Ok(edit_error(&form, "Username is required."));
    }
    let Some(birthdate) = parse_birthdate(&form.birthdate) else {
        return Ok(edit_error(&form, "Birthdate must be a valid date (YYYY-MM-DD)."));
    };

    match state
        .users
        .update_profile(viewer.id, &username, birthdate)
        .await
    {
        Ok(Some(user)) => {
            info!(user_id = %user.id, username = %user.username, "profile updated");
            Ok(Redirect::to(&format!("/profile/{}", user.id)).into_response())
        }
        Ok(None) => {
            warn!(user_id = %viewer.id, "session user no longer exists");
            Err(AppError::not_found("User not found."))
        }
        Err(StoreError::DuplicateUsername) => {
            warn!(user_id = %viewer.id, username = %username, "edit duplicate username");
            Ok(edit_error(&form, "This username is already taken."))
        }
        Err(StoreError::Other(e)) => Err(AppError::Internal(e)),
    }
}

pub async fn terms() -> Html<String> {
    Html(views::terms_page())
}
