use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use tracing::{info, instrument, warn};
use tower_sessions::Session;

use crate::{
    auth::{
        dto::{LoginForm, SignupForm},
        password::{hash_password, verify_password},
        session::{current_user, SessionUser, SESSION_USER_KEY},
    },
    error::AppError,
    state::AppState,
    users::dto::parse_birthdate,
    users::repo::{NewUser, ProfileImage, StoreError},
    views,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", get(signup_page).post(signup))
        .route("/login", get(login_page).post(login))
        .route("/logout", post(logout))
}

pub async fn signup_page() -> Html<String> {
    Html(views::signup_page(None, None))
}

pub async fn login_page() -> Html<String> {
    Html(views::login_page(None))
}

fn signup_error(msg: &str) -> Response {
    Html(views::signup_page(Some(msg), None)).into_response()
}

#[instrument(skip(state, multipart))]
pub async fn signup(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let mut form = SignupForm::default();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("username") => {
                form.username = field
                    .text()
                    .await
                    .map_err(anyhow::Error::from)?
                    .trim()
                    .to_string();
            }
            Some("password") => {
                form.password = field.text().await.map_err(anyhow::Error::from)?;
            }
            Some("birthdate") => {
                form.birthdate = field.text().await.map_err(anyhow::Error::from)?;
            }
            Some("profileImage") => {
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".into());
                let data = field.bytes().await.map_err(anyhow::Error::from)?;
                if !data.is_empty() {
                    form.image = Some(ProfileImage {
                        data: data.to_vec(),
                        content_type,
                    });
                }
            }
            _ => {}
        }
    }

    if form.username.is_empty() {
        return Ok(signup_error("Username is required."));
    }
    if form.password.len() < 8 {
        return Ok(signup_error("Password must be at least 8 characters."));
    }
    let Some(birthdate) = parse_birthdate(&form.birthdate) else {
        return Ok(signup_error("Birthdate must be a valid date (YYYY-MM-DD)."));
    };

    let hash = hash_password(&form.password)?;

    let new_user = NewUser {
        username: form.username.clone(),
        password_hash: hash,
        birthdate,
        image: form.image,
    };
    match state.users.create(new_user).await {
        Ok(user) => {
            info!(user_id = %user.id, username = %user.username, "user signed up");
            Ok(Html(views::signup_page(None, Some("Your account has been created!")))
                .into_response())
        }
        Err(StoreError::DuplicateUsername) => {
            warn!(username = %form.username, "signup duplicate username");
            Ok(signup_error("This username is already taken."))
        }
        Err(StoreError::Other(e)) => Err(AppError::Internal(e)),
    }
}

#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let user = match state.users.find_by_username(form.username.trim()).await? {
        Some(u) => u,
        None => {
            warn!(username = %form.username, "login unknown username");
            return Ok((
                StatusCode::UNAUTHORIZED,
                Html(views::login_page(Some("No account with that username was found."))),
            )
                .into_response());
        }
    };

    let ok = verify_password(&form.password, &user.password_hash)?;
    if !ok {
        warn!(username = %form.username, user_id = %user.id, "login wrong password");
        return Ok((
            StatusCode::UNAUTHORIZED,
            Html(views::login_page(Some("The password does not match."))),
        )
            .into_response());
    }

    let snapshot = SessionUser {
        id: user.id,
        username: user.username.clone(),
        birthdate: user.birthdate,
    };
    session
        .insert(SESSION_USER_KEY, &snapshot)
        .await
        .map_err(anyhow::Error::from)?;

    info!(user_id = %user.id, username = %user.username, "user logged in");
    Ok(Redirect::to(&format!("/profile/{}", user.id)).into_response())
}

#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Redirect, AppError> {
    match current_user(&session).await {
        Ok(Some(user)) => {
            session.flush().await.map_err(anyhow::Error::from)?;
            info!(user_id = %user.id, "user logged out");
            Ok(Redirect::to("/"))
        }
        _ => Ok(Redirect::to("/")),
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{header, StatusCode};

    use crate::auth::password::verify_password;
    use crate::test_util::{
        body_string, form_request, get_request, login, send, session_cookie, signup_request,
        test_app, with_cookie,
    };

    const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];

    #[tokio::test]
    async fn signup_creates_user_with_hashed_password_and_image() {
        let (app, state) = test_app();

        let resp = send(
            &app,
            signup_request("alice", "p@ss1234", "2000-01-01", Some(("image/jpeg", JPEG_BYTES))),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_string(resp).await.contains("Your account has been created!"));

        let user = state
            .users
            .find_by_username("alice")
            .await
            .unwrap()
            .expect("user created");
        assert_ne!(user.password_hash, "p@ss1234");
        assert!(verify_password("p@ss1234", &user.password_hash).unwrap());

        let image = state
            .users
            .load_image(user.id)
            .await
            .unwrap()
            .expect("image stored");
        assert_eq!(image.data, JPEG_BYTES);
        assert_eq!(image.content_type, "image/jpeg");
    }

    #[tokio::test]
    async fn signup_without_image_stores_no_image() {
        let (app, state) = test_app();
        send(&app, signup_request("bob", "password1", "1990-06-15", None)).await;

        let user = state.users.find_by_username("bob").await.unwrap().unwrap();
        assert!(state.users.load_image(user.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_signup_keeps_existing_record_unchanged() {
        let (app, state) = test_app();
        send(&app, signup_request("alice", "p@ss1234", "2000-01-01", None)).await;

        let resp = send(&app, signup_request("alice", "other-pass", "1999-12-31", None)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_string(resp).await.contains("already taken"));

        let users = state.users.list_all().await.unwrap();
        assert_eq!(users.len(), 1);
        assert!(verify_password("p@ss1234", &users[0].password_hash).unwrap());
        assert_eq!(users[0].birthdate, time::macros::date!(2000 - 01 - 01));
    }

    #[tokio::test]
    async fn signup_rejects_short_password() {
        let (app, state) = test_app();
        let resp = send(&app, signup_request("carol", "short", "2000-01-01", None)).await;
        assert!(body_string(resp).await.contains("at least 8 characters"));
        assert!(state.users.find_by_username("carol").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn signup_rejects_invalid_birthdate() {
        let (app, state) = test_app();
        let resp = send(&app, signup_request("carol", "password1", "tomorrow", None)).await;
        assert!(body_string(resp).await.contains("valid date"));
        assert!(state.users.find_by_username("carol").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn login_with_correct_credentials_redirects_to_profile() {
        let (app, state) = test_app();
        send(&app, signup_request("alice", "p@ss1234", "2000-01-01", None)).await;
        let alice = state.users.find_by_username("alice").await.unwrap().unwrap();

        let (resp, _cookie) = login(&app, "alice", "p%40ss1234").await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            resp.headers()[header::LOCATION],
            format!("/profile/{}", alice.id)
        );
    }

    #[tokio::test]
    async fn login_with_unknown_username_is_unauthorized() {
        let (app, _state) = test_app();
        let resp = send(&app, form_request("/login", "username=ghost&password=whatever1")).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert!(body_string(resp).await.contains("No account"));
    }

    #[tokio::test]
    async fn login_with_wrong_password_is_unauthorized() {
        let (app, _state) = test_app();
        send(&app, signup_request("alice", "p@ss1234", "2000-01-01", None)).await;

        let resp = send(&app, form_request("/login", "username=alice&password=nope-nope")).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert!(body_string(resp).await.contains("does not match"));
    }

    #[tokio::test]
    async fn logout_without_session_redirects_home() {
        let (app, _state) = test_app();
        let resp = send(&app, form_request("/logout", "")).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()[header::LOCATION], "/");
    }

    #[tokio::test]
    async fn logout_clears_the_session() {
        let (app, _state) = test_app();
        send(&app, signup_request("alice", "p@ss1234", "2000-01-01", None)).await;
        let (_resp, cookie) = login(&app, "alice", "p%40ss1234").await;

        // session works before logout
        let profile = send(&app, with_cookie(get_request("/profile"), &cookie)).await;
        assert_eq!(profile.status(), StatusCode::OK);

        let logout_resp = send(&app, with_cookie(form_request("/logout", ""), &cookie)).await;
        assert_eq!(logout_resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(logout_resp.headers()[header::LOCATION], "/");

        // same cookie no longer authenticates
        let after = send(&app, with_cookie(get_request("/profile"), &cookie)).await;
        assert_eq!(after.status(), StatusCode::SEE_OTHER);
        assert_eq!(after.headers()[header::LOCATION], "/login");
    }

    #[tokio::test]
    async fn login_response_sets_a_session_cookie() {
        let (app, _state) = test_app();
        send(&app, signup_request("alice", "p@ss1234", "2000-01-01", None)).await;
        let resp = send(&app, form_request("/login", "username=alice&password=p%40ss1234")).await;
        let cookie = session_cookie(&resp);
        assert!(!cookie.is_empty());
    }
}
