use serde::{Deserialize, Serialize};
use time::Date;
use tower_sessions::Session;
use uuid::Uuid;

pub const SESSION_USER_KEY: &str = "user";

/// Snapshot of the user taken at login time. It lives in the session store
/// and is not refreshed when the profile is edited, so it can lag behind
/// the database until the next login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub username: String,
    pub birthdate: Date,
}

/// Read the logged-in user from the session, if any.
pub async fn current_user(session: &Session) -> anyhow::Result<Option<SessionUser>> {
    let user = session
        .get::<SessionUser>(SESSION_USER_KEY)
        .await
        .map_err(anyhow::Error::from)?;
    Ok(user)
}
