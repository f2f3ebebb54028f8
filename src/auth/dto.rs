use serde::Deserialize;

use crate::users::repo::ProfileImage;

/// Form body for POST /login.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Fields collected from the multipart signup form. The image part is kept
/// only when the browser actually sent file bytes.
#[derive(Debug, Default)]
pub struct SignupForm {
    pub username: String,
    pub password: String,
    pub birthdate: String,
    pub image: Option<ProfileImage>,
}
