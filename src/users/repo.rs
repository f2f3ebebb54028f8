use axum::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub birthdate: Date,
    pub created_at: OffsetDateTime,
}

/// Raw image bytes plus the content type declared at upload time. The two
/// always travel together; the schema enforces the pairing.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProfileImage {
    pub data: Vec<u8>,
    pub content_type: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub birthdate: Date,
    pub image: Option<ProfileImage>,
}

/// Write failures the handlers branch on. Username collisions come out of
/// the database unique constraint rather than an application pre-check, so
/// concurrent signups cannot slip a duplicate through.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("username already taken")]
    DuplicateUsername,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn list_all(&self) -> anyhow::Result<Vec<User>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError>;
    async fn update_profile(
        &self,
        id: Uuid,
        username: &str,
        birthdate: Date,
    ) -> Result<Option<User>, StoreError>;
    async fn load_image(&self, id: Uuid) -> anyhow::Result<Option<ProfileImage>>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn map_write_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return StoreError::DuplicateUsername;
        }
    }
    StoreError::Other(e.into())
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn list_all(&self) -> anyhow::Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, birthdate, created_at
            FROM users
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(users)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, birthdate, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    /// Find a user by username.
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, birthdate, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    /// Create a new user with hashed password and optional profile image.
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let (image_data, image_content_type) = match new_user.image {
            Some(img) => (Some(img.data), Some(img.content_type)),
            None => (None, None),
        };
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash, birthdate, image_data, image_content_type)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, username, password_hash, birthdate, created_at
            "#,
        )
        .bind(&new_user.username)
        .bind(&new_user.password_hash)
        .bind(new_user.birthdate)
        .bind(image_data)
        .bind(image_content_type)
        .fetch_one(&self.db)
        .await
        .map_err(map_write_error)?;
        Ok(user)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        username: &str,
        birthdate: Date,
    ) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET username = $2, birthdate = $3
            WHERE id = $1
            RETURNING id, username, password_hash, birthdate, created_at
            "#,
        )
        .bind(id)
        .bind(username)
        .bind(birthdate)
        .fetch_optional(&self.db)
        .await
        .map_err(map_write_error)?;
        Ok(user)
    }

    async fn load_image(&self, id: Uuid) -> anyhow::Result<Option<ProfileImage>> {
        let image = sqlx::query_as::<_, ProfileImage>(
            r#"
            SELECT image_data AS data, image_content_type AS content_type
            FROM users
            WHERE id = $1 AND image_data IS NOT NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(image)
    }
}
