use crate::{
    record::{PostRecord, UserRecord},
    store::{DbError, Result, Store},
};
use async_trait::async_trait;
use inkwell_common::model::{
    Id,
    post::{CreatePost, Post, PostChanges, PostMarker},
    user::{CreateUser, Email, User, UserCredentials, UserMarker},
};
use sqlx::{
    PgPool,
    postgres::{PgConnectOptions, PgPoolOptions},
    query, query_as,
};
use std::{
    fmt::{Debug, Formatter},
    time::Duration,
};
use tracing::info;

/// Where and how to connect. The pool never holds more than
/// `max_connections`, keeps `min_connections` open while idle and recycles
/// every connection after `max_lifetime`.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct ConnectionSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub max_lifetime: Duration,
}

impl Debug for ConnectionSettings {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .field("database", &self.database)
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .field("max_lifetime", &self.max_lifetime)
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct DbClient {
    pool: PgPool,
}

impl DbClient {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(settings: &ConnectionSettings) -> Result<Self> {
        let options = PgConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .username(&settings.username)
            .password(&settings.password)
            .database(&settings.database);

        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .max_lifetime(settings.max_lifetime)
            .connect_with(options)
            .await?;

        info!(
            host = %settings.host,
            database = %settings.database,
            "Database connection established"
        );

        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!().run(&self.pool).await?;
        Ok(())
    }
}

fn classify_insert_error(err: sqlx::Error) -> DbError {
    match err {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => DbError::EmailTaken,
        other => DbError::Sqlx(other),
    }
}

#[async_trait]
impl Store for DbClient {
    async fn fetch_user(&self, user_id: Id<UserMarker>) -> Result<Option<User>> {
        let record = query_as::<_, UserRecord>(
            "
            SELECT id, username, email, password_hash, role, created_at, updated_at
            FROM users
            WHERE id = $1
            ",
        )
        .bind(user_id.get())
        .fetch_optional(&self.pool)
        .await?;

        let user = record.map(User::try_from).transpose()?;
        Ok(user)
    }

    async fn fetch_credentials_by_email(&self, email: &Email) -> Result<Option<UserCredentials>> {
        let record = query_as::<_, UserRecord>(
            "
            SELECT id, username, email, password_hash, role, created_at, updated_at
            FROM users
            WHERE email = $1
            ",
        )
        .bind(email.get())
        .fetch_optional(&self.pool)
        .await?;

        let credentials = record.map(UserCredentials::try_from).transpose()?;
        Ok(credentials)
    }

    async fn create_user(&self, user: &CreateUser) -> Result<User> {
        let record = query_as::<_, UserRecord>(
            "
            INSERT INTO users (username, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, email, password_hash, role, created_at, updated_at
            ",
        )
        .bind(user.username.get())
        .bind(user.email.get())
        .bind(user.password_hash.get())
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(classify_insert_error)?;

        Ok(User::try_from(record)?)
    }

    async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Option<Post>> {
        let record = query_as::<_, PostRecord>(
            "
            SELECT id, title, content, author_id, status, created_at, updated_at
            FROM posts
            WHERE id = $1
            ",
        )
        .bind(post_id.get())
        .fetch_optional(&self.pool)
        .await?;

        let post = record.map(Post::try_from).transpose()?;
        Ok(post)
    }

    async fn fetch_user_posts(&self, author: Id<UserMarker>) -> Result<Vec<Post>> {
        let records = query_as::<_, PostRecord>(
            "
            SELECT id, title, content, author_id, status, created_at, updated_at
            FROM posts
            WHERE author_id = $1
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(author.get())
        .fetch_all(&self.pool)
        .await?;

        let posts = records
            .into_iter()
            .map(Post::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(posts)
    }

    async fn create_post(&self, post: &CreatePost) -> Result<Post> {
        let record = query_as::<_, PostRecord>(
            "
            INSERT INTO posts (title, content, author_id, status)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, content, author_id, status, created_at, updated_at
            ",
        )
        .bind(post.title.get())
        .bind(post.content.get())
        .bind(post.author.get())
        .bind(post.status.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(Post::try_from(record)?)
    }

    async fn update_owned_post(
        &self,
        post_id: Id<PostMarker>,
        author: Id<UserMarker>,
        changes: &PostChanges,
    ) -> Result<Option<Post>> {
        let record = query_as::<_, PostRecord>(
            "
            UPDATE posts
            SET
                title = COALESCE($3, title),
                content = COALESCE($4, content),
                status = COALESCE($5, status),
                updated_at = now()
            WHERE id = $1 AND author_id = $2
            RETURNING id, title, content, author_id, status, created_at, updated_at
            ",
        )
        .bind(post_id.get())
        .bind(author.get())
        .bind(changes.title.as_ref().map(|title| title.get()))
        .bind(changes.content.as_ref().map(|content| content.get()))
        .bind(changes.status.map(|status| status.as_str()))
        .fetch_optional(&self.pool)
        .await?;

        let post = record.map(Post::try_from).transpose()?;
        Ok(post)
    }

    async fn delete_owned_post(
        &self,
        post_id: Id<PostMarker>,
        author: Id<UserMarker>,
    ) -> Result<bool> {
        let result = query(
            "
            DELETE FROM posts
            WHERE id = $1 AND author_id = $2
            ",
        )
        .bind(post_id.get())
        .bind(author.get())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
