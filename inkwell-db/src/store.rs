use async_trait::async_trait;
use inkwell_common::model::{
    Id, ModelValidationError,
    post::{CreatePost, Post, PostChanges, PostMarker},
    user::{CreateUser, Email, User, UserCredentials, UserMarker},
};
use std::fmt::Debug;
use thiserror::Error;

pub type Result<T, E = DbError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("An object in the database was invalid: {0}")]
    Data(#[from] ModelValidationError),
    #[error("A user with this email already exists")]
    EmailTaken,
    #[error("Running migrations failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Persistence for users and posts.
///
/// Post mutations take the caller's id alongside the post id and only touch a
/// row matching both, in a single operation. Callers cannot tell a missing post
/// from one owned by somebody else.
#[async_trait]
pub trait Store: Debug + Send + Sync {
    async fn fetch_user(&self, user_id: Id<UserMarker>) -> Result<Option<User>>;

    async fn fetch_credentials_by_email(&self, email: &Email) -> Result<Option<UserCredentials>>;

    /// Fails with [`DbError::EmailTaken`] if the email is already registered.
    async fn create_user(&self, user: &CreateUser) -> Result<User>;

    async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Option<Post>>;

    /// Newest first.
    async fn fetch_user_posts(&self, author: Id<UserMarker>) -> Result<Vec<Post>>;

    async fn create_post(&self, post: &CreatePost) -> Result<Post>;

    /// Returns `None` if no post with `post_id` is owned by `author`.
    async fn update_owned_post(
        &self,
        post_id: Id<PostMarker>,
        author: Id<UserMarker>,
        changes: &PostChanges,
    ) -> Result<Option<Post>>;

    /// Returns `false` if no post with `post_id` is owned by `author`.
    async fn delete_owned_post(
        &self,
        post_id: Id<PostMarker>,
        author: Id<UserMarker>,
    ) -> Result<bool>;
}
