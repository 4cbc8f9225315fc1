use axum::http::StatusCode;
use inkwell_common::model::{
    Id, ModelValidationError,
    auth::{PasswordHashError, TokenError},
    post::PostMarker,
    user::UserMarker,
};
use inkwell_db::store::DbError;
use thiserror::Error;

pub mod auth;
pub mod posts;

pub type Result<T, E = ServiceError> = std::result::Result<T, E>;

pub const INTERNAL_ERROR_MESSAGE: &str = "internal server error";

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ModelValidationError),
    #[error("password is required")]
    MissingPassword,
    #[error("no fields to update")]
    NothingToUpdate,
    #[error("email already registered")]
    EmailTaken,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("user {0} no longer exists")]
    UnknownCaller(Id<UserMarker>),
    #[error("post {0} not found")]
    PostNotFound(Id<PostMarker>),
    #[error("post {0} not found or not owned by the caller")]
    PostNotFoundOrNotOwned(Id<PostMarker>),
    #[error(transparent)]
    PasswordHash(#[from] PasswordHashError),
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error(transparent)]
    Database(DbError),
}

impl From<DbError> for ServiceError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::EmailTaken => ServiceError::EmailTaken,
            other => ServiceError::Database(other),
        }
    }
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_)
            | ServiceError::MissingPassword
            | ServiceError::NothingToUpdate => StatusCode::BAD_REQUEST,
            ServiceError::EmailTaken => StatusCode::CONFLICT,
            ServiceError::InvalidCredentials | ServiceError::UnknownCaller(_) => {
                StatusCode::UNAUTHORIZED
            }
            ServiceError::PostNotFound(_) | ServiceError::PostNotFoundOrNotOwned(_) => {
                StatusCode::NOT_FOUND
            }
            ServiceError::PasswordHash(_)
            | ServiceError::Token(_)
            | ServiceError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The text sent to clients. Ids and internal causes stay in the logs.
    pub fn client_message(&self) -> String {
        match self {
            ServiceError::Validation(err) => err.to_string(),
            ServiceError::MissingPassword
            | ServiceError::NothingToUpdate
            | ServiceError::EmailTaken
            | ServiceError::InvalidCredentials => self.to_string(),
            ServiceError::UnknownCaller(_) => "unauthorized".to_owned(),
            ServiceError::PostNotFound(_) => "post not found".to_owned(),
            ServiceError::PostNotFoundOrNotOwned(_) => "post not found or unauthorized".to_owned(),
            ServiceError::PasswordHash(_) | ServiceError::Token(_) | ServiceError::Database(_) => {
                INTERNAL_ERROR_MESSAGE.to_owned()
            }
        }
    }
}
