use crate::service::{
    INTERNAL_ERROR_MESSAGE, ServiceError, auth::AuthService, posts::PostService,
};
use axum::{
    Router,
    extract::{
        FromRef, Request,
        rejection::{JsonRejection, PathRejection},
    },
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use axum_extra::typed_header::TypedHeaderRejection;
use inkwell_common::model::auth::{PasswordHasher, TokenError, TokenIssuer};
use inkwell_db::store::Store;
use json::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

pub mod auth;
pub mod json;
mod routes;

pub type ServerRouter = Router<ServerState>;

#[derive(Clone, Debug, FromRef)]
pub struct ServerState {
    pub auth: AuthService,
    pub posts: PostService,
    pub tokens: Arc<TokenIssuer>,
}

impl ServerState {
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        hasher: Arc<PasswordHasher>,
        tokens: Arc<TokenIssuer>,
    ) -> Self {
        Self {
            auth: AuthService::new(store.clone(), hasher, tokens.clone()),
            posts: PostService::new(store),
            tokens,
        }
    }
}

pub fn routes() -> ServerRouter {
    routes::routes().fallback(fallback)
}

/// The complete application, ready to be served.
pub fn router(state: ServerState) -> Router {
    routes()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn fallback(request: Request) -> ServerError {
    ServerError::UnknownRoute(request.into_parts().0.uri)
}

pub type Result<T, E = ServerError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Unknown route requested: {0}")]
    UnknownRoute(Uri),
    #[error("Path rejected: {0}")]
    PathRejection(#[from] PathRejection),
    #[error("Not a valid id: {0:?}")]
    InvalidId(String),
    #[error("Incoming JSON rejected: {0}")]
    JsonRejection(#[from] JsonRejection),
    #[error("JSON response could not be serialized: {0}")]
    JsonResponse(#[from] serde_json::Error),
    #[error("Authorization header was missing or invalid: {0}")]
    InvalidAuthorizationHeader(TypedHeaderRejection),
    #[error("The provided auth token was rejected: {0}")]
    InvalidToken(#[from] TokenError),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::UnknownRoute(_) => StatusCode::NOT_FOUND,
            ServerError::PathRejection(_)
            | ServerError::InvalidId(_)
            | ServerError::JsonRejection(_) => StatusCode::BAD_REQUEST,
            ServerError::InvalidAuthorizationHeader(_) | ServerError::InvalidToken(_) => {
                StatusCode::UNAUTHORIZED
            }
            ServerError::JsonResponse(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Service(err) => err.status(),
        }
    }

    fn client_message(&self) -> String {
        match self {
            ServerError::UnknownRoute(_) => "not found".to_owned(),
            ServerError::PathRejection(_) | ServerError::InvalidId(_) => "invalid id".to_owned(),
            ServerError::JsonRejection(_) => "invalid request body".to_owned(),
            ServerError::InvalidAuthorizationHeader(rejection) if rejection.is_missing() => {
                "authorization header required".to_owned()
            }
            ServerError::InvalidAuthorizationHeader(_) => {
                "invalid authorization header format".to_owned()
            }
            ServerError::InvalidToken(_) => "invalid or expired token".to_owned(),
            ServerError::JsonResponse(_) => INTERNAL_ERROR_MESSAGE.to_owned(),
            ServerError::Service(err) => err.client_message(),
        }
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub error: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            error!(error = %self, %status, "Replying with error");
        } else {
            debug!(error = %self, %status, "Replying with error");
        }

        let error_response = ErrorResponse {
            status: status.as_u16(),
            error: self.client_message(),
        };
        (status, Json(error_response)).into_response()
    }
}
