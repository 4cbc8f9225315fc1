use crate::server::ServerError;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use inkwell_common::model::{
    Id,
    auth::{Identity, TokenIssuer},
    user::UserMarker,
};
use std::sync::Arc;

type AuthorizationHeader = TypedHeader<Authorization<Bearer>>;

/// The caller of a protected route, as proven by their bearer token. Taking
/// this as a handler argument is what makes a route protected: the handler
/// never runs without a valid token.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct AuthenticatedUser {
    identity: Identity,
}

impl AuthenticatedUser {
    #[must_use]
    pub fn user_id(self) -> Id<UserMarker> {
        self.identity.user_id
    }

    #[must_use]
    pub fn identity(self) -> Identity {
        self.identity
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<TokenIssuer>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header = AuthorizationHeader::from_request_parts(parts, state)
            .await
            .map_err(ServerError::InvalidAuthorizationHeader)?;

        let identity = Arc::<TokenIssuer>::from_ref(state).verify(header.token())?;

        Ok(Self { identity })
    }
}
