use crate::service::{Result, ServiceError};
use inkwell_common::model::{
    ModelValidationError,
    auth::{Identity, PasswordHasher, TokenIssuer},
    user::{CreateUser, Email, InvalidEmailError, Password, Role, User, Username},
};
use inkwell_db::store::Store;
use serde::Serialize;
use std::{
    fmt::{Debug, Formatter},
    sync::Arc,
};
use tracing::{debug, info};

/// A freshly issued token together with the account it belongs to.
#[derive(Clone, Eq, PartialEq, Hash, Serialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

impl Debug for Session {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"[redacted]")
            .field("user", &self.user)
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct AuthService {
    store: Arc<dyn Store>,
    hasher: Arc<PasswordHasher>,
    tokens: Arc<TokenIssuer>,
}

impl AuthService {
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        hasher: Arc<PasswordHasher>,
        tokens: Arc<TokenIssuer>,
    ) -> Self {
        Self {
            store,
            hasher,
            tokens,
        }
    }

    pub async fn register(
        &self,
        username: String,
        email: String,
        password: String,
    ) -> Result<User> {
        let username = Username::new(username).map_err(ModelValidationError::from)?;
        let email = Email::new(email).map_err(ModelValidationError::from)?;
        let password = Password::new(password).map_err(ModelValidationError::from)?;

        if self.store.fetch_credentials_by_email(&email).await?.is_some() {
            return Err(ServiceError::EmailTaken);
        }

        let password_hash = self.hasher.hash(&password)?;
        // A concurrent registration can still win the race; the store reports
        // that as a taken email too.
        let user = self
            .store
            .create_user(&CreateUser {
                username,
                email,
                password_hash,
                role: Role::User,
            })
            .await?;

        info!(user_id = %user.id, "Registered user");
        Ok(user)
    }

    pub async fn login(&self, email: String, password: String) -> Result<Session> {
        if !Email::is_well_formed(&email) {
            return Err(ModelValidationError::from(InvalidEmailError).into());
        }
        if password.is_empty() {
            return Err(ServiceError::MissingPassword);
        }

        // An address too long to store cannot belong to anybody.
        let credentials = match Email::new(email) {
            Ok(email) => self.store.fetch_credentials_by_email(&email).await?,
            Err(_) => None,
        };
        let Some(credentials) = credentials else {
            debug!("Login for unknown email");
            // Same hashing work as a wrong password.
            let _ = self.hasher.verify_absent(&password);
            return Err(ServiceError::InvalidCredentials);
        };

        if !self.hasher.verify(&credentials.password_hash, &password) {
            debug!(user_id = %credentials.user.id, "Login with wrong password");
            return Err(ServiceError::InvalidCredentials);
        }

        let token = self.tokens.issue(Identity {
            user_id: credentials.user.id,
            role: credentials.user.role,
        })?;

        info!(user_id = %credentials.user.id, "User logged in");
        Ok(Session {
            token,
            user: credentials.user,
        })
    }

    pub async fn me(&self, identity: Identity) -> Result<User> {
        self.store
            .fetch_user(identity.user_id)
            .await?
            .ok_or(ServiceError::UnknownCaller(identity.user_id))
    }
}
