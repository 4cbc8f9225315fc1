use crate::model::{Id, auth::HashedPassword};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Debug, Display, Formatter},
    str::FromStr,
    sync::LazyLock,
};
use thiserror::Error;
use time::OffsetDateTime;

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 50;
pub const EMAIL_MAX_LEN: usize = 100;
pub const PASSWORD_MIN_LEN: usize = 6;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("Email pattern is valid."));

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct UserMarker;

/// Public view of an account. The password hash lives in [`UserCredentials`]
/// and never leaves the server.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct User {
    pub id: Id<UserMarker>,
    pub username: Username,
    pub email: Email,
    pub role: Role,
    #[serde(skip)]
    pub created_at: OffsetDateTime,
    #[serde(skip)]
    pub updated_at: OffsetDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: HashedPassword,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct CreateUser {
    pub username: Username,
    pub email: Email,
    pub password_hash: HashedPassword,
    pub role: Role,
}

#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRoleError(String);

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(UnknownRoleError(other.to_owned())),
        }
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
#[serde(transparent)]
pub struct Username(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("username must be between 3 and 50 characters")]
pub struct InvalidUsernameError;

impl Username {
    pub fn new(username: String) -> Result<Self, InvalidUsernameError> {
        let len = username.chars().count();
        if (USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len) {
            Ok(Username(username))
        } else {
            Err(InvalidUsernameError)
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }
}

/// Compared byte for byte; no case folding or trimming is applied.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
#[serde(transparent)]
pub struct Email(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("email is invalid")]
pub struct InvalidEmailError;

impl Email {
    pub fn new(email: String) -> Result<Self, InvalidEmailError> {
        if email.chars().count() <= EMAIL_MAX_LEN && Self::is_well_formed(&email) {
            Ok(Email(email))
        } else {
            Err(InvalidEmailError)
        }
    }

    /// Shape check only. Addresses longer than [`EMAIL_MAX_LEN`] pass here but
    /// can never be stored.
    #[must_use]
    pub fn is_well_formed(email: &str) -> bool {
        EMAIL_PATTERN.is_match(email)
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }
}

/// A plaintext password that passed the registration policy.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct Password(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("password must be at least 6 characters")]
pub struct InvalidPasswordError;

impl Password {
    pub fn new(password: String) -> Result<Self, InvalidPasswordError> {
        if password.chars().count() >= PASSWORD_MIN_LEN {
            Ok(Password(password))
        } else {
            Err(InvalidPasswordError)
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }
}

impl Debug for Password {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Password").field(&"[redacted]").finish()
    }
}
