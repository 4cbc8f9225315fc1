pub mod auth;
pub mod post;
pub mod user;

use crate::model::{
    post::{InvalidPostContentError, InvalidPostTitleError, UnknownPostStatusError},
    user::{InvalidEmailError, InvalidPasswordError, InvalidUsernameError, UnknownRoleError},
};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, marker::PhantomData};
use thiserror::Error;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Error)]
pub enum ModelValidationError {
    #[error(transparent)]
    Username(#[from] InvalidUsernameError),
    #[error(transparent)]
    Email(#[from] InvalidEmailError),
    #[error(transparent)]
    Password(#[from] InvalidPasswordError),
    #[error(transparent)]
    Role(#[from] UnknownRoleError),
    #[error(transparent)]
    PostTitle(#[from] InvalidPostTitleError),
    #[error(transparent)]
    PostContent(#[from] InvalidPostContentError),
    #[error(transparent)]
    PostStatus(#[from] UnknownPostStatusError),
}

/// Store-assigned row id, tagged with the kind of record it points at.
#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Id<Marker>(i64, #[serde(skip)] PhantomData<Marker>);

impl<Marker> Id<Marker> {
    #[must_use]
    pub fn new(id: i64) -> Self {
        Self(id, PhantomData)
    }

    #[must_use]
    pub fn get(self) -> i64 {
        self.0
    }
}

impl<Marker> Display for Id<Marker> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<Marker> From<i64> for Id<Marker> {
    fn from(value: i64) -> Self {
        Id::new(value)
    }
}

impl<Marker> From<Id<Marker>> for i64 {
    fn from(value: Id<Marker>) -> Self {
        value.get()
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{Id, post::PostMarker};

    #[test]
    fn id_is_a_plain_number_on_the_wire() {
        let id = Id::<PostMarker>::new(42);

        assert_eq!(serde_json::to_string(&id).unwrap(), "42");
        assert_eq!(serde_json::from_str::<Id<PostMarker>>("42").unwrap(), id);
        assert!(serde_json::from_str::<Id<PostMarker>>("\"abc\"").is_err());
    }
}
