use crate::model::{Id, user::UserMarker};
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};
use thiserror::Error;
use time::OffsetDateTime;

pub const POST_TITLE_MAX_LEN: usize = 255;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct PostMarker;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct Post {
    pub id: Id<PostMarker>,
    pub title: PostTitle,
    pub content: PostContent,
    pub author_id: Id<UserMarker>,
    pub status: PostStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct CreatePost {
    pub author: Id<UserMarker>,
    pub title: PostTitle,
    pub content: PostContent,
    pub status: PostStatus,
}

/// Sparse set of replacement values for an existing post. `None` keeps the
/// stored value.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct PostChanges {
    pub title: Option<PostTitle>,
    pub content: Option<PostContent>,
    pub status: Option<PostStatus>,
}

impl PostChanges {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.status.is_none()
    }
}

#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("status must be one of: draft, published")]
pub struct UnknownPostStatusError(String);

impl PostStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
        }
    }
}

impl Display for PostStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = UnknownPostStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(PostStatus::Draft),
            "published" => Ok(PostStatus::Published),
            other => Err(UnknownPostStatusError(other.to_owned())),
        }
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
#[serde(transparent)]
pub struct PostTitle(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("title must be between 1 and 255 characters")]
pub struct InvalidPostTitleError;

impl PostTitle {
    pub fn new(title: String) -> Result<Self, InvalidPostTitleError> {
        if !title.is_empty() && title.chars().count() <= POST_TITLE_MAX_LEN {
            Ok(PostTitle(title))
        } else {
            Err(InvalidPostTitleError)
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
#[serde(transparent)]
pub struct PostContent(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("content must not be empty")]
pub struct InvalidPostContentError;

impl PostContent {
    pub fn new(content: String) -> Result<Self, InvalidPostContentError> {
        if content.is_empty() {
            Err(InvalidPostContentError)
        } else {
            Ok(PostContent(content))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{
        Id,
        post::{Post, PostChanges, PostContent, PostStatus, PostTitle},
    };
    use time::macros::datetime;

    #[test]
    fn title_length_bounds() {
        assert!(PostTitle::new(String::new()).is_err());
        assert!(PostTitle::new("x".to_owned()).is_ok());
        assert!(PostTitle::new("x".repeat(255)).is_ok());
        assert!(PostTitle::new("x".repeat(256)).is_err());
    }

    #[test]
    fn content_must_not_be_empty() {
        assert!(PostContent::new(String::new()).is_err());
        assert!(PostContent::new(" ".to_owned()).is_ok());
    }

    #[test]
    fn status_parsing() {
        assert_eq!("draft".parse::<PostStatus>().unwrap(), PostStatus::Draft);
        assert_eq!(
            "published".parse::<PostStatus>().unwrap(),
            PostStatus::Published
        );
        assert!("Published".parse::<PostStatus>().is_err());
        assert!("archived".parse::<PostStatus>().is_err());
        assert_eq!(PostStatus::default(), PostStatus::Draft);
    }

    #[test]
    fn empty_changes() {
        assert!(PostChanges::default().is_empty());

        let changes = PostChanges {
            status: Some(PostStatus::Published),
            ..PostChanges::default()
        };
        assert!(!changes.is_empty());
    }

    #[test]
    fn post_view_serialization() {
        let post = Post {
            id: Id::new(7),
            title: PostTitle::new("Hello".to_owned()).unwrap(),
            content: PostContent::new("World".to_owned()).unwrap(),
            author_id: Id::new(3),
            status: PostStatus::Published,
            created_at: datetime!(2025-03-01 12:00 UTC),
            updated_at: datetime!(2025-03-02 08:30 UTC),
        };

        let json = serde_json::to_value(&post).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 7,
                "title": "Hello",
                "content": "World",
                "author_id": 3,
                "status": "published",
                "created_at": "2025-03-01T12:00:00Z",
                "updated_at": "2025-03-02T08:30:00Z",
            })
        );
    }
}
