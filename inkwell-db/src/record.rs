use inkwell_common::model::{
    ModelValidationError,
    auth::HashedPassword,
    post::{Post, PostContent, PostTitle},
    user::{Email, User, UserCredentials, Username},
};
use sqlx::FromRow;
use time::OffsetDateTime;

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct UserRecord {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct PostRecord {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author_id: i64,
    pub status: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl TryFrom<UserRecord> for UserCredentials {
    type Error = ModelValidationError;

    fn try_from(value: UserRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            user: User {
                id: value.id.into(),
                username: Username::new(value.username)?,
                email: Email::new(value.email)?,
                role: value.role.parse()?,
                created_at: value.created_at,
                updated_at: value.updated_at,
            },
            password_hash: HashedPassword::from_stored(value.password_hash),
        })
    }
}

impl TryFrom<UserRecord> for User {
    type Error = ModelValidationError;

    fn try_from(value: UserRecord) -> Result<Self, Self::Error> {
        UserCredentials::try_from(value).map(|credentials| credentials.user)
    }
}

impl TryFrom<PostRecord> for Post {
    type Error = ModelValidationError;

    fn try_from(value: PostRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id.into(),
            title: PostTitle::new(value.title)?,
            content: PostContent::new(value.content)?,
            author_id: value.author_id.into(),
            status: value.status.parse()?,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::record::{PostRecord, UserRecord};
    use inkwell_common::model::{
        ModelValidationError,
        post::{Post, PostStatus},
        user::{Role, User, UserCredentials},
    };
    use time::macros::datetime;

    fn user_record() -> UserRecord {
        UserRecord {
            id: 4,
            username: "admin".to_owned(),
            email: "admin@example.com".to_owned(),
            password_hash: "$argon2id$v=19$m=8,t=1,p=1$c2FsdHNhbHQ$aGFzaA".to_owned(),
            role: "admin".to_owned(),
            created_at: datetime!(2025-01-01 00:00 UTC),
            updated_at: datetime!(2025-01-01 00:00 UTC),
        }
    }

    fn post_record() -> PostRecord {
        PostRecord {
            id: 9,
            title: "Title".to_owned(),
            content: "Body".to_owned(),
            author_id: 4,
            status: "published".to_owned(),
            created_at: datetime!(2025-01-01 00:00 UTC),
            updated_at: datetime!(2025-01-02 00:00 UTC),
        }
    }

    #[test]
    fn user_record_conversion() {
        let credentials = UserCredentials::try_from(user_record()).unwrap();

        assert_eq!(credentials.user.id.get(), 4);
        assert_eq!(credentials.user.role, Role::Admin);
        assert_eq!(credentials.user.email.get(), "admin@example.com");
        assert!(credentials.password_hash.get().starts_with("$argon2id$"));

        assert_eq!(User::try_from(user_record()).unwrap(), credentials.user);
    }

    #[test]
    fn user_record_with_unknown_role_is_rejected() {
        let record = UserRecord {
            role: "superuser".to_owned(),
            ..user_record()
        };

        assert!(matches!(
            User::try_from(record),
            Err(ModelValidationError::Role(_))
        ));
    }

    #[test]
    fn post_record_conversion() {
        let post = Post::try_from(post_record()).unwrap();

        assert_eq!(post.id.get(), 9);
        assert_eq!(post.author_id.get(), 4);
        assert_eq!(post.status, PostStatus::Published);
        assert_eq!(post.title.get(), "Title");
    }

    #[test]
    fn post_record_with_empty_title_is_rejected() {
        let record = PostRecord {
            title: String::new(),
            ..post_record()
        };

        assert!(matches!(
            Post::try_from(record),
            Err(ModelValidationError::PostTitle(_))
        ));
    }
}
