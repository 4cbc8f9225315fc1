use crate::service::{Result, ServiceError};
use inkwell_common::model::{
    Id, ModelValidationError,
    post::{CreatePost, Post, PostChanges, PostContent, PostMarker, PostStatus, PostTitle},
    user::UserMarker,
};
use inkwell_db::store::Store;
use std::sync::Arc;
use tracing::info;

/// Raw update fields as they arrive from a client. An empty string counts as
/// absent.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct PostUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub status: Option<String>,
}

#[derive(Clone, Debug)]
pub struct PostService {
    store: Arc<dyn Store>,
}

fn provided(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}

fn parse_status(status: &str) -> Result<PostStatus> {
    Ok(status
        .parse::<PostStatus>()
        .map_err(ModelValidationError::from)?)
}

impl PostService {
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create(
        &self,
        author: Id<UserMarker>,
        title: String,
        content: String,
        status: Option<String>,
    ) -> Result<Post> {
        let title = PostTitle::new(title).map_err(ModelValidationError::from)?;
        let content = PostContent::new(content).map_err(ModelValidationError::from)?;
        let status = provided(status)
            .as_deref()
            .map(parse_status)
            .transpose()?
            .unwrap_or_default();

        let post = self
            .store
            .create_post(&CreatePost {
                author,
                title,
                content,
                status,
            })
            .await?;

        info!(post_id = %post.id, author_id = %author, "Created post");
        Ok(post)
    }

    pub async fn get(&self, post_id: Id<PostMarker>) -> Result<Post> {
        self.store
            .fetch_post(post_id)
            .await?
            .ok_or(ServiceError::PostNotFound(post_id))
    }

    pub async fn list_for_author(&self, author: Id<UserMarker>) -> Result<Vec<Post>> {
        Ok(self.store.fetch_user_posts(author).await?)
    }

    pub async fn update(
        &self,
        post_id: Id<PostMarker>,
        caller: Id<UserMarker>,
        update: PostUpdate,
    ) -> Result<Post> {
        let changes = PostChanges {
            title: provided(update.title)
                .map(PostTitle::new)
                .transpose()
                .map_err(ModelValidationError::from)?,
            content: provided(update.content)
                .map(PostContent::new)
                .transpose()
                .map_err(ModelValidationError::from)?,
            status: provided(update.status)
                .as_deref()
                .map(parse_status)
                .transpose()?,
        };

        if changes.is_empty() {
            return Err(ServiceError::NothingToUpdate);
        }

        let post = self
            .store
            .update_owned_post(post_id, caller, &changes)
            .await?
            .ok_or(ServiceError::PostNotFoundOrNotOwned(post_id))?;

        info!(%post_id, "Updated post");
        Ok(post)
    }

    pub async fn delete(&self, post_id: Id<PostMarker>, caller: Id<UserMarker>) -> Result<()> {
        if !self.store.delete_owned_post(post_id, caller).await? {
            return Err(ServiceError::PostNotFoundOrNotOwned(post_id));
        }

        info!(%post_id, "Deleted post");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::service::{
        ServiceError,
        posts::{PostService, PostUpdate},
    };
    use inkwell_common::model::{
        Id, ModelValidationError,
        auth::HashedPassword,
        post::PostStatus,
        user::{CreateUser, Email, Role, User, Username},
    };
    use inkwell_db::{memory::MemoryStore, store::Store};
    use std::sync::Arc;

    async fn setup() -> (PostService, Arc<MemoryStore>, User, User) {
        let store = Arc::new(MemoryStore::new());
        let mut users = Vec::new();
        for name in ["alice", "mallory"] {
            let user = store
                .create_user(&CreateUser {
                    username: Username::new(name.to_owned()).unwrap(),
                    email: Email::new(format!("{name}@example.com")).unwrap(),
                    password_hash: HashedPassword::from_stored("digest".to_owned()),
                    role: Role::User,
                })
                .await
                .unwrap();
            users.push(user);
        }
        let mallory = users.pop().unwrap();
        let alice = users.pop().unwrap();

        (PostService::new(store.clone()), store, alice, mallory)
    }

    #[tokio::test]
    async fn status_defaults_to_draft() {
        let (service, _, alice, _) = setup().await;

        let unset = service
            .create(alice.id, "Hello".to_owned(), "World".to_owned(), None)
            .await
            .unwrap();
        let empty = service
            .create(
                alice.id,
                "Hello".to_owned(),
                "World".to_owned(),
                Some(String::new()),
            )
            .await
            .unwrap();
        let published = service
            .create(
                alice.id,
                "Hello".to_owned(),
                "World".to_owned(),
                Some("published".to_owned()),
            )
            .await
            .unwrap();

        assert_eq!(unset.status, PostStatus::Draft);
        assert_eq!(empty.status, PostStatus::Draft);
        assert_eq!(published.status, PostStatus::Published);
        assert_eq!(published.author_id, alice.id);
    }

    #[tokio::test]
    async fn create_validates_fields() {
        let (service, store, alice, _) = setup().await;

        let empty_title = service
            .create(alice.id, String::new(), "World".to_owned(), None)
            .await;
        assert!(matches!(
            empty_title,
            Err(ServiceError::Validation(ModelValidationError::PostTitle(_)))
        ));

        let long_title = service
            .create(alice.id, "t".repeat(256), "World".to_owned(), None)
            .await;
        assert!(matches!(
            long_title,
            Err(ServiceError::Validation(ModelValidationError::PostTitle(_)))
        ));

        let empty_content = service
            .create(alice.id, "Hello".to_owned(), String::new(), None)
            .await;
        assert!(matches!(
            empty_content,
            Err(ServiceError::Validation(ModelValidationError::PostContent(_)))
        ));

        let bad_status = service
            .create(
                alice.id,
                "Hello".to_owned(),
                "World".to_owned(),
                Some("archived".to_owned()),
            )
            .await;
        assert!(matches!(
            bad_status,
            Err(ServiceError::Validation(ModelValidationError::PostStatus(_)))
        ));

        assert_eq!(store.post_writes(), 0);
    }

    #[tokio::test]
    async fn empty_update_never_reaches_the_store() {
        let (service, store, alice, _) = setup().await;
        let post = service
            .create(alice.id, "Hello".to_owned(), "World".to_owned(), None)
            .await
            .unwrap();
        let writes = store.post_writes();

        let nothing = service
            .update(post.id, alice.id, PostUpdate::default())
            .await;
        let blanks = service
            .update(
                post.id,
                alice.id,
                PostUpdate {
                    title: Some(String::new()),
                    content: Some(String::new()),
                    status: Some(String::new()),
                },
            )
            .await;

        assert!(matches!(nothing, Err(ServiceError::NothingToUpdate)));
        assert!(matches!(blanks, Err(ServiceError::NothingToUpdate)));
        assert_eq!(store.post_writes(), writes);
        assert_eq!(service.get(post.id).await.unwrap(), post);
    }

    #[tokio::test]
    async fn update_changes_only_supplied_fields() {
        let (service, _, alice, _) = setup().await;
        let post = service
            .create(alice.id, "Hello".to_owned(), "World".to_owned(), None)
            .await
            .unwrap();

        let updated = service
            .update(
                post.id,
                alice.id,
                PostUpdate {
                    status: Some("published".to_owned()),
                    ..PostUpdate::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.status, PostStatus::Published);
        assert_eq!(updated.title, post.title);
        assert_eq!(updated.content, post.content);
        assert_eq!(service.get(post.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn foreign_and_missing_posts_are_indistinguishable() {
        let (service, store, alice, mallory) = setup().await;
        let post = service
            .create(alice.id, "Hello".to_owned(), "World".to_owned(), None)
            .await
            .unwrap();
        let writes = store.post_writes();

        let retitle = || PostUpdate {
            title: Some("Mine now".to_owned()),
            ..PostUpdate::default()
        };

        let foreign = service
            .update(post.id, mallory.id, retitle())
            .await
            .unwrap_err();
        let missing = service
            .update(Id::new(9999), mallory.id, retitle())
            .await
            .unwrap_err();
        assert_eq!(foreign.status(), missing.status());
        assert_eq!(foreign.client_message(), missing.client_message());

        let foreign = service.delete(post.id, mallory.id).await.unwrap_err();
        let missing = service.delete(Id::new(9999), mallory.id).await.unwrap_err();
        assert!(matches!(foreign, ServiceError::PostNotFoundOrNotOwned(_)));
        assert_eq!(foreign.client_message(), missing.client_message());

        assert_eq!(store.post_writes(), writes);
        assert_eq!(service.get(post.id).await.unwrap(), post);
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let (service, _, alice, _) = setup().await;
        let post = service
            .create(alice.id, "Hello".to_owned(), "World".to_owned(), None)
            .await
            .unwrap();

        service.delete(post.id, alice.id).await.unwrap();

        assert!(matches!(
            service.get(post.id).await,
            Err(ServiceError::PostNotFound(_))
        ));
        assert!(matches!(
            service.delete(post.id, alice.id).await,
            Err(ServiceError::PostNotFoundOrNotOwned(_))
        ));
    }

    #[tokio::test]
    async fn author_listing_holds_only_own_posts() {
        let (service, _, alice, mallory) = setup().await;
        let first = service
            .create(alice.id, "First".to_owned(), "1".to_owned(), None)
            .await
            .unwrap();
        service
            .create(mallory.id, "Theirs".to_owned(), "x".to_owned(), None)
            .await
            .unwrap();
        let second = service
            .create(alice.id, "Second".to_owned(), "2".to_owned(), None)
            .await
            .unwrap();

        assert_eq!(
            service.list_for_author(alice.id).await.unwrap(),
            vec![second, first]
        );
    }
}
