//! In-process [`Store`] for tests. Every operation runs under one lock, so the
//! ownership predicate is as atomic here as it is in Postgres.

use crate::store::{DbError, Result, Store};
use async_trait::async_trait;
use inkwell_common::model::{
    Id,
    post::{CreatePost, Post, PostChanges, PostMarker},
    user::{CreateUser, Email, User, UserCredentials, UserMarker},
};
use std::{
    collections::BTreeMap,
    sync::atomic::{AtomicUsize, Ordering},
};
use time::OffsetDateTime;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    post_writes: AtomicUsize,
}

#[derive(Debug, Default)]
struct MemoryState {
    users: BTreeMap<i64, UserCredentials>,
    posts: BTreeMap<i64, Post>,
    last_user_id: i64,
    last_post_id: i64,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of post rows created, updated or deleted so far.
    #[must_use]
    pub fn post_writes(&self) -> usize {
        self.post_writes.load(Ordering::SeqCst)
    }

    pub async fn user_count(&self) -> usize {
        self.state.lock().await.users.len()
    }

    fn record_post_write(&self) {
        self.post_writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn fetch_user(&self, user_id: Id<UserMarker>) -> Result<Option<User>> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .get(&user_id.get())
            .map(|credentials| credentials.user.clone()))
    }

    async fn fetch_credentials_by_email(&self, email: &Email) -> Result<Option<UserCredentials>> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .find(|credentials| credentials.user.email == *email)
            .cloned())
    }

    async fn create_user(&self, user: &CreateUser) -> Result<User> {
        let mut state = self.state.lock().await;
        if state
            .users
            .values()
            .any(|credentials| credentials.user.email == user.email)
        {
            return Err(DbError::EmailTaken);
        }

        state.last_user_id += 1;
        let now = OffsetDateTime::now_utc();
        let created = User {
            id: Id::new(state.last_user_id),
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(
            created.id.get(),
            UserCredentials {
                user: created.clone(),
                password_hash: user.password_hash.clone(),
            },
        );

        Ok(created)
    }

    async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Option<Post>> {
        let state = self.state.lock().await;
        Ok(state.posts.get(&post_id.get()).cloned())
    }

    async fn fetch_user_posts(&self, author: Id<UserMarker>) -> Result<Vec<Post>> {
        let state = self.state.lock().await;
        // Ids only grow, so reverse id order is newest first.
        Ok(state
            .posts
            .values()
            .rev()
            .filter(|post| post.author_id == author)
            .cloned()
            .collect())
    }

    async fn create_post(&self, post: &CreatePost) -> Result<Post> {
        let mut state = self.state.lock().await;
        if !state.users.contains_key(&post.author.get()) {
            return Err(DbError::Sqlx(sqlx::Error::RowNotFound));
        }

        state.last_post_id += 1;
        let now = OffsetDateTime::now_utc();
        let created = Post {
            id: Id::new(state.last_post_id),
            title: post.title.clone(),
            content: post.content.clone(),
            author_id: post.author,
            status: post.status,
            created_at: now,
            updated_at: now,
        };
        state.posts.insert(created.id.get(), created.clone());
        self.record_post_write();

        Ok(created)
    }

    async fn update_owned_post(
        &self,
        post_id: Id<PostMarker>,
        author: Id<UserMarker>,
        changes: &PostChanges,
    ) -> Result<Option<Post>> {
        let mut state = self.state.lock().await;
        let Some(post) = state
            .posts
            .get_mut(&post_id.get())
            .filter(|post| post.author_id == author)
        else {
            return Ok(None);
        };

        if let Some(title) = &changes.title {
            post.title = title.clone();
        }
        if let Some(content) = &changes.content {
            post.content = content.clone();
        }
        if let Some(status) = changes.status {
            post.status = status;
        }
        post.updated_at = OffsetDateTime::now_utc();
        let updated = post.clone();
        self.record_post_write();

        Ok(Some(updated))
    }

    async fn delete_owned_post(
        &self,
        post_id: Id<PostMarker>,
        author: Id<UserMarker>,
    ) -> Result<bool> {
        let mut state = self.state.lock().await;
        let owned = state
            .posts
            .get(&post_id.get())
            .is_some_and(|post| post.author_id == author);
        if !owned {
            return Ok(false);
        }

        state.posts.remove(&post_id.get());
        self.record_post_write();
        Ok(true)
    }
}
