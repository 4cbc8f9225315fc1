use crate::{
    server::{
        Result, ServerError, ServerRouter,
        auth::AuthenticatedUser,
        json::{Created, Json},
    },
    service::posts::{PostService, PostUpdate},
};
use axum::extract::State;
use axum_extra::routing::{RouterExt, TypedPath};
use inkwell_common::model::{
    Id,
    post::{Post, PostMarker},
};
use serde::{Deserialize, Serialize};

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_post(create_post)
        .typed_get(get_post)
        .typed_put(update_post)
        .typed_delete(delete_post)
}

#[derive(TypedPath)]
#[typed_path("/api/posts")]
struct PostsPath;

// The id stays raw until the handler runs, so protected routes reject a
// missing token before they look at the id.
#[derive(TypedPath, Deserialize)]
#[typed_path("/api/posts/{id}", rejection(ServerError))]
struct PostPath {
    id: String,
}

impl PostPath {
    fn post_id(&self) -> Result<Id<PostMarker>> {
        self.id
            .parse::<i64>()
            .map(Id::new)
            .map_err(|_| ServerError::InvalidId(self.id.clone()))
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
struct PostResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
    post: Post,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash, Serialize)]
struct MessageResponse {
    message: &'static str,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Default, Deserialize)]
#[serde(default)]
struct CreatePostRequest {
    title: String,
    content: String,
    status: Option<String>,
}

async fn create_post(
    _: PostsPath,
    State(posts): State<PostService>,
    caller: AuthenticatedUser,
    Json(request): Json<CreatePostRequest>,
) -> Result<Created<PostResponse>> {
    let post = posts
        .create(
            caller.user_id(),
            request.title,
            request.content,
            request.status,
        )
        .await?;

    Ok(Created(PostResponse {
        message: Some("post created successfully"),
        post,
    }))
}

async fn get_post(
    path: PostPath,
    State(posts): State<PostService>,
) -> Result<Json<PostResponse>> {
    let post = posts.get(path.post_id()?).await?;

    Ok(Json(PostResponse {
        message: None,
        post,
    }))
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Default, Deserialize)]
#[serde(default)]
struct UpdatePostRequest {
    title: Option<String>,
    content: Option<String>,
    status: Option<String>,
}

impl From<UpdatePostRequest> for PostUpdate {
    fn from(request: UpdatePostRequest) -> Self {
        PostUpdate {
            title: request.title,
            content: request.content,
            status: request.status,
        }
    }
}

async fn update_post(
    path: PostPath,
    State(posts): State<PostService>,
    caller: AuthenticatedUser,
    Json(request): Json<UpdatePostRequest>,
) -> Result<Json<PostResponse>> {
    let post = posts
        .update(path.post_id()?, caller.user_id(), request.into())
        .await?;

    Ok(Json(PostResponse {
        message: Some("post updated successfully"),
        post,
    }))
}

async fn delete_post(
    path: PostPath,
    State(posts): State<PostService>,
    caller: AuthenticatedUser,
) -> Result<Json<MessageResponse>> {
    posts.delete(path.post_id()?, caller.user_id()).await?;

    Ok(Json(MessageResponse {
        message: "post deleted successfully",
    }))
}
