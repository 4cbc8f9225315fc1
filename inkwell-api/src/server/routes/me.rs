use crate::{
    server::{Result, ServerRouter, auth::AuthenticatedUser, json::Json},
    service::{auth::AuthService, posts::PostService},
};
use axum::extract::State;
use axum_extra::routing::{RouterExt, TypedPath};
use inkwell_common::model::{post::Post, user::User};
use serde::Serialize;

pub fn routes() -> ServerRouter {
    ServerRouter::new().typed_get(me).typed_get(my_posts)
}

#[derive(TypedPath)]
#[typed_path("/api/me")]
struct MePath;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
struct MeResponse {
    user: User,
}

async fn me(
    _: MePath,
    State(auth): State<AuthService>,
    caller: AuthenticatedUser,
) -> Result<Json<MeResponse>> {
    let user = auth.me(caller.identity()).await?;

    Ok(Json(MeResponse { user }))
}

#[derive(TypedPath)]
#[typed_path("/api/me/posts")]
struct MyPostsPath;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
struct MyPostsResponse {
    posts: Vec<Post>,
}

async fn my_posts(
    _: MyPostsPath,
    State(posts): State<PostService>,
    caller: AuthenticatedUser,
) -> Result<Json<MyPostsResponse>> {
    let posts = posts.list_for_author(caller.user_id()).await?;

    Ok(Json(MyPostsResponse { posts }))
}
