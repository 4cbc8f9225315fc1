use crate::{
    server::{
        Result, ServerRouter,
        json::{Created, Json},
    },
    service::auth::{AuthService, Session},
};
use axum::extract::State;
use axum_extra::routing::{RouterExt, TypedPath};
use inkwell_common::model::user::User;
use serde::{Deserialize, Serialize};

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_post(register)
        .typed_post(login)
}

#[derive(TypedPath)]
#[typed_path("/auth/register")]
struct RegisterPath;

// Missing fields deserialize as empty and fail validation with a specific
// message instead of a generic body rejection.
#[derive(Clone, Eq, PartialEq, Hash, Default, Deserialize)]
#[serde(default)]
struct RegisterRequest {
    username: String,
    email: String,
    password: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
struct RegisterResponse {
    message: &'static str,
    user: User,
}

async fn register(
    _: RegisterPath,
    State(auth): State<AuthService>,
    Json(request): Json<RegisterRequest>,
) -> Result<Created<RegisterResponse>> {
    let user = auth
        .register(request.username, request.email, request.password)
        .await?;

    Ok(Created(RegisterResponse {
        message: "user registered successfully",
        user,
    }))
}

#[derive(TypedPath)]
#[typed_path("/auth/login")]
struct LoginPath;

#[derive(Clone, Eq, PartialEq, Hash, Default, Deserialize)]
#[serde(default)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Clone, Eq, PartialEq, Hash, Serialize)]
struct LoginResponse {
    message: &'static str,
    #[serde(flatten)]
    session: Session,
}

async fn login(
    _: LoginPath,
    State(auth): State<AuthService>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let session = auth.login(request.email, request.password).await?;

    Ok(Json(LoginResponse {
        message: "login successful",
        session,
    }))
}
