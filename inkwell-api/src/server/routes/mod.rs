use crate::server::ServerRouter;

mod auth;
mod health;
mod me;
mod posts;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(me::routes())
        .merge(posts::routes())
}
