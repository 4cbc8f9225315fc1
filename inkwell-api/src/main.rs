use inkwell_api::{
    config::{ConfigError, Env},
    seed::seed_admin,
    server::{ServerState, router},
};
use inkwell_common::model::auth::{PasswordHasher, TokenError, TokenIssuer};
use inkwell_db::{
    client::DbClient,
    store::{DbError, Store},
};
use std::{net::SocketAddr, sync::Arc};
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Error)]
enum InitError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Error setting up the database: {0}")]
    Database(#[from] DbError),
    #[error("Error configuring token signing: {0}")]
    Token(#[from] TokenError),
    #[error("Error binding tcp listener: {0}")]
    TcpBind(std::io::Error),
    #[error("Error serving server: {0}")]
    TcpServe(std::io::Error),
}

fn install_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "inkwell_api=debug,\
                inkwell_common=debug,\
                inkwell_db=debug,\
                tower_http=debug,axum::rejection=trace,sqlx=warn"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "Could not listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "Could not listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutting down");
}

#[tokio::main]
async fn main() -> Result<(), InitError> {
    install_tracing();
    let env = Env::load()?;
    info!(?env, "Loaded configuration");

    let tokens = Arc::new(TokenIssuer::new(
        env.jwt_secret.as_bytes(),
        env.token_lifetime(),
    )?);

    let db_client = DbClient::connect(&env.connection_settings()).await?;
    db_client.migrate().await?;
    let store: Arc<dyn Store> = Arc::new(db_client);

    let hasher = Arc::new(PasswordHasher::default());

    match seed_admin(store.as_ref(), &hasher, &env.seed_settings()).await {
        Ok(outcome) => info!(?outcome, "Admin seed finished"),
        Err(err) => warn!(error = %err, "Admin seed failed"),
    }

    let app = router(ServerState::new(store, hasher, tokens));

    let server_address = SocketAddr::new(env.server_address, env.app_port);
    let listener = tokio::net::TcpListener::bind(server_address)
        .await
        .map_err(InitError::TcpBind)?;
    info!(%server_address, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(InitError::TcpServe)?;

    Ok(())
}
