use crate::{
    config::SeedSettings,
    service::{Result, ServiceError},
};
use inkwell_common::model::{
    ModelValidationError,
    auth::PasswordHasher,
    user::{CreateUser, Email, Password, Role, Username},
};
use inkwell_db::store::Store;
use tracing::{info, warn};

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub enum SeedOutcome {
    Disabled,
    RefusedInProduction,
    AlreadyPresent,
    Created,
}

/// Makes sure the configured admin account exists. Safe to call on every
/// startup.
pub async fn seed_admin(
    store: &dyn Store,
    hasher: &PasswordHasher,
    settings: &SeedSettings,
) -> Result<SeedOutcome> {
    if !settings.enabled {
        return Ok(SeedOutcome::Disabled);
    }
    if settings.production {
        warn!("Refusing to seed an admin account in production");
        return Ok(SeedOutcome::RefusedInProduction);
    }

    let email = Email::new(settings.email.clone()).map_err(ModelValidationError::from)?;
    if store.fetch_credentials_by_email(&email).await?.is_some() {
        info!(email = %email.get(), "Admin account already present");
        return Ok(SeedOutcome::AlreadyPresent);
    }

    let username =
        Username::new(settings.username.clone()).map_err(ModelValidationError::from)?;
    let password =
        Password::new(settings.password.clone()).map_err(ModelValidationError::from)?;
    let password_hash = hasher.hash(&password)?;

    match store
        .create_user(&CreateUser {
            username,
            email,
            password_hash,
            role: Role::Admin,
        })
        .await
    {
        Ok(admin) => {
            info!(user_id = %admin.id, "Seeded admin account");
            Ok(SeedOutcome::Created)
        }
        // Another instance got there first.
        Err(err) => match ServiceError::from(err) {
            ServiceError::EmailTaken => Ok(SeedOutcome::AlreadyPresent),
            other => Err(other),
        },
    }
}
