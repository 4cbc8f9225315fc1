use crate::model::{
    Id,
    user::{Password, Role, UserMarker},
};
use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher as _, PasswordVerifier as _, Version,
    password_hash::SaltString,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};
use thiserror::Error;
use time::{Duration, OffsetDateTime};

pub const PASSWORD_SALT_LEN: usize = 16;
pub const TOKEN_ALGORITHM: jsonwebtoken::Algorithm = jsonwebtoken::Algorithm::HS256;
pub const MAX_TOKEN_LIFETIME: Duration = Duration::days(366);

const ABSENT_USER_SALT: [u8; PASSWORD_SALT_LEN] = [0x5a; PASSWORD_SALT_LEN];

#[derive(Clone, Eq, PartialEq, Debug, Error)]
#[error("Hashing password failed: {0}")]
pub struct PasswordHashError(argon2::password_hash::Error);

/// PHC-formatted Argon2 digest as stored in the database.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct HashedPassword(String);

impl HashedPassword {
    /// Wraps a digest loaded from storage. The string is not parsed here;
    /// [`PasswordHasher::verify`] treats an unparseable digest as a mismatch.
    #[must_use]
    pub fn from_stored(digest: String) -> Self {
        Self(digest)
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }
}

impl Debug for HashedPassword {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("HashedPassword").field(&"[redacted]").finish()
    }
}

#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    #[must_use]
    pub fn new(params: Params) -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }

    pub fn hash(&self, password: &Password) -> Result<HashedPassword, PasswordHashError> {
        let salt_bytes: [u8; PASSWORD_SALT_LEN] = rand::random();
        let salt = SaltString::encode_b64(&salt_bytes).map_err(PasswordHashError)?;

        let hash = self
            .argon2
            .hash_password(password.get().as_bytes(), &salt)
            .map_err(PasswordHashError)?;

        Ok(HashedPassword(hash.to_string()))
    }

    /// Does the work of a [`verify`](Self::verify) against a digest produced by
    /// this hasher, for callers that have no stored digest to check. Always a
    /// mismatch.
    #[must_use]
    pub fn verify_absent(&self, password: &str) -> bool {
        let mut output = [0u8; Params::DEFAULT_OUTPUT_LEN];
        let _ = self
            .argon2
            .hash_password_into(password.as_bytes(), &ABSENT_USER_SALT, &mut output);
        false
    }

    /// Cost parameters are taken from `hashed`, so digests created with other
    /// parameters still verify.
    #[must_use]
    pub fn verify(&self, hashed: &HashedPassword, password: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hashed.get()) else {
            return false;
        };

        self.argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(Params::default())
    }
}

impl Debug for PasswordHasher {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("algorithm", &Algorithm::Argon2id)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("The token signing secret is empty")]
    EmptySecret,
    #[error("The token lifetime is not positive: {0}")]
    NonPositiveLifetime(Duration),
    #[error("The token lifetime is longer than a year: {0}")]
    LifetimeTooLong(Duration),
    #[error("The token expiry is out of range")]
    ExpiryOutOfRange,
    #[error("Encoding the token failed: {0}")]
    Encode(jsonwebtoken::errors::Error),
    #[error("The token is invalid: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
    #[error("The token subject is not a user id")]
    InvalidSubject,
}

/// The verified contents of a token.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct Identity {
    pub user_id: Id<UserMarker>,
    pub role: Role,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize, Deserialize)]
struct Claims {
    sub: String,
    role: Role,
    iat: i64,
    exp: i64,
}

/// Issues and verifies HS256 JWTs. The secret is fixed for the lifetime of the
/// issuer; tokens signed with any other secret fail verification.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    lifetime: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &[u8], lifetime: Duration) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::EmptySecret);
        }
        if !lifetime.is_positive() {
            return Err(TokenError::NonPositiveLifetime(lifetime));
        }
        if lifetime > MAX_TOKEN_LIFETIME {
            return Err(TokenError::LifetimeTooLong(lifetime));
        }

        let mut validation = Validation::new(TOKEN_ALGORITHM);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            lifetime,
        })
    }

    #[must_use]
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    pub fn issue(&self, identity: Identity) -> Result<String, TokenError> {
        self.issue_at(identity, OffsetDateTime::now_utc())
    }

    pub fn issue_at(
        &self,
        identity: Identity,
        issued_at: OffsetDateTime,
    ) -> Result<String, TokenError> {
        let expires_at = issued_at
            .checked_add(self.lifetime)
            .ok_or(TokenError::ExpiryOutOfRange)?;
        let claims = Claims {
            sub: identity.user_id.to_string(),
            role: identity.role,
            iat: issued_at.unix_timestamp(),
            exp: expires_at.unix_timestamp(),
        };

        jsonwebtoken::encode(&Header::new(TOKEN_ALGORITHM), &claims, &self.encoding_key)
            .map_err(TokenError::Encode)
    }

    pub fn verify(&self, token: &str) -> Result<Identity, TokenError> {
        let claims =
            jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)?.claims;

        let user_id = claims
            .sub
            .parse::<i64>()
            .map_err(|_| TokenError::InvalidSubject)?;

        Ok(Identity {
            user_id: Id::new(user_id),
            role: claims.role,
        })
    }
}

impl Debug for TokenIssuer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("secret", &"[redacted]")
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{
        Id,
        auth::{
            HashedPassword, Identity, MAX_TOKEN_LIFETIME, PasswordHasher, TokenError, TokenIssuer,
        },
        user::{Password, Role},
    };
    use argon2::Params;
    use time::{Duration, OffsetDateTime, macros::datetime};

    fn cheap_hasher() -> PasswordHasher {
        PasswordHasher::new(Params::new(Params::MIN_M_COST, 1, 1, None).unwrap())
    }

    fn issuer(secret: &str) -> TokenIssuer {
        TokenIssuer::new(secret.as_bytes(), Duration::hours(1)).unwrap()
    }

    fn identity() -> Identity {
        Identity {
            user_id: Id::new(17),
            role: Role::Admin,
        }
    }

    #[test]
    fn hashed_password_verifies_and_differs_from_plaintext() {
        let hasher = cheap_hasher();
        let password = Password::new("correct horse".to_owned()).unwrap();

        let hashed = hasher.hash(&password).unwrap();

        assert_ne!(hashed.get(), password.get());
        assert!(hashed.get().starts_with("$argon2id$"));
        assert!(hasher.verify(&hashed, "correct horse"));
        assert!(!hasher.verify(&hashed, "correct horsE"));
        assert!(!hasher.verify(&hashed, ""));
    }

    #[test]
    fn hashing_is_salted() {
        let hasher = cheap_hasher();
        let password = Password::new("same-password".to_owned()).unwrap();

        let first = hasher.hash(&password).unwrap();
        let second = hasher.hash(&password).unwrap();

        assert_ne!(first, second);
        assert!(hasher.verify(&first, password.get()));
        assert!(hasher.verify(&second, password.get()));
    }

    #[test]
    fn verification_uses_parameters_from_the_digest() {
        let hashed = cheap_hasher()
            .hash(&Password::new("secret-pass".to_owned()).unwrap())
            .unwrap();

        assert!(PasswordHasher::default().verify(&hashed, "secret-pass"));
    }

    #[test]
    fn absent_digest_never_verifies() {
        let hasher = cheap_hasher();

        assert!(!hasher.verify_absent("correct horse"));
        assert!(!hasher.verify_absent(""));
    }

    #[test]
    fn garbage_digest_is_a_mismatch() {
        let hasher = cheap_hasher();
        let garbage = HashedPassword::from_stored("not-a-phc-string".to_owned());

        assert!(!hasher.verify(&garbage, "anything"));
        assert!(!format!("{garbage:?}").contains("not-a-phc-string"));
    }

    #[test]
    fn token_round_trip() {
        let issuer = issuer("top-secret");

        let token = issuer.issue(identity()).unwrap();

        assert_eq!(issuer.verify(&token).unwrap(), identity());
    }

    #[test]
    fn expired_token_is_rejected() {
        let issuer = issuer("top-secret");
        let long_ago = OffsetDateTime::now_utc() - Duration::hours(2);

        let token = issuer.issue_at(identity(), long_ago).unwrap();

        assert!(matches!(issuer.verify(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn tampered_token_is_rejected() {
        let issuer = issuer("top-secret");
        let token = issuer.issue(identity()).unwrap();

        let mut parts: Vec<String> = token.split('.').map(str::to_owned).collect();
        assert_eq!(parts.len(), 3);

        // Swap in a payload claiming a different user, keeping the old signature.
        let other = issuer
            .issue(Identity {
                user_id: Id::new(18),
                role: Role::Admin,
            })
            .unwrap();
        parts[1] = other.split('.').nth(1).unwrap().to_owned();
        let forged = parts.join(".");

        assert!(issuer.verify(&forged).is_err());

        let unsigned = format!("{}.{}.", parts[0], parts[1]);
        assert!(issuer.verify(&unsigned).is_err());
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let token = issuer("first-secret").issue(identity()).unwrap();

        assert!(issuer("second-secret").verify(&token).is_err());
    }

    #[test]
    fn malformed_token_is_rejected() {
        let issuer = issuer("top-secret");

        for token in ["", "abc", "a.b.c", "Bearer x.y.z"] {
            assert!(issuer.verify(token).is_err(), "{token}");
        }
    }

    #[test]
    fn issuer_rejects_bad_configuration() {
        assert!(matches!(
            TokenIssuer::new(b"", Duration::hours(1)),
            Err(TokenError::EmptySecret)
        ));
        assert!(matches!(
            TokenIssuer::new(b"secret", Duration::ZERO),
            Err(TokenError::NonPositiveLifetime(_))
        ));
        assert!(matches!(
            TokenIssuer::new(b"secret", Duration::hours(2_000_000_000)),
            Err(TokenError::LifetimeTooLong(_))
        ));
        assert!(TokenIssuer::new(b"secret", MAX_TOKEN_LIFETIME).is_ok());
        assert!(!format!("{:?}", issuer("top-secret")).contains("top-secret"));
    }

    #[test]
    fn expiry_past_the_calendar_is_an_error() {
        let issuer = TokenIssuer::new(b"secret", MAX_TOKEN_LIFETIME).unwrap();

        let issued = issuer.issue_at(identity(), datetime!(9999-12-01 00:00 UTC));

        assert!(matches!(issued, Err(TokenError::ExpiryOutOfRange)));
    }
}
