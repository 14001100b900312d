//! Session auth: argon2 password hashing plus JWT bearer tokens.

use crate::{entities::user, errors::ServiceError, AppState};
use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

/// JWT claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub name: String,
    pub email: String,
    pub exp: usize,
}

/// Signup form input.
#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct SignupInput {
    #[validate(length(min = 1, max = 200))]
    pub full_name: String,
    #[validate(length(min = 3, max = 150))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6, max = 15))]
    pub mobile_number: String,
    #[validate(length(min = 8))]
    pub password: String,
    #[validate(must_match = "password")]
    pub confirm_password: String,
}

/// Login form input.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

/// Account service: signup, login, and token validation.
#[derive(Clone)]
pub struct AuthService {
    db: Arc<DatabaseConnection>,
    jwt_secret: String,
    jwt_expiration_secs: usize,
}

impl AuthService {
    pub fn new(db: Arc<DatabaseConnection>, jwt_secret: String, jwt_expiration_secs: usize) -> Self {
        Self {
            db,
            jwt_secret,
            jwt_expiration_secs,
        }
    }

    /// Registers a new account and returns the user plus a session token.
    #[instrument(skip(self, input))]
    pub async fn signup(&self, input: SignupInput) -> Result<(user::Model, String), ServiceError> {
        input.validate()?;

        let username_taken = user::Entity::find()
            .filter(user::Column::Username.eq(input.username.clone()))
            .one(&*self.db)
            .await?
            .is_some();
        if username_taken {
            return Err(ServiceError::Conflict("Username already exists".to_string()));
        }

        let email_taken = user::Entity::find()
            .filter(user::Column::Email.eq(input.email.clone()))
            .one(&*self.db)
            .await?
            .is_some();
        if email_taken {
            return Err(ServiceError::Conflict("Email already exists".to_string()));
        }

        let now = Utc::now();
        let model = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(input.username),
            email: Set(input.email),
            password_hash: Set(hash_password(&input.password)?),
            full_name: Set(input.full_name),
            mobile_number: Set(Some(input.mobile_number)),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = model.insert(&*self.db).await?;
        let token = self.issue_token(&created)?;

        info!(user_id = %created.id, "registered new user");
        Ok((created, token))
    }

    /// Verifies credentials and returns the user plus a session token.
    #[instrument(skip(self, input))]
    pub async fn login(&self, input: LoginInput) -> Result<(user::Model, String), ServiceError> {
        let found = user::Entity::find()
            .filter(user::Column::Username.eq(input.username.clone()))
            .one(&*self.db)
            .await?;

        // Invalid username and invalid password produce the same error.
        let Some(account) = found else {
            return Err(ServiceError::AuthError(
                "Invalid username or password".to_string(),
            ));
        };

        if !verify_password(&input.password, &account.password_hash)? {
            return Err(ServiceError::AuthError(
                "Invalid username or password".to_string(),
            ));
        }

        let token = self.issue_token(&account)?;
        Ok((account, token))
    }

    /// Loads the full user row behind a set of validated claims.
    pub async fn fetch_user(&self, user_id: Uuid) -> Result<user::Model, ServiceError> {
        user::Entity::find_by_id(user_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::Unauthorized("Unknown user".to_string()))
    }

    fn issue_token(&self, account: &user::Model) -> Result<String, ServiceError> {
        let claims = Claims {
            sub: account.id,
            name: account.full_name.clone(),
            email: account.email.clone(),
            exp: (Utc::now().timestamp() as usize) + self.jwt_expiration_secs,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| ServiceError::JwtError(e.to_string()))
    }

    /// Decodes and validates a bearer token.
    pub fn validate_token(&self, token: &str) -> Result<Claims, ServiceError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| ServiceError::JwtError(e.to_string()))
    }
}

fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::HashError(e.to_string()))
}

fn verify_password(password: &str, hash: &str) -> Result<bool, ServiceError> {
    let parsed = PasswordHash::new(hash).map_err(|e| ServiceError::HashError(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Authenticated caller, extracted from the `Authorization: Bearer` header.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ServiceError::Unauthorized("Missing Authorization header".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ServiceError::Unauthorized("Invalid Authorization header".to_string()))?
            .trim();

        let claims = state.services.auth.validate_token(token)?;

        Ok(CurrentUser {
            id: claims.sub,
            name: claims.name,
            email: claims.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("kanjivaram#9").expect("hashing should succeed");
        assert!(verify_password("kanjivaram#9", &hash).unwrap());
        assert!(!verify_password("wrong-password", &hash).unwrap());
    }

    #[test]
    fn signup_input_requires_matching_passwords() {
        let input = SignupInput {
            full_name: "Meera Devi".into(),
            username: "meera".into(),
            email: "meera@example.com".into(),
            mobile_number: "9876543210".into(),
            password: "longenough".into(),
            confirm_password: "different1".into(),
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn token_round_trip_preserves_claims() {
        let secret = "unit_test_secret_that_is_long_enough_123".to_string();
        let claims = Claims {
            sub: Uuid::new_v4(),
            name: "Meera Devi".into(),
            email: "meera@example.com".into(),
            exp: (Utc::now().timestamp() as usize) + 600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap();

        let decoded = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )
        .unwrap()
        .claims;

        assert_eq!(decoded.sub, claims.sub);
        assert_eq!(decoded.email, claims.email);
    }
}
