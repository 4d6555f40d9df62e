//! Registration, login and stateless JWT session handling.
//!
//! Passwords are stored as Argon2 PHC strings; tokens are HS256 JWTs
//! carrying the user id and email. Nothing here touches request state:
//! callers pass the decoded claims in explicitly.

use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::entities::users;
use crate::store::{NewUser, StoreError, UserStore};

#[derive(Debug)]
pub enum AuthError {
    /// Unknown email, wrong password, or a token for a deleted user
    InvalidCredentials,
    EmailTaken(String),
    InvalidToken(String),
    Hashing(String),
    Database(String),
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "Invalid credentials"),
            AuthError::EmailTaken(email) => write!(f, "Email {} is already registered", email),
            AuthError::InvalidToken(msg) => write!(f, "Invalid token: {}", msg),
            AuthError::Hashing(msg) => write!(f, "Password hashing error: {}", msg),
            AuthError::Database(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        AuthError::Database(err.to_string())
    }
}

/// JWT payload. `exp` and `iat` are unix seconds; `sub` is the user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// A freshly signed token plus its lifetime, before DTO shaping.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    pub expires_in: i64,
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    secret: String,
    token_ttl_secs: i64,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, secret: String, token_ttl_secs: i64) -> Self {
        Self {
            users,
            secret,
            token_ttl_secs,
        }
    }

    pub async fn register(
        &self,
        name: String,
        email: String,
        password: String,
    ) -> Result<users::Model, AuthError> {
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailTaken(email));
        }

        let password_hash = hash_password(&password)?;
        let user = self
            .users
            .insert_user(NewUser {
                name,
                email,
                password_hash,
            })
            .await?;

        Ok(user)
    }

    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(users::Model, IssuedToken), AuthError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(&user.password_hash, password)? {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.issue_token(&user)?;
        Ok((user, token))
    }

    pub fn issue_token(&self, user: &users::Model) -> Result<IssuedToken, AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            iat: now,
            exp: now + self.token_ttl_secs,
        };

        let access_token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        Ok(IssuedToken {
            access_token,
            expires_in: self.token_ttl_secs,
        })
    }

    /// Checks signature and expiry, returning the embedded claims.
    pub fn decode_token(&self, token: &str) -> Result<Claims, AuthError> {
        let data = jsonwebtoken::decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        Ok(data.claims)
    }

    /// Resolves claims back to a live user row. A valid token whose user
    /// has since disappeared is treated as bad credentials.
    pub async fn current_user(&self, claims: &Claims) -> Result<users::Model, AuthError> {
        self.users
            .find_user(claims.sub)
            .await?
            .ok_or(AuthError::InvalidCredentials)
    }
}

fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Hashing(e.to_string()))?;

    Ok(hash.to_string())
}

fn verify_password(stored: &str, provided: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(stored).map_err(|e| AuthError::Hashing(e.to_string()))?;

    match Argon2::default().verify_password(provided.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::Hashing(e.to_string())),
    }
}
