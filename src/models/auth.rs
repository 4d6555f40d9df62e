use serde::{Deserialize, Serialize};

use crate::entities::users;
use crate::services::auth::IssuedToken;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl TokenResponse {
    pub fn from_issued(token: IssuedToken) -> Self {
        Self {
            access_token: token.access_token,
            token_type: "bearer".to_string(),
            expires_in: token.expires_in,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub created_at: Option<String>,
}

impl UserResponse {
    pub fn from_model(user: users::Model) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at.map(|dt| dt.to_rfc3339()),
        }
    }
}
