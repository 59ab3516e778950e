use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::validation::validate_password;

/// OAuth2 password-flow form. `username` carries the email.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Response returned after login.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".into(),
        }
    }
}

/// Request body for resetting a password with an emailed token.
#[derive(Debug, Deserialize)]
pub struct NewPassword {
    pub token: String,
    pub new_password: String,
}

impl NewPassword {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_password("new_password", &self.new_password)
    }
}
