use serde::{Deserialize, Serialize};

use super::repo_types::UserPublic;
use crate::error::AppError;
use crate::validation::{normalize_email, validate_email, validate_full_name, validate_password};

fn default_true() -> bool {
    true
}

/// Body for creating a user as a superuser.
#[derive(Debug, Clone, Deserialize)]
pub struct UserCreate {
    pub email: String,
    pub password: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_superuser: bool,
    pub full_name: Option<String>,
}

/// Body for open sign-up.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRegister {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

/// Partial update applied by a superuser. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub password: Option<String>,
    pub is_active: Option<bool>,
    pub is_superuser: Option<bool>,
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdateMe {
    pub full_name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePassword {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct UsersPublic {
    pub data: Vec<UserPublic>,
    pub count: i64,
}

// Each `validate` normalizes the email in place before checking it.

impl UserCreate {
    pub fn validate(&mut self) -> Result<(), AppError> {
        self.email = normalize_email(&self.email);
        validate_email(&self.email)?;
        validate_password("password", &self.password)?;
        validate_full_name(self.full_name.as_deref())
    }
}

impl UserRegister {
    pub fn validate(&mut self) -> Result<(), AppError> {
        self.email = normalize_email(&self.email);
        validate_email(&self.email)?;
        validate_password("password", &self.password)?;
        validate_full_name(self.full_name.as_deref())
    }
}

impl From<UserRegister> for UserCreate {
    fn from(r: UserRegister) -> Self {
        Self {
            email: r.email,
            password: r.password,
            is_active: true,
            is_superuser: false,
            full_name: r.full_name,
        }
    }
}

impl UserUpdate {
    pub fn validate(&mut self) -> Result<(), AppError> {
        if let Some(email) = self.email.as_mut() {
            *email = normalize_email(email);
            validate_email(email)?;
        }
        if let Some(password) = self.password.as_deref() {
            validate_password("password", password)?;
        }
        validate_full_name(self.full_name.as_deref())
    }
}

impl UserUpdateMe {
    pub fn validate(&mut self) -> Result<(), AppError> {
        if let Some(email) = self.email.as_mut() {
            *email = normalize_email(email);
            validate_email(email)?;
        }
        validate_full_name(self.full_name.as_deref())
    }
}

impl From<UserUpdateMe> for UserUpdate {
    fn from(u: UserUpdateMe) -> Self {
        Self {
            email: u.email,
            full_name: u.full_name,
            ..Default::default()
        }
    }
}

impl UpdatePassword {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_password("current_password", &self.current_password)?;
        validate_password("new_password", &self.new_password)
    }
}
