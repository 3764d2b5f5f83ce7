use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo_types::User;
use crate::validation::{self, ValidationError};

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Registration input that passed every field rule.
#[derive(Debug)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(self) -> Result<NewAccount, ValidationError> {
        let email = validation::email(self.email.as_deref())?;
        validation::password(self.password.as_deref())?;
        let name = match self.name.as_deref() {
            Some(n) => validation::name(n)?,
            None => return Err(ValidationError::new("Name is required")),
        };
        Ok(NewAccount {
            name,
            email,
            password: self.password.unwrap_or_default(),
        })
    }
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Request body for a profile update; every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    /// `(current, new)`
    pub password: Option<(String, String)>,
}

impl UpdateProfileRequest {
    pub fn validate(self) -> Result<ProfileChanges, ValidationError> {
        let email = match self.email.as_deref() {
            Some(e) => Some(validation::email(Some(e))?),
            None => None,
        };
        let password = match (self.current_password, self.new_password) {
            (_, None) => None,
            (None, Some(_)) => {
                return Err(ValidationError::new(
                    "currentPassword is required to set a new password",
                ))
            }
            (Some(current), Some(new)) => {
                validation::password(Some(&new))?;
                Some((current, new))
            }
        };
        let name = match self.name.as_deref() {
            Some(n) => Some(validation::name(n)?),
            None => None,
        };
        Ok(ProfileChanges {
            name,
            email,
            password,
        })
    }
}

/// Public part of the user returned with auth responses.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
        }
    }
}

/// Response returned after register or login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: &'static str,
    pub user: PublicUser,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub message: &'static str,
    pub user: PublicUser,
}
