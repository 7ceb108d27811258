use serde::{Deserialize, Serialize};

use super::repo_types::{NewUser, User, UserChanges};
use crate::{
    error::{AppError, FieldErrors},
    validation,
};

const MIN_PASSWORD_LEN: usize = 5;
const MAX_TEXT_LEN: usize = 255;

/// Registration and profile payload. Every field is optional on the wire so
/// missing ones can be reported per field.
#[derive(Debug, Default, Deserialize)]
pub struct UserPayload {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

impl UserPayload {
    fn check_present(&self, errors: &mut FieldErrors) {
        if let Some(email) = &self.email {
            validation::email(errors, "email", email);
        }
        if let Some(password) = &self.password {
            validation::min_len(errors, "password", password, MIN_PASSWORD_LEN);
        }
        if let Some(name) = &self.name {
            validation::text(errors, "name", name, MAX_TEXT_LEN, false);
        }
    }

    /// Registration and PUT: all three fields required.
    pub fn into_new_user(self) -> Result<NewUser, AppError> {
        let mut errors = FieldErrors::new();
        validation::required(&mut errors, "email", self.email.as_ref());
        validation::required(&mut errors, "password", self.password.as_ref());
        validation::required(&mut errors, "name", self.name.as_ref());
        self.check_present(&mut errors);
        errors.into_result()?;

        Ok(NewUser {
            email: self.email.unwrap_or_default(),
            password: self.password.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            ..NewUser::default()
        })
    }

    pub fn into_changes(self, partial: bool) -> Result<UserChanges, AppError> {
        if !partial {
            let full = self.into_new_user()?;
            return Ok(UserChanges {
                email: Some(full.email),
                password: Some(full.password),
                name: Some(full.name),
            });
        }

        let mut errors = FieldErrors::new();
        self.check_present(&mut errors);
        errors.into_result()?;
        Ok(UserChanges {
            email: self.email,
            password: self.password,
            name: self.name,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub refresh_token: String,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub email: String,
    pub name: String,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            email: u.email,
            name: u.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_reports_every_missing_field() {
        let err = UserPayload::default().into_new_user().unwrap_err();
        let AppError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        for field in ["email", "password", "name"] {
            assert_eq!(errors.get(field), Some(&[validation::REQUIRED.to_string()][..]));
        }
    }

    #[test]
    fn short_password_is_rejected() {
        let payload = UserPayload {
            email: Some("a@example.com".into()),
            password: Some("pw".into()),
            name: Some("A".into()),
        };
        assert!(matches!(
            payload.into_new_user(),
            Err(AppError::Validation(ref e)) if e.get("password").is_some()
        ));
    }

    #[test]
    fn partial_changes_keep_absent_fields_absent() {
        let payload = UserPayload {
            name: Some("New name".into()),
            ..UserPayload::default()
        };
        let changes = payload.into_changes(true).unwrap();
        assert_eq!(changes.name.as_deref(), Some("New name"));
        assert!(changes.email.is_none());
        assert!(changes.password.is_none());
    }

    #[test]
    fn public_user_never_contains_password() {
        let user = User {
            id: 1,
            email: "test@example.com".into(),
            password_hash: "$argon2id$secret".into(),
            name: "Test".into(),
            is_active: true,
            is_staff: false,
            is_superuser: false,
        };
        let json = serde_json::to_string(&PublicUser::from(user)).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(!json.contains("argon2"));
    }
}
