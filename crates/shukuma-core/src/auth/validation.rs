//! Login and registration form checks, run before any request is sent.

use thiserror::Error;

pub const MIN_USERNAME_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please fill in all fields")]
    MissingFields,

    #[error("Username must be at least 3 characters long")]
    UsernameTooShort,

    #[error("Password must be at least 8 characters long")]
    PasswordTooShort,

    #[error("Passwords do not match")]
    PasswordMismatch,
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.username.is_empty() || self.password.is_empty() {
            return Err(ValidationError::MissingFields);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegistrationForm {
    /// Rules are checked in order; the first failure is returned.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.username.is_empty()
            || self.email.is_empty()
            || self.password.is_empty()
            || self.confirm_password.is_empty()
        {
            return Err(ValidationError::MissingFields);
        }
        // Lengths count characters, not bytes
        if self.username.chars().count() < MIN_USERNAME_LEN {
            return Err(ValidationError::UsernameTooShort);
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::PasswordTooShort);
        }
        if self.password != self.confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(username: &str, email: &str, password: &str, confirm: &str) -> RegistrationForm {
        RegistrationForm {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            confirm_password: confirm.to_string(),
        }
    }

    #[test]
    fn test_login_form_requires_both_fields() {
        assert_eq!(LoginForm::new("", "pw").validate(), Err(ValidationError::MissingFields));
        assert_eq!(LoginForm::new("alex", "").validate(), Err(ValidationError::MissingFields));
        assert_eq!(LoginForm::new("alex", "pw").validate(), Ok(()));
    }

    #[test]
    fn test_registration_rules() {
        assert_eq!(
            form("alex", "", "password1", "password1").validate(),
            Err(ValidationError::MissingFields)
        );
        assert_eq!(
            form("al", "a@b.c", "password1", "password1").validate(),
            Err(ValidationError::UsernameTooShort)
        );
        assert_eq!(
            form("alex", "a@b.c", "short", "short").validate(),
            Err(ValidationError::PasswordTooShort)
        );
        assert_eq!(
            form("alex", "a@b.c", "password1", "password2").validate(),
            Err(ValidationError::PasswordMismatch)
        );
        assert_eq!(form("alex", "a@b.c", "password1", "password1").validate(), Ok(()));
    }

    #[test]
    fn test_registration_first_failure_wins() {
        // Short username and short, mismatched password: username is reported
        assert_eq!(
            form("al", "a@b.c", "pw", "other").validate(),
            Err(ValidationError::UsernameTooShort)
        );
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ValidationError::UsernameTooShort.to_string(),
            "Username must be at least 3 characters long"
        );
        assert_eq!(
            ValidationError::PasswordTooShort.to_string(),
            "Password must be at least 8 characters long"
        );
    }
}
