use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

pub const MIN_PASSWORD_CHARS: usize = 6;

static EMAIL_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9._%+\-]+@[a-z0-9.\-]+\.[a-z]{2,4}$").ok());

/// Signup body. Absent fields deserialize as empty and are reported by `validate`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SignupRequest {
    pub email: String,
    pub firstname: String,
    pub lastname: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl SignupRequest {
    /// Every problem is collected, in field order.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.email.is_empty() {
            errors.push("email is required".to_string());
        } else if !is_valid_email(&self.email) {
            errors.push("invalid email format".to_string());
        }

        if self.firstname.is_empty() {
            errors.push("first name is required".to_string());
        }
        if self.lastname.is_empty() {
            errors.push("last name is required".to_string());
        }

        if self.password.is_empty() {
            errors.push("password is required".to_string());
        } else if self.password.chars().count() < MIN_PASSWORD_CHARS {
            errors.push(format!(
                "password needs to be at least {} characters",
                MIN_PASSWORD_CHARS
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.as_ref().is_some_and(|re| re.is_match(email))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> SignupRequest {
        SignupRequest {
            email: "test@example.com".to_string(),
            firstname: "Mister".to_string(),
            lastname: "Test".to_string(),
            password: "secret1".to_string(),
        }
    }

    #[test]
    fn complete_request_passes() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn empty_request_reports_every_field() {
        let errors = SignupRequest::default().validate().unwrap_err();
        assert_eq!(
            errors,
            vec![
                "email is required",
                "first name is required",
                "last name is required",
                "password is required",
            ]
        );
    }

    #[test]
    fn five_char_password_is_rejected() {
        let req = SignupRequest { password: "12345".to_string(), ..valid() };
        assert_eq!(
            req.validate().unwrap_err(),
            vec!["password needs to be at least 6 characters"]
        );
    }

    #[test]
    fn email_format_is_checked() {
        for bad in ["no-at-sign", "UPPER@EXAMPLE.COM", "a@b", "a@b.toolongtld"] {
            let req = SignupRequest { email: bad.to_string(), ..valid() };
            assert_eq!(req.validate().unwrap_err(), vec!["invalid email format"], "{bad}");
        }
    }

    #[test]
    fn missing_json_fields_default_to_empty() {
        let req: SignupRequest = serde_json::from_str(r#"{"email":"test@example.com"}"#).unwrap();
        assert_eq!(req.validate().unwrap_err().len(), 3);
    }
}
