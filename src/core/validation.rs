//! Input validation for account names, passwords and task names
//!
//! The messages are returned to API clients verbatim, so their wording is
//! part of the public contract.

/// Minimum account name length
pub const MIN_NAME_LENGTH: usize = 8;

/// Maximum account name length
pub const MAX_NAME_LENGTH: usize = 30;

/// Minimum password length in bytes
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Characters that satisfy the password special-character rule
pub const PASSWORD_SPECIAL_CHARACTERS: &str = "!@#$&*^()_-+\\";

/// Validation error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Name is not 8-30 ASCII letters and digits
    InvalidName,
    /// Another account already uses the name
    NameTaken,
    /// Password shorter than the minimum
    PasswordTooShort,
    PasswordNoLowercase,
    PasswordNoUppercase,
    PasswordNoDigit,
    PasswordNoSpecial,
    /// Task name empty after trimming
    EmptyTaskName,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::InvalidName => {
                write!(f, "name must consist of 8-30 latin letters and digits")
            }
            ValidationError::NameTaken => write!(f, "user with specified name already exists"),
            ValidationError::PasswordTooShort => {
                write!(f, "password must be at least 8 characters")
            }
            ValidationError::PasswordNoLowercase => {
                write!(f, "password must contain latin lowercase letters")
            }
            ValidationError::PasswordNoUppercase => {
                write!(f, "password must contain latin uppercase letters")
            }
            ValidationError::PasswordNoDigit => write!(f, "password must contain digits"),
            ValidationError::PasswordNoSpecial => write!(
                f,
                "password must contain special characters: {}",
                PASSWORD_SPECIAL_CHARACTERS
            ),
            ValidationError::EmptyTaskName => write!(f, "empty name specified"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Check the account name format (uniqueness is checked against the store)
pub fn validate_account_name(name: &str) -> Result<(), ValidationError> {
    let length_ok = (MIN_NAME_LENGTH..=MAX_NAME_LENGTH).contains(&name.len());
    if length_ok && name.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(())
    } else {
        Err(ValidationError::InvalidName)
    }
}

/// Check the password policy, reporting the first rule that fails
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooShort);
    }

    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password
        .chars()
        .any(|c| PASSWORD_SPECIAL_CHARACTERS.contains(c));

    if !has_lower {
        return Err(ValidationError::PasswordNoLowercase);
    }
    if !has_upper {
        return Err(ValidationError::PasswordNoUppercase);
    }
    if !has_digit {
        return Err(ValidationError::PasswordNoDigit);
    }
    if !has_special {
        return Err(ValidationError::PasswordNoSpecial);
    }

    Ok(())
}

/// Trim a task name; empty names are rejected
pub fn normalize_task_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        Err(ValidationError::EmptyTaskName)
    } else {
        Ok(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // Account Name Tests
    // ========================================================================

    #[test]
    fn test_valid_account_names() {
        assert!(validate_account_name("alice1234").is_ok());
        assert!(validate_account_name("ABCDEFGH").is_ok());
        assert!(validate_account_name("12345678").is_ok());
        assert!(validate_account_name(&"a".repeat(30)).is_ok());
    }

    #[test]
    fn test_invalid_account_names() {
        for name in ["", "alice12", "alice_1234", "alice 1234", "алиса12345", "bob-smith"] {
            assert_eq!(
                validate_account_name(name),
                Err(ValidationError::InvalidName),
                "expected {name:?} to be rejected"
            );
        }
        assert!(validate_account_name(&"a".repeat(31)).is_err());
    }

    // ========================================================================
    // Password Tests
    // ========================================================================

    #[test]
    fn test_valid_password() {
        assert!(validate_password("Abcdef1!").is_ok());
        assert!(validate_password("xY9\\xxxx").is_ok());
    }

    #[test]
    fn test_password_rules_in_order() {
        assert_eq!(
            validate_password("Ab1!"),
            Err(ValidationError::PasswordTooShort)
        );
        assert_eq!(
            validate_password("ABCDEF1!"),
            Err(ValidationError::PasswordNoLowercase)
        );
        assert_eq!(
            validate_password("abcdef1!"),
            Err(ValidationError::PasswordNoUppercase)
        );
        assert_eq!(
            validate_password("Abcdefg!"),
            Err(ValidationError::PasswordNoDigit)
        );
        assert_eq!(
            validate_password("Abcdefg1"),
            Err(ValidationError::PasswordNoSpecial)
        );
    }

    #[test]
    fn test_password_special_outside_set() {
        assert_eq!(
            validate_password("Abcdef1%"),
            Err(ValidationError::PasswordNoSpecial)
        );
    }

    // ========================================================================
    // Task Name Tests
    // ========================================================================

    #[test]
    fn test_normalize_task_name() {
        assert_eq!(normalize_task_name("  buy milk \n").unwrap(), "buy milk");
        assert_eq!(
            normalize_task_name("   "),
            Err(ValidationError::EmptyTaskName)
        );
    }

    // ========================================================================
    // Message Tests
    // ========================================================================

    #[test]
    fn test_messages() {
        assert_eq!(
            ValidationError::InvalidName.to_string(),
            "name must consist of 8-30 latin letters and digits"
        );
        assert_eq!(
            ValidationError::NameTaken.to_string(),
            "user with specified name already exists"
        );
        assert_eq!(
            ValidationError::PasswordNoSpecial.to_string(),
            "password must contain special characters: !@#$&*^()_-+\\"
        );
        assert_eq!(
            ValidationError::EmptyTaskName.to_string(),
            "empty name specified"
        );
    }
}
