//! Input validation for user, account and transfer requests
//!
//! Validated types keep their fields private so the only way to obtain one is
//! through its checking constructor.

use std::fmt;
use std::str::FromStr;

// ============================================================================
// Validation Errors
// ============================================================================

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ValidationError {
    #[error("Invalid length for {field}: expected {min}-{max}, got {actual}")]
    InvalidLength {
        field: &'static str,
        min: usize,
        max: usize,
        actual: usize,
    },

    #[error("Invalid format for {field}: '{value}' (expected: {expected})")]
    InvalidFormat {
        field: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("Unsupported currency: '{0}'")]
    UnsupportedCurrency(String),

    #[error("{field} out of range: expected {min}-{max}, got {actual}")]
    OutOfRange {
        field: &'static str,
        min: i64,
        max: i64,
        actual: i64,
    },
}

// ============================================================================
// Currency
// ============================================================================

/// Supported account currency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Currency {
    Usd,
    Eur,
    Cad,
}

impl Currency {
    pub const ALL: [Currency; 3] = [Currency::Usd, Currency::Eur, Currency::Cad];

    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Cad => "CAD",
        }
    }

    /// Codes are case-sensitive: `usd` is not supported
    pub fn is_supported(code: &str) -> bool {
        code.parse::<Currency>().is_ok()
    }
}

impl FromStr for Currency {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Currency::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ValidationError::UnsupportedCurrency(s.to_string()))
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Username / Email
// ============================================================================

/// Validated username: ASCII letters and digits, 3-32 characters
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    pub fn new(name: &str) -> Result<Self, ValidationError> {
        let name = name.trim();

        if name.len() < 3 || name.len() > 32 {
            return Err(ValidationError::InvalidLength {
                field: "username",
                min: 3,
                max: 32,
                actual: name.len(),
            });
        }

        if !name.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ValidationError::InvalidFormat {
                field: "username",
                value: name.to_string(),
                expected: "letters and digits only",
            });
        }

        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validated email address (`local@domain.tld`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Email(String);

impl Email {
    pub fn new(email: &str) -> Result<Self, ValidationError> {
        let email = email.trim();
        let invalid = || ValidationError::InvalidFormat {
            field: "email",
            value: email.to_string(),
            expected: "local@domain.tld",
        };

        if email.is_empty() || email.len() > 254 {
            return Err(ValidationError::InvalidLength {
                field: "email",
                min: 1,
                max: 254,
                actual: email.len(),
            });
        }

        let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
        let domain_ok = domain
            .split('.')
            .all(|label| !label.is_empty())
            && domain.contains('.');
        if local.is_empty() || domain.contains('@') || !domain_ok || email.contains(char::is_whitespace) {
            return Err(invalid());
        }

        Ok(Self(email.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

// ============================================================================
// Free-form fields
// ============================================================================

pub const MIN_PASSWORD_LEN: usize = 6;

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LEN || len > 128 {
        return Err(ValidationError::InvalidLength {
            field: "password",
            min: MIN_PASSWORD_LEN,
            max: 128,
            actual: len,
        });
    }
    Ok(())
}

pub fn validate_full_name(full_name: &str) -> Result<(), ValidationError> {
    let len = full_name.trim().chars().count();
    if len == 0 || len > 128 {
        return Err(ValidationError::InvalidLength {
            field: "full_name",
            min: 1,
            max: 128,
            actual: len,
        });
    }
    Ok(())
}

pub fn validate_account_id(id: i64) -> Result<i64, ValidationError> {
    if id < 1 {
        return Err(ValidationError::OutOfRange {
            field: "account_id",
            min: 1,
            max: i64::MAX,
            actual: id,
        });
    }
    Ok(id)
}

pub fn validate_amount(amount: i64) -> Result<i64, ValidationError> {
    if amount < 1 {
        return Err(ValidationError::OutOfRange {
            field: "amount",
            min: 1,
            max: i64::MAX,
            actual: amount,
        });
    }
    Ok(amount)
}

// ============================================================================
// Pagination
// ============================================================================

/// Validated page request: `page_id >= 1`, `page_size` in 5..=10
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    page_id: i32,
    page_size: i32,
}

impl PageParams {
    pub const MIN_PAGE_SIZE: i32 = 5;
    pub const MAX_PAGE_SIZE: i32 = 10;

    pub fn new(page_id: i32, page_size: i32) -> Result<Self, ValidationError> {
        if page_id < 1 {
            return Err(ValidationError::OutOfRange {
                field: "page_id",
                min: 1,
                max: i32::MAX as i64,
                actual: page_id as i64,
            });
        }
        if !(Self::MIN_PAGE_SIZE..=Self::MAX_PAGE_SIZE).contains(&page_size) {
            return Err(ValidationError::OutOfRange {
                field: "page_size",
                min: Self::MIN_PAGE_SIZE as i64,
                max: Self::MAX_PAGE_SIZE as i64,
                actual: page_size as i64,
            });
        }
        Ok(Self { page_id, page_size })
    }

    pub fn limit(&self) -> i64 {
        self.page_size as i64
    }

    pub fn offset(&self) -> i64 {
        (self.page_id as i64 - 1) * self.page_size as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_parse() {
        assert_eq!("USD".parse::<Currency>().unwrap(), Currency::Usd);
        assert_eq!("EUR".parse::<Currency>().unwrap(), Currency::Eur);
        assert_eq!("CAD".parse::<Currency>().unwrap(), Currency::Cad);
        assert_eq!(
            "usd".parse::<Currency>(),
            Err(ValidationError::UnsupportedCurrency("usd".to_string()))
        );
        assert!(!Currency::is_supported("JPY"));
        assert_eq!(Currency::Cad.to_string(), "CAD");
    }

    #[test]
    fn test_username_valid() {
        assert_eq!(Username::new("alice42").unwrap().as_str(), "alice42");
        assert_eq!(Username::new("  bob  ").unwrap().as_str(), "bob");
    }

    #[test]
    fn test_username_invalid() {
        assert!(matches!(
            Username::new("ab"),
            Err(ValidationError::InvalidLength { actual: 2, .. })
        ));
        assert!(matches!(
            Username::new(&"a".repeat(33)),
            Err(ValidationError::InvalidLength { actual: 33, .. })
        ));
        assert!(matches!(
            Username::new("alice_smith"),
            Err(ValidationError::InvalidFormat { field: "username", .. })
        ));
    }

    #[test]
    fn test_email() {
        assert!(Email::new("alice@example.com").is_ok());
        assert!(Email::new("a.b+c@mail.example.org").is_ok());

        for bad in ["", "alice", "@example.com", "alice@", "alice@example", "a@b@c.com", "a b@c.com", "alice@.com"] {
            assert!(Email::new(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_password_and_full_name() {
        assert!(validate_password("secret").is_ok());
        assert!(matches!(
            validate_password("12345"),
            Err(ValidationError::InvalidLength { field: "password", actual: 5, .. })
        ));
        assert!(validate_full_name("Alice Liddell").is_ok());
        assert!(validate_full_name("   ").is_err());
    }

    #[test]
    fn test_amount_and_account_id() {
        assert_eq!(validate_amount(1), Ok(1));
        assert!(validate_amount(0).is_err());
        assert!(validate_amount(-10).is_err());
        assert_eq!(validate_account_id(7), Ok(7));
        assert!(validate_account_id(0).is_err());
    }

    #[test]
    fn test_page_params() {
        let page = PageParams::new(3, 5).unwrap();
        assert_eq!(page.limit(), 5);
        assert_eq!(page.offset(), 10);

        assert!(PageParams::new(0, 5).is_err());
        assert!(PageParams::new(1, 4).is_err());
        assert!(PageParams::new(1, 11).is_err());
        assert_eq!(PageParams::new(1, 10).unwrap().offset(), 0);
    }
}
