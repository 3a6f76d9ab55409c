//! Username type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, InvalidInputError};

const MAX_LEN: usize = 255;

/// A validated account name identifying the viewer of a search.
///
/// Usernames are typically email addresses. They must be non-empty, contain
/// no whitespace or `/`, and fit in 255 bytes.
///
/// # Example
///
/// ```
/// use reposift_core::Username;
///
/// let user = Username::new("alice@example.com").unwrap();
/// assert_eq!(user.as_str(), "alice@example.com");
/// assert!(Username::new("").is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Create a new username, validating the format.
    pub fn new(s: impl Into<String>) -> Result<Self, Error> {
        let s = s.into();
        Self::validate(&s)?;
        Ok(Self(s))
    }

    /// Returns the username string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(s: &str) -> Result<(), Error> {
        let reason = if s.is_empty() {
            Some("must not be empty")
        } else if s.len() > MAX_LEN {
            Some("must be at most 255 bytes")
        } else if s.chars().any(char::is_whitespace) {
            Some("must not contain whitespace")
        } else if s.contains('/') {
            Some("must not contain '/'")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(InvalidInputError::Username {
                value: s.to_string(),
                reason: reason.to_string(),
            }
            .into()),
            None => Ok(()),
        }
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Username {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Username {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Username> for String {
    fn from(user: Username) -> Self {
        user.0
    }
}
