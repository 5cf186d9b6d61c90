use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

// `\d` would also match non-ASCII digits.
static IDN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{12}$").expect("IDN pattern is a valid regex"));

/// Returns true when `value` is exactly twelve ASCII decimal digits.
pub fn is_valid_idn(value: &str) -> bool {
    IDN_PATTERN.is_match(value)
}

/// National identification number of a customer, the natural key of the
/// customer registry.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Idn(String);

impl Idn {
    /// Validates `value` as-is. Callers that accept user input trim first.
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        if is_valid_idn(value) {
            Ok(Self(value.to_owned()))
        } else {
            Err(DomainError::InvalidIdn)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Idn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Idn {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Idn> for String {
    fn from(value: Idn) -> Self {
        value.0
    }
}
