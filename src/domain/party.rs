//! Party kinds

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::DomainError;

/// Whether a party buys from or sells to the shop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PartyType {
    Customer,
    Supplier,
}

impl PartyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartyType::Customer => "CUSTOMER",
            PartyType::Supplier => "SUPPLIER",
        }
    }
}

impl fmt::Display for PartyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PartyType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CUSTOMER" => Ok(PartyType::Customer),
            "SUPPLIER" => Ok(PartyType::Supplier),
            other => Err(DomainError::BusinessRuleViolation(format!(
                "party type must be CUSTOMER or SUPPLIER, got '{}'",
                other
            ))),
        }
    }
}
