use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::customer::CustomerId;
use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShipmentId(pub Uuid);

impl ShipmentId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Checks the identifier shape locally so malformed ids never reach storage.
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        Uuid::parse_str(value).map(Self).map_err(|_| DomainError::InvalidShipmentId)
    }
}

impl fmt::Display for ShipmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Trimmed, non-empty route text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Route(String);

impl Route {
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidRoute);
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Strictly positive monetary amount, kept as an exact decimal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    pub fn new(amount: Decimal) -> Result<Self, DomainError> {
        if amount <= Decimal::ZERO {
            return Err(DomainError::InvalidPrice);
        }
        Ok(Self(amount))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// Canonical storage text: trailing fractional zeros removed.
    pub fn to_storage_string(&self) -> String {
        self.0.normalize().to_string()
    }
}

impl FromStr for Price {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let amount = Decimal::from_str(value.trim()).map_err(|_| DomainError::InvalidPrice)?;
        Self::new(amount)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentStatus {
    Created,
}

impl ShipmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
        }
    }
}

impl fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShipmentStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "CREATED" => Ok(Self::Created),
            other => Err(format!("unknown shipment status `{other}`")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shipment {
    pub id: ShipmentId,
    pub route: Route,
    pub price: Price,
    pub status: ShipmentStatus,
    pub customer_id: CustomerId,
    pub created_at: DateTime<Utc>,
}

/// Validated values for a shipment that has not been stored yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewShipment {
    pub route: Route,
    pub price: Price,
    pub customer_id: CustomerId,
}

/// Untrusted creation request as received from a transport adapter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateShipmentInput {
    pub route: String,
    pub price: Decimal,
    pub customer_idn: String,
}
