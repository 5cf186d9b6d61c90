use async_trait::async_trait;
use thiserror::Error;

use parcel_core::domain::customer::Customer;
use parcel_core::domain::idn::Idn;
use parcel_core::domain::shipment::{NewShipment, Shipment, ShipmentId};

pub mod customer;
pub mod memory;
pub mod shipment;

pub use customer::SqlCustomerRepository;
pub use memory::{InMemoryCustomerRepository, InMemoryShipmentRepository};
pub use shipment::SqlShipmentRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// Inserts a customer for `idn` or returns the one already stored. A single
    /// conditional write; concurrent calls for the same new IDN observe one row.
    async fn upsert_by_idn(&self, idn: &Idn) -> Result<Customer, RepositoryError>;

    async fn find_by_idn(&self, idn: &Idn) -> Result<Option<Customer>, RepositoryError>;
}

#[async_trait]
pub trait ShipmentRepository: Send + Sync {
    async fn create(&self, shipment: NewShipment) -> Result<Shipment, RepositoryError>;

    async fn find_by_id(&self, id: &ShipmentId) -> Result<Option<Shipment>, RepositoryError>;
}

pub(crate) fn decode_err(error: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Decode(error.to_string())
}
