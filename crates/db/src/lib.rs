pub mod connection;
pub mod migrations;
pub mod repositories;

pub use connection::{
    connect, connect_with_config, connect_with_retry, connect_with_settings, DbPool,
};
pub use repositories::{
    CustomerRepository, InMemoryCustomerRepository, InMemoryShipmentRepository, RepositoryError,
    ShipmentRepository, SqlCustomerRepository, SqlShipmentRepository,
};
