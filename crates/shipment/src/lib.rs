pub mod bootstrap;
pub mod customer_client;
pub mod health;
pub mod http;
pub mod workflow;

pub use customer_client::{CustomerGateway, RpcCustomerClient};
pub use workflow::ShipmentWorkflow;
