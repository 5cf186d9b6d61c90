pub mod config;
pub mod context;
pub mod domain;
pub mod errors;
pub mod runtime;

pub use context::{DeadlineExceeded, RequestContext};
pub use domain::customer::{Customer, CustomerId};
pub use domain::idn::{is_valid_idn, Idn};
pub use domain::shipment::{
    CreateShipmentInput, NewShipment, Price, Route, Shipment, ShipmentId, ShipmentStatus,
};
pub use errors::{ApplicationError, DomainError, ErrorClass, InterfaceError};
