pub mod customer;
pub mod idn;
pub mod shipment;
