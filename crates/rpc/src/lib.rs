//! Remote-call contract of the customer registry.
//!
//! Failures cross the process boundary as an [`RpcStatus`] tag plus a short
//! message; callers branch on the tag, never on the text.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tarpc::client;
use tarpc::serde_transport::tcp;
use tarpc::tokio_serde::formats::Bincode;
use thiserror::Error;
use uuid::Uuid;

use parcel_core::domain::customer::{Customer, CustomerId};
use parcel_core::domain::idn::Idn;
use parcel_core::errors::{ApplicationError, ErrorClass, INTERNAL_ERROR_MESSAGE};

/// Service exposed by the customer registry.
#[tarpc::service]
pub trait CustomerService {
    /// Returns the customer for the IDN, creating it on first use.
    async fn upsert_customer(request: CustomerRequest) -> RpcResult<CustomerReply>;

    /// Returns the customer for the IDN or a `NotFound` failure.
    async fn get_customer(request: CustomerRequest) -> RpcResult<CustomerReply>;
}

pub type RpcResult<T> = Result<T, RpcFailure>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRequest {
    pub idn: String,
    /// Propagated so both services tag their log events with the same id.
    pub correlation_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerReply {
    pub id: Uuid,
    pub idn: String,
    pub created_at: DateTime<Utc>,
}

impl From<Customer> for CustomerReply {
    fn from(customer: Customer) -> Self {
        Self { id: customer.id.0, idn: customer.idn.into(), created_at: customer.created_at }
    }
}

impl TryFrom<CustomerReply> for Customer {
    type Error = parcel_core::errors::DomainError;

    fn try_from(reply: CustomerReply) -> Result<Self, Self::Error> {
        Ok(Self {
            id: CustomerId(reply.id),
            idn: Idn::parse(&reply.idn)?,
            created_at: reply.created_at,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RpcStatus {
    InvalidArgument,
    NotFound,
    Internal,
}

#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("{status:?}: {message}")]
pub struct RpcFailure {
    pub status: RpcStatus,
    pub message: String,
}

impl RpcFailure {
    pub fn new(status: RpcStatus, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }
}

impl From<&ApplicationError> for RpcFailure {
    fn from(error: &ApplicationError) -> Self {
        match error.class() {
            ErrorClass::InvalidInput => Self::new(RpcStatus::InvalidArgument, error.to_string()),
            ErrorClass::NotFound => Self::new(RpcStatus::NotFound, error.to_string()),
            ErrorClass::UpstreamUnavailable
            | ErrorClass::UpstreamRejected
            | ErrorClass::Internal => Self::new(RpcStatus::Internal, INTERNAL_ERROR_MESSAGE),
        }
    }
}

/// Opens a TCP connection to the customer registry and spawns the client
/// dispatch task on the current tokio runtime.
pub async fn connect(address: &str) -> std::io::Result<CustomerServiceClient> {
    let transport = tcp::connect(address, Bincode::default).await?;
    Ok(CustomerServiceClient::new(client::Config::default(), transport).spawn())
}
