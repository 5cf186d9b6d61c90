//! Outbound access to the customer registry.
//!
//! A call that completes with a rejection is `UpstreamRejected`; a call that
//! cannot complete at all (refused connection, broken channel, deadline) is
//! `UpstreamUnavailable`. Nothing here retries.

use std::time::Duration;

use async_trait::async_trait;
use tarpc::client::RpcError;
use tokio::sync::Mutex;
use tracing::warn;

use parcel_core::domain::customer::Customer;
use parcel_core::domain::idn::Idn;
use parcel_core::{ApplicationError, RequestContext};
use parcel_rpc::{CustomerReply, CustomerRequest, CustomerServiceClient, RpcFailure, RpcStatus};

#[async_trait]
pub trait CustomerGateway: Send + Sync {
    /// Resolves `idn` to a stored customer, creating it if needed.
    async fn upsert_by_idn(
        &self,
        context: &RequestContext,
        idn: &Idn,
    ) -> Result<Customer, ApplicationError>;
}

#[derive(Clone, Copy, Debug)]
enum Operation {
    Upsert,
    Get,
}

impl Operation {
    fn name(self) -> &'static str {
        match self {
            Self::Upsert => "upsert_customer",
            Self::Get => "get_customer",
        }
    }
}

/// tarpc client that connects on first use and again after any transport
/// failure, so the shipment service can start before the registry is up.
pub struct RpcCustomerClient {
    address: String,
    timeout: Duration,
    client: Mutex<Option<CustomerServiceClient>>,
}

impl RpcCustomerClient {
    pub fn new(address: impl Into<String>, timeout: Duration) -> Self {
        Self { address: address.into(), timeout, client: Mutex::new(None) }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Looks a customer up without creating it. An unknown IDN is `Ok(None)`.
    pub async fn get_by_idn(
        &self,
        context: &RequestContext,
        idn: &Idn,
    ) -> Result<Option<Customer>, ApplicationError> {
        match self.call(context, Operation::Get, idn).await? {
            Ok(reply) => decode(reply).map(Some),
            Err(failure) if failure.status == RpcStatus::NotFound => Ok(None),
            Err(failure) => Err(rejection(failure)),
        }
    }

    /// Runs one remote call under the narrower of the caller's deadline and
    /// the client timeout. The outer `Err` covers calls that never completed.
    async fn call(
        &self,
        context: &RequestContext,
        operation: Operation,
        idn: &Idn,
    ) -> Result<Result<CustomerReply, RpcFailure>, ApplicationError> {
        let context = context.clone().with_timeout(self.timeout);
        let request = CustomerRequest {
            idn: idn.to_string(),
            correlation_id: context.correlation_id().to_owned(),
        };

        let outcome = context
            .run(async {
                let client = self.connected().await?;
                let remote = rpc_context(&context);
                let reply = match operation {
                    Operation::Upsert => client.upsert_customer(remote, request).await,
                    Operation::Get => client.get_customer(remote, request).await,
                };
                reply.map_err(CallError::Rpc)
            })
            .await;

        match outcome {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(error)) => {
                if matches!(error, CallError::Rpc(_)) {
                    self.disconnect().await;
                }
                Err(self.unavailable(&context, operation, error.to_string()))
            }
            Err(deadline) => Err(self.unavailable(&context, operation, deadline.to_string())),
        }
    }

    async fn connected(&self) -> Result<CustomerServiceClient, CallError> {
        let mut slot = self.client.lock().await;
        if let Some(client) = slot.as_ref() {
            return Ok(client.clone());
        }

        let client = parcel_rpc::connect(&self.address).await.map_err(CallError::Connect)?;
        *slot = Some(client.clone());
        Ok(client)
    }

    async fn disconnect(&self) {
        self.client.lock().await.take();
    }

    fn unavailable(
        &self,
        context: &RequestContext,
        operation: Operation,
        detail: String,
    ) -> ApplicationError {
        warn!(
            event_name = "customer.call_failed",
            correlation_id = %context.correlation_id(),
            operation = operation.name(),
            address = %self.address,
            error = %detail,
            "customer service call did not complete"
        );
        ApplicationError::UpstreamUnavailable(detail)
    }
}

#[async_trait]
impl CustomerGateway for RpcCustomerClient {
    async fn upsert_by_idn(
        &self,
        context: &RequestContext,
        idn: &Idn,
    ) -> Result<Customer, ApplicationError> {
        match self.call(context, Operation::Upsert, idn).await? {
            Ok(reply) => decode(reply),
            Err(failure) => Err(rejection(failure)),
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum CallError {
    #[error("connect failed: {0}")]
    Connect(#[source] std::io::Error),
    #[error("rpc failed: {0}")]
    Rpc(#[source] RpcError),
}

/// tarpc context carrying the caller's deadline to the registry.
fn rpc_context(context: &RequestContext) -> tarpc::context::Context {
    let mut rpc_context = tarpc::context::current();
    if let Some(remaining) = context.remaining() {
        rpc_context.deadline = std::time::Instant::now() + remaining;
    }
    rpc_context
}

fn rejection(failure: RpcFailure) -> ApplicationError {
    match failure.status {
        RpcStatus::InvalidArgument => ApplicationError::UpstreamRejected(failure.message),
        RpcStatus::NotFound | RpcStatus::Internal => {
            ApplicationError::Internal(format!("customer service failed: {}", failure.message))
        }
    }
}

fn decode(reply: CustomerReply) -> Result<Customer, ApplicationError> {
    Customer::try_from(reply).map_err(|error| {
        ApplicationError::Internal(format!(
            "customer service returned a malformed customer: {error}"
        ))
    })
}
