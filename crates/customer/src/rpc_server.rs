use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tarpc::context::Context;
use tarpc::serde_transport::tcp;
use tarpc::server::{self, Channel};
use tarpc::tokio_serde::formats::Bincode;
use tokio::sync::{oneshot, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::Instant;
use tracing::{error, info, warn};

use parcel_core::{ApplicationError, ErrorClass, RequestContext};
use parcel_rpc::{CustomerReply, CustomerRequest, CustomerService, RpcFailure, RpcResult};

use crate::directory::CustomerDirectory;

/// tarpc handler for [`CustomerService`]. Cloned once per connection.
#[derive(Clone)]
pub struct CustomerRpcServer {
    directory: CustomerDirectory,
    request_timeout: Duration,
}

impl CustomerRpcServer {
    pub fn new(directory: CustomerDirectory, request_timeout: Duration) -> Self {
        Self { directory, request_timeout }
    }

    /// Bounds the request by the caller's deadline or the server's own
    /// timeout, whichever ends first.
    fn request_context(&self, rpc_context: &Context, correlation_id: String) -> RequestContext {
        let context = if correlation_id.trim().is_empty() {
            RequestContext::generate()
        } else {
            RequestContext::new(correlation_id)
        };
        context
            .with_timeout(self.request_timeout)
            .with_deadline(Instant::from_std(rpc_context.deadline))
    }
}

impl CustomerService for CustomerRpcServer {
    async fn upsert_customer(
        self,
        rpc_context: Context,
        request: CustomerRequest,
    ) -> RpcResult<CustomerReply> {
        let context = self.request_context(&rpc_context, request.correlation_id);

        match self.directory.upsert_by_idn(&context, &request.idn).await {
            Ok(customer) => {
                info!(
                    event_name = "customer.upserted",
                    correlation_id = %context.correlation_id(),
                    customer_id = %customer.id,
                    idn = %customer.idn,
                    "customer upserted"
                );
                Ok(customer.into())
            }
            Err(error) => Err(reject("customer.upsert_failed", &context, &error)),
        }
    }

    async fn get_customer(
        self,
        rpc_context: Context,
        request: CustomerRequest,
    ) -> RpcResult<CustomerReply> {
        let context = self.request_context(&rpc_context, request.correlation_id);

        match self.directory.get_by_idn(&context, &request.idn).await {
            Ok(customer) => {
                info!(
                    event_name = "customer.fetched",
                    correlation_id = %context.correlation_id(),
                    customer_id = %customer.id,
                    idn = %customer.idn,
                    "customer fetched"
                );
                Ok(customer.into())
            }
            Err(error) => Err(reject("customer.fetch_failed", &context, &error)),
        }
    }
}

/// Logs the failure with full detail and returns the wire form, which only
/// carries detail for caller mistakes.
fn reject(
    event_name: &'static str,
    context: &RequestContext,
    error: &ApplicationError,
) -> RpcFailure {
    match error.class() {
        ErrorClass::InvalidInput | ErrorClass::NotFound => warn!(
            event_name,
            correlation_id = %context.correlation_id(),
            error = %error,
            "customer request rejected"
        ),
        ErrorClass::UpstreamUnavailable | ErrorClass::UpstreamRejected | ErrorClass::Internal => {
            error!(
                event_name,
                correlation_id = %context.correlation_id(),
                error = %error,
                "customer request failed"
            )
        }
    }
    RpcFailure::from(error)
}

/// Running accept loop. Dropping the handle stops the server without a
/// grace period.
pub struct RpcServerHandle {
    local_addr: SocketAddr,
    stop: oneshot::Sender<Duration>,
    task: JoinHandle<()>,
}

impl RpcServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stops accepting connections, waits up to `grace` for in-flight
    /// requests, then closes every connection.
    pub async fn shutdown(self, grace: Duration) {
        let _ = self.stop.send(grace);
        if let Err(error) = self.task.await {
            error!(
                event_name = "system.rpc.error",
                correlation_id = "shutdown",
                error = %error,
                "customer rpc server task failed"
            );
        }
    }
}

pub async fn spawn(
    bind_address: &str,
    port: u16,
    server: CustomerRpcServer,
) -> std::io::Result<RpcServerHandle> {
    let address = format!("{bind_address}:{port}");
    let mut listener = tcp::listen(&address, Bincode::default).await?;
    let local_addr = listener.local_addr();

    info!(
        event_name = "system.rpc.start",
        correlation_id = "bootstrap",
        bind_address = %local_addr,
        "customer rpc server listening"
    );

    let (stop, mut stop_rx) = oneshot::channel::<Duration>();
    let task = tokio::spawn(async move {
        let in_flight = Arc::new(watch::channel(0_usize).0);
        let mut connections = JoinSet::new();

        let grace = loop {
            tokio::select! {
                grace = &mut stop_rx => break grace.unwrap_or_default(),
                next = listener.next() => match next {
                    Some(Ok(transport)) => {
                        let server = server.clone();
                        let in_flight = in_flight.clone();
                        connections.spawn(async move {
                            server::BaseChannel::with_defaults(transport)
                                .execute(server.serve())
                                .for_each(|response| {
                                    let guard = InFlightGuard::enter(&in_flight);
                                    async move {
                                        tokio::spawn(async move {
                                            response.await;
                                            drop(guard);
                                        });
                                    }
                                })
                                .await;
                        });
                    }
                    Some(Err(error)) => warn!(
                        event_name = "system.rpc.accept_failed",
                        correlation_id = "system",
                        error = %error,
                        "failed to accept rpc connection"
                    ),
                    None => break Duration::ZERO,
                },
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
            }
        };

        drain(&in_flight, grace).await;
        connections.shutdown().await;
        info!(
            event_name = "system.rpc.stopped",
            correlation_id = "shutdown",
            "customer rpc server stopped"
        );
    });

    Ok(RpcServerHandle { local_addr, stop, task })
}

struct InFlightGuard(Arc<watch::Sender<usize>>);

impl InFlightGuard {
    fn enter(counter: &Arc<watch::Sender<usize>>) -> Self {
        counter.send_modify(|count| *count += 1);
        Self(counter.clone())
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.send_modify(|count| *count -= 1);
    }
}

async fn drain(in_flight: &watch::Sender<usize>, grace: Duration) {
    let mut idle = in_flight.subscribe();
    let drained = tokio::time::timeout(grace, idle.wait_for(|count| *count == 0)).await.is_ok();

    if !drained {
        warn!(
            event_name = "system.rpc.drain_timeout",
            correlation_id = "shutdown",
            in_flight = *in_flight.borrow(),
            "in-flight customer requests abandoned at shutdown"
        );
    }
}
