//! JSON API of the shipment service.
//!
//! - `POST /api/v1/shipments`      create a shipment
//! - `GET  /api/v1/shipments/{id}` fetch a shipment
//! - `GET  /health`                liveness, plain `OK`
//!
//! Every response carries `x-request-id`: the caller's value when present,
//! otherwise a generated one. The same id tags logs and is forwarded to the
//! customer service.

use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::SecondsFormat;
use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer, Serialize};
use tracing::{error, info, warn};

use parcel_core::domain::shipment::{CreateShipmentInput, Shipment};
use parcel_core::{ApplicationError, InterfaceError, RequestContext};

use crate::workflow::ShipmentWorkflow;

pub const REQUEST_ID_HEADER: &str = "x-request-id";
const INVALID_BODY_MESSAGE: &str = "invalid request body";
const MAX_REQUEST_ID_LEN: usize = 128;

#[derive(Clone)]
pub struct HttpState {
    workflow: ShipmentWorkflow,
    request_timeout: Duration,
}

impl HttpState {
    fn request_context(&self, headers: &HeaderMap) -> RequestContext {
        let supplied = headers
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty() && value.len() <= MAX_REQUEST_ID_LEN);

        supplied
            .map(RequestContext::new)
            .unwrap_or_else(RequestContext::generate)
            .with_timeout(self.request_timeout)
    }
}

/// Missing fields decode to empty values so that they fail domain
/// validation with a specific message rather than as an undecodable body.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateShipmentRequest {
    #[serde(default)]
    pub route: String,
    #[serde(default, deserialize_with = "exact_price")]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub customer: CustomerPayload,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomerPayload {
    #[serde(default)]
    pub idn: String,
}

impl From<CreateShipmentRequest> for CreateShipmentInput {
    fn from(request: CreateShipmentRequest) -> Self {
        Self {
            route: request.route,
            price: request.price.unwrap_or_default(),
            customer_idn: request.customer.idn,
        }
    }
}

/// Reads the JSON number from its source text. A value `Decimal` cannot hold
/// without rounding is an undecodable body, and `null` reads as absent.
fn exact_price<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(number) = Option::<serde_json::Number>::deserialize(deserializer)? else {
        return Ok(None);
    };

    let text = number.to_string();
    let parsed = if text.contains(['e', 'E']) {
        Decimal::from_scientific(&text)
    } else {
        Decimal::from_str_exact(&text)
    };
    parsed.map(Some).map_err(|error| de::Error::custom(format!("price {text}: {error}")))
}

#[derive(Debug, Serialize)]
pub struct CreateShipmentResponse {
    pub id: String,
    pub status: String,
    #[serde(rename = "customerId")]
    pub customer_id: String,
}

#[derive(Debug, Serialize)]
pub struct ShipmentResponse {
    pub id: String,
    pub route: String,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub price: Decimal,
    pub status: String,
    #[serde(rename = "customerId")]
    pub customer_id: String,
    pub created_at: String,
}

impl From<&Shipment> for ShipmentResponse {
    fn from(shipment: &Shipment) -> Self {
        Self {
            id: shipment.id.to_string(),
            route: shipment.route.as_str().to_owned(),
            price: shipment.price.amount().normalize(),
            status: shipment.status.to_string(),
            customer_id: shipment.customer_id.to_string(),
            created_at: shipment.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

pub fn router(workflow: ShipmentWorkflow, request_timeout: Duration) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/shipments", post(create_shipment))
        .route("/api/v1/shipments/{id}", get(get_shipment))
        .with_state(HttpState { workflow, request_timeout })
}

async fn health() -> &'static str {
    "OK"
}

async fn create_shipment(
    State(state): State<HttpState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let context = state.request_context(&headers);

    // Also rejects trailing content after the JSON value.
    let request = match serde_json::from_slice::<CreateShipmentRequest>(&body) {
        Ok(request) => request,
        Err(error) => {
            warn!(
                event_name = "shipment.request_rejected",
                correlation_id = %context.correlation_id(),
                error = %error,
                "create shipment body could not be decoded"
            );
            return respond(
                &context,
                StatusCode::BAD_REQUEST,
                ErrorBody { error: INVALID_BODY_MESSAGE.to_owned() },
            );
        }
    };

    match state.workflow.create(&context, request.into()).await {
        Ok(shipment) => {
            info!(
                event_name = "shipment.created",
                correlation_id = %context.correlation_id(),
                shipment_id = %shipment.id,
                customer_id = %shipment.customer_id,
                "shipment created"
            );
            respond(
                &context,
                StatusCode::CREATED,
                CreateShipmentResponse {
                    id: shipment.id.to_string(),
                    status: shipment.status.to_string(),
                    customer_id: shipment.customer_id.to_string(),
                },
            )
        }
        Err(error) => fail(&context, "shipment.create_failed", error),
    }
}

async fn get_shipment(
    State(state): State<HttpState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let context = state.request_context(&headers);

    match state.workflow.get(&context, &id).await {
        Ok(shipment) => {
            info!(
                event_name = "shipment.fetched",
                correlation_id = %context.correlation_id(),
                shipment_id = %shipment.id,
                "shipment fetched"
            );
            respond(&context, StatusCode::OK, ShipmentResponse::from(&shipment))
        }
        Err(error) => fail(&context, "shipment.fetch_failed", error),
    }
}

fn fail(context: &RequestContext, event_name: &'static str, error: ApplicationError) -> Response {
    let detail = error.to_string();
    let interface = error.into_interface(context.correlation_id());
    let status = status_code(&interface);

    if status.is_server_error() {
        error!(
            event_name,
            correlation_id = %context.correlation_id(),
            status = status.as_u16(),
            error = %detail,
            "shipment request failed"
        );
    } else {
        warn!(
            event_name,
            correlation_id = %context.correlation_id(),
            status = status.as_u16(),
            error = %detail,
            "shipment request rejected"
        );
    }

    respond(context, status, ErrorBody { error: interface.message().to_owned() })
}

fn status_code(error: &InterfaceError) -> StatusCode {
    match error {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::NotFound { .. } => StatusCode::NOT_FOUND,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn respond<T: Serialize>(context: &RequestContext, status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    if let Ok(value) = HeaderValue::from_str(context.correlation_id()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
