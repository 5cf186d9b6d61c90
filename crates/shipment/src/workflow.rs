//! Shipment creation and lookup.
//!
//! `create` validates route, then price, then IDN, and stops at the first
//! failure. The customer is resolved remotely before anything is written
//! locally, so a shipment is never stored for an unconfirmed customer.

use std::sync::Arc;

use parcel_core::domain::idn::Idn;
use parcel_core::domain::shipment::{
    CreateShipmentInput, NewShipment, Price, Route, Shipment, ShipmentId,
};
use parcel_core::{ApplicationError, RequestContext};
use parcel_db::{RepositoryError, ShipmentRepository};

use crate::customer_client::CustomerGateway;

#[derive(Clone)]
pub struct ShipmentWorkflow {
    customers: Arc<dyn CustomerGateway>,
    shipments: Arc<dyn ShipmentRepository>,
}

impl ShipmentWorkflow {
    pub fn new(
        customers: Arc<dyn CustomerGateway>,
        shipments: Arc<dyn ShipmentRepository>,
    ) -> Self {
        Self { customers, shipments }
    }

    pub async fn create(
        &self,
        context: &RequestContext,
        input: CreateShipmentInput,
    ) -> Result<Shipment, ApplicationError> {
        let route = Route::parse(&input.route)?;
        let price = Price::new(input.price)?;
        let idn = Idn::parse(input.customer_idn.trim())?;

        let customer = self.customers.upsert_by_idn(context, &idn).await?;

        context
            .run(self.shipments.create(NewShipment { route, price, customer_id: customer.id }))
            .await
            .map_err(|_| ApplicationError::DeadlineExceeded { operation: "shipment insert" })?
            .map_err(persistence)
    }

    pub async fn get(
        &self,
        context: &RequestContext,
        id: &str,
    ) -> Result<Shipment, ApplicationError> {
        let id = ShipmentId::parse(id)?;

        context
            .run(self.shipments.find_by_id(&id))
            .await
            .map_err(|_| ApplicationError::DeadlineExceeded { operation: "shipment lookup" })?
            .map_err(persistence)?
            .ok_or(ApplicationError::NotFound { entity: "shipment" })
    }
}

fn persistence(error: RepositoryError) -> ApplicationError {
    ApplicationError::Persistence(error.to_string())
}
