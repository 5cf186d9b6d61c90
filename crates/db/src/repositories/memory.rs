use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;

use parcel_core::domain::customer::{Customer, CustomerId};
use parcel_core::domain::idn::Idn;
use parcel_core::domain::shipment::{NewShipment, Shipment, ShipmentId, ShipmentStatus};

use super::{CustomerRepository, RepositoryError, ShipmentRepository};

#[derive(Default)]
pub struct InMemoryCustomerRepository {
    customers: RwLock<HashMap<Idn, Customer>>,
}

#[async_trait::async_trait]
impl CustomerRepository for InMemoryCustomerRepository {
    async fn upsert_by_idn(&self, idn: &Idn) -> Result<Customer, RepositoryError> {
        let mut customers = self.customers.write().await;
        let customer = customers.entry(idn.clone()).or_insert_with(|| Customer {
            id: CustomerId::generate(),
            idn: idn.clone(),
            created_at: Utc::now(),
        });
        Ok(customer.clone())
    }

    async fn find_by_idn(&self, idn: &Idn) -> Result<Option<Customer>, RepositoryError> {
        let customers = self.customers.read().await;
        Ok(customers.get(idn).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryShipmentRepository {
    shipments: RwLock<HashMap<ShipmentId, Shipment>>,
}

impl InMemoryShipmentRepository {
    pub async fn len(&self) -> usize {
        self.shipments.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait::async_trait]
impl ShipmentRepository for InMemoryShipmentRepository {
    async fn create(&self, shipment: NewShipment) -> Result<Shipment, RepositoryError> {
        let stored = Shipment {
            id: ShipmentId::generate(),
            route: shipment.route,
            price: shipment.price,
            status: ShipmentStatus::Created,
            customer_id: shipment.customer_id,
            created_at: Utc::now(),
        };
        let mut shipments = self.shipments.write().await;
        shipments.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: &ShipmentId) -> Result<Option<Shipment>, RepositoryError> {
        let shipments = self.shipments.read().await;
        Ok(shipments.get(id).cloned())
    }
}
