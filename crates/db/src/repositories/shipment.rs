use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::Row;
use uuid::Uuid;

use parcel_core::domain::customer::CustomerId;
use parcel_core::domain::shipment::{
    NewShipment, Price, Route, Shipment, ShipmentId, ShipmentStatus,
};

use super::{decode_err, RepositoryError, ShipmentRepository};
use crate::DbPool;

pub struct SqlShipmentRepository {
    pool: DbPool,
}

impl SqlShipmentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_shipment(row: &sqlx::sqlite::SqliteRow) -> Result<Shipment, RepositoryError> {
    let id: String = row.try_get("id").map_err(decode_err)?;
    let route: String = row.try_get("route").map_err(decode_err)?;
    let price: String = row.try_get("price").map_err(decode_err)?;
    let status: String = row.try_get("status").map_err(decode_err)?;
    let customer_id: String = row.try_get("customer_id").map_err(decode_err)?;
    let created_at: String = row.try_get("created_at").map_err(decode_err)?;

    Ok(Shipment {
        id: ShipmentId(Uuid::parse_str(&id).map_err(decode_err)?),
        route: Route::parse(&route).map_err(decode_err)?,
        price: Price::from_str(&price).map_err(decode_err)?,
        status: ShipmentStatus::from_str(&status).map_err(RepositoryError::Decode)?,
        customer_id: CustomerId(Uuid::parse_str(&customer_id).map_err(decode_err)?),
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(decode_err)?,
    })
}

#[async_trait::async_trait]
impl ShipmentRepository for SqlShipmentRepository {
    async fn create(&self, shipment: NewShipment) -> Result<Shipment, RepositoryError> {
        let row = sqlx::query(
            "INSERT INTO shipments (id, route, price, customer_id, created_at)
             VALUES (?, ?, ?, ?, ?)
             RETURNING id, route, price, status, customer_id, created_at",
        )
        .bind(ShipmentId::generate().to_string())
        .bind(shipment.route.as_str())
        .bind(shipment.price.to_storage_string())
        .bind(shipment.customer_id.to_string())
        .bind(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true))
        .fetch_one(&self.pool)
        .await?;

        row_to_shipment(&row)
    }

    async fn find_by_id(&self, id: &ShipmentId) -> Result<Option<Shipment>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, route, price, status, customer_id, created_at
             FROM shipments WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_shipment).transpose()
    }
}
