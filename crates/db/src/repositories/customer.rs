use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::Row;
use uuid::Uuid;

use parcel_core::domain::customer::{Customer, CustomerId};
use parcel_core::domain::idn::Idn;

use super::{decode_err, CustomerRepository, RepositoryError};
use crate::DbPool;

pub struct SqlCustomerRepository {
    pool: DbPool,
}

impl SqlCustomerRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_customer(row: &sqlx::sqlite::SqliteRow) -> Result<Customer, RepositoryError> {
    let id: String = row.try_get("id").map_err(decode_err)?;
    let idn: String = row.try_get("idn").map_err(decode_err)?;
    let created_at: String = row.try_get("created_at").map_err(decode_err)?;

    Ok(Customer {
        id: CustomerId(Uuid::parse_str(&id).map_err(decode_err)?),
        idn: Idn::parse(&idn).map_err(decode_err)?,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(decode_err)?,
    })
}

#[async_trait::async_trait]
impl CustomerRepository for SqlCustomerRepository {
    async fn upsert_by_idn(&self, idn: &Idn) -> Result<Customer, RepositoryError> {
        // Re-assigning idn to itself makes RETURNING yield the stored row on conflict.
        let row = sqlx::query(
            "INSERT INTO customers (id, idn, created_at)
             VALUES (?, ?, ?)
             ON CONFLICT(idn) DO UPDATE SET idn = excluded.idn
             RETURNING id, idn, created_at",
        )
        .bind(CustomerId::generate().to_string())
        .bind(idn.as_str())
        .bind(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true))
        .fetch_one(&self.pool)
        .await?;

        row_to_customer(&row)
    }

    async fn find_by_idn(&self, idn: &Idn) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query("SELECT id, idn, created_at FROM customers WHERE idn = ?")
            .bind(idn.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_customer).transpose()
    }
}
