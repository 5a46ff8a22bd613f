use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use corsia_domain::{
    FlightInventory, InventoryStore, Passenger, ReservationRecord, StoreError, WriteOutcome,
};

/// Postgres-backed inventory store. The conditional write relies on the
/// database's row-level atomicity: `UPDATE ... WHERE revision = $expected`
/// either applies the whole mutation or touches nothing, and the reservation
/// row lands in the same transaction.
pub struct PostgresInventoryStore {
    pool: PgPool,
}

impl PostgresInventoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

#[async_trait]
impl InventoryStore for PostgresInventoryStore {
    async fn read_inventory(&self, flight_id: Uuid) -> Result<Option<FlightInventory>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, capacity, booked, revision, created_at
            FROM flight_inventory
            WHERE id = $1
            "#,
        )
        .bind(flight_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        Ok(row.map(|r| FlightInventory {
            id: r.get("id"),
            capacity: r.get("capacity"),
            booked: r.get("booked"),
            revision: r.get("revision"),
            created_at: r.get("created_at"),
        }))
    }

    async fn conditional_write(
        &self,
        flight_id: Uuid,
        expected_revision: i64,
        new_booked: i32,
        record: &ReservationRecord,
    ) -> Result<WriteOutcome, StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let updated = sqlx::query(
            r#"
            UPDATE flight_inventory
            SET booked = $3, revision = revision + 1
            WHERE id = $1 AND revision = $2
            "#,
        )
        .bind(flight_id)
        .bind(expected_revision)
        .bind(new_booked)
        .execute(&mut *tx)
        .await
        .map_err(backend)?;

        if updated.rows_affected() == 0 {
            // Zero rows means either the flight is gone or another writer
            // moved the revision. Disambiguate before reporting.
            let exists = sqlx::query("SELECT 1 AS present FROM flight_inventory WHERE id = $1")
                .bind(flight_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(backend)?;
            tx.rollback().await.map_err(backend)?;

            return Ok(match exists {
                Some(_) => WriteOutcome::RevisionMismatch,
                None => WriteOutcome::NotFound,
            });
        }

        sqlx::query(
            r#"
            INSERT INTO reservations (id, flight_id, passenger_name, passenger_contact, seat_count, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(record.id)
        .bind(record.flight_id)
        .bind(&record.passenger.full_name)
        .bind(&record.passenger.contact.0)
        .bind(record.seat_count)
        .bind(record.created_at)
        .execute(&mut *tx)
        .await
        .map_err(backend)?;

        tx.commit().await.map_err(backend)?;
        Ok(WriteOutcome::Accepted)
    }

    async fn create_inventory(&self, inventory: &FlightInventory) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO flight_inventory (id, capacity, booked, revision, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(inventory.id)
        .bind(inventory.capacity)
        .bind(inventory.booked)
        .bind(inventory.revision)
        .bind(inventory.created_at)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        Ok(())
    }

    async fn reservations_for(
        &self,
        flight_id: Uuid,
    ) -> Result<Vec<ReservationRecord>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, flight_id, passenger_name, passenger_contact, seat_count, created_at
            FROM reservations
            WHERE flight_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(flight_id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        Ok(rows
            .into_iter()
            .map(|r| ReservationRecord {
                id: r.get("id"),
                flight_id: r.get("flight_id"),
                passenger: Passenger::new(
                    r.get::<String, _>("passenger_name"),
                    r.get::<String, _>("passenger_contact"),
                ),
                seat_count: r.get("seat_count"),
                created_at: r.get("created_at"),
            })
            .collect())
    }
}
