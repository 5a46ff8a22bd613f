use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use corsia_domain::{
    FlightInventory, InventoryStore, ReservationRecord, StoreError, WriteOutcome,
};

struct FlightRow {
    inventory: FlightInventory,
    reservations: Vec<ReservationRecord>,
}

/// In-memory inventory store with real compare-and-swap semantics.
///
/// The write lock is the per-process equivalent of the database's row-level
/// atomicity: revision check, booked update and reservation append happen in
/// one critical section. Used in tests and as the reference implementation
/// of the store contract.
#[derive(Default)]
pub struct InMemoryInventoryStore {
    flights: RwLock<HashMap<Uuid, FlightRow>>,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InventoryStore for InMemoryInventoryStore {
    async fn read_inventory(&self, flight_id: Uuid) -> Result<Option<FlightInventory>, StoreError> {
        let flights = self.flights.read().await;
        Ok(flights.get(&flight_id).map(|row| row.inventory.clone()))
    }

    async fn conditional_write(
        &self,
        flight_id: Uuid,
        expected_revision: i64,
        new_booked: i32,
        record: &ReservationRecord,
    ) -> Result<WriteOutcome, StoreError> {
        let mut flights = self.flights.write().await;

        let row = match flights.get_mut(&flight_id) {
            Some(row) => row,
            None => return Ok(WriteOutcome::NotFound),
        };

        if row.inventory.revision != expected_revision {
            return Ok(WriteOutcome::RevisionMismatch);
        }

        row.inventory.booked = new_booked;
        row.inventory.revision += 1;
        row.reservations.push(record.clone());

        Ok(WriteOutcome::Accepted)
    }

    async fn create_inventory(&self, inventory: &FlightInventory) -> Result<(), StoreError> {
        let mut flights = self.flights.write().await;
        if flights.contains_key(&inventory.id) {
            return Err(StoreError::Backend(format!(
                "flight {} already exists",
                inventory.id
            )));
        }
        flights.insert(
            inventory.id,
            FlightRow {
                inventory: inventory.clone(),
                reservations: Vec::new(),
            },
        );
        Ok(())
    }

    async fn reservations_for(
        &self,
        flight_id: Uuid,
    ) -> Result<Vec<ReservationRecord>, StoreError> {
        let flights = self.flights.read().await;
        Ok(flights
            .get(&flight_id)
            .map(|row| row.reservations.clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corsia_domain::Passenger;

    fn passenger() -> Passenger {
        Passenger::new("Ada Lovelace", "ada@example.com")
    }

    #[tokio::test]
    async fn test_conditional_write_accepted() {
        let store = InMemoryInventoryStore::new();
        let flight_id = Uuid::new_v4();
        store
            .create_inventory(&FlightInventory::new(flight_id, 180))
            .await
            .unwrap();

        let record = ReservationRecord::new(flight_id, passenger(), 2);
        let outcome = store
            .conditional_write(flight_id, 0, 2, &record)
            .await
            .unwrap();
        assert_eq!(outcome, WriteOutcome::Accepted);

        let inv = store.read_inventory(flight_id).await.unwrap().unwrap();
        assert_eq!(inv.booked, 2);
        assert_eq!(inv.revision, 1);
        assert_eq!(store.reservations_for(flight_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_stale_revision_is_rejected() {
        let store = InMemoryInventoryStore::new();
        let flight_id = Uuid::new_v4();
        store
            .create_inventory(&FlightInventory::new(flight_id, 180))
            .await
            .unwrap();

        let winner = ReservationRecord::new(flight_id, passenger(), 2);
        store
            .conditional_write(flight_id, 0, 2, &winner)
            .await
            .unwrap();

        // Second writer still holds revision 0.
        let loser = ReservationRecord::new(flight_id, passenger(), 1);
        let outcome = store
            .conditional_write(flight_id, 0, 3, &loser)
            .await
            .unwrap();
        assert_eq!(outcome, WriteOutcome::RevisionMismatch);

        let inv = store.read_inventory(flight_id).await.unwrap().unwrap();
        assert_eq!(inv.booked, 2);
        assert_eq!(inv.revision, 1);
        assert_eq!(store.reservations_for(flight_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_flight() {
        let store = InMemoryInventoryStore::new();
        let flight_id = Uuid::new_v4();

        assert!(store.read_inventory(flight_id).await.unwrap().is_none());

        let record = ReservationRecord::new(flight_id, passenger(), 1);
        let outcome = store
            .conditional_write(flight_id, 0, 1, &record)
            .await
            .unwrap();
        assert_eq!(outcome, WriteOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_duplicate_create_is_an_error() {
        let store = InMemoryInventoryStore::new();
        let inventory = FlightInventory::new(Uuid::new_v4(), 180);
        store.create_inventory(&inventory).await.unwrap();
        assert!(store.create_inventory(&inventory).await.is_err());
    }
}
