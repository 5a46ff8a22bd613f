use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::inventory::FlightInventory;
use crate::reservation::ReservationRecord;

/// Result of a conditional inventory write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The stored revision matched and the write was applied.
    Accepted,
    /// Another writer won the race since the caller's read.
    RevisionMismatch,
    NotFound,
}

/// Durable record of capacity, booked count and revision per flight.
///
/// `conditional_write` is the single serialization point of the whole
/// system: it must be atomic with respect to all other writers on the same
/// flight, and no lock may be held between a caller's read and its write.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn read_inventory(&self, flight_id: Uuid) -> Result<Option<FlightInventory>, StoreError>;

    /// Set `booked = new_booked`, bump the revision by 1 and persist the
    /// reservation record, all-or-nothing, if and only if the stored
    /// revision still equals `expected_revision`.
    async fn conditional_write(
        &self,
        flight_id: Uuid,
        expected_revision: i64,
        new_booked: i32,
        record: &ReservationRecord,
    ) -> Result<WriteOutcome, StoreError>;

    /// Insert a fresh inventory row. Supplied by flight creation with
    /// `booked = 0`, `revision = 0`.
    async fn create_inventory(&self, inventory: &FlightInventory) -> Result<(), StoreError>;

    /// All accepted reservations for a flight, in insertion order.
    async fn reservations_for(
        &self,
        flight_id: Uuid,
    ) -> Result<Vec<ReservationRecord>, StoreError>;
}
