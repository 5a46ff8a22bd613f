use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Seat inventory for a single flight.
///
/// `revision` is the optimistic-concurrency token: it starts at 0 and is
/// bumped by exactly 1 on every accepted write. `booked` is mutated only
/// through conditional writes, so `0 <= booked <= capacity` holds as long as
/// every writer validates against the revision it read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlightInventory {
    pub id: Uuid,
    pub capacity: i32,
    pub booked: i32,
    pub revision: i64,
    pub created_at: DateTime<Utc>,
}

impl FlightInventory {
    /// Fresh inventory as supplied by flight creation: nothing booked, revision 0.
    pub fn new(id: Uuid, capacity: i32) -> Self {
        Self {
            id,
            capacity,
            booked: 0,
            revision: 0,
            created_at: Utc::now(),
        }
    }

    /// Seats still open for sale.
    pub fn available(&self) -> i32 {
        self.capacity - self.booked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_inventory_is_empty() {
        let inv = FlightInventory::new(Uuid::new_v4(), 180);
        assert_eq!(inv.booked, 0);
        assert_eq!(inv.revision, 0);
        assert_eq!(inv.available(), 180);
    }

    #[test]
    fn test_available_tracks_booked() {
        let mut inv = FlightInventory::new(Uuid::new_v4(), 180);
        inv.booked = 178;
        assert_eq!(inv.available(), 2);
    }
}
