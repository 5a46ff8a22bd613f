use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pii::Masked;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passenger {
    pub full_name: String,
    pub contact: Masked<String>,
}

impl Passenger {
    pub fn new(full_name: impl Into<String>, contact: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            contact: Masked::new(contact.into()),
        }
    }
}

/// One accepted booking. Immutable once created; persisted in the same
/// transaction as the inventory update that accepted it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationRecord {
    pub id: Uuid,
    pub flight_id: Uuid,
    pub passenger: Passenger,
    pub seat_count: i32,
    pub created_at: DateTime<Utc>,
}

impl ReservationRecord {
    pub fn new(flight_id: Uuid, passenger: Passenger, seat_count: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            flight_id,
            passenger,
            seat_count,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passenger_contact_is_masked_in_debug() {
        let passenger = Passenger::new("Ada Lovelace", "ada@example.com");
        let debug = format!("{:?}", passenger);
        assert!(debug.contains("Ada Lovelace"));
        assert!(!debug.contains("ada@example.com"));
    }
}
