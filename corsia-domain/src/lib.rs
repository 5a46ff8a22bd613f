pub mod audit;
pub mod error;
pub mod inventory;
pub mod pii;
pub mod reservation;
pub mod store;

pub use audit::{AuditEntry, AuditOutcome, AuditSink, MemoryAuditSink};
pub use error::{ReserveError, StoreError};
pub use inventory::FlightInventory;
pub use pii::Masked;
pub use reservation::{Passenger, ReservationRecord};
pub use store::{InventoryStore, WriteOutcome};
