use uuid::Uuid;

/// Failure of the storage backend itself. Absence of a flight and losing a
/// revision race are data, not errors; this covers connectivity loss and
/// contract violations only.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Storage backend failure: {0}")]
    Backend(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ReserveError {
    #[error("Flight not found: {0}")]
    NotFound(Uuid),

    #[error("Insufficient seats: requested {requested}, available {available}")]
    InsufficientSeats { requested: i32, available: i32 },

    #[error("Booking conflict unresolved after {attempts} attempts")]
    ConflictExhausted { attempts: u32 },

    #[error("Reservation aborted: caller deadline exceeded")]
    DeadlineExceeded,

    #[error("Seat count must be at least 1")]
    InvalidSeatCount,

    #[error("Store failure: {0}")]
    Store(#[from] StoreError),
}

impl ReserveError {
    /// Whether the caller may reasonably retry the whole request. Exhausted
    /// contention signals a transient hot spot, not a permanent refusal.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ReserveError::ConflictExhausted { .. })
    }
}
