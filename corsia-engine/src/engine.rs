use chrono::Utc;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

use corsia_domain::{
    AuditEntry, AuditOutcome, InventoryStore, Passenger, ReservationRecord, ReserveError,
    WriteOutcome,
};

use crate::audit::AuditRecorder;
use crate::cache::AvailabilityCache;
use crate::retry::{retry_with_backoff, RetryError, RetryPolicy};

/// One failed booking attempt. Only a lost revision race is transient;
/// everything else ends the cycle.
#[derive(Debug, thiserror::Error)]
enum AttemptError {
    #[error("revision conflict on flight inventory")]
    Conflict { available: i32 },
    #[error("{error}")]
    Terminal {
        error: ReserveError,
        available: Option<i32>,
    },
}

impl AttemptError {
    fn terminal(error: ReserveError, available: Option<i32>) -> Self {
        Self::Terminal { error, available }
    }

    fn available(&self) -> Option<i32> {
        match self {
            Self::Conflict { available } => Some(*available),
            Self::Terminal { available, .. } => *available,
        }
    }
}

/// Orchestrates the read-validate-write booking cycle.
///
/// Each attempt validates against a fresh authoritative read, then tries a
/// conditional write carrying the reservation record. A lost revision race
/// is retried with backoff; every other outcome is terminal. On any
/// terminal outcome the flight's cache entry is invalidated exactly once
/// and exactly one audit entry is recorded, neither of which can fail the
/// booking.
pub struct ReservationEngine {
    store: Arc<dyn InventoryStore>,
    cache: Arc<AvailabilityCache>,
    audit: AuditRecorder,
    policy: RetryPolicy,
}

impl ReservationEngine {
    pub fn new(
        store: Arc<dyn InventoryStore>,
        cache: Arc<AvailabilityCache>,
        audit: AuditRecorder,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            store,
            cache,
            audit,
            policy,
        }
    }

    /// Book `seat_count` seats on a flight.
    pub async fn reserve(
        &self,
        flight_id: Uuid,
        seat_count: u32,
        passenger: Passenger,
    ) -> Result<ReservationRecord, ReserveError> {
        self.reserve_inner(flight_id, seat_count, passenger, None)
            .await
    }

    /// Like [`reserve`](Self::reserve), but aborts with `DeadlineExceeded`
    /// instead of retrying past the caller's deadline.
    pub async fn reserve_before(
        &self,
        flight_id: Uuid,
        seat_count: u32,
        passenger: Passenger,
        deadline: Instant,
    ) -> Result<ReservationRecord, ReserveError> {
        self.reserve_inner(flight_id, seat_count, passenger, Some(deadline))
            .await
    }

    /// Cache-backed availability for the read path. Never consulted by
    /// `reserve`.
    pub async fn available_seats(&self, flight_id: Uuid) -> Result<i32, ReserveError> {
        self.cache.get_available(flight_id).await
    }

    /// Stop the audit worker, draining anything still buffered.
    pub async fn shutdown(self) {
        self.audit.shutdown().await;
    }

    async fn reserve_inner(
        &self,
        flight_id: Uuid,
        seat_count: u32,
        passenger: Passenger,
        deadline: Option<Instant>,
    ) -> Result<ReservationRecord, ReserveError> {
        if seat_count == 0 {
            return Err(ReserveError::InvalidSeatCount);
        }
        let requested = i32::try_from(seat_count).map_err(|_| ReserveError::InvalidSeatCount)?;

        let result = retry_with_backoff(
            &self.policy,
            deadline,
            || {
                let store = Arc::clone(&self.store);
                let passenger = passenger.clone();
                async move { attempt(store, flight_id, requested, passenger).await }
            },
            |err| matches!(err, AttemptError::Conflict { .. }),
        )
        .await;

        let (booking, available_before) = match result {
            Ok((record, available)) => (Ok(record), Some(available)),
            Err(RetryError::Terminal(err)) => {
                let available = err.available();
                match err {
                    AttemptError::Terminal { error, .. } => (Err(error), available),
                    // Conflicts are marked transient, so they can only reach
                    // this path through exhaustion.
                    AttemptError::Conflict { .. } => (
                        Err(ReserveError::ConflictExhausted {
                            attempts: self.policy.max_attempts,
                        }),
                        available,
                    ),
                }
            }
            Err(RetryError::Exhausted { last, attempts }) => (
                Err(ReserveError::ConflictExhausted { attempts }),
                last.available(),
            ),
            Err(RetryError::DeadlineExceeded { last }) => (
                Err(ReserveError::DeadlineExceeded),
                last.and_then(|err| err.available()),
            ),
        };

        // Terminal outcome: exactly one invalidation, exactly one audit
        // entry, both best-effort and off the correctness path.
        self.cache.invalidate(flight_id);
        self.audit.record(build_audit_entry(
            flight_id,
            &passenger,
            requested,
            available_before,
            &booking,
        ));

        match &booking {
            Ok(record) => info!(
                "Reserved {} seats on flight {} (reservation {})",
                requested, flight_id, record.id
            ),
            Err(err) => warn!("Reservation on flight {} failed: {}", flight_id, err),
        }

        booking
    }
}

/// One pass of the read-validate-write cycle.
async fn attempt(
    store: Arc<dyn InventoryStore>,
    flight_id: Uuid,
    requested: i32,
    passenger: Passenger,
) -> Result<(ReservationRecord, i32), AttemptError> {
    // 1. Fresh authoritative read. The availability cache is never used
    //    here: writes must validate against the store.
    let inventory = store
        .read_inventory(flight_id)
        .await
        .map_err(|e| AttemptError::terminal(ReserveError::Store(e), None))?;

    let inventory = match inventory {
        Some(inv) => inv,
        None => return Err(AttemptError::terminal(ReserveError::NotFound(flight_id), None)),
    };

    // 2. Validate against what is available right now. A request that
    //    started with seats free can legitimately end up here on a retry
    //    after real availability moved underneath it.
    let available = inventory.available();
    if requested > available {
        return Err(AttemptError::terminal(
            ReserveError::InsufficientSeats {
                requested,
                available,
            },
            Some(available),
        ));
    }

    // 3. Conditional write, atomically paired with the reservation record.
    let record = ReservationRecord::new(flight_id, passenger, requested);
    match store
        .conditional_write(
            flight_id,
            inventory.revision,
            inventory.booked + requested,
            &record,
        )
        .await
    {
        Ok(WriteOutcome::Accepted) => Ok((record, available)),
        Ok(WriteOutcome::RevisionMismatch) => Err(AttemptError::Conflict { available }),
        Ok(WriteOutcome::NotFound) => Err(AttemptError::terminal(
            ReserveError::NotFound(flight_id),
            Some(available),
        )),
        Err(e) => Err(AttemptError::terminal(
            ReserveError::Store(e),
            Some(available),
        )),
    }
}

fn build_audit_entry(
    flight_id: Uuid,
    passenger: &Passenger,
    requested: i32,
    available_before: Option<i32>,
    result: &Result<ReservationRecord, ReserveError>,
) -> AuditEntry {
    let (outcome, error_detail, reservation_id) = match result {
        Ok(record) => (AuditOutcome::Success, None, Some(record.id)),
        Err(err) => {
            let outcome = match err {
                ReserveError::NotFound(_) => AuditOutcome::NotFound,
                ReserveError::InsufficientSeats { .. } => AuditOutcome::InsufficientSeats,
                ReserveError::ConflictExhausted { .. } => AuditOutcome::ConflictExhausted,
                // The audit outcome set is fixed; deadline aborts and backend
                // failures both land here, distinguished by the detail text.
                ReserveError::DeadlineExceeded
                | ReserveError::Store(_)
                | ReserveError::InvalidSeatCount => AuditOutcome::SystemError,
            };
            (outcome, Some(err.to_string()), None)
        }
    };

    AuditEntry {
        id: Uuid::new_v4(),
        timestamp: Utc::now(),
        flight_id,
        passenger_contact: passenger.contact.clone(),
        requested_seats: requested,
        available_before,
        outcome,
        error_detail,
        reservation_id,
    }
}
