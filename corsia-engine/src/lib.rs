pub mod audit;
pub mod cache;
pub mod engine;
pub mod retry;

pub use audit::AuditRecorder;
pub use cache::{AvailabilityCache, CacheConfig};
pub use engine::ReservationEngine;
pub use retry::{retry_with_backoff, RetryError, RetryPolicy};
