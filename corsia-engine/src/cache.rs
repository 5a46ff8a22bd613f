use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

use corsia_domain::{InventoryStore, ReserveError};

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of flights cached at once.
    pub capacity: usize,
    /// Entries expire this long after insertion, regardless of access.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 1024,
            ttl: Duration::from_secs(30),
        }
    }
}

struct CacheSlot {
    available: i32,
    inserted_at: Instant,
    last_access: Instant,
}

/// Read-through cache of computed seat availability.
///
/// Serves the read path only; the reservation write path always reads the
/// store directly, so a stale cached value can never feed a write. Bounded
/// by `capacity` with least-recently-used eviction, and entries expire
/// `ttl` after insertion. The lock is never held across an await.
pub struct AvailabilityCache {
    store: Arc<dyn InventoryStore>,
    entries: Mutex<HashMap<Uuid, CacheSlot>>,
    config: CacheConfig,
}

impl AvailabilityCache {
    pub fn new(store: Arc<dyn InventoryStore>, config: CacheConfig) -> Self {
        Self {
            store,
            entries: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Available seats for a flight. Cached within the TTL; on miss or
    /// expiry, recomputed from the store and re-cached.
    pub async fn get_available(&self, flight_id: Uuid) -> Result<i32, ReserveError> {
        let now = Instant::now();
        {
            let mut entries = self.entries.lock().unwrap();
            if let Some(slot) = entries.get_mut(&flight_id) {
                if now.duration_since(slot.inserted_at) < self.config.ttl {
                    slot.last_access = now;
                    return Ok(slot.available);
                }
                entries.remove(&flight_id);
            }
        }

        let inventory = self
            .store
            .read_inventory(flight_id)
            .await?
            .ok_or(ReserveError::NotFound(flight_id))?;
        let available = inventory.available();

        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap();
        if entries.len() >= self.config.capacity && !entries.contains_key(&flight_id) {
            let lru = entries
                .iter()
                .min_by_key(|(_, slot)| slot.last_access)
                .map(|(id, _)| *id);
            if let Some(id) = lru {
                entries.remove(&id);
                debug!("Evicted availability cache entry for flight {}", id);
            }
        }
        entries.insert(
            flight_id,
            CacheSlot {
                available,
                inserted_at: now,
                last_access: now,
            },
        );

        Ok(available)
    }

    /// Remove a flight's entry. A no-op when nothing is cached.
    pub fn invalidate(&self, flight_id: Uuid) {
        let mut entries = self.entries.lock().unwrap();
        if entries.remove(&flight_id).is_some() {
            debug!("Invalidated availability cache for flight {}", flight_id);
        }
    }

    #[cfg(test)]
    fn cached_len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}
