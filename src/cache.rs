//! In-memory caching using moka
//!
//! Holds the blocking slots per date for the public availability lookup.
//! Booking submission never reads from here; it always asks the store.

use chrono::NaiveDate;
use moka::future::Cache;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::conference::availability::ExistingBooking;

/// Application cache
#[derive(Clone)]
pub struct AppCache {
    /// Blocking bookings per date (date -> confirmed/completed slots)
    pub day_slots: Cache<NaiveDate, Arc<Vec<ExistingBooking>>>,
}

impl AppCache {
    /// Create a new cache instance with configured TTLs
    pub fn new() -> Self {
        Self {
            // Availability: 365 dates, 30 s TTL so admin changes show up quickly
            day_slots: Cache::builder()
                .max_capacity(365)
                .time_to_live(Duration::from_secs(30))
                .build(),
        }
    }

    /// Get cache statistics for monitoring
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            day_slots_size: self.day_slots.entry_count(),
        }
    }

    /// Drop the cached slots for one date after a booking changed
    pub async fn invalidate_day(&self, date: NaiveDate) {
        self.day_slots.invalidate(&date).await;
        debug!("Availability cache invalidated for {}", date);
    }
}

impl Default for AppCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics for the health endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub day_slots_size: u64,
}
