//! In-memory caching using moka
//!
//! Holds the active rate table so repeated quotes do not re-read and
//! re-parse the store. Saving rates replaces the cached entry.

use moka::sync::Cache;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::Result;
use crate::pricing::models::RateTable;
use crate::store::{self, KeyValueStore, RATES_KEY};

/// Application cache holding the rate table
#[derive(Clone)]
pub struct AppCache {
    /// Rate table (singleton keyed by store key)
    pub rates: Cache<String, Arc<RateTable>>,
}

impl AppCache {
    /// Create a new cache instance with the given TTL
    pub fn new(ttl: Duration) -> Self {
        Self {
            rates: Cache::builder().max_capacity(1).time_to_live(ttl).build(),
        }
    }

    /// Current rate table: cache, then store, then the seed table
    pub fn rates<S: KeyValueStore + ?Sized>(&self, store: &S) -> Result<Arc<RateTable>> {
        if let Some(cached) = self.rates.get(RATES_KEY) {
            debug!("Cache HIT for rate table");
            return Ok(cached);
        }

        debug!("Cache MISS for rate table");
        let table = match store::load_json::<RateTable, S>(store, RATES_KEY)? {
            Some(table) => table,
            None => {
                info!("No saved rate table, using defaults");
                RateTable::default()
            }
        };

        let table = Arc::new(table);
        self.rates.insert(RATES_KEY.to_string(), table.clone());
        Ok(table)
    }

    /// Replace the cached rate table after a save
    pub fn put_rates(&self, table: RateTable) -> Arc<RateTable> {
        let table = Arc::new(table);
        self.rates.insert(RATES_KEY.to_string(), table.clone());
        table
    }

    /// Drop the cached table so the next read goes back to the store
    pub fn invalidate_all(&self) {
        self.rates.invalidate_all();
        debug!("Rate cache invalidated");
    }
}

impl Default for AppCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(5 * 60))
    }
}
