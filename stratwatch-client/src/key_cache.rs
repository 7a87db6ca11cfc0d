//! Strategy key cache
//!
//! Every job endpoint is addressed by a server-side key that depends on the
//! strategy code and the trading mode. Keys are fetched lazily on first use and
//! kept for the lifetime of the client that owns the cache.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use stratwatch_core::domain::job::TradingMode;

type CacheKey = (String, TradingMode);

/// Keyed cache of strategy keys, indexed by `(strategy code, mode)`
#[derive(Debug, Default)]
pub struct KeyCache {
    keys: Mutex<HashMap<CacheKey, String>>,
}

impl KeyCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, strategy_code: &str, mode: TradingMode) -> Option<String> {
        let keys = self.keys.lock().unwrap_or_else(PoisonError::into_inner);
        keys.get(&(strategy_code.to_string(), mode)).cloned()
    }

    pub fn insert(&self, strategy_code: &str, mode: TradingMode, key: String) {
        let mut keys = self.keys.lock().unwrap_or_else(PoisonError::into_inner);
        keys.insert((strategy_code.to_string(), mode), key);
    }

    /// Drops a cached key so the next call fetches it again
    pub fn invalidate(&self, strategy_code: &str, mode: TradingMode) -> Option<String> {
        let mut keys = self.keys.lock().unwrap_or_else(PoisonError::into_inner);
        keys.remove(&(strategy_code.to_string(), mode))
    }

    pub fn len(&self) -> usize {
        self.keys.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
