//! Persisted max score
//!
//! A single integer under `MAX_SCORE`. Storage problems never reach gameplay:
//! reads fall back to 0 and failed writes are logged and skipped.

use crate::consts::MAX_SCORE;
use crate::persistence::KeyValueStore;

/// Max score record on top of a key-value store
pub struct MaxScore {
    store: Box<dyn KeyValueStore>,
}

impl MaxScore {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "MAX_SCORE";

    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Current max score, 0 if nothing is stored or the store fails
    pub fn read(&self) -> u32 {
        match self.store.get(Self::STORAGE_KEY, 0) {
            Ok(value) => value.clamp(0, MAX_SCORE as i64) as u32,
            Err(err) => {
                log::warn!("Could not read max score, using 0: {:#}", err);
                0
            }
        }
    }

    /// Store `score` if it beats the current max. Returns the max after the update.
    pub fn record(&mut self, score: u32) -> u32 {
        let best = self.read();
        if score <= best {
            return best;
        }
        match self.store.set(Self::STORAGE_KEY, score as i64) {
            Ok(()) => log::info!("New max score: {}", score),
            Err(err) => log::warn!("Could not save max score {}: {:#}", score, err),
        }
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str, _default: i64) -> anyhow::Result<i64> {
            anyhow::bail!("disk unplugged")
        }

        fn set(&mut self, _key: &str, _value: i64) -> anyhow::Result<()> {
            anyhow::bail!("disk unplugged")
        }
    }

    #[test]
    fn test_record_only_raises() {
        let store = MemoryStore::new();
        let mut max = MaxScore::new(Box::new(store.clone()));
        assert_eq!(max.read(), 0);

        assert_eq!(max.record(300), 300);
        assert_eq!(max.record(120), 300);
        assert_eq!(store.get(MaxScore::STORAGE_KEY, 0).unwrap(), 300);
    }

    #[test]
    fn test_store_failures_fall_back() {
        let mut max = MaxScore::new(Box::new(BrokenStore));
        assert_eq!(max.read(), 0);
        assert_eq!(max.record(50), 50);
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let mut store = MemoryStore::new();
        store.set(MaxScore::STORAGE_KEY, -40).unwrap();
        let max = MaxScore::new(Box::new(store.clone()));
        assert_eq!(max.read(), 0);

        store.set(MaxScore::STORAGE_KEY, 5_000_000).unwrap();
        assert_eq!(max.read(), MAX_SCORE);
    }
}
