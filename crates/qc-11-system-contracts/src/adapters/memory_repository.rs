//! # In-Memory Repository
//!
//! Key-value repository backed by a `HashMap`, for tests and local runs.
//! Production wiring passes the host's state database instead.

use crate::errors::RepositoryError;
use crate::ports::outbound::KeyValueRepository;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Operation counters, useful for asserting which keys a call touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepositoryStats {
    /// Calls to `get`.
    pub gets: u64,
    /// Calls to `put`.
    pub puts: u64,
    /// Calls to `delete`.
    pub deletes: u64,
}

/// In-memory key-value repository.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    data: RwLock<HashMap<Vec<u8>, Vec<u8>>>,
    gets: AtomicU64,
    puts: AtomicU64,
    deletes: AtomicU64,
    fail_writes: AtomicBool,
    put_budget: Mutex<Option<u64>>,
}

impl InMemoryRepository {
    /// Create a new empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// True when nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// True if `key` holds a value.
    #[must_use]
    pub fn contains(&self, key: &[u8]) -> bool {
        self.data.read().contains_key(key)
    }

    /// Snapshot of the operation counters.
    #[must_use]
    pub fn stats(&self) -> RepositoryStats {
        RepositoryStats {
            gets: self.gets.load(Ordering::Relaxed),
            puts: self.puts.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
        }
    }

    /// Makes every subsequent `put` and `delete` fail with an I/O error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }

    /// Lets the next `puts` calls to `put` succeed and fails every one after.
    /// `None` removes the limit.
    pub fn set_fail_after_puts(&self, puts: Option<u64>) {
        *self.put_budget.lock() = puts;
    }

    fn take_put_budget(&self) -> Result<(), RepositoryError> {
        let mut budget = self.put_budget.lock();
        match budget.as_mut() {
            Some(&mut 0) => Err(RepositoryError::Io {
                message: "put budget exhausted".to_string(),
            }),
            Some(remaining) => {
                *remaining -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn check_writable(&self) -> Result<(), RepositoryError> {
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(RepositoryError::Io {
                message: "write rejected".to_string(),
            });
        }
        Ok(())
    }
}

impl KeyValueRepository for InMemoryRepository {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, RepositoryError> {
        self.gets.fetch_add(1, Ordering::Relaxed);
        Ok(self.data.read().get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), RepositoryError> {
        self.puts.fetch_add(1, Ordering::Relaxed);
        self.check_writable()?;
        self.take_put_budget()?;
        self.data.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), RepositoryError> {
        self.deletes.fetch_add(1, Ordering::Relaxed);
        self.check_writable()?;
        self.data.write().remove(key);
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_put_delete() {
        let repo = InMemoryRepository::new();

        repo.put(b"key1", b"value1").unwrap();
        repo.put(b"key2", b"value2").unwrap();

        assert_eq!(repo.get(b"key1").unwrap(), Some(b"value1".to_vec()));
        assert_eq!(repo.get(b"key3").unwrap(), None);
        assert_eq!(repo.len(), 2);

        repo.delete(b"key1").unwrap();
        assert!(!repo.contains(b"key1"));
        repo.delete(b"never-written").unwrap();
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn test_stats_count_calls() {
        let repo = InMemoryRepository::new();
        repo.put(b"a", b"1").unwrap();
        let _ = repo.get(b"a").unwrap();
        repo.delete(b"a").unwrap();
        repo.delete(b"a").unwrap();
        assert_eq!(
            repo.stats(),
            RepositoryStats {
                gets: 1,
                puts: 1,
                deletes: 2,
            }
        );
    }

    #[test]
    fn test_fail_after_puts() {
        let repo = InMemoryRepository::new();
        repo.set_fail_after_puts(Some(2));
        repo.put(b"a", b"1").unwrap();
        repo.put(b"b", b"2").unwrap();
        assert!(matches!(repo.put(b"c", b"3"), Err(RepositoryError::Io { .. })));
        assert!(repo.delete(b"a").is_ok());
        assert_eq!(repo.len(), 1);

        repo.set_fail_after_puts(None);
        repo.put(b"c", b"3").unwrap();
        assert!(repo.contains(b"c"));
    }

    #[test]
    fn test_fail_writes() {
        let repo = InMemoryRepository::new();
        repo.put(b"a", b"1").unwrap();
        repo.set_fail_writes(true);
        assert!(matches!(repo.put(b"b", b"2"), Err(RepositoryError::Io { .. })));
        assert!(repo.delete(b"a").is_err());
        assert_eq!(repo.get(b"a").unwrap(), Some(b"1".to_vec()));
    }
}
