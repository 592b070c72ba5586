//! In-memory ledger.
//!
//! Backs the CLI snapshot file and every test. Supports fault injection so
//! callers can exercise the error paths of the contract, and counts open
//! range cursors so tests can assert they are released.

use super::{Ledger, RangeScan};
use crate::error::{LedgerError, LedgerResult};
use crate::types::KeyValue;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashSet};
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Injected failures.
#[derive(Default)]
struct Faults {
    /// Keys whose writes fail.
    failing_puts: HashSet<String>,

    /// Fail every `range` call.
    fail_range_open: bool,

    /// Fail iteration after this many entries have been yielded.
    fail_iteration_after: Option<usize>,
}

/// Ledger holding its world state in a sorted map.
#[derive(Default)]
pub struct MemoryLedger {
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
    faults: RwLock<Faults>,
    open_cursors: Arc<AtomicUsize>,
}

impl MemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ledger pre-populated with `entries`.
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Vec<u8>>,
    {
        let ledger = Self::new();
        {
            let mut map = ledger.entries.write();
            for (key, value) in entries {
                map.insert(key.into(), value.into());
            }
        }
        ledger
    }

    /// Copy of the current world state.
    pub fn snapshot(&self) -> BTreeMap<String, Vec<u8>> {
        self.entries.read().clone()
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Number of range cursors that have not been closed.
    pub fn open_cursors(&self) -> usize {
        self.open_cursors.load(Ordering::SeqCst)
    }

    /// Make writes to `key` fail.
    pub fn fail_puts_for(&self, key: impl Into<String>) {
        self.faults.write().failing_puts.insert(key.into());
    }

    /// Make every `range` call fail.
    pub fn fail_range_open(&self) {
        self.faults.write().fail_range_open = true;
    }

    /// Make scans fail after yielding `count` entries.
    pub fn fail_iteration_after(&self, count: usize) {
        self.faults.write().fail_iteration_after = Some(count);
    }

    /// Remove all injected failures.
    pub fn clear_faults(&self) {
        *self.faults.write() = Faults::default();
    }

    fn check_put(&self, key: &str) -> LedgerResult<()> {
        if key.is_empty() {
            return Err(LedgerError::EmptyKey);
        }
        if self.faults.read().failing_puts.contains(key) {
            return Err(LedgerError::Backend(format!("put of key {} failed", key)));
        }
        Ok(())
    }
}

impl Ledger for MemoryLedger {
    fn get_state(&self, key: &str) -> LedgerResult<Option<Vec<u8>>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn put_state(&self, key: &str, value: Vec<u8>) -> LedgerResult<()> {
        self.check_put(key)?;
        self.entries.write().insert(key.to_string(), value);
        Ok(())
    }

    fn range(&self, start: &str, end: &str) -> LedgerResult<RangeScan<'_>> {
        let faults = self.faults.read();
        if faults.fail_range_open {
            return Err(LedgerError::Backend(format!(
                "failed to open range [{}, {})",
                start, end
            )));
        }

        let upper = if end.is_empty() {
            Bound::Unbounded
        } else if start > end {
            return Ok(RangeScan::empty());
        } else {
            Bound::Excluded(end)
        };

        // Materialize so the read lock is not held across iteration.
        let matched: Vec<KeyValue> = self
            .entries
            .read()
            .range::<str, _>((Bound::Included(start), upper))
            .map(|(k, v)| KeyValue::new(k.clone(), v.clone()))
            .collect();

        let fail_after = faults.fail_iteration_after;
        drop(faults);

        let entries = matched.into_iter().map(Ok);
        let scan = match fail_after {
            Some(count) => RangeScan::new(entries.take(count).chain(std::iter::once(Err(
                LedgerError::Backend("range iteration failed".to_string()),
            )))),
            None => RangeScan::new(entries),
        };

        self.open_cursors.fetch_add(1, Ordering::SeqCst);
        let cursors = Arc::clone(&self.open_cursors);
        Ok(scan.on_close(move || {
            cursors.fetch_sub(1, Ordering::SeqCst);
        }))
    }

    /// Validates every write before applying any, so a failing batch leaves
    /// the world state untouched.
    fn commit_writes(&self, writes: BTreeMap<String, Vec<u8>>) -> LedgerResult<()> {
        for key in writes.keys() {
            self.check_put(key)?;
        }
        self.entries.write().extend(writes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(scan: RangeScan<'_>) -> Vec<String> {
        scan.map(|kv| kv.unwrap().key).collect()
    }

    #[test]
    fn test_get_missing_key() {
        let ledger = MemoryLedger::new();
        assert_eq!(ledger.get_state("nope").unwrap(), None);
    }

    #[test]
    fn test_put_overwrites() {
        let ledger = MemoryLedger::new();
        ledger.put_state("k", b"1".to_vec()).unwrap();
        ledger.put_state("k", b"2".to_vec()).unwrap();
        assert_eq!(ledger.get_state("k").unwrap(), Some(b"2".to_vec()));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_empty_key_rejected() {
        let ledger = MemoryLedger::new();
        assert!(matches!(
            ledger.put_state("", b"x".to_vec()),
            Err(LedgerError::EmptyKey)
        ));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_range_is_half_open_and_lexicographic() {
        let ledger = MemoryLedger::from_entries([
            ("FIDO0", "a"),
            ("FIDO10", "b"),
            ("FIDO2", "c"),
            ("FIDO999", "d"),
            ("FIDP", "e"),
            ("A", "f"),
        ]);

        let found = keys(ledger.range("FIDO0", "FIDO999").unwrap());
        assert_eq!(found, vec!["FIDO0", "FIDO10", "FIDO2"]);
    }

    #[test]
    fn test_range_unbounded_end() {
        let ledger = MemoryLedger::from_entries([("a", "1"), ("b", "2"), ("c", "3")]);
        assert_eq!(keys(ledger.range("b", "").unwrap()), vec!["b", "c"]);
    }

    #[test]
    fn test_range_inverted_bounds_is_empty() {
        let ledger = MemoryLedger::from_entries([("a", "1"), ("z", "2")]);
        assert!(keys(ledger.range("z", "a").unwrap()).is_empty());
    }

    #[test]
    fn test_cursor_accounting() {
        let ledger = MemoryLedger::from_entries([("a", "1")]);
        let scan = ledger.range("a", "b").unwrap();
        assert_eq!(ledger.open_cursors(), 1);
        drop(scan);
        assert_eq!(ledger.open_cursors(), 0);
    }

    #[test]
    fn test_fail_iteration_after() {
        let ledger = MemoryLedger::from_entries([("a", "1"), ("b", "2"), ("c", "3")]);
        ledger.fail_iteration_after(1);

        let results: Vec<_> = ledger.range("a", "z").unwrap().collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }

    #[test]
    fn test_batch_commit_is_atomic() {
        let ledger = MemoryLedger::new();
        ledger.fail_puts_for("b");

        let mut writes = BTreeMap::new();
        writes.insert("a".to_string(), b"1".to_vec());
        writes.insert("b".to_string(), b"2".to_vec());

        assert!(ledger.commit_writes(writes).is_err());
        assert!(ledger.is_empty());

        ledger.clear_faults();
        ledger.put_state("b", b"2".to_vec()).unwrap();
        assert_eq!(ledger.len(), 1);
    }
}
