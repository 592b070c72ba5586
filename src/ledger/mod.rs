//! Key/value ledger interface.
//!
//! The contract never owns state. Every operation receives a [`Ledger`] and
//! reads or writes through it; durability and ordering belong to whatever
//! sits behind the trait.

mod memory;
mod snapshot;

pub use memory::MemoryLedger;
pub use snapshot::SnapshotLedger;

use crate::error::LedgerResult;
use crate::types::KeyValue;
use std::collections::BTreeMap;

/// Access to the ledger's world state.
pub trait Ledger: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// Returns `Ok(None)` if the key does not exist.
    fn get_state(&self, key: &str) -> LedgerResult<Option<Vec<u8>>>;

    /// Write `value` under `key`, replacing any existing value.
    fn put_state(&self, key: &str, value: Vec<u8>) -> LedgerResult<()>;

    /// Open a scan over keys in `[start, end)`, in lexicographic order.
    ///
    /// An empty `end` leaves the scan unbounded above.
    fn range(&self, start: &str, end: &str) -> LedgerResult<RangeScan<'_>>;

    /// Apply a batch of writes.
    ///
    /// The default applies them one by one; backends that can apply a batch
    /// atomically should override this.
    fn commit_writes(&self, writes: BTreeMap<String, Vec<u8>>) -> LedgerResult<()> {
        for (key, value) in writes {
            self.put_state(&key, value)?;
        }
        Ok(())
    }
}

/// An open range cursor.
///
/// Yields entries until exhausted or until the backend reports an error.
/// The backend-side cursor is released when the scan is dropped, on every
/// exit path.
pub struct RangeScan<'a> {
    entries: Box<dyn Iterator<Item = LedgerResult<KeyValue>> + Send + 'a>,
    on_close: Option<Box<dyn FnOnce() + Send + 'a>>,
}

impl<'a> RangeScan<'a> {
    /// Wrap an iterator of entries.
    pub fn new<I>(entries: I) -> Self
    where
        I: Iterator<Item = LedgerResult<KeyValue>> + Send + 'a,
    {
        Self {
            entries: Box::new(entries),
            on_close: None,
        }
    }

    /// A scan that yields nothing.
    pub fn empty() -> Self {
        Self::new(std::iter::empty())
    }

    /// Run `hook` when the scan is closed or dropped.
    pub fn on_close(mut self, hook: impl FnOnce() + Send + 'a) -> Self {
        self.on_close = Some(Box::new(hook));
        self
    }

    /// Close the cursor explicitly.
    pub fn close(self) {}
}

impl Iterator for RangeScan<'_> {
    type Item = LedgerResult<KeyValue>;

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next()
    }
}

impl Drop for RangeScan<'_> {
    fn drop(&mut self) {
        if let Some(hook) = self.on_close.take() {
            hook();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_close_hook_runs_on_drop() {
        let closed = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&closed);
        let scan = RangeScan::new(vec![Ok(KeyValue::new("a", b"1".to_vec()))].into_iter())
            .on_close(move || flag.store(true, Ordering::SeqCst));

        assert!(!closed.load(Ordering::SeqCst));
        scan.close();
        assert!(closed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_empty_scan() {
        assert_eq!(RangeScan::empty().count(), 0);
    }

    /// Forwards everything except `commit_writes`.
    struct Unbatched(MemoryLedger);

    impl Ledger for Unbatched {
        fn get_state(&self, key: &str) -> LedgerResult<Option<Vec<u8>>> {
            self.0.get_state(key)
        }

        fn put_state(&self, key: &str, value: Vec<u8>) -> LedgerResult<()> {
            self.0.put_state(key, value)
        }

        fn range(&self, start: &str, end: &str) -> LedgerResult<RangeScan<'_>> {
            self.0.range(start, end)
        }
    }

    #[test]
    fn test_default_commit_writes_stops_at_first_failure() {
        let ledger = Unbatched(MemoryLedger::new());
        ledger.0.fail_puts_for("b");

        let mut writes = BTreeMap::new();
        writes.insert("a".to_string(), b"1".to_vec());
        writes.insert("b".to_string(), b"2".to_vec());
        writes.insert("c".to_string(), b"3".to_vec());

        assert!(ledger.commit_writes(writes).is_err());
        assert_eq!(ledger.get_state("a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(ledger.get_state("b").unwrap(), None);
        assert_eq!(ledger.get_state("c").unwrap(), None);
    }
}
