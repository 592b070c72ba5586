//! File-backed world-state snapshot.
//!
//! Lets the command-line tool keep state between runs. The whole world state
//! is loaded into a [`MemoryLedger`] on open and written back by [`save`].
//!
//! File format:
//!
//! ```text
//! magic "FLG\0" | version u8 | count u64 | entries... | crc32 u32
//! entry: key_len u32 | key | value_len u64 | value
//! ```
//!
//! The checksum covers everything between the header and the checksum.
//! Integers are little-endian.
//!
//! [`save`]: SnapshotLedger::save

use super::{Ledger, MemoryLedger, RangeScan};
use crate::error::{LedgerError, LedgerResult};
use fs2::FileExt;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Magic bytes for snapshot files.
const SNAPSHOT_MAGIC: &[u8; 4] = b"FLG\0";

/// Current snapshot format version.
const SNAPSHOT_VERSION: u8 = 1;

/// Header size (magic + version).
const HEADER_SIZE: usize = 5;

/// Ledger persisted to a single snapshot file.
pub struct SnapshotLedger {
    /// Path to the snapshot file.
    path: PathBuf,

    /// Lock file for exclusive access.
    _lock_file: File,

    /// Loaded world state.
    ledger: MemoryLedger,
}

impl SnapshotLedger {
    /// Open the snapshot at `path`, starting empty if the file does not exist.
    pub fn open(path: impl AsRef<Path>) -> LedgerResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let lock_file = Self::acquire_lock(&path)?;

        let ledger = if path.exists() {
            let bytes = fs::read(&path)?;
            let entries = decode(&bytes)?;
            debug!(path = %path.display(), keys = entries.len(), "loaded ledger snapshot");
            MemoryLedger::from_entries(entries)
        } else {
            MemoryLedger::new()
        };

        Ok(Self {
            path,
            _lock_file: lock_file,
            ledger,
        })
    }

    /// Write the current world state back to disk.
    ///
    /// Writes to a temporary file and renames it over the snapshot.
    pub fn save(&self) -> LedgerResult<()> {
        let bytes = encode(&self.ledger.snapshot());
        let tmp_path = sibling(&self.path, ".tmp");

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp_path)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp_path, &self.path)?;
        debug!(path = %self.path.display(), bytes = bytes.len(), "saved ledger snapshot");
        Ok(())
    }

    /// Path of the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The in-memory world state.
    pub fn ledger(&self) -> &MemoryLedger {
        &self.ledger
    }

    fn acquire_lock(path: &Path) -> LedgerResult<File> {
        let lock_file = File::create(sibling(path, ".lock"))?;

        lock_file
            .try_lock_exclusive()
            .map_err(|_| LedgerError::Locked)?;

        Ok(lock_file)
    }
}

impl Ledger for SnapshotLedger {
    fn get_state(&self, key: &str) -> LedgerResult<Option<Vec<u8>>> {
        self.ledger.get_state(key)
    }

    fn put_state(&self, key: &str, value: Vec<u8>) -> LedgerResult<()> {
        self.ledger.put_state(key, value)
    }

    fn range(&self, start: &str, end: &str) -> LedgerResult<RangeScan<'_>> {
        self.ledger.range(start, end)
    }

    fn commit_writes(&self, writes: BTreeMap<String, Vec<u8>>) -> LedgerResult<()> {
        self.ledger.commit_writes(writes)
    }
}

/// `path` with `suffix` appended to its file name.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Serialize a world state.
pub(crate) fn encode(entries: &BTreeMap<String, Vec<u8>>) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&(entries.len() as u64).to_le_bytes());
    for (key, value) in entries {
        body.extend_from_slice(&(key.len() as u32).to_le_bytes());
        body.extend_from_slice(key.as_bytes());
        body.extend_from_slice(&(value.len() as u64).to_le_bytes());
        body.extend_from_slice(value);
    }

    let mut out = Vec::with_capacity(HEADER_SIZE + body.len() + 4);
    out.extend_from_slice(SNAPSHOT_MAGIC);
    out.push(SNAPSHOT_VERSION);
    out.extend_from_slice(&body);
    out.extend_from_slice(&crc32fast::hash(&body).to_le_bytes());
    out
}

/// Parse a world state, verifying magic, version and checksum.
pub(crate) fn decode(bytes: &[u8]) -> LedgerResult<BTreeMap<String, Vec<u8>>> {
    if bytes.len() < HEADER_SIZE + 8 + 4 {
        return Err(LedgerError::InvalidFormat("file too short".into()));
    }
    if &bytes[..4] != SNAPSHOT_MAGIC {
        return Err(LedgerError::InvalidFormat("Invalid snapshot magic".into()));
    }
    if bytes[4] != SNAPSHOT_VERSION {
        return Err(LedgerError::InvalidFormat(format!(
            "Unsupported snapshot version: {}",
            bytes[4]
        )));
    }

    let (body, checksum) = bytes[HEADER_SIZE..].split_at(bytes.len() - HEADER_SIZE - 4);
    let expected = u32::from_le_bytes([checksum[0], checksum[1], checksum[2], checksum[3]]);
    let got = crc32fast::hash(body);
    if expected != got {
        return Err(LedgerError::ChecksumMismatch { expected, got });
    }

    let mut reader = body;
    let count = read_u64(&mut reader)?;
    let mut entries = BTreeMap::new();
    for _ in 0..count {
        let key_len = read_u32(&mut reader)? as usize;
        let key = String::from_utf8(read_bytes(&mut reader, key_len)?)
            .map_err(|_| LedgerError::InvalidFormat("key is not valid UTF-8".into()))?;
        let value_len = read_u64(&mut reader)? as usize;
        let value = read_bytes(&mut reader, value_len)?;
        entries.insert(key, value);
    }

    if !reader.is_empty() {
        return Err(LedgerError::InvalidFormat(format!(
            "{} trailing bytes after last entry",
            reader.len()
        )));
    }

    Ok(entries)
}

fn read_bytes(reader: &mut &[u8], len: usize) -> LedgerResult<Vec<u8>> {
    if reader.len() < len {
        return Err(LedgerError::InvalidFormat("truncated entry".into()));
    }
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

fn read_u32(reader: &mut &[u8]) -> LedgerResult<u32> {
    let bytes = read_bytes(reader, 4)?;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn read_u64(reader: &mut &[u8]) -> LedgerResult<u64> {
    let bytes = read_bytes(reader, 8)?;
    let mut arr = [0u8; 8];
    arr.copy_from_slice(&bytes);
    Ok(u64::from_le_bytes(arr))
}
