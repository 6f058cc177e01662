//! Log-backed persistent store.
//!
//! Layout of a store directory:
//!
//! ```text
//! <path>/
//! ├─ LOCK         # advisory lock for single-process access
//! └─ store.log    # append-only log of put/delete frames
//! ```
//!
//! Every `put` and `delete` appends one frame to the log; the full entry
//! map is replayed into memory on open. A torn frame at the tail (a crash
//! mid-append) is truncated away during replay; a bad frame anywhere else
//! is reported as corruption.

use crate::error::{StoreError, StoreResult};
use crate::kv::KvStore;
use fs2::FileExt;
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

const LOCK_FILE: &str = "LOCK";
const LOG_FILE: &str = "store.log";
const LOG_TEMP: &str = "store.log.tmp";

const TAG_PUT: u8 = 0;
const TAG_DELETE: u8 = 1;

/// Options for opening a [`FileStore`].
#[derive(Debug, Clone)]
pub struct FileStoreOptions {
    /// Whether to create the store directory if it doesn't exist.
    pub create_if_missing: bool,
    /// Whether to fsync the log after every write (safer but slower).
    pub sync_on_write: bool,
}

impl Default for FileStoreOptions {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            sync_on_write: true,
        }
    }
}

/// A persistent key-value store backed by an append-only log.
///
/// The live entry map is kept in memory; the log is the durable record.
/// Reads never touch the disk. [`FileStore::compact`] rewrites the log to
/// the live set, reclaiming space taken by overwritten and deleted keys.
///
/// # Thread Safety
///
/// The store is thread-safe. An advisory file lock prevents two processes
/// from opening the same store directory.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    log: Mutex<File>,
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
    sync_on_write: bool,
    _lock_file: File,
}

enum Frame {
    Put { key: String, value: Vec<u8> },
    Delete { key: String },
}

impl FileStore {
    /// Opens or creates a store at the given directory with default options.
    ///
    /// # Errors
    ///
    /// Returns `Locked` if another process holds the store, `Corrupted` if
    /// the log contains an unreadable frame, or an I/O error.
    pub fn open(path: &Path) -> StoreResult<Self> {
        Self::open_with_options(path, &FileStoreOptions::default())
    }

    /// Opens or creates a store at the given directory.
    ///
    /// # Errors
    ///
    /// Returns an I/O error with kind `NotFound` if the directory is
    /// missing and `create_if_missing` is false; otherwise as [`Self::open`].
    pub fn open_with_options(path: &Path, options: &FileStoreOptions) -> StoreResult<Self> {
        if !path.exists() {
            if options.create_if_missing {
                fs::create_dir_all(path)?;
            } else {
                return Err(StoreError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("store directory does not exist: {}", path.display()),
                )));
            }
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.join(LOCK_FILE))?;
        lock_file
            .try_lock_exclusive()
            .map_err(|_| StoreError::Locked)?;

        let mut log = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.join(LOG_FILE))?;

        let mut data = Vec::new();
        log.seek(SeekFrom::Start(0))?;
        log.read_to_end(&mut data)?;

        let (entries, valid_len) = replay(&data)?;
        if valid_len < data.len() {
            // torn tail from a crash mid-append
            log.set_len(valid_len as u64)?;
            log.sync_all()?;
        }
        log.seek(SeekFrom::End(0))?;

        Ok(Self {
            path: path.to_path_buf(),
            log: Mutex::new(log),
            entries: RwLock::new(entries),
            sync_on_write: options.sync_on_write,
            _lock_file: lock_file,
        })
    }

    /// Returns the store directory path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the current size of the log in bytes.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the log metadata cannot be read.
    pub fn log_size(&self) -> StoreResult<u64> {
        let log = self.log.lock();
        Ok(log.metadata()?.len())
    }

    /// Rewrites the log to contain only the live entries.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the replacement log cannot be written or
    /// swapped into place.
    pub fn compact(&self) -> StoreResult<()> {
        let mut log = self.log.lock();
        let entries = self.entries.read();

        let temp_path = self.path.join(LOG_TEMP);
        let mut temp = File::create(&temp_path)?;
        for (key, value) in entries.iter() {
            temp.write_all(&put_frame(key, value))?;
        }
        temp.sync_all()?;
        drop(temp);

        let log_path = self.path.join(LOG_FILE);
        fs::rename(&temp_path, &log_path)?;

        let mut reopened = OpenOptions::new().read(true).write(true).open(&log_path)?;
        reopened.seek(SeekFrom::End(0))?;
        *log = reopened;

        Ok(())
    }

    /// Appends one frame and applies `update` to the entry map while the
    /// log lock is still held, so log order always matches map state.
    fn append(&self, frame: &[u8], update: impl FnOnce(&mut BTreeMap<String, Vec<u8>>)) -> StoreResult<()> {
        let mut log = self.log.lock();
        log.write_all(frame)?;
        if self.sync_on_write {
            log.sync_data()?;
        }
        update(&mut self.entries.write());
        Ok(())
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> StoreResult<Vec<u8>> {
        self.entries
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::not_found(key))
    }

    fn put(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        self.append(&put_frame(key, value), |entries| {
            entries.insert(key.to_string(), value.to_vec());
        })
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        if !self.entries.read().contains_key(key) {
            return Ok(());
        }
        self.append(&delete_frame(key), |entries| {
            entries.remove(key);
        })
    }

    fn scan(&self) -> StoreResult<Vec<(String, Vec<u8>)>> {
        let entries = self.entries.read();
        Ok(entries
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }
}

fn put_frame(key: &str, value: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(9 + key.len() + value.len());
    frame.push(TAG_PUT);
    frame.extend_from_slice(&(key.len() as u32).to_le_bytes());
    frame.extend_from_slice(key.as_bytes());
    frame.extend_from_slice(&(value.len() as u32).to_le_bytes());
    frame.extend_from_slice(value);
    frame
}

fn delete_frame(key: &str) -> Vec<u8> {
    let mut frame = Vec::with_capacity(5 + key.len());
    frame.push(TAG_DELETE);
    frame.extend_from_slice(&(key.len() as u32).to_le_bytes());
    frame.extend_from_slice(key.as_bytes());
    frame
}

/// Replays the log into an entry map.
///
/// Returns the map and the byte length of the valid prefix; anything past
/// it is an incomplete trailing frame and should be truncated.
fn replay(data: &[u8]) -> StoreResult<(BTreeMap<String, Vec<u8>>, usize)> {
    let mut entries = BTreeMap::new();
    let mut pos = 0;

    while pos < data.len() {
        match parse_frame(&data[pos..])? {
            Some((frame, consumed)) => {
                match frame {
                    Frame::Put { key, value } => {
                        entries.insert(key, value);
                    }
                    Frame::Delete { key } => {
                        entries.remove(&key);
                    }
                }
                pos += consumed;
            }
            None => break,
        }
    }

    Ok((entries, pos))
}

/// Parses one frame from the head of `data`.
///
/// `Ok(None)` means the data ends mid-frame (torn tail); malformed content
/// is an error.
fn parse_frame(data: &[u8]) -> StoreResult<Option<(Frame, usize)>> {
    if data.is_empty() {
        return Ok(None);
    }

    let tag = data[0];
    if tag != TAG_PUT && tag != TAG_DELETE {
        return Err(StoreError::Corrupted(format!("unknown frame tag {tag}")));
    }

    let Some(key_len) = read_len(data, 1) else {
        return Ok(None);
    };
    let key_end = 5 + key_len;
    if data.len() < key_end {
        return Ok(None);
    }
    let key = std::str::from_utf8(&data[5..key_end])
        .map_err(|_| StoreError::Corrupted("frame key is not valid UTF-8".to_string()))?
        .to_string();

    if tag == TAG_DELETE {
        return Ok(Some((Frame::Delete { key }, key_end)));
    }

    let Some(value_len) = read_len(data, key_end) else {
        return Ok(None);
    };
    let value_end = key_end + 4 + value_len;
    if data.len() < value_end {
        return Ok(None);
    }
    let value = data[key_end + 4..value_end].to_vec();

    Ok(Some((Frame::Put { key, value }, value_end)))
}

fn read_len(data: &[u8], at: usize) -> Option<usize> {
    let bytes: [u8; 4] = data.get(at..at + 4)?.try_into().ok()?;
    Some(u32::from_le_bytes(bytes) as usize)
}
