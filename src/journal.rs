//! Bounded journal of failures raised in this process.
//!
//! Unrecoverable failures are recorded when raised so that they are still
//! inspectable after the status vector that carried them was handed to the
//! caller and discarded. The journal keeps a fixed number of entries with
//! FIFO eviction, and caps the text stored per entry.
//!
//! # Example
//!
//! ```rust
//! use fb_status::journal::FailureJournal;
//! use fb_status::{Exception, FatalError};
//!
//! let journal = FailureJournal::new(2, 256);
//! for n in 0..3 {
//!     journal.record(&Exception::from(FatalError::new(format!("failure {n}"))));
//! }
//! assert_eq!(journal.len(), 2);
//! assert_eq!(journal.eviction_count(), 1);
//! assert_eq!(journal.get_recent(1)[0].message.as_ref(), "failure 2");
//! ```

use crate::codes::StatusCode;
use crate::config;
use crate::exception::{Exception, ExceptionKind};
use crate::logging::truncate_with_indicator;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{SystemTime, UNIX_EPOCH};

static GLOBAL: OnceLock<FailureJournal> = OnceLock::new();

const TRUNCATION_INDICATOR: &str = "...[TRUNC]";

/// The process journal, sized from [`config::get`] on first use.
pub fn global() -> &'static FailureJournal {
    GLOBAL.get_or_init(|| {
        let config = config::get();
        FailureJournal::new(config.journal_capacity(), config.max_entry_bytes())
    })
}

/// One recorded failure.
///
/// Text fields are `Arc<str>` so snapshots clone by reference count.
#[derive(Clone, Debug)]
pub struct JournalEntry {
    /// Unix timestamp, seconds.
    pub timestamp: u64,
    pub kind: ExceptionKind,
    pub primary_code: Option<StatusCode>,
    pub message: Arc<str>,
    pub syscall: Option<&'static str>,
    pub os_error: Option<i32>,
    /// Approximate stored size.
    pub size_bytes: usize,
}

struct Ring {
    entries: Box<[Option<JournalEntry>]>,
    tail: usize,
    head: usize,
    len: usize,
}

impl Ring {
    fn new(capacity: usize) -> Self {
        Self {
            entries: std::iter::repeat_with(|| None)
                .take(capacity)
                .collect::<Box<[Option<JournalEntry>]>>(),
            tail: 0,
            head: 0,
            len: 0,
        }
    }

    fn push(&mut self, entry: JournalEntry) -> Option<JournalEntry> {
        let evicted = self.entries[self.tail].replace(entry);
        self.tail = (self.tail + 1) % self.entries.len();
        if self.len < self.entries.len() {
            self.len += 1;
        } else {
            self.head = (self.head + 1) % self.entries.len();
        }
        evicted
    }

    fn iter(&self) -> impl DoubleEndedIterator<Item = &JournalEntry> {
        let head = self.head;
        let cap = self.entries.len();
        (0..self.len).filter_map(move |i| self.entries[(head + i) % cap].as_ref())
    }

    fn clear(&mut self) {
        self.entries.iter_mut().for_each(|e| *e = None);
        self.head = 0;
        self.tail = 0;
        self.len = 0;
    }
}

/// Fixed-capacity FIFO of [`JournalEntry`].
///
/// Clones share the same storage.
#[derive(Clone)]
pub struct FailureJournal {
    ring: Arc<RwLock<Ring>>,
    capacity: usize,
    max_entry_bytes: usize,
    eviction_count: Arc<AtomicU64>,
}

impl FailureJournal {
    /// `capacity` is raised to at least one entry.
    pub fn new(capacity: usize, max_entry_bytes: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            ring: Arc::new(RwLock::new(Ring::new(capacity))),
            capacity,
            max_entry_bytes,
            eviction_count: Arc::new(AtomicU64::new(0)),
        }
    }

    #[inline]
    fn read_ring(&self) -> RwLockReadGuard<'_, Ring> {
        match self.ring.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    #[inline]
    fn write_ring(&self) -> RwLockWriteGuard<'_, Ring> {
        match self.ring.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Record a failure, evicting the oldest entry when full.
    pub fn record(&self, exception: &Exception) {
        let entry = self.create_entry(exception);
        if self.write_ring().push(entry).is_some() {
            self.eviction_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn create_entry(&self, exception: &Exception) -> JournalEntry {
        exception.with_diagnostic_log(|log| {
            let message =
                truncate_with_indicator(log.message, self.max_entry_bytes, TRUNCATION_INDICATOR);
            let syscall_len = log.syscall.map_or(0, str::len);
            JournalEntry {
                timestamp: SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map_or(0, |d| d.as_secs()),
                kind: log.kind,
                primary_code: log.primary_code,
                size_bytes: message.len() + syscall_len,
                message: Arc::from(&*message),
                syscall: log.syscall,
                os_error: log.os_error,
            }
        })
    }

    /// The `count` most recent entries, newest first.
    pub fn get_recent(&self, count: usize) -> Vec<JournalEntry> {
        self.read_ring().iter().rev().take(count).cloned().collect()
    }

    /// Every entry, newest first.
    pub fn get_all(&self) -> Vec<JournalEntry> {
        self.read_ring().iter().rev().cloned().collect()
    }

    pub fn get_filtered<F>(&self, predicate: F) -> Vec<JournalEntry>
    where
        F: Fn(&JournalEntry) -> bool,
    {
        self.read_ring().iter().filter(|e| predicate(e)).cloned().collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.read_ring().len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn eviction_count(&self) -> u64 {
        self.eviction_count.load(Ordering::Relaxed)
    }

    pub fn clear(&self) {
        self.write_ring().clear();
    }
}
