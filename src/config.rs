//! Process-lifetime configuration.
//!
//! The configuration is installed at most once with [`init`] and is
//! read-only afterwards. The first call to [`get`] freezes the defaults, so
//! `init` must run before any error is raised if it is to take effect.
//!
//! ```rust
//! use fb_status::config::{self, BoundaryConfig};
//! use fb_status::ENGINE_MESSAGES;
//!
//! let installed = config::init(
//!     BoundaryConfig::new()
//!         .with_journal_capacity(256)
//!         .with_catalog(&ENGINE_MESSAGES),
//! );
//! assert!(installed.is_ok());
//! assert_eq!(config::get().journal_capacity(), 256);
//! ```

use crate::message::{MessageCatalog, NoCatalog};
use std::fmt;
use std::sync::OnceLock;

/// Smallest accepted per-entry journal limit.
pub const MIN_ENTRY_BYTES: usize = 32;

static CONFIG: OnceLock<BoundaryConfig> = OnceLock::new();

/// Read-only settings shared by the boundary, the journal and rendering.
#[derive(Clone, Copy)]
pub struct BoundaryConfig {
    diagnostic_build: bool,
    journal_capacity: usize,
    max_entry_bytes: usize,
    catalog: &'static (dyn MessageCatalog + Sync),
}

impl BoundaryConfig {
    /// Defaults: 1024 journal entries of at most 2 KiB, no message catalog.
    ///
    /// `diagnostic_build` follows the `dev_build` feature.
    pub const fn new() -> Self {
        Self {
            diagnostic_build: cfg!(feature = "dev_build"),
            journal_capacity: 1024,
            max_entry_bytes: 2048,
            catalog: &NoCatalog,
        }
    }

    /// Abort the process after recording a `SystemCallFailed`.
    pub const fn with_diagnostic_build(mut self, enabled: bool) -> Self {
        self.diagnostic_build = enabled;
        self
    }

    pub const fn with_journal_capacity(mut self, entries: usize) -> Self {
        self.journal_capacity = entries;
        self
    }

    pub const fn with_max_entry_bytes(mut self, bytes: usize) -> Self {
        self.max_entry_bytes = bytes;
        self
    }

    pub const fn with_catalog(mut self, catalog: &'static (dyn MessageCatalog + Sync)) -> Self {
        self.catalog = catalog;
        self
    }

    #[inline]
    pub const fn diagnostic_build(&self) -> bool {
        self.diagnostic_build
    }

    #[inline]
    pub const fn journal_capacity(&self) -> usize {
        self.journal_capacity
    }

    #[inline]
    pub const fn max_entry_bytes(&self) -> usize {
        self.max_entry_bytes
    }

    #[inline]
    pub fn catalog(&self) -> &'static dyn MessageCatalog {
        self.catalog
    }

    /// Check limits before installation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.journal_capacity == 0 {
            return Err(ConfigError::ZeroJournalCapacity);
        }
        if self.max_entry_bytes < MIN_ENTRY_BYTES {
            return Err(ConfigError::EntryLimitTooSmall {
                requested: self.max_entry_bytes,
                minimum: MIN_ENTRY_BYTES,
            });
        }
        Ok(())
    }
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BoundaryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundaryConfig")
            .field("diagnostic_build", &self.diagnostic_build)
            .field("journal_capacity", &self.journal_capacity)
            .field("max_entry_bytes", &self.max_entry_bytes)
            .finish_non_exhaustive()
    }
}

/// Failure to install a configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A configuration is already in place (installed or frozen by first use).
    AlreadyInitialized,
    /// The journal must hold at least one entry.
    ZeroJournalCapacity,
    /// Per-entry limit below [`MIN_ENTRY_BYTES`].
    EntryLimitTooSmall { requested: usize, minimum: usize },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyInitialized => f.write_str("boundary configuration is already initialized"),
            Self::ZeroJournalCapacity => f.write_str("journal capacity must be at least 1"),
            Self::EntryLimitTooSmall { requested, minimum } => write!(
                f,
                "journal entry limit {requested} is below the minimum of {minimum} bytes"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

fn install(cell: &OnceLock<BoundaryConfig>, config: BoundaryConfig) -> Result<(), ConfigError> {
    config.validate()?;
    cell.set(config).map_err(|_| ConfigError::AlreadyInitialized)
}

/// Install the process configuration.
pub fn init(config: BoundaryConfig) -> Result<(), ConfigError> {
    install(&CONFIG, config)?;
    log::debug!("boundary configuration installed: {config:?}");
    Ok(())
}

/// The active configuration; defaults if [`init`] was never called.
pub fn get() -> &'static BoundaryConfig {
    CONFIG.get_or_init(BoundaryConfig::new)
}
