//! # fb_status
//!
//! Status-vector error marshaling between a native database client library
//! and host code.
//!
//! The client library reports failures as a flat run of integers: error
//! codes, warning codes and their arguments, each introduced by a marker word,
//! with string arguments kept in a side-table. This crate turns those vectors
//! into owned, inspectable errors and back, and makes sure no failure unwinds
//! across the native/host boundary.
//!
//! ## Design Philosophy
//!
//! 1. **Records own their data.** Decoding copies strings out of the native
//!    buffer, so a record stays valid after the buffer is reused.
//! 2. **Decoding fails closed.** Malformed or cut-off input yields a partial
//!    record flagged as truncated; nothing past the slice is ever read.
//! 3. **Failure is a value.** Every operation returns [`Result<T>`]; the
//!    boundary is the single place where failures are caught.
//! 4. **Out-of-memory is reportable.** [`BadAllocation`] is built, described
//!    and serialized without touching the heap.
//! 5. **Argument text is zeroized.** Owned strings in records are wiped on drop.
//!
//! ## Quick Start
//!
//! ```rust
//! use fb_status::{check_status, RawStatus, Boundary, Crossing, LocalStatus, markers::*};
//!
//! // Inbound: a vector returned by the native library.
//! let strings = ["connection lost"];
//! let words = [ARG_GDS, 335544321, ARG_STRING, 0, ARG_END];
//! let err = check_status(RawStatus::new(&words, &strings)).unwrap_err();
//! assert_eq!(err.record().and_then(|r| r.primary_code()).map(|c| c.raw()), Some(335544321));
//!
//! // Outbound: native work run behind a boundary.
//! let boundary = Boundary::new();
//! let mut status = LocalStatus::new();
//! let crossing = boundary.call(&mut status, |checkpoint| {
//!     checkpoint.check()?;
//!     check_status(RawStatus::new(&words, &strings))?;
//!     Ok(())
//! });
//! let Crossing::Failed(description) = crossing else { unreachable!() };
//! assert!(description.message.contains("connection lost"));
//! assert!(!description.fatal);
//! ```
//!
//! ## Features
//!
//! - `dev_build`: a [`SystemCallFailed`] aborts the process after it is
//!   recorded, leaving a core dump for post-mortem analysis
//! - `tokio`: [`call_blocking`] runs boundary calls on tokio's blocking pool

#![warn(clippy::all)]

use std::result;

pub mod boundary;
pub mod codes;
pub mod config;
pub mod convenience;
pub mod exception;
pub mod interface;
pub mod journal;
pub mod logging;
pub mod message;
pub mod record;
pub mod status;

pub use boundary::*;
pub use codes::*;
pub use convenience::*;
pub use exception::*;
pub use interface::*;
pub use logging::*;
pub use message::*;
pub use record::*;
pub use status::*;

/// Type alias for Results using our error type.
pub type Result<T> = result::Result<T, Exception>;
