//! Time abstractions
//!
//! The refresh policy and the token client read wall-clock time through the
//! [`Clock`] trait so that token lifetimes can be exercised deterministically
//! in tests.
//!
//! ```rust
//! use std::time::Duration;
//!
//! use tokenflow_common::time::{Clock, MockClock};
//!
//! let clock = MockClock::at_epoch_secs(1_700_000_000);
//! clock.advance(Duration::from_secs(5));
//! assert_eq!(clock.epoch_secs(), 1_700_000_005);
//! ```

pub mod clock;

pub use clock::{Clock, MockClock, SystemClock};
