//! Testing utilities and helpers
//!
//! This module provides:
//! - **[`fixtures`]**: Deterministic tokens, profiles, and configuration
//! - **[`mocks`]**: Mock storage, OAuth client, and browser prompt
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use tokenflow_common::auth::SessionController;
//! use tokenflow_common::testing::{fixtures, MockClock, MockOAuthClient, MockPrompt, MockStorage};
//!
//! let storage = Arc::new(MockStorage::new());
//! storage.seed_tokens(&fixtures::saved_tokens());
//!
//! let controller = SessionController::new(
//!     fixtures::auth_config(),
//!     Arc::new(MockOAuthClient::new()),
//!     storage,
//!     Arc::new(MockPrompt::new()),
//! )
//! .with_clock(Arc::new(MockClock::at_epoch_secs(fixtures::ISSUED_AT as u64)));
//! assert!(!controller.is_ready());
//! ```

pub mod fixtures;
pub mod mocks;

pub use mocks::{MockOAuthClient, MockPrompt, MockStorage};

pub use crate::time::{Clock, MockClock, SystemClock};
