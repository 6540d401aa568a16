//! PV en Ligne Core Library
//!
//! UI-agnostic pieces of the `@mention` autocomplete:
//! - Mention trigger detection and commit splicing
//! - Query session state machine with stale-response guard
//! - Cancellable debounce scheduling
//! - User directory lookups (HTTP endpoint or in-memory)
//! - Configuration resolution, error types, tracing setup

pub mod config;
pub mod debounce;
pub mod directory;
pub mod error;
pub mod mention;
pub mod session;
pub mod tracing_init;

pub use config::Config;
pub use directory::{UserDirectory, UserRecord};
pub use error::{Error, Result};
pub use session::{MentionSession, NavKey};
