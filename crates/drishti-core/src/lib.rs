//! Issue lifecycle core for the Jan Drishti civic reporting service.
//!
//! Citizens report civic problems; administrators move them through the
//! `open -> pending -> resolved / rejected` lifecycle. The authoritative
//! records live in an [`store::IssueStore`]; each connected client holds
//! a view-scoped [`cache::IssueCache`] seeded by a fetch and kept current
//! by reconciling events from the [`channel::RealtimeChannel`].
//!
//! # Conventions
//!
//! - **Errors**: the [`error::Error`] taxonomy at the contract surface;
//!   `anyhow::Result` with context inside store plumbing.
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `debug!`, `trace!`).

pub mod backend;
pub mod cache;
pub mod channel;
pub mod config;
pub mod error;
pub mod event;
pub mod lifecycle;
pub mod model;
pub mod session;
pub mod store;

pub use error::{Error, Result};
