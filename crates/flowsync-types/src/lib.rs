//! # Flowsync Types
//!
//! Domain models and configuration for the Flowsync ecosystem.
//!
//! This crate provides the foundational type system:
//!
//! - **`models`** - Domain models (FlowDocument, TrackedEntity, Decision)
//! - **`settings`** - Daemon configuration loaded from `config.json`
//!
//! ## Architecture Role
//!
//! `flowsync-types` sits at the bottom of the dependency graph:
//!
//! ```text
//!        flowsync-types (this crate)
//!                │
//!                ▼
//!         flowsync-core
//!                │
//!                ▼
//!        flowsync-daemon
//! ```
//!
//! All types are designed to be:
//! - **Serializable** via serde where they cross a file or wire boundary
//! - **Clone** for cheap sharing across async boundaries
//! - **PartialEq** for testing and comparison

pub mod models;
pub mod settings;

pub use models::{
    format_gmt_modified, hash_content, parse_gmt_modified, Decision, FlowDocument, Origin,
    SkipReason, SyncDirection, TrackedEntity, TIMESTAMP_FORMAT,
};
pub use settings::{BotEntry, SyncSettings};
