//! # Flowsync Core
//!
//! Bidirectional sync between a remote bot-platform API and a local
//! filesystem mirror of flow descriptors.
//!
//! ## Architecture
//!
//! ```text
//! flowsync-core/src/
//! ├── engine.rs    # Sync decisions + per-entity critical section
//! ├── store.rs     # EntityStore: per-id locked TrackedEntity records
//! ├── gateway.rs   # RemoteGateway trait + HTTP implementation
//! ├── mirror.rs    # LocalMirror: input writes, output reads
//! ├── watcher.rs   # notify-based output-directory change events
//! ├── puller.rs    # Periodic remote → local driver
//! ├── pusher.rs    # Event-driven local → remote driver
//! ├── config.rs    # Settings loading and validation
//! └── error.rs     # SyncError taxonomy
//! ```
//!
//! Both drivers funnel through [`engine::SyncEngine`], which owns the
//! [`store::EntityStore`], the single source of truth for what was last
//! synced per entity.

pub mod config;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod mirror;
pub mod puller;
pub mod pusher;
pub mod store;
pub mod watcher;

pub use config::load_settings;
pub use engine::SyncEngine;
pub use error::{SyncError, SyncResult};
pub use gateway::{HttpGateway, RemoteFlow, RemoteGateway};
pub use mirror::{LocalMirror, MirrorDocument};
pub use puller::Puller;
pub use pusher::Pusher;
pub use store::EntityStore;
pub use watcher::{watch_output, OutputWatcher};
