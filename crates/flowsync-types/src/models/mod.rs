//! Domain models for Flowsync.

mod document;
mod entity;

pub use document::{
    format_gmt_modified, hash_content, parse_gmt_modified, FlowDocument, TIMESTAMP_FORMAT,
};
pub use entity::{Decision, Origin, SkipReason, SyncDirection, TrackedEntity};
