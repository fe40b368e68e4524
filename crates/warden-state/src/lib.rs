//! warden-state: domain records and state store for Warden.
//!
//! Backed by [redb](https://docs.rs/redb), provides persistent and in-memory
//! storage for releases, clusters (environments), nodes, node groups,
//! plugins, and vmware attributes.
//!
//! # Architecture
//!
//! All domain types are JSON-serialized into redb's `&[u8]` value columns.
//! Records are keyed by zero-padded numeric id so key order matches id
//! order; cluster/plugin links use `{cluster_id}:{plugin_id}` keys.
//!
//! Validators never see the store directly: they query through the
//! read-only [`Catalog`] trait, which `StateStore` implements.
//!
//! The `StateStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`)
//! and can be shared across async tasks.

pub mod catalog;
pub mod error;
pub mod merge;
pub mod store;
pub mod tables;
pub mod types;

pub use catalog::Catalog;
pub use error::{StateError, StateResult};
pub use merge::deep_merge;
pub use store::StateStore;
pub use types::*;
