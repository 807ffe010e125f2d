//! # dictmsgr-core
//!
//! A hierarchical key-value context tree with change callbacks.
//!
//! This crate provides:
//! - A tree of named mappings addressed by slash-separated topics
//! - Per-node subscriptions keyed by leaf segment
//! - Synchronous, in-order callback dispatch on every write
//! - JSON seeding and snapshots
//!
//! The tree is meant to be embedded as shared mutable state inside a single
//! processing loop. It is single-threaded and contains no async code.
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use dictmsgr_core::Context;
//!
//! let ctx = Context::<i64>::new();
//! ctx.set("global_iters", 0)?;
//!
//! let seen = Rc::new(Cell::new(0));
//! let sink = Rc::clone(&seen);
//! ctx.subscribe("global_iters", move |_root, value| {
//!     if let Some(v) = value.as_leaf() {
//!         sink.set(*v);
//!     }
//! })?;
//!
//! ctx.modify("global_iters", |n| n + 1)?;
//! assert_eq!(seen.get(), 1);
//!
//! ctx.set("batch/img_metas", 7)?;
//! assert_eq!(ctx.get_leaf("batch/img_metas")?, 7);
//! # Ok::<(), dictmsgr_core::ContextError>(())
//! ```

pub mod error;
pub mod json;
pub mod node;
pub mod path;
mod resolve;
pub mod store;
pub mod subscription;

pub use error::{ContextError, Result};
pub use node::{Context, Entry};
pub use path::{Topic, DELIMITER};
pub use store::Seed;
pub use subscription::Callback;
