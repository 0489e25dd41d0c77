//! Handler module - event dispatch.
//!
//! Provides:
//! - [`HandlerRegistry`] - maps event names to handlers
//! - [`EventContext`] - name, namespace and raw arguments of an event
//!
//! # Example
//!
//! ```
//! use socketio_ws_client::handler::HandlerRegistry;
//!
//! let mut registry = HandlerRegistry::new();
//!
//! registry.register("news", |data: serde_json::Value, ctx| async move {
//!     println!("{} on {:?}: {}", ctx.name(), ctx.namespace(), data);
//!     Ok(())
//! });
//!
//! assert!(registry.contains("news"));
//! ```

mod context;
mod registry;

pub use context::EventContext;
pub use registry::{BoxFuture, EventHandler, HandlerRegistry, HandlerResult, SharedHandler, TypedHandler};
