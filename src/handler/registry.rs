//! Handler registry for dispatching incoming events by name.
//!
//! Several handlers may listen to one event; they run in registration
//! order. Registering the same shared handler twice for an event is a
//! no-op.
//!
//! # Example
//!
//! ```
//! use socketio_ws_client::handler::HandlerRegistry;
//!
//! let mut registry = HandlerRegistry::new();
//!
//! let handler = registry.register("pong", |data: String, _ctx| async move {
//!     println!("pong: {}", data);
//!     Ok(())
//! });
//!
//! // Duplicates are skipped.
//! assert!(!registry.add("pong", handler));
//! assert_eq!(registry.handlers("pong").len(), 1);
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::EventContext;
use crate::codec::Event;
use crate::error::Result;

/// Result type for handler functions.
pub type HandlerResult = Result<()>;

/// Boxed future for handler results.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Trait for event handlers.
pub trait EventHandler: Send + Sync + 'static {
    /// Handle an event given its first argument as raw JSON.
    fn call(&self, data: Value, ctx: EventContext) -> BoxFuture<'static, HandlerResult>;
}

/// Wrapper that deserializes the first argument before calling the handler.
pub struct TypedHandler<F, T, Fut>
where
    F: Fn(T, EventContext) -> Fut + Send + Sync + 'static,
    T: DeserializeOwned + Send + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    handler: F,
    _phantom: PhantomData<fn(T) -> Fut>,
}

impl<F, T, Fut> TypedHandler<F, T, Fut>
where
    F: Fn(T, EventContext) -> Fut + Send + Sync + 'static,
    T: DeserializeOwned + Send + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    /// Create a new typed handler.
    pub fn new(handler: F) -> Self {
        Self {
            handler,
            _phantom: PhantomData,
        }
    }
}

impl<F, T, Fut> EventHandler for TypedHandler<F, T, Fut>
where
    F: Fn(T, EventContext) -> Fut + Send + Sync + 'static,
    T: DeserializeOwned + Send + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, data: Value, ctx: EventContext) -> BoxFuture<'static, HandlerResult> {
        let parsed: T = match serde_json::from_value(data) {
            Ok(v) => v,
            Err(e) => return Box::pin(async move { Err(e.into()) }),
        };

        Box::pin((self.handler)(parsed, ctx))
    }
}

/// Shared handler, compared by identity when deduplicating.
pub type SharedHandler = Arc<dyn EventHandler>;

/// Registry mapping event names to handlers.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Vec<SharedHandler>>,
}

impl HandlerRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a closure for `event`.
    ///
    /// Returns the shared handler so it can be added to other events or
    /// other registries.
    pub fn register<F, T, Fut>(&mut self, event: &str, handler: F) -> SharedHandler
    where
        F: Fn(T, EventContext) -> Fut + Send + Sync + 'static,
        T: DeserializeOwned + Send + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let shared: SharedHandler = Arc::new(TypedHandler::new(handler));
        self.add(event, shared.clone());
        shared
    }

    /// Add a shared handler for `event`.
    ///
    /// Returns false if this exact handler is already registered for it.
    pub fn add(&mut self, event: &str, handler: SharedHandler) -> bool {
        let entries = self.handlers.entry(event.to_string()).or_default();
        if entries.iter().any(|h| same_handler(h, &handler)) {
            tracing::debug!(event, "skipping duplicate handler");
            return false;
        }
        entries.push(handler);
        true
    }

    /// Handlers registered for `event`, in registration order.
    pub fn handlers(&self, event: &str) -> &[SharedHandler] {
        self.handlers.get(event).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether any handler listens to `event`.
    pub fn contains(&self, event: &str) -> bool {
        !self.handlers(event).is_empty()
    }

    /// Whether no handler is registered at all.
    pub fn is_empty(&self) -> bool {
        self.handlers.values().all(Vec::is_empty)
    }

    /// Run every handler of `event` in order and return how many ran.
    ///
    /// A failing handler is logged and does not stop the others.
    pub async fn dispatch(&self, event: &Event) -> usize {
        let handlers = self.handlers(&event.name);

        for handler in handlers {
            let ctx = EventContext::from_event(event);
            if let Err(e) = handler.call(event.first_arg(), ctx).await {
                tracing::warn!(event = %event.name, error = %e, "event handler failed");
            }
        }

        handlers.len()
    }
}

fn same_handler(a: &SharedHandler, b: &SharedHandler) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn event(name: &str, args: Vec<Value>) -> Event {
        Event {
            name: name.to_string(),
            namespace: String::new(),
            args,
            id: None,
        }
    }

    #[test]
    fn test_register() {
        let mut registry = HandlerRegistry::new();
        assert!(registry.is_empty());

        registry.register("news", |_data: Value, _ctx| async { Ok(()) });

        assert!(registry.contains("news"));
        assert!(!registry.contains("other"));
        assert!(!registry.is_empty());
        assert!(registry.handlers("other").is_empty());
    }

    #[test]
    fn test_duplicate_shared_handler_is_skipped() {
        let mut registry = HandlerRegistry::new();

        let handler = registry.register("pong", |_: Value, _ctx| async { Ok(()) });
        assert!(!registry.add("pong", handler.clone()));
        assert_eq!(registry.handlers("pong").len(), 1);

        // Same handler on another event is fine.
        assert!(registry.add("ping", handler));
        assert_eq!(registry.handlers("ping").len(), 1);
    }

    #[test]
    fn test_distinct_closures_are_not_duplicates() {
        let mut registry = HandlerRegistry::new();

        registry.register("pong", |_: Value, _ctx| async { Ok(()) });
        registry.register("pong", |_: Value, _ctx| async { Ok(()) });

        assert_eq!(registry.handlers("pong").len(), 2);
    }

    #[tokio::test]
    async fn test_dispatch_typed_first_argument() {
        #[derive(Deserialize)]
        struct Greeting {
            hello: String,
        }

        let seen = Arc::new(AtomicUsize::new(0));
        let mut registry = HandlerRegistry::new();

        let counter = seen.clone();
        registry.register("news", move |data: Greeting, ctx| {
            let counter = counter.clone();
            async move {
                assert_eq!(data.hello, "world");
                assert_eq!(ctx.args().len(), 2);
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        let ran = registry
            .dispatch(&event("news", vec![json!({"hello": "world"}), json!(2)]))
            .await;

        assert_eq!(ran, 1);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dispatch_without_arguments_passes_null() {
        let mut registry = HandlerRegistry::new();
        registry.register("tick", |data: Option<String>, _ctx| async move {
            assert!(data.is_none());
            Ok(())
        });

        assert_eq!(registry.dispatch(&event("tick", vec![])).await, 1);
    }

    #[tokio::test]
    async fn test_failing_handler_does_not_stop_others() {
        let seen = Arc::new(AtomicUsize::new(0));
        let mut registry = HandlerRegistry::new();

        // Expects a number but receives a string.
        registry.register("news", |_: u32, _ctx| async { Ok(()) });

        let counter = seen.clone();
        registry.register("news", move |_: Value, _ctx| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        let ran = registry.dispatch(&event("news", vec![json!("text")])).await;
        assert_eq!(ran, 2);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dispatch_unknown_event() {
        let registry = HandlerRegistry::new();
        assert_eq!(registry.dispatch(&event("nobody", vec![])).await, 0);
    }
}
