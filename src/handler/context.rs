//! Event context for handlers.
//!
//! Handlers receive their first argument already decoded; the context
//! carries everything else about the event:
//! - `name` / `namespace` - where the event came from
//! - `args` - every argument, as raw JSON
//! - `ack_id` - acknowledgement id requested by the server
//!
//! # Example
//!
//! ```ignore
//! async fn on_move(x: i32, ctx: EventContext) -> HandlerResult {
//!     let y: i32 = ctx.arg(1)?;
//!     println!("{} moved to {},{}", ctx.namespace(), x, y);
//!     Ok(())
//! }
//! ```

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::codec::Event;
use crate::error::{Result, SocketIoError};

/// Context passed to event handlers.
#[derive(Debug, Clone, PartialEq)]
pub struct EventContext {
    name: String,
    namespace: String,
    args: Vec<Value>,
    ack_id: Option<String>,
}

impl EventContext {
    /// Create a context for an event.
    pub fn new(name: impl Into<String>, namespace: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            args,
            ack_id: None,
        }
    }

    /// Create a context from a decoded event.
    pub fn from_event(event: &Event) -> Self {
        Self {
            name: event.name.clone(),
            namespace: event.namespace.clone(),
            args: event.args.clone(),
            ack_id: event.id.clone(),
        }
    }

    /// Event name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Namespace the event arrived on. Empty for the default namespace.
    #[inline]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// All arguments, in order.
    #[inline]
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Acknowledgement id, if the server asked for one.
    #[inline]
    pub fn ack_id(&self) -> Option<&str> {
        self.ack_id.as_deref()
    }

    /// Decode argument `index`.
    pub fn arg<T: DeserializeOwned>(&self, index: usize) -> Result<T> {
        let value = self.args.get(index).cloned().ok_or_else(|| {
            SocketIoError::InvalidArgument(format!(
                "event {:?} has no argument {}",
                self.name, index
            ))
        })?;

        Ok(serde_json::from_value(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_context_creation() {
        let ctx = EventContext::new("news", "/chat", vec![json!(1), json!("two")]);
        assert_eq!(ctx.name(), "news");
        assert_eq!(ctx.namespace(), "/chat");
        assert_eq!(ctx.args().len(), 2);
        assert_eq!(ctx.ack_id(), None);
    }

    #[test]
    fn test_from_event_keeps_ack_id() {
        let event = Event {
            name: "news".to_string(),
            namespace: String::new(),
            args: vec![json!(true)],
            id: Some("12".to_string()),
        };

        let ctx = EventContext::from_event(&event);
        assert_eq!(ctx.ack_id(), Some("12"));
        assert_eq!(ctx.args(), &[json!(true)]);
    }

    #[test]
    fn test_typed_arguments() {
        let ctx = EventContext::new("move", "", vec![json!(3), json!(4)]);
        assert_eq!(ctx.arg::<i32>(1).unwrap(), 4);
        assert!(matches!(
            ctx.arg::<i32>(2),
            Err(SocketIoError::InvalidArgument(_))
        ));
        assert!(matches!(ctx.arg::<String>(0), Err(SocketIoError::Json(_))));
    }

    #[test]
    fn test_context_is_clone() {
        let ctx = EventContext::new("news", "", vec![]);
        let cloned = ctx.clone();
        assert_eq!(ctx, cloned);
    }
}
