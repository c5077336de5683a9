//! Error types used by the dispatcher and by handlers.
//!
//! This module defines two main error enums:
//!
//! - [`DispatchError`]: errors returned synchronously to the caller of a
//!   [`Dispatcher`](crate::Dispatcher) operation.
//! - [`HandlerError`]: errors raised while a handler processes one event.
//!   They never reach the caller of `post`; they abort the current delivery and
//!   are reported through [`DeliveryFailure`](crate::DeliveryFailure).
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging/metrics.

use thiserror::Error;

use crate::events::EventType;

/// # Errors returned by dispatcher operations.
///
/// Raised synchronously at the call that violates the contract; the registry
/// and the runner are left unchanged.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The same handler is already subscribed to this event type.
    #[error("handler {handler} already subscribed to event {event_type}")]
    DuplicateSubscriber {
        /// Name of the rejected handler.
        handler: String,
        /// Event type the handler was registered for.
        event_type: EventType,
    },

    /// The dispatcher was shut down; the operation was not performed.
    #[error("dispatcher is shut down; {operation} rejected")]
    Closed {
        /// Operation that was rejected (`post`, `subscribe`).
        operation: &'static str,
    },

    /// Waiting for termination was interrupted by a termination signal.
    ///
    /// Pending deliveries that had not started were discarded.
    #[error("interrupted while awaiting termination; pending deliveries discarded")]
    Interrupted,
}

impl DispatchError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use typebus::DispatchError;
    ///
    /// let err = DispatchError::Closed { operation: "post" };
    /// assert_eq!(err.as_label(), "dispatch_closed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            DispatchError::DuplicateSubscriber { .. } => "dispatch_duplicate_subscriber",
            DispatchError::Closed { .. } => "dispatch_closed",
            DispatchError::Interrupted => "dispatch_interrupted",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            DispatchError::DuplicateSubscriber {
                handler,
                event_type,
            } => format!("duplicate: handler={handler} event={event_type}"),
            DispatchError::Closed { operation } => format!("closed: {operation}"),
            DispatchError::Interrupted => "interrupted".to_string(),
        }
    }
}

/// # Errors produced while a handler processes an event.
///
/// Any of these aborts the delivery it occurred in: handlers registered after
/// the failing one do not see the event.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// The handler returned an error.
    #[error("handler failed: {error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },

    /// The handler panicked.
    #[error("handler panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },

    /// The routed event was not of the type the handler accepts.
    #[error("event is not a {expected}")]
    TypeMismatch {
        /// Type name the handler expected.
        expected: &'static str,
    },
}

impl HandlerError {
    /// Builds a [`HandlerError::Failed`] from anything printable.
    pub fn failed(error: impl std::fmt::Display) -> Self {
        HandlerError::Failed {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use typebus::HandlerError;
    ///
    /// let err = HandlerError::failed("boom");
    /// assert_eq!(err.as_label(), "handler_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            HandlerError::Failed { .. } => "handler_failed",
            HandlerError::Panicked { .. } => "handler_panicked",
            HandlerError::TypeMismatch { .. } => "handler_type_mismatch",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            HandlerError::Failed { error } => format!("error: {error}"),
            HandlerError::Panicked { info } => format!("panic: {info}"),
            HandlerError::TypeMismatch { expected } => format!("expected: {expected}"),
        }
    }

    /// Renders a caught panic payload as a `Panicked` error.
    pub(crate) fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let info = if let Some(msg) = payload.downcast_ref::<&'static str>() {
            (*msg).to_string()
        } else if let Some(msg) = payload.downcast_ref::<String>() {
            msg.clone()
        } else {
            "unknown panic".to_string()
        };
        HandlerError::Panicked { info }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_stable() {
        let dup = DispatchError::DuplicateSubscriber {
            handler: "h".into(),
            event_type: EventType::of::<u8>(),
        };
        assert_eq!(dup.as_label(), "dispatch_duplicate_subscriber");
        assert_eq!(DispatchError::Interrupted.as_label(), "dispatch_interrupted");
        assert_eq!(
            HandlerError::Panicked { info: "x".into() }.as_label(),
            "handler_panicked"
        );
    }

    #[test]
    fn test_duplicate_message_names_handler_and_type() {
        let dup = DispatchError::DuplicateSubscriber {
            handler: "audit".into(),
            event_type: EventType::of::<String>(),
        };
        let text = dup.to_string();
        assert!(text.contains("audit"), "{text}");
        assert!(text.contains("String"), "{text}");
    }

    #[test]
    fn test_panic_payload_rendering() {
        let s: Box<dyn std::any::Any + Send> = Box::new("static boom");
        assert_eq!(
            HandlerError::from_panic(s.as_ref()),
            HandlerError::Panicked {
                info: "static boom".into()
            }
        );

        let owned: Box<dyn std::any::Any + Send> = Box::new(String::from("owned boom"));
        assert_eq!(
            HandlerError::from_panic(owned.as_ref()),
            HandlerError::Panicked {
                info: "owned boom".into()
            }
        );

        let other: Box<dyn std::any::Any + Send> = Box::new(42u32);
        assert_eq!(
            HandlerError::from_panic(other.as_ref()),
            HandlerError::Panicked {
                info: "unknown panic".into()
            }
        );
    }
}
