//! # Closure-backed event handler (`Handler`)
//!
//! [`Handler`] wraps a closure `F: Fn(&E)` (or a fallible `Fn(&E) -> Result<(), Err>`)
//! behind an `Arc`. The wrapper is what gives a handler its identity: closures
//! cannot be compared, `Handler`s can.
//!
//! ## Identity semantics
//! - [`Handler::clone`] returns the **same** handler (shared allocation).
//! - Two separate constructor calls produce **different** handlers, even for
//!   identical closures.
//! - The registry rejects a second subscription of the same handler to the
//!   same event type.
//!
//! ## Example
//! ```rust
//! use typebus::Handler;
//!
//! let h = Handler::new(|s: &String| println!("got {s}")).named("printer");
//! let same = h.clone();
//! let other = Handler::new(|s: &String| println!("got {s}"));
//!
//! assert!(h.same_as(&same));
//! assert!(!h.same_as(&other));
//! assert_eq!(h.name(), "printer");
//! ```

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::error::HandlerError;

type HandlerFn<E> = dyn Fn(&E) -> Result<(), HandlerError> + Send + Sync;

/// Shared, identity-comparable event handler for events of type `E`.
pub struct Handler<E> {
    name: Cow<'static, str>,
    f: Arc<HandlerFn<E>>,
}

impl<E: Any + Send + Sync> Handler<E> {
    /// Creates a handler from an infallible closure.
    ///
    /// The default name is the closure's type name.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        Self {
            name: Cow::Borrowed(std::any::type_name::<F>()),
            f: Arc::new(move |event: &E| {
                f(event);
                Ok(())
            }),
        }
    }

    /// Creates a handler from a fallible closure.
    ///
    /// Returning `Err` aborts the current delivery: handlers registered after
    /// this one do not receive the event.
    ///
    /// ## Example
    /// ```rust
    /// use typebus::Handler;
    ///
    /// let h = Handler::fallible(|n: &i32| {
    ///     if *n < 0 { return Err(format!("negative: {n}")); }
    ///     Ok(())
    /// });
    /// assert!(h.call(&1).is_ok());
    /// assert!(h.call(&-1).is_err());
    /// ```
    pub fn fallible<F, Err>(f: F) -> Self
    where
        F: Fn(&E) -> Result<(), Err> + Send + Sync + 'static,
        Err: fmt::Display,
    {
        Self {
            name: Cow::Borrowed(std::any::type_name::<F>()),
            f: Arc::new(move |event: &E| f(event).map_err(HandlerError::failed)),
        }
    }
}

impl<E> Handler<E> {
    /// Replaces the handler's name (used in logs and errors).
    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Human-readable handler name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True if both values refer to the same handler.
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.f, &other.f)
    }

    /// Invokes the handler directly on the caller's thread.
    pub fn call(&self, event: &E) -> Result<(), HandlerError> {
        (self.f)(event)
    }

    /// Address of the shared closure; stable while any clone is alive.
    pub(crate) fn identity(&self) -> usize {
        Arc::as_ptr(&self.f) as *const () as usize
    }
}

impl<E> Clone for Handler<E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            f: Arc::clone(&self.f),
        }
    }
}

impl<E> fmt::Debug for Handler<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("name", &self.name)
            .field("identity", &format_args!("{:#x}", self.identity()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_clone_keeps_identity() {
        let h = Handler::new(|_: &u8| {});
        let c = h.clone();
        assert!(h.same_as(&c));
        assert_eq!(h.identity(), c.identity());
    }

    #[test]
    fn test_equal_closures_are_distinct_handlers() {
        let noop = |_: &u8| {};
        let a = Handler::new(noop);
        let b = Handler::new(noop);
        assert!(!a.same_as(&b));
    }

    #[test]
    fn test_renaming_keeps_identity() {
        let h = Handler::new(|_: &u8| {});
        let renamed = h.clone().named("renamed");
        assert!(h.same_as(&renamed));
        assert_eq!(renamed.name(), "renamed");
        assert_ne!(h.name(), "renamed");
    }

    #[test]
    fn test_call_runs_closure() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let h = Handler::new(move |n: &usize| {
            counter.fetch_add(*n, Ordering::SeqCst);
        });
        h.call(&3).expect("infallible");
        h.call(&4).expect("infallible");
        assert_eq!(hits.load(Ordering::SeqCst), 7);
    }

    #[test]
    fn test_fallible_error_is_rendered() {
        let h = Handler::fallible(|n: &i32| if *n > 0 { Ok(()) } else { Err("not positive") });
        assert_eq!(
            h.call(&0),
            Err(HandlerError::Failed {
                error: "not positive".into()
            })
        );
    }
}
