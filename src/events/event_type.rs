//! # Routing key derived from an event's concrete type.
//!
//! [`EventType`] pairs a [`TypeId`] with the type's name. Only the `TypeId`
//! takes part in equality and hashing; the name is carried for logs and error
//! messages.
//!
//! ## Example
//! ```rust
//! use std::any::Any;
//! use typebus::EventType;
//!
//! let boxed: Box<dyn Any + Send + Sync> = Box::new(String::from("hi"));
//! assert_eq!(EventType::of_val(boxed.as_ref()), EventType::of::<String>());
//! ```

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identifier of an event's runtime type.
#[derive(Clone, Copy)]
pub struct EventType {
    id: TypeId,
    name: &'static str,
}

impl EventType {
    /// Event type of `E`.
    pub fn of<E: Any>() -> Self {
        Self {
            id: TypeId::of::<E>(),
            name: std::any::type_name::<E>(),
        }
    }

    /// Event type of the concrete value behind a `dyn Any` reference.
    ///
    /// The type name is not recoverable from a trait object, so the returned
    /// key reports `"<dyn Any>"` as its name. It still compares equal to
    /// [`EventType::of`] for the same concrete type.
    pub fn of_val(event: &(dyn Any + Send + Sync)) -> Self {
        Self {
            id: event.type_id(),
            name: "<dyn Any>",
        }
    }

    /// Underlying `TypeId`.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name (as reported by [`std::any::type_name`]).
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for EventType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EventType {}

impl Hash for EventType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EventType").field(&self.name).finish()
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_equality_follows_type_id() {
        assert_eq!(EventType::of::<String>(), EventType::of::<String>());
        assert_ne!(EventType::of::<String>(), EventType::of::<&'static str>());
        assert_ne!(EventType::of::<i32>(), EventType::of::<i64>());
    }

    #[test]
    fn test_of_val_sees_concrete_type_and_ignores_name() {
        let boxed: Box<dyn Any + Send + Sync> = Box::new(5i32);
        let dynamic = EventType::of_val(boxed.as_ref());
        assert_eq!(dynamic, EventType::of::<i32>());
        assert_ne!(dynamic, EventType::of::<Box<dyn Any + Send + Sync>>());

        let mut set = HashSet::new();
        set.insert(EventType::of::<i32>());
        assert!(set.contains(&dynamic));
    }

    #[test]
    fn test_display_uses_type_name() {
        assert_eq!(EventType::of::<u64>().to_string(), "u64");
        assert!(format!("{:?}", EventType::of::<String>()).contains("String"));
    }
}
