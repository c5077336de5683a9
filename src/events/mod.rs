//! Event routing keys.
//!
//! Events themselves are plain user values (`Send + Sync + 'static`); the
//! dispatcher only needs a key to route them by. See [`EventType`].

mod event_type;

pub use event_type::EventType;
