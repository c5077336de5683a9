//! # Handler abstractions.
//!
//! - [`Handler`] - shared, identity-comparable wrapper around a closure
//!   receiving `&E`.

mod handler;

pub use handler::Handler;
