//! # geovision-core
//!
//! Core types, traits, and abstractions for the geovision image
//! geolocation pipeline.
//!
//! This crate provides the data model, the error type, and the
//! [`ModelGateway`] trait that the inference and pipeline crates depend on.

pub mod defaults;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use events::{EventBus, StateChange};
pub use models::*;
pub use traits::*;
