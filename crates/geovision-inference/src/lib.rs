//! # geovision-inference
//!
//! Model service backends for geovision.
//!
//! This crate provides:
//! - Gemini `generateContent` backend implementing [`geovision_core::ModelGateway`]
//! - Grounded-answer parsing into [`geovision_core::GeolocationResult`]
//! - Scripted mock gateway (feature `mock`)
//!
//! # Feature Flags
//!
//! - `mock`: Enable [`mock::MockGateway`] for tests in dependent crates

pub mod gemini;
pub mod parser;

// Mock model gateway for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use gemini::{GeminiBackend, GeminiConfig};
pub use parser::{find_marker, Marker, ResultParser, MARKER_FORMAT};
