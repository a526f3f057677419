//! Gemini `generateContent` backend.
//!
//! Implements [`geovision_core::ModelGateway`] over the Gemini REST API:
//! a vision model for the forensic description, a maps-grounded model for
//! the location stage, and a light model for short messages.
//!
//! # Example
//!
//! ```rust,no_run
//! use geovision_core::{Image, ModelGateway};
//! use geovision_inference::gemini::GeminiBackend;
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = GeminiBackend::from_env().unwrap();
//!     let image = Image::from_data_uri("data:image/jpeg;base64,/9j/4AAQ").unwrap();
//!     let description = backend.describe(&image).await.unwrap();
//!     let answer = backend.locate(&description, &image, None).await.unwrap();
//!     println!("{}", answer.text);
//! }
//! ```

mod backend;
mod error;
mod types;

pub use backend::{locate_prompt, GeminiBackend, GeminiConfig};
pub use error::{to_geovision_error, GeminiErrorCode};
pub use types::*;
