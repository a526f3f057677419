//! # geovision-pipeline
//!
//! Orchestration for the geovision geolocation flow.
//!
//! An [`AnalysisPipeline`] takes one image through two model stages:
//! a forensic description, then a map-grounded location answer that is
//! parsed into a [`GeolocationResult`](geovision_core::GeolocationResult).
//! The UI shell observes progress by subscribing to state snapshots.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use geovision_core::Image;
//! use geovision_inference::GeminiBackend;
//! use geovision_pipeline::AnalysisPipeline;
//!
//! # async fn example(bytes: Vec<u8>) -> geovision_core::Result<()> {
//! let pipeline = AnalysisPipeline::new(Arc::new(GeminiBackend::from_env()?));
//! pipeline.select_image(Image::from_bytes(&bytes, "image/jpeg")?).await;
//! let state = pipeline.start().await?;
//! println!("{:?}", state.location_result);
//! # Ok(())
//! # }
//! ```

pub mod greeting;
pub mod pipeline;

pub use greeting::fetch_greeting;
pub use pipeline::AnalysisPipeline;
