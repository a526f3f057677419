//! Seams between the pipeline and the model service.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{GroundedAnswer, Image, UserCoordinates};

/// Request/response boundary to the hosted multimodal model service.
///
/// Implementations make exactly one attempt per call: no retry, backoff or
/// caching. Errors from `describe` and `locate` are returned unchanged.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Produce a detailed forensic description of the image.
    async fn describe(&self, image: &Image) -> Result<String>;

    /// Ground a description to a place, optionally biased toward `hint`.
    async fn locate(
        &self,
        description: &str,
        image: &Image,
        hint: Option<UserCoordinates>,
    ) -> Result<GroundedAnswer>;

    /// Single-turn lightweight message. Never fails: a failed call yields
    /// an empty string.
    async fn quick_message(&self, prompt: &str) -> String;

    /// Model name used for the description stage.
    fn model_name(&self) -> &str;
}
