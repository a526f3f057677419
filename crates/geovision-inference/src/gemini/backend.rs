//! Gemini backend implementation.

use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

use geovision_core::{
    defaults, Error, GroundedAnswer, Image, ModelGateway, Result, UserCoordinates,
};

use super::error::{to_geovision_error, GeminiErrorCode};
use super::types::*;
use crate::parser::MARKER_FORMAT;

/// Configuration for the Gemini backend.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// Base URL of the REST API, up to and excluding `/models`.
    pub base_url: String,
    /// API key. Checked on first call, not at construction.
    pub api_key: Option<String>,
    /// Model used for the forensic description stage.
    pub describe_model: String,
    /// Model used for the maps-grounded location stage.
    pub locate_model: String,
    /// Model used for short single-turn messages.
    pub quick_model: String,
    /// Request timeout in seconds. `None` inherits the transport's behavior.
    pub timeout_seconds: Option<u64>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::GEMINI_BASE_URL.to_string(),
            api_key: None,
            describe_model: defaults::DESCRIBE_MODEL.to_string(),
            locate_model: defaults::LOCATE_MODEL.to_string(),
            quick_model: defaults::QUICK_MODEL.to_string(),
            timeout_seconds: None,
        }
    }
}

impl GeminiConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `GEMINI_API_KEY` | (none) | API key; `API_KEY` is consulted if unset |
    /// | `GEMINI_BASE_URL` | `https://generativelanguage.googleapis.com/v1beta` | API endpoint |
    /// | `GEMINI_DESCRIBE_MODEL` | `gemini-3-pro-preview` | Description model |
    /// | `GEMINI_LOCATE_MODEL` | `gemini-2.5-flash` | Grounding model |
    /// | `GEMINI_QUICK_MODEL` | `gemini-2.5-flash-lite-latest` | Greeting model |
    /// | `GEMINI_TIMEOUT` | (none) | Request timeout in seconds |
    pub fn from_env() -> Self {
        let api_key = std::env::var(defaults::ENV_API_KEY)
            .or_else(|_| std::env::var(defaults::ENV_API_KEY_LEGACY))
            .ok()
            .filter(|k| !k.trim().is_empty());

        Self {
            base_url: std::env::var(defaults::ENV_BASE_URL)
                .unwrap_or_else(|_| defaults::GEMINI_BASE_URL.to_string()),
            api_key,
            describe_model: std::env::var(defaults::ENV_DESCRIBE_MODEL)
                .unwrap_or_else(|_| defaults::DESCRIBE_MODEL.to_string()),
            locate_model: std::env::var(defaults::ENV_LOCATE_MODEL)
                .unwrap_or_else(|_| defaults::LOCATE_MODEL.to_string()),
            quick_model: std::env::var(defaults::ENV_QUICK_MODEL)
                .unwrap_or_else(|_| defaults::QUICK_MODEL.to_string()),
            timeout_seconds: std::env::var(defaults::ENV_TIMEOUT)
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|secs| *secs > 0),
        }
    }
}

/// Build the instruction for the location stage.
pub fn locate_prompt(description: &str, hint: Option<UserCoordinates>) -> String {
    let hint_line = hint
        .map(|h| {
            format!(
                "Hint: The user is currently near {}, {}.\n",
                h.latitude, h.longitude
            )
        })
        .unwrap_or_default();

    format!(
        "Based on this image and the following technical description, pinpoint the exact geographical spot on Google Maps:\n\
         Description: {description}\n\
         {hint_line}\
         Provide the name of the place, address, and explain why this is the correct location.\n\
         Finish your answer with the coordinates of the spot on a final line in exactly this format: {MARKER_FORMAT}"
    )
}

/// Gemini-backed model gateway.
pub struct GeminiBackend {
    client: Client,
    config: GeminiConfig,
}

impl GeminiBackend {
    /// Create a new Gemini backend with the given configuration.
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let mut client_builder = Client::builder();
        if let Some(secs) = config.timeout_seconds {
            client_builder = client_builder.timeout(Duration::from_secs(secs));
        }

        let client = client_builder
            .build()
            .map_err(|e| Error::Inference(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            base_url = %config.base_url,
            describe_model = %config.describe_model,
            locate_model = %config.locate_model,
            quick_model = %config.quick_model,
            has_api_key = config.api_key.is_some(),
            "Initializing Gemini backend"
        );

        Ok(Self { client, config })
    }

    /// Create with default configuration.
    pub fn with_defaults() -> Result<Self> {
        Self::new(GeminiConfig::default())
    }

    /// Create from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(GeminiConfig::from_env())
    }

    /// Get the current configuration.
    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            model
        )
    }

    /// Send one `generateContent` call. Single attempt, no retry.
    async fn generate(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let api_key = self.config.api_key.as_deref().ok_or_else(|| {
            Error::Config(format!("{} is not set", defaults::ENV_API_KEY))
        })?;

        let start = Instant::now();
        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::Request(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let (status_name, message) = match serde_json::from_str::<GeminiErrorResponse>(&body)
            {
                Ok(parsed) => (parsed.error.status, parsed.error.message),
                Err(_) => (String::new(), body),
            };
            let code = GeminiErrorCode::from_response(status.as_u16(), &status_name, &message);
            warn!(
                model,
                status = status.as_u16(),
                ?code,
                duration_ms = start.elapsed().as_millis() as u64,
                "Gemini request rejected"
            );
            return Err(to_geovision_error(
                code,
                &format!("Gemini returned {}: {}", status, message),
            ));
        }

        let result: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| Error::Serialization(format!("Failed to parse response: {}", e)))?;

        if let Some(reason) = result.block_reason() {
            return Err(Error::Inference(format!("Prompt blocked: {}", reason)));
        }

        debug!(
            model,
            duration_ms = start.elapsed().as_millis() as u64,
            candidate_count = result.candidates.len(),
            "Gemini request complete"
        );
        Ok(result)
    }
}

#[async_trait]
impl ModelGateway for GeminiBackend {
    #[instrument(skip(self, image), fields(component = "gemini", op = "describe", model = %self.config.describe_model, image_len = image.base64_data().len()))]
    async fn describe(&self, image: &Image) -> Result<String> {
        let request = GenerateContentRequest::single_turn(vec![
            Part::inline_data(image.mime_type(), image.base64_data()),
            Part::text(defaults::DESCRIBE_PROMPT),
        ]);

        let text = self
            .generate(&self.config.describe_model, &request)
            .await?
            .text();

        if text.trim().is_empty() {
            warn!("Empty description from model, using fallback text");
            return Ok(defaults::EMPTY_DESCRIPTION.to_string());
        }

        debug!(response_len = text.len(), "Description complete");
        Ok(text)
    }

    #[instrument(skip(self, description, image), fields(component = "gemini", op = "locate", model = %self.config.locate_model, prompt_len = description.len(), has_hint = hint.is_some()))]
    async fn locate(
        &self,
        description: &str,
        image: &Image,
        hint: Option<UserCoordinates>,
    ) -> Result<GroundedAnswer> {
        let mut request = GenerateContentRequest::single_turn(vec![
            Part::inline_data(image.mime_type(), image.base64_data()),
            Part::text(locate_prompt(description, hint)),
        ]);
        request.tools.push(Tool::google_maps());
        request.tool_config = hint.map(|h| ToolConfig {
            retrieval_config: RetrievalConfig {
                lat_lng: LatLng {
                    latitude: h.latitude,
                    longitude: h.longitude,
                },
            },
        });

        let response = self.generate(&self.config.locate_model, &request).await?;
        let citations = response.citations();
        let mut text = response.text();
        if text.trim().is_empty() {
            warn!("Empty grounded answer from model, using fallback text");
            text = defaults::EMPTY_LOCATION.to_string();
        }

        debug!(
            response_len = text.len(),
            citation_count = citations.len(),
            "Grounding complete"
        );
        Ok(GroundedAnswer { text, citations })
    }

    #[instrument(skip(self, prompt), fields(component = "gemini", op = "quick_message", model = %self.config.quick_model, prompt_len = prompt.len()))]
    async fn quick_message(&self, prompt: &str) -> String {
        let request = GenerateContentRequest::single_turn(vec![Part::text(prompt)]);
        match self.generate(&self.config.quick_model, &request).await {
            Ok(response) => response.text(),
            Err(e) => {
                warn!(error = %e, "Quick message failed, returning empty text");
                String::new()
            }
        }
    }

    fn model_name(&self) -> &str {
        &self.config.describe_model
    }
}
