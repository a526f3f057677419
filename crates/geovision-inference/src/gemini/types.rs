//! Gemini `generateContent` request and response types.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use geovision_core::GroundingCitation;

// =============================================================================
// REQUEST TYPES
// =============================================================================

/// Request body for `models/{model}:generateContent`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_config: Option<ToolConfig>,
}

impl GenerateContentRequest {
    /// Single-turn request with the given parts and no tools.
    pub fn single_turn(parts: Vec<Part>) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
            tools: Vec::new(),
            tool_config: None,
        }
    }
}

/// A turn of conversation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// One part of a turn: text or inline binary data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
    /// Set on reasoning parts, which are not part of the answer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<bool>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn inline_data(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            inline_data: Some(InlineData {
                mime_type: mime_type.into(),
                data: data.into(),
            }),
            ..Default::default()
        }
    }
}

/// Base64 payload with its mime type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

/// Tool enabled for a request.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_maps: Option<GoogleMaps>,
}

impl Tool {
    pub fn google_maps() -> Self {
        Self {
            google_maps: Some(GoogleMaps {}),
        }
    }
}

/// Maps grounding tool (no options).
#[derive(Debug, Clone, Default, Serialize)]
pub struct GoogleMaps {}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolConfig {
    pub retrieval_config: RetrievalConfig,
}

/// Location bias for grounded retrieval.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalConfig {
    pub lat_lng: LatLng,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

// =============================================================================
// RESPONSE TYPES
// =============================================================================

/// Response from `generateContent`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

impl GenerateContentResponse {
    /// Answer text of the first candidate (reasoning parts excluded).
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter(|p| p.thought != Some(true))
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }

    /// Grounding citations of the first candidate, in returned order.
    pub fn citations(&self) -> Vec<GroundingCitation> {
        self.candidates
            .first()
            .and_then(|c| c.grounding_metadata.as_ref())
            .map(|meta| {
                meta.grounding_chunks
                    .iter()
                    .flat_map(GroundingChunk::to_citations)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Why the prompt was blocked, if it was.
    pub fn block_reason(&self) -> Option<&str> {
        self.prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
    #[serde(default)]
    pub grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    #[serde(default)]
    pub grounding_chunks: Vec<GroundingChunk>,
}

/// A grounding source: a maps place, a web page, or both.
#[derive(Debug, Default, Deserialize)]
pub struct GroundingChunk {
    #[serde(default)]
    pub maps: Option<MapsSource>,
    #[serde(default)]
    pub web: Option<WebSource>,
}

impl GroundingChunk {
    /// Map citation first, then web, skipping sources with no uri and title.
    fn to_citations(&self) -> Vec<GroundingCitation> {
        let mut out = Vec::with_capacity(2);
        if let Some(maps) = &self.maps {
            let uri = maps.uri.clone().unwrap_or_default();
            let title = maps.title.clone().unwrap_or_default();
            if !uri.is_empty() || !title.is_empty() {
                out.push(GroundingCitation::Map {
                    uri,
                    title,
                    review_snippets: maps
                        .place_answer_sources
                        .as_ref()
                        .map(PlaceAnswerSources::snippets)
                        .unwrap_or_default(),
                });
            }
        }
        if let Some(web) = &self.web {
            let uri = web.uri.clone().unwrap_or_default();
            let title = web.title.clone().unwrap_or_default();
            if !uri.is_empty() || !title.is_empty() {
                out.push(GroundingCitation::Web { uri, title });
            }
        }
        out
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapsSource {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub place_answer_sources: Option<PlaceAnswerSources>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceAnswerSources {
    /// Either plain strings or objects carrying the excerpt.
    #[serde(default)]
    pub review_snippets: Vec<JsonValue>,
}

impl PlaceAnswerSources {
    fn snippets(&self) -> Vec<String> {
        self.review_snippets
            .iter()
            .filter_map(|v| match v {
                JsonValue::String(s) => Some(s.clone()),
                JsonValue::Object(obj) => ["text", "snippet", "title"]
                    .iter()
                    .find_map(|k| obj.get(*k).and_then(|t| t.as_str()))
                    .map(String::from),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct WebSource {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Error response body from the Gemini API.
#[derive(Debug, Deserialize)]
pub struct GeminiErrorResponse {
    pub error: GeminiError,
}

#[derive(Debug, Deserialize)]
pub struct GeminiError {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
    /// Canonical status name, e.g. `RESOURCE_EXHAUSTED`.
    #[serde(default)]
    pub status: String,
}
