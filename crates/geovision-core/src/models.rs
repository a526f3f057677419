//! Data model shared by the gateway, the parser, and the pipeline.

use std::fmt;

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::{Error, Result};

// =============================================================================
// IMAGE
// =============================================================================

/// An uploaded photograph, held as a self-describing data URI
/// (`data:<mime>;base64,<body>`).
///
/// Built once per user selection and never mutated afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct Image {
    mime_type: String,
    data: String,
}

impl Image {
    /// Encode raw bytes selected by the user.
    ///
    /// A missing or non-image mime type is replaced by one sniffed from the
    /// magic bytes; if that fails too the payload is labelled
    /// `application/octet-stream` and left for the service to judge.
    pub fn from_bytes(raw: &[u8], mime_type: &str) -> Result<Self> {
        if raw.is_empty() {
            return Err(Error::InvalidInput("Image payload is empty".to_string()));
        }

        let declared = mime_type.trim().to_lowercase();
        let mime_type = if declared.starts_with("image/") {
            declared
        } else {
            match infer::get(raw) {
                Some(kind) if kind.matcher_type() == infer::MatcherType::Image => {
                    kind.mime_type().to_string()
                }
                _ if !declared.is_empty() => declared,
                _ => defaults::FALLBACK_MIME.to_string(),
            }
        };

        Ok(Self {
            mime_type,
            data: base64::engine::general_purpose::STANDARD.encode(raw),
        })
    }

    /// Parse a data URI. Text without a `data:` header is taken as a bare
    /// base64 body of a JPEG.
    pub fn from_data_uri(text: &str) -> Result<Self> {
        let text = text.trim();
        let (mime_type, body) = match text.strip_prefix("data:") {
            Some(rest) => {
                let (header, body) = rest.split_once(',').ok_or_else(|| {
                    Error::InvalidInput("Data URI has no payload separator".to_string())
                })?;
                let mut params = header.split(';');
                let mime = params.next().unwrap_or_default().trim().to_lowercase();
                if !params.any(|p| p.trim().eq_ignore_ascii_case("base64")) {
                    return Err(Error::InvalidInput(
                        "Data URI payload is not base64 encoded".to_string(),
                    ));
                }
                let mime = if mime.is_empty() {
                    defaults::DEFAULT_IMAGE_MIME.to_string()
                } else {
                    mime
                };
                (mime, body)
            }
            None => (defaults::DEFAULT_IMAGE_MIME.to_string(), text),
        };

        if body.is_empty() {
            return Err(Error::InvalidInput("Image payload is empty".to_string()));
        }
        base64::engine::general_purpose::STANDARD
            .decode(body)
            .map_err(|e| Error::InvalidInput(format!("Invalid base64 image payload: {}", e)))?;

        Ok(Self {
            mime_type,
            data: body.to_string(),
        })
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// The base64 body without the data URI header.
    pub fn base64_data(&self) -> &str {
        &self.data
    }

    pub fn as_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Size in bytes of the decoded payload.
    pub fn decoded_len(&self) -> usize {
        let padding = self.data.bytes().rev().take_while(|b| *b == b'=').count();
        (self.data.len() / 4) * 3 - padding.min(2)
    }
}

impl fmt::Debug for Image {
    // The payload can be megabytes; keep it out of logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("mime_type", &self.mime_type)
            .field("decoded_len", &self.decoded_len())
            .finish()
    }
}

// =============================================================================
// LOCATION HINT
// =============================================================================

/// Position reported by the host platform's location service.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UserCoordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl UserCoordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

// =============================================================================
// GROUNDING RESULT
// =============================================================================

/// A reference attached to a grounded answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum GroundingCitation {
    Map {
        uri: String,
        title: String,
        /// Review excerpts the maps tool quoted for this place.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        review_snippets: Vec<String>,
    },
    Web {
        uri: String,
        title: String,
    },
}

impl GroundingCitation {
    pub fn map(uri: impl Into<String>, title: impl Into<String>) -> Self {
        Self::Map {
            uri: uri.into(),
            title: title.into(),
            review_snippets: Vec::new(),
        }
    }

    pub fn web(uri: impl Into<String>, title: impl Into<String>) -> Self {
        Self::Web {
            uri: uri.into(),
            title: title.into(),
        }
    }

    pub fn uri(&self) -> &str {
        match self {
            Self::Map { uri, .. } | Self::Web { uri, .. } => uri,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Map { title, .. } | Self::Web { title, .. } => title,
        }
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Self::Map { .. })
    }

    /// Title for rendering; untitled citations get a generic label.
    pub fn display_title(&self) -> &str {
        match self {
            Self::Map { title, .. } if title.is_empty() => defaults::MAP_CITATION_LABEL,
            Self::Web { title, .. } if title.is_empty() => defaults::WEB_CITATION_LABEL,
            _ => self.title(),
        }
    }
}

/// Unparsed output of the grounding stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroundedAnswer {
    pub text: String,
    pub citations: Vec<GroundingCitation>,
}

/// Machine-readable position extracted from a grounded answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
    /// Place name usable as a map search when the pair itself is not needed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

/// Final, user-facing result of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeolocationResult {
    /// Answer text with the coordinate marker removed.
    pub text: String,
    pub citations: Vec<GroundingCitation>,
    /// Absent when the answer carried no parseable marker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

impl GeolocationResult {
    /// Link to the located spot on Google Maps.
    ///
    /// Uses the numeric pair when present, otherwise the first map citation.
    pub fn map_link(&self) -> Option<String> {
        if let Some(coords) = &self.coordinates {
            return Some(format!(
                "{}{}",
                defaults::MAPS_SEARCH_URL,
                urlencoding::encode(&format!("{},{}", coords.lat, coords.lng))
            ));
        }
        self.citations
            .iter()
            .find(|c| c.is_map() && !c.uri().is_empty())
            .map(|c| c.uri().to_string())
    }
}

// =============================================================================
// ANALYSIS STATE
// =============================================================================

/// Step of the analysis state machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStep {
    #[default]
    Idle,
    Analyzing,
    Locating,
    Done,
    Error,
}

impl AnalysisStep {
    /// A stage call is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Analyzing | Self::Locating)
    }

    /// `start()` is permitted from this step.
    pub fn can_start(&self) -> bool {
        !self.is_busy()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Analyzing => "analyzing",
            Self::Locating => "locating",
            Self::Done => "done",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for AnalysisStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single record the UI renders from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisState {
    pub step: AnalysisStep,
    /// Stage 1 output; empty until stage 1 succeeds. Kept when stage 2
    /// fails so the observations stay visible next to the error.
    pub description: String,
    /// Stage 2 output; set only in `done`.
    pub location_result: Option<GeolocationResult>,
    /// User-facing failure; set only in `error`.
    pub error: Option<String>,
}

impl AnalysisState {
    /// True when the field/step invariants hold.
    pub fn check_invariants(&self) -> bool {
        let description_ok = self.description.is_empty()
            || matches!(
                self.step,
                AnalysisStep::Locating | AnalysisStep::Done | AnalysisStep::Error
            );
        let result_ok = self.location_result.is_none() || self.step == AnalysisStep::Done;
        let error_ok = self.error.is_some() == (self.step == AnalysisStep::Error);
        description_ok && result_ok && error_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR\x00\x00\x00\x01\x00\x00\x00\x01";

    #[test]
    fn test_image_from_bytes_keeps_declared_mime() {
        let image = Image::from_bytes(b"\xff\xd8\xff\xe0jpegdata", "image/jpeg").unwrap();
        assert_eq!(image.mime_type(), "image/jpeg");
        assert_eq!(image.as_data_uri(), format!("data:image/jpeg;base64,{}", image.base64_data()));
    }

    #[test]
    fn test_image_from_bytes_sniffs_missing_mime() {
        let image = Image::from_bytes(PNG_HEADER, "").unwrap();
        assert_eq!(image.mime_type(), "image/png");
    }

    #[test]
    fn test_image_from_bytes_sniffs_generic_mime() {
        let image = Image::from_bytes(PNG_HEADER, "application/octet-stream").unwrap();
        assert_eq!(image.mime_type(), "image/png");
    }

    #[test]
    fn test_image_from_bytes_unknown_payload() {
        let image = Image::from_bytes(b"plain text", "").unwrap();
        assert_eq!(image.mime_type(), defaults::FALLBACK_MIME);
    }

    #[test]
    fn test_image_from_bytes_rejects_empty() {
        let err = Image::from_bytes(&[], "image/png").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_image_decoded_len() {
        for len in 1..8 {
            let raw = vec![7u8; len];
            let image = Image::from_bytes(&raw, "image/jpeg").unwrap();
            assert_eq!(image.decoded_len(), len);
        }
    }

    #[test]
    fn test_image_from_data_uri() {
        let image = Image::from_data_uri("data:image/webp;base64,aGVsbG8=").unwrap();
        assert_eq!(image.mime_type(), "image/webp");
        assert_eq!(image.base64_data(), "aGVsbG8=");
        assert_eq!(image.decoded_len(), 5);
    }

    #[test]
    fn test_image_from_bare_base64() {
        let image = Image::from_data_uri("aGVsbG8=").unwrap();
        assert_eq!(image.mime_type(), defaults::DEFAULT_IMAGE_MIME);
        assert_eq!(image.base64_data(), "aGVsbG8=");
    }

    #[test]
    fn test_image_from_data_uri_rejects_non_base64() {
        assert!(Image::from_data_uri("data:image/png,rawtext").is_err());
        assert!(Image::from_data_uri("data:image/png;base64").is_err());
        assert!(Image::from_data_uri("data:image/png;base64,").is_err());
        assert!(Image::from_data_uri("data:image/png;base64,@@@").is_err());
    }

    #[test]
    fn test_image_debug_omits_payload() {
        let image = Image::from_data_uri("data:image/png;base64,aGVsbG8=").unwrap();
        let debug = format!("{:?}", image);
        assert!(debug.contains("image/png"));
        assert!(!debug.contains("aGVsbG8="));
    }

    #[test]
    fn test_citation_serialization_is_tagged() {
        let json = serde_json::to_value(GroundingCitation::map("https://maps/1", "Eiffel Tower"))
            .unwrap();
        assert_eq!(json["kind"], "map");
        assert_eq!(json["title"], "Eiffel Tower");
        assert!(json.get("review_snippets").is_none());

        let web: GroundingCitation =
            serde_json::from_str(r#"{"kind":"web","uri":"https://w","title":"Wiki"}"#).unwrap();
        assert_eq!(web, GroundingCitation::web("https://w", "Wiki"));
    }

    #[test]
    fn test_citation_display_title_fallbacks() {
        assert_eq!(
            GroundingCitation::map("u", "").display_title(),
            defaults::MAP_CITATION_LABEL
        );
        assert_eq!(
            GroundingCitation::web("u", "").display_title(),
            defaults::WEB_CITATION_LABEL
        );
        assert_eq!(GroundingCitation::web("u", "Wiki").display_title(), "Wiki");
    }

    #[test]
    fn test_map_link_prefers_coordinates() {
        let result = GeolocationResult {
            text: "Paris".to_string(),
            citations: vec![GroundingCitation::map("https://maps/1", "Louvre")],
            coordinates: Some(Coordinates {
                lat: 48.86,
                lng: 2.35,
                query: Some("Louvre".to_string()),
            }),
        };
        assert_eq!(
            result.map_link().unwrap(),
            "https://www.google.com/maps/search/?api=1&query=48.86%2C2.35"
        );
    }

    #[test]
    fn test_map_link_falls_back_to_map_citation() {
        let result = GeolocationResult {
            text: "Paris".to_string(),
            citations: vec![
                GroundingCitation::web("https://web/1", "Wiki"),
                GroundingCitation::map("https://maps/1", "Louvre"),
            ],
            coordinates: None,
        };
        assert_eq!(result.map_link().as_deref(), Some("https://maps/1"));

        let bare = GeolocationResult {
            text: "Somewhere".to_string(),
            citations: vec![],
            coordinates: None,
        };
        assert!(bare.map_link().is_none());
    }

    #[test]
    fn test_step_gating() {
        assert!(AnalysisStep::Idle.can_start());
        assert!(AnalysisStep::Done.can_start());
        assert!(AnalysisStep::Error.can_start());
        assert!(!AnalysisStep::Analyzing.can_start());
        assert!(!AnalysisStep::Locating.can_start());
    }

    #[test]
    fn test_step_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&AnalysisStep::Locating).unwrap(),
            "\"locating\""
        );
        assert_eq!(AnalysisStep::Done.to_string(), "done");
    }

    #[test]
    fn test_zero_state_satisfies_invariants() {
        let state = AnalysisState::default();
        assert_eq!(state.step, AnalysisStep::Idle);
        assert!(state.check_invariants());
    }

    #[test]
    fn test_invariant_violations_detected() {
        let described_while_idle = AnalysisState {
            description: "brick".to_string(),
            ..Default::default()
        };
        assert!(!described_while_idle.check_invariants());

        let error_without_message = AnalysisState {
            step: AnalysisStep::Error,
            ..Default::default()
        };
        assert!(!error_without_message.check_invariants());

        let result_while_locating = AnalysisState {
            step: AnalysisStep::Locating,
            description: "brick".to_string(),
            location_result: Some(GeolocationResult {
                text: String::new(),
                citations: vec![],
                coordinates: None,
            }),
            error: None,
        };
        assert!(!result_while_locating.check_invariants());
    }
}
