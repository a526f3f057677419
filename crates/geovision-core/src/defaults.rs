//! Centralized default constants for geovision.
//!
//! **This module is the single source of truth** for shared default values:
//! endpoints, model names, fixed prompts, and fallback strings. Backends and
//! the pipeline reference these constants instead of defining their own.

// =============================================================================
// SERVICE
// =============================================================================

/// Default Gemini REST base URL.
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// High-capability vision model used for the forensic description stage.
pub const DESCRIBE_MODEL: &str = "gemini-3-pro-preview";

/// Model with maps-grounding support used for the location stage.
pub const LOCATE_MODEL: &str = "gemini-2.5-flash";

/// Lightweight model for short single-turn messages.
pub const QUICK_MODEL: &str = "gemini-2.5-flash-lite-latest";

/// Mime type assumed for a bare base64 body with no data URI header.
pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// Mime type used when neither the caller nor sniffing can name the format.
pub const FALLBACK_MIME: &str = "application/octet-stream";

// =============================================================================
// ENVIRONMENT
// =============================================================================

pub const ENV_API_KEY: &str = "GEMINI_API_KEY";

/// Legacy credential variable, consulted when `GEMINI_API_KEY` is unset.
pub const ENV_API_KEY_LEGACY: &str = "API_KEY";

pub const ENV_BASE_URL: &str = "GEMINI_BASE_URL";
pub const ENV_DESCRIBE_MODEL: &str = "GEMINI_DESCRIBE_MODEL";
pub const ENV_LOCATE_MODEL: &str = "GEMINI_LOCATE_MODEL";
pub const ENV_QUICK_MODEL: &str = "GEMINI_QUICK_MODEL";

/// Request timeout in seconds. Unset means no timeout.
pub const ENV_TIMEOUT: &str = "GEMINI_TIMEOUT";

// =============================================================================
// PROMPTS
// =============================================================================

/// Fixed instruction for the forensic description stage.
pub const DESCRIBE_PROMPT: &str = "Act as a world-class forensic geolocator. Analyze this image in extreme detail.
Identify:
1. Architecture style and building materials.
2. Flora, climate indicators, and sun/shadow positions.
3. License plates, street signs, store names, or specific brand fonts.
4. Infrastructure like utility poles, pavement types, or traffic light designs.
5. Geographic landmarks or unique topography.
Provide a highly detailed technical description of the location features to help a mapping tool find the exact coordinates.";

/// Prompt for the greeting shown while the session warms up.
pub const GREETING_PROMPT: &str =
    "Provide a very short, professional greeting for a geolocation AI assistant. 10 words max.";

// =============================================================================
// FALLBACKS
// =============================================================================

/// Substituted when the description stage returns no text.
pub const EMPTY_DESCRIPTION: &str = "No description generated.";

/// Substituted when the location stage returns no text.
pub const EMPTY_LOCATION: &str = "Could not pinpoint location.";

/// Shown in place of a greeting that failed or came back empty.
pub const GREETING_FALLBACK: &str = "Loading AI assistant...";

/// The single user-facing message for any failed stage.
pub const GEOLOCATE_FAILURE_MESSAGE: &str =
    "Failed to geolocate. Please check your API key and network connection.";

/// Label for a map citation without a title.
pub const MAP_CITATION_LABEL: &str = "View on Google Maps";

/// Label for a web citation without a title.
pub const WEB_CITATION_LABEL: &str = "Reference Info";

// =============================================================================
// EVENTS
// =============================================================================

/// Default broadcast capacity for the pipeline event bus.
///
/// A run emits at most four transitions; 64 leaves room for slow
/// subscribers across several runs.
pub const EVENT_BUS_CAPACITY: usize = 64;

/// Google Maps search endpoint used to build result links.
pub const MAPS_SEARCH_URL: &str = "https://www.google.com/maps/search/?api=1&query=";
