//! Structured logging field name constants for geovision.
//!
//! All crates use these constants for consistent structured logging fields,
//! so a log pipeline can query a run end to end by the same names.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | A pipeline stage failed, the run moved to `error` |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Run lifecycle (started, located, reset), backend init |
//! | DEBUG | Decision points, discarded stale results, request sizes |
//! | TRACE | Per-item iteration (citations) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Monotonic analysis run identifier.
pub const RUN_ID: &str = "run_id";

/// Component within a crate.
/// Examples: "gemini", "pipeline", "parser"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "describe", "locate", "quick_message"
pub const OPERATION: &str = "op";

/// Pipeline step entered by a transition.
pub const STEP: &str = "step";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Byte length of a prompt.
pub const PROMPT_LEN: &str = "prompt_len";

/// Byte length of a model response.
pub const RESPONSE_LEN: &str = "response_len";

/// Byte length of the encoded image payload.
pub const IMAGE_LEN: &str = "image_len";

/// Number of grounding citations attached to an answer.
pub const CITATION_COUNT: &str = "citation_count";

// ─── Inference fields ──────────────────────────────────────────────────────

/// Model name used for inference.
pub const MODEL: &str = "model";

/// Whether a location hint was attached to the grounding request.
pub const HAS_HINT: &str = "has_hint";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

/// Whether the coordinate marker was found in the grounded answer.
pub const MARKER_FOUND: &str = "marker_found";
