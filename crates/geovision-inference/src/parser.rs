//! Turns a grounded answer into a [`GeolocationResult`].
//!
//! The grounding prompt asks the model to end its answer with a marker of the
//! form `COORDINATES: [LAT: 48.8584, LNG: 2.2945]`. The parser lifts the pair
//! out of the text and removes the marker, which is not meant for display.
//! A missing or malformed marker is a normal outcome: the result simply has
//! no coordinates.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, trace};

use geovision_core::{Coordinates, GeolocationResult, GroundedAnswer, GroundingCitation};

/// Marker format quoted verbatim in the grounding prompt.
pub const MARKER_FORMAT: &str = "COORDINATES: [LAT: <latitude>, LNG: <longitude>]";

static MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"COORDINATES:\s*\[\s*LAT:\s*([+-]?\d+(?:\.\d+)?)\s*,\s*LNG:\s*([+-]?\d+(?:\.\d+)?)\s*\]",
    )
    .expect("coordinate marker pattern is valid")
});

/// A coordinate marker located in a body of text.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub lat: f64,
    pub lng: f64,
    /// Byte range of the whole marker in the searched text.
    pub span: Range<usize>,
}

/// Find the first marker carrying a valid latitude/longitude pair.
pub fn find_marker(text: &str) -> Option<Marker> {
    MARKER_RE.captures_iter(text).find_map(|caps| {
        let whole = caps.get(0)?;
        let lat: f64 = caps.get(1)?.as_str().parse().ok()?;
        let lng: f64 = caps.get(2)?.as_str().parse().ok()?;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            trace!(lat, lng, "Skipping out-of-range coordinate marker");
            return None;
        }
        Some(Marker {
            lat,
            lng,
            span: whole.range(),
        })
    })
}

/// Title of the first titled map citation, used as a fallback map search.
fn map_query(citations: &[GroundingCitation]) -> Option<String> {
    citations
        .iter()
        .find(|c| c.is_map() && !c.title().is_empty())
        .map(|c| c.title().to_string())
}

/// Parser for grounded answers.
pub struct ResultParser;

impl ResultParser {
    pub fn extract(answer: GroundedAnswer) -> GeolocationResult {
        let GroundedAnswer { text, citations } = answer;

        let Some(marker) = find_marker(&text) else {
            debug!(
                marker_found = false,
                citation_count = citations.len(),
                "No coordinate marker in grounded answer"
            );
            return GeolocationResult {
                text,
                citations,
                coordinates: None,
            };
        };

        let mut display = String::with_capacity(text.len());
        display.push_str(&text[..marker.span.start]);
        display.push_str(&text[marker.span.end..]);

        debug!(
            marker_found = true,
            lat = marker.lat,
            lng = marker.lng,
            citation_count = citations.len(),
            "Parsed coordinate marker"
        );

        let query = map_query(&citations);
        GeolocationResult {
            text: display,
            coordinates: Some(Coordinates {
                lat: marker.lat,
                lng: marker.lng,
                query,
            }),
            citations,
        }
    }
}
