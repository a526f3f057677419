//! Two-stage analysis pipeline and its step state machine.
//!
//! ```text
//! idle ──start──▶ analyzing ──describe ok──▶ locating ──locate ok──▶ done
//!                     │                          │
//!                     └──── describe err ──▶ error ◀── locate err ───┘
//! any ──reset──▶ idle            error/done ──start──▶ analyzing
//! ```
//!
//! The pipeline owns the only mutable [`AnalysisState`]. Each transition is
//! published on the [`EventBus`] as an immutable snapshot.
//!
//! Stage calls are awaited without holding the state lock. A run id,
//! bumped by every `start`, `reset` and image selection, is captured when a
//! run begins and compared before each stage result is applied; a result
//! from a superseded run is dropped.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{broadcast, RwLock};
use tracing::{debug, error, info};

use geovision_core::{
    defaults, AnalysisState, AnalysisStep, Error, EventBus, Image, ModelGateway, Result,
    StateChange, UserCoordinates,
};
use geovision_inference::ResultParser;

#[derive(Default)]
struct Inner {
    image: Option<Arc<Image>>,
    user_coordinates: Option<UserCoordinates>,
    run_id: u64,
    state: AnalysisState,
}

/// Orchestrates describe → locate → parse for one image at a time.
pub struct AnalysisPipeline {
    gateway: Arc<dyn ModelGateway>,
    inner: RwLock<Inner>,
    events: EventBus,
}

impl AnalysisPipeline {
    pub fn new(gateway: Arc<dyn ModelGateway>) -> Self {
        Self::with_event_bus(gateway, EventBus::default())
    }

    /// Create a pipeline publishing on an existing bus.
    pub fn with_event_bus(gateway: Arc<dyn ModelGateway>, events: EventBus) -> Self {
        Self {
            gateway,
            inner: RwLock::new(Inner::default()),
            events,
        }
    }

    /// Receive a snapshot after every transition.
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.events.subscribe()
    }

    pub fn gateway(&self) -> &Arc<dyn ModelGateway> {
        &self.gateway
    }

    /// Current state snapshot.
    pub async fn state(&self) -> AnalysisState {
        self.inner.read().await.state.clone()
    }

    pub async fn has_image(&self) -> bool {
        self.inner.read().await.image.is_some()
    }

    pub async fn user_coordinates(&self) -> Option<UserCoordinates> {
        self.inner.read().await.user_coordinates
    }

    /// Replace the image and return to `idle`. Any run in flight is superseded.
    pub async fn select_image(&self, image: Image) {
        let mut inner = self.inner.write().await;
        inner.image = Some(Arc::new(image));
        inner.run_id += 1;
        inner.state = AnalysisState::default();
        debug!(run_id = inner.run_id, "Image selected");
        self.publish(&inner);
    }

    /// Store the location hint. It is read when stage 2 begins, so a hint
    /// arriving while `locate` is in flight only affects later runs.
    pub async fn set_user_coordinates(&self, coordinates: UserCoordinates) {
        self.inner.write().await.user_coordinates = Some(coordinates);
        debug!("User coordinates hint stored");
    }

    /// Clear the image and return to the zero state from any step.
    pub async fn reset(&self) {
        let mut inner = self.inner.write().await;
        inner.image = None;
        inner.run_id += 1;
        inner.state = AnalysisState::default();
        info!(run_id = inner.run_id, "Pipeline reset");
        self.publish(&inner);
    }

    /// Run both stages for the selected image.
    ///
    /// Without an image this is a no-op returning the current state. While a
    /// run is in flight it fails with [`Error::Busy`]. Stage failures are not
    /// returned as errors: they move the state to `error`, and the final
    /// snapshot is returned. Retrying from `error` restarts at stage 1.
    pub async fn start(&self) -> Result<AnalysisState> {
        let (run_id, image) = {
            let mut inner = self.inner.write().await;
            let Some(image) = inner.image.clone() else {
                debug!("start() without an image ignored");
                return Ok(inner.state.clone());
            };
            if !inner.state.step.can_start() {
                return Err(Error::Busy);
            }
            inner.run_id += 1;
            inner.state = AnalysisState {
                step: AnalysisStep::Analyzing,
                ..Default::default()
            };
            self.publish(&inner);
            (inner.run_id, image)
        };

        let started = Instant::now();
        info!(
            run_id,
            model = self.gateway.model_name(),
            mime_type = image.mime_type(),
            image_bytes = image.decoded_len(),
            "Analysis started"
        );

        let description = match self.gateway.describe(&image).await {
            Ok(description) => description,
            Err(e) => return Ok(self.fail(run_id, "describe", e).await),
        };

        let hint = {
            let mut inner = self.inner.write().await;
            if inner.run_id != run_id {
                debug!(run_id, op = "describe", "Discarding result of superseded run");
                return Ok(inner.state.clone());
            }
            inner.state.step = AnalysisStep::Locating;
            inner.state.description = description.clone();
            self.publish(&inner);
            inner.user_coordinates
        };

        debug!(
            run_id,
            response_len = description.len(),
            has_hint = hint.is_some(),
            "Description stored, locating"
        );

        let answer = match self.gateway.locate(&description, &image, hint).await {
            Ok(answer) => answer,
            Err(e) => return Ok(self.fail(run_id, "locate", e).await),
        };
        let result = ResultParser::extract(answer);

        let mut inner = self.inner.write().await;
        if inner.run_id != run_id {
            debug!(run_id, op = "locate", "Discarding result of superseded run");
            return Ok(inner.state.clone());
        }
        info!(
            run_id,
            marker_found = result.coordinates.is_some(),
            citation_count = result.citations.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Analysis complete"
        );
        inner.state.step = AnalysisStep::Done;
        inner.state.location_result = Some(result);
        self.publish(&inner);
        Ok(inner.state.clone())
    }

    /// Move a live run to `error`, collapsing the cause into the single
    /// user-facing message.
    async fn fail(&self, run_id: u64, op: &'static str, cause: Error) -> AnalysisState {
        let mut inner = self.inner.write().await;
        if inner.run_id != run_id {
            debug!(run_id, op, error = %cause, "Discarding failure of superseded run");
            return inner.state.clone();
        }
        error!(run_id, op, error = %cause, "Analysis stage failed");
        inner.state.step = AnalysisStep::Error;
        inner.state.location_result = None;
        inner.state.error = Some(defaults::GEOLOCATE_FAILURE_MESSAGE.to_string());
        self.publish(&inner);
        inner.state.clone()
    }

    fn publish(&self, inner: &Inner) {
        debug_assert!(inner.state.check_invariants());
        self.events.emit(inner.run_id, inner.state.clone());
    }
}
