//! Mock model gateway for deterministic testing.
//!
//! Replies are scripted per operation: queued one-shot replies are used first,
//! then the default reply. Every call is logged for assertions, and a stage
//! can be held open with a [`MockGate`] to exercise in-flight behavior.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use geovision_core::{Image, ModelGateway};
//! use geovision_inference::mock::MockGateway;
//!
//! #[tokio::test]
//! async fn test_with_mock_gateway() {
//!     let gateway = MockGateway::new().with_description("brick rowhouses");
//!     let image = Image::from_data_uri("aGVsbG8=").unwrap();
//!
//!     assert_eq!(gateway.describe(&image).await.unwrap(), "brick rowhouses");
//!     assert_eq!(gateway.call_count("describe"), 1);
//! }
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use geovision_core::{Error, GroundedAnswer, Image, ModelGateway, Result, UserCoordinates};

type Reply<T> = std::result::Result<T, String>;

/// One logged gateway call.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub operation: &'static str,
    /// Description for `locate`, prompt for `quick_message`, mime type for `describe`.
    pub input: String,
    pub hint: Option<UserCoordinates>,
}

/// Holds a stage open until released.
#[derive(Debug, Default)]
pub struct MockGate {
    entered: Notify,
    release: Notify,
}

impl MockGate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Wait until a call has reached the gate.
    pub async fn wait_entered(&self) {
        self.entered.notified().await;
    }

    /// Let the held call (or the next one) through.
    pub fn release(&self) {
        self.release.notify_one();
    }

    async fn pass(&self) {
        self.entered.notify_one();
        self.release.notified().await;
    }
}

#[derive(Debug)]
struct MockState {
    describe_default: Reply<String>,
    describe_queue: VecDeque<Reply<String>>,
    locate_default: Reply<GroundedAnswer>,
    locate_queue: VecDeque<Reply<GroundedAnswer>>,
    quick_reply: String,
    calls: Vec<MockCall>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            describe_default: Ok("Mock description".to_string()),
            describe_queue: VecDeque::new(),
            locate_default: Ok(GroundedAnswer {
                text: "Mock location".to_string(),
                citations: Vec::new(),
            }),
            locate_queue: VecDeque::new(),
            quick_reply: "Mock greeting".to_string(),
            calls: Vec::new(),
        }
    }
}

/// Scripted [`ModelGateway`].
#[derive(Clone, Default)]
pub struct MockGateway {
    state: Arc<Mutex<MockState>>,
    describe_gate: Option<Arc<MockGate>>,
    locate_gate: Option<Arc<MockGate>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default `describe` reply.
    pub fn with_description(self, text: impl Into<String>) -> Self {
        self.state.lock().unwrap().describe_default = Ok(text.into());
        self
    }

    /// Make `describe` fail with a transport error by default.
    pub fn with_describe_error(self, message: impl Into<String>) -> Self {
        self.state.lock().unwrap().describe_default = Err(message.into());
        self
    }

    /// One-shot `describe` reply, used before the default.
    pub fn queue_describe(self, reply: Reply<String>) -> Self {
        self.state.lock().unwrap().describe_queue.push_back(reply);
        self
    }

    /// Default `locate` reply.
    pub fn with_location(self, answer: GroundedAnswer) -> Self {
        self.state.lock().unwrap().locate_default = Ok(answer);
        self
    }

    /// Make `locate` fail with a transport error by default.
    pub fn with_locate_error(self, message: impl Into<String>) -> Self {
        self.state.lock().unwrap().locate_default = Err(message.into());
        self
    }

    /// One-shot `locate` reply, used before the default.
    pub fn queue_locate(self, reply: Reply<GroundedAnswer>) -> Self {
        self.state.lock().unwrap().locate_queue.push_back(reply);
        self
    }

    /// Reply for `quick_message`; an empty string simulates a swallowed failure.
    pub fn with_quick_message(self, text: impl Into<String>) -> Self {
        self.state.lock().unwrap().quick_reply = text.into();
        self
    }

    /// Hold every `describe` call at `gate`.
    pub fn with_describe_gate(mut self, gate: Arc<MockGate>) -> Self {
        self.describe_gate = Some(gate);
        self
    }

    /// Hold every `locate` call at `gate`.
    pub fn with_locate_gate(mut self, gate: Arc<MockGate>) -> Self {
        self.locate_gate = Some(gate);
        self
    }

    /// Get all logged calls for assertion.
    pub fn calls(&self) -> Vec<MockCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self, operation: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    /// Operation names in call order.
    pub fn operations(&self) -> Vec<&'static str> {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .map(|c| c.operation)
            .collect()
    }

    fn log(&self, operation: &'static str, input: &str, hint: Option<UserCoordinates>) {
        self.state.lock().unwrap().calls.push(MockCall {
            operation,
            input: input.to_string(),
            hint,
        });
    }
}

#[async_trait]
impl ModelGateway for MockGateway {
    async fn describe(&self, image: &Image) -> Result<String> {
        self.log("describe", image.mime_type(), None);
        if let Some(gate) = &self.describe_gate {
            gate.pass().await;
        }
        let reply = {
            let mut state = self.state.lock().unwrap();
            state
                .describe_queue
                .pop_front()
                .unwrap_or_else(|| state.describe_default.clone())
        };
        reply.map_err(Error::Request)
    }

    async fn locate(
        &self,
        description: &str,
        _image: &Image,
        hint: Option<UserCoordinates>,
    ) -> Result<GroundedAnswer> {
        self.log("locate", description, hint);
        if let Some(gate) = &self.locate_gate {
            gate.pass().await;
        }
        let reply = {
            let mut state = self.state.lock().unwrap();
            state
                .locate_queue
                .pop_front()
                .unwrap_or_else(|| state.locate_default.clone())
        };
        reply.map_err(Error::Request)
    }

    async fn quick_message(&self, prompt: &str) -> String {
        self.log("quick_message", prompt, None);
        self.state.lock().unwrap().quick_reply.clone()
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
