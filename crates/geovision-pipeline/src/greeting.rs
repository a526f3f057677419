//! Welcome line shown when the shell starts.

use tracing::debug;

use geovision_core::{defaults, ModelGateway};

/// Ask the quick model for a one-line greeting.
///
/// `quick_message` never fails; an empty reply (the swallowed-failure case)
/// becomes [`defaults::GREETING_FALLBACK`].
pub async fn fetch_greeting(gateway: &dyn ModelGateway) -> String {
    let reply = gateway.quick_message(defaults::GREETING_PROMPT).await;
    let reply = reply.trim();
    if reply.is_empty() {
        debug!("Greeting unavailable, using fallback");
        return defaults::GREETING_FALLBACK.to_string();
    }
    reply.to_string()
}
