//! Push delivery collaborator.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::push::{PushMessage, PushOutcome};

/// Sends push messages to devices.
#[async_trait]
pub trait PushGateway: Send + Sync + 'static {
    /// Send every message in one batch.
    ///
    /// Returns one outcome per message, in input order. An `Err` means
    /// the gateway could not be reached at all and nothing was delivered;
    /// individual rejections are reported as unsuccessful outcomes.
    async fn send_batch(&self, messages: &[PushMessage]) -> AppResult<Vec<PushOutcome>>;

    /// Name of the gateway for logging.
    fn name(&self) -> &str;
}
