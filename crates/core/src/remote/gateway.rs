use async_trait::async_trait;
use serde_json::Value;

use super::Envelope;

/// Action-dispatch transport to the remote data backend.
///
/// Implementations never fail: transport errors and non-2xx responses come
/// back as [`Envelope::failure`].
#[async_trait]
pub trait DataGatewayTrait: Send + Sync {
    /// Read call: `GET ?action=<action>&<params>&_=<cache-buster>`.
    async fn fetch(&self, action: &str, params: &[(&str, String)]) -> Envelope;

    /// Write call: `POST {"action": <action>, "payload": <payload>}`.
    async fn send(&self, action: &str, payload: &Value) -> Envelope;
}
