//! In-memory collaborators shared by the unit tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{Mutex, Notify};

use crate::ai::{AnalysisGatewayTrait, AnalysisRequest};
use crate::errors::{Error, Result};
use crate::models::{Coordinates, LocationInfo, QualityAnalysis};
use crate::remote::{DataGatewayTrait, Envelope};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Fetch {
        action: String,
        params: Vec<(String, String)>,
    },
    Send {
        action: String,
        payload: Value,
    },
}

/// Scripted backend. Unscripted actions answer with a failure envelope.
#[derive(Default)]
pub(crate) struct FakeGateway {
    fetches: Mutex<HashMap<String, Envelope>>,
    sends: Mutex<HashMap<String, Envelope>>,
    holds: Mutex<HashMap<String, Arc<Notify>>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeGateway {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) async fn on_fetch(&self, action: &str, envelope: Envelope) {
        self.fetches
            .lock()
            .await
            .insert(action.to_string(), envelope);
    }

    pub(crate) async fn on_send(&self, action: &str, envelope: Envelope) {
        self.sends.lock().await.insert(action.to_string(), envelope);
    }

    /// Makes fetches of `action` wait until the returned handle is notified.
    pub(crate) async fn hold(&self, action: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.holds
            .lock()
            .await
            .insert(action.to_string(), notify.clone());
        notify
    }

    pub(crate) async fn calls(&self) -> Vec<Call> {
        self.calls.lock().await.clone()
    }

    pub(crate) async fn fetched(&self, action: &str) -> Vec<Vec<(String, String)>> {
        self.calls()
            .await
            .into_iter()
            .filter_map(|call| match call {
                Call::Fetch { action: a, params } if a == action => Some(params),
                _ => None,
            })
            .collect()
    }

    pub(crate) async fn sent(&self, action: &str) -> Vec<Value> {
        self.calls()
            .await
            .into_iter()
            .filter_map(|call| match call {
                Call::Send { action: a, payload } if a == action => Some(payload),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl DataGatewayTrait for FakeGateway {
    async fn fetch(&self, action: &str, params: &[(&str, String)]) -> Envelope {
        self.calls.lock().await.push(Call::Fetch {
            action: action.to_string(),
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        });
        let hold = self.holds.lock().await.get(action).cloned();
        if let Some(hold) = hold {
            hold.notified().await;
        }
        self.fetches
            .lock()
            .await
            .get(action)
            .cloned()
            .unwrap_or_else(|| Envelope::failure("offline"))
    }

    async fn send(&self, action: &str, payload: &Value) -> Envelope {
        self.calls.lock().await.push(Call::Send {
            action: action.to_string(),
            payload: payload.clone(),
        });
        self.sends
            .lock()
            .await
            .get(action)
            .cloned()
            .unwrap_or_else(|| Envelope::failure("offline"))
    }
}

/// AI service returning fixed answers, or failing when none is set.
#[derive(Default)]
pub(crate) struct FakeAnalysis {
    pub(crate) verdict: Mutex<Option<QualityAnalysis>>,
    pub(crate) ingredients: Mutex<Option<String>>,
    /// Lookup results; `locate` answers with the first one.
    pub(crate) places: Mutex<Option<Vec<LocationInfo>>>,
    pub(crate) searches: Mutex<Vec<(String, Option<Coordinates>)>>,
}

#[async_trait]
impl AnalysisGatewayTrait for FakeAnalysis {
    async fn analyze_food_quality(&self, _request: &AnalysisRequest) -> Result<QualityAnalysis> {
        self.verdict
            .lock()
            .await
            .clone()
            .ok_or_else(|| Error::analysis("model unavailable"))
    }

    async fn detect_ingredients(&self, _image_jpeg: &[u8]) -> Result<String> {
        self.ingredients
            .lock()
            .await
            .clone()
            .ok_or_else(|| Error::analysis("model unavailable"))
    }

    async fn locate(&self, _at: Coordinates) -> Result<LocationInfo> {
        self.places
            .lock()
            .await
            .as_ref()
            .and_then(|places| places.first().cloned())
            .ok_or_else(|| Error::analysis("maps unavailable"))
    }

    async fn search_locations(
        &self,
        query: &str,
        near: Option<Coordinates>,
    ) -> Result<Vec<LocationInfo>> {
        self.searches.lock().await.push((query.to_string(), near));
        self.places
            .lock()
            .await
            .clone()
            .ok_or_else(|| Error::analysis("maps unavailable"))
    }
}
