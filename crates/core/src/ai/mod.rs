//! Contract of the AI service: food-photo analysis and place lookup.

use async_trait::async_trait;

use crate::errors::Result;
use crate::models::{Coordinates, LocationInfo, QualityAnalysis};

/// One photo plus optional free-text hints for the analysis.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnalysisRequest {
    /// JPEG bytes.
    pub image_jpeg: Vec<u8>,
    /// Free-text context ("dimasak pagi ini", ingredients list, ...).
    pub context: String,
}

impl AnalysisRequest {
    pub fn new(image_jpeg: Vec<u8>, context: impl Into<String>) -> Self {
        Self {
            image_jpeg,
            context: context.into(),
        }
    }

    /// The image as a `data:` URL, as stored in quality-check history.
    pub fn data_url(&self) -> String {
        use base64::Engine;
        format!(
            "data:image/jpeg;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&self.image_jpeg)
        )
    }
}

#[async_trait]
pub trait AnalysisGatewayTrait: Send + Sync {
    /// Structured food-quality verdict for one photo.
    async fn analyze_food_quality(&self, request: &AnalysisRequest) -> Result<QualityAnalysis>;

    /// Comma-joined list of ingredients visible in the photo.
    async fn detect_ingredients(&self, image_jpeg: &[u8]) -> Result<String>;

    /// Describes the place at `at`.
    async fn locate(&self, at: Coordinates) -> Result<LocationInfo>;

    /// Places matching `query`, biased towards `near` when given. Only
    /// results with a maps link are returned.
    async fn search_locations(
        &self,
        query: &str,
        near: Option<Coordinates>,
    ) -> Result<Vec<LocationInfo>>;
}
