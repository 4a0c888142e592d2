use crate::math::StatsHelper;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Statistics returned by the detection service for one uploaded image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub anomaly_count: u64,
    pub total_pixels: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visualization: Option<Visualization>,
}

impl AnalysisResult {
    pub fn new(anomaly_count: u64, total_pixels: u64) -> Self {
        Self {
            anomaly_count,
            total_pixels,
            visualization: None,
        }
    }

    pub fn with_visualization(mut self, visualization: Visualization) -> Self {
        self.visualization = Some(visualization);
        self
    }

    /// Display-only; `None` when `total_pixels` is zero.
    pub fn anomaly_percentage(&self) -> Option<f64> {
        StatsHelper::percentage(self.anomaly_count, self.total_pixels)
    }

    pub fn percentage_label(&self) -> String {
        StatsHelper::percentage_label(self.anomaly_count, self.total_pixels)
    }

    pub fn anomaly_ratio(&self) -> f32 {
        StatsHelper::ratio(self.anomaly_count, self.total_pixels)
    }
}

/// Base64-encoded PNG produced by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Visualization(String);

impl Visualization {
    pub fn from_base64(payload: impl Into<String>) -> Self {
        Self(payload.into())
    }

    pub fn from_png(bytes: &[u8]) -> Self {
        Self(base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    pub fn data_uri(&self) -> String {
        format!("data:image/png;base64,{}", self.0)
    }

    /// Raw PNG bytes for image widgets that cannot load data URIs.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        base64::engine::general_purpose::STANDARD.decode(self.0.trim())
    }
}
