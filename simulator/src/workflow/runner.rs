use crate::generator::mask::{build_anomaly_mask, render_mask_png};
use crate::service::model::UploadedImage;
use crate::workflow::config::ServiceConfig;
use anyhow::Context;
use hsadcore::api::{AnalysisResult, Visualization};
use log::info;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

/// Produces the reply body for each upload from the configured scene.
pub struct Runner {
    config: ServiceConfig,
    requests: AtomicU64,
    last_upload: RwLock<Option<UploadedImage>>,
}

impl Runner {
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            config,
            requests: AtomicU64::new(0),
            last_upload: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// The most recent upload handed to `execute`, as received.
    pub fn last_upload(&self) -> Option<UploadedImage> {
        self.last_upload
            .read()
            .ok()
            .and_then(|upload| upload.clone())
    }

    /// Each request draws a fresh scene; the n-th request uses `seed + n`.
    pub fn execute(&self, upload: &UploadedImage) -> anyhow::Result<Value> {
        if let Ok(mut last) = self.last_upload.write() {
            *last = Some(upload.clone());
        }
        if let Some(message) = &self.config.fail_with {
            anyhow::bail!("{}", message);
        }

        let sequence = self.requests.fetch_add(1, Ordering::Relaxed);
        let seed = self.config.seed.wrapping_add(sequence);
        let rows = self.config.rows;
        let cols = self.config.cols;
        let total_pixels = self.config.total_pixels()?;

        let mask = build_anomaly_mask(rows, cols, self.config.anomalies, seed)
            .context("building anomaly mask")?;
        let anomaly_count = mask.iter().filter(|hit| **hit).count() as u64;
        let mut result = AnalysisResult::new(anomaly_count, total_pixels);

        if self.config.visualization && !mask.is_empty() {
            let png = render_mask_png(&mask, rows, cols)?;
            result = result.with_visualization(Visualization::from_png(&png));
        }

        info!(
            "{} ({} bytes) -> {} anomalies / {} pixels",
            upload.file_name,
            upload.bytes.len(),
            result.anomaly_count,
            result.total_pixels
        );

        let mut body = serde_json::to_value(&result).context("serializing result")?;
        if self.config.omit_totals {
            if let Some(fields) = body.as_object_mut() {
                fields.remove("total_pixels");
            }
        }
        Ok(body)
    }
}
