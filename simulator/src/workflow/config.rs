use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Largest scene the stand-in renders (4096 x 4096).
pub const MAX_SCENE_PIXELS: u64 = 4096 * 4096;

/// Shape of the synthetic scene and the scripted behaviour of the service.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub rows: u32,
    pub cols: u32,
    pub anomalies: usize,
    pub seed: u64,
    pub visualization: bool,
    /// Answer every upload with a 500 carrying this message.
    pub fail_with: Option<String>,
    /// Drop `total_pixels` from successful replies.
    pub omit_totals: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            rows: 100,
            cols: 100,
            anomalies: 20,
            seed: 42,
            visualization: true,
            fail_with: None,
            omit_totals: false,
        }
    }
}

impl ServiceConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading scenario {}", path_ref.display()))?;
        let config: ServiceConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing scenario {}", path_ref.display()))?;
        Ok(config)
    }

    /// Scene size, rejecting grids above `MAX_SCENE_PIXELS`.
    pub fn total_pixels(&self) -> anyhow::Result<u64> {
        let total = u64::from(self.rows) * u64::from(self.cols);
        anyhow::ensure!(
            total <= MAX_SCENE_PIXELS,
            "scene {}x{} exceeds {} pixels",
            self.rows,
            self.cols,
            MAX_SCENE_PIXELS
        );
        Ok(total)
    }
}
