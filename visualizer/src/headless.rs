use anyhow::Context;
use hsadcore::config::SessionConfig;
use hsadcore::input::{FileSelector, SelectedFile};
use hsadcore::prelude::AnalyzeTransport;
use hsadcore::session::SessionController;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Builder as TokioBuilder;

/// One analyze round without a window; the summary goes to stdout.
pub fn run(
    config: SessionConfig,
    transport: Arc<dyn AnalyzeTransport>,
    image: PathBuf,
    save_visualization: Option<PathBuf>,
) -> anyhow::Result<()> {
    let runtime = TokioBuilder::new_current_thread()
        .enable_all()
        .build()
        .context("creating runtime for headless analysis")?;
    let report = runtime.block_on(analyze_file(&config, transport, &image))?;
    print!("{}", report.summary);

    if let (Some(path), Some(png)) = (save_visualization, report.visualization) {
        fs::write(&path, png)
            .with_context(|| format!("writing visualization {}", path.display()))?;
        println!("Visualization saved to {}", path.display());
    }
    Ok(())
}

#[derive(Debug)]
pub struct Report {
    pub summary: String,
    pub visualization: Option<Vec<u8>>,
}

pub async fn analyze_file(
    config: &SessionConfig,
    transport: Arc<dyn AnalyzeTransport>,
    image: &Path,
) -> anyhow::Result<Report> {
    let mut session = SessionController::new(config, transport);
    let file = SelectedFile::load(image)
        .await
        .with_context(|| format!("reading image {}", image.display()))?;
    FileSelector::new(|file| session.select_file(file)).pick(Some(file));

    let result = match session.analyze().await {
        Ok(result) => result,
        Err(err) => anyhow::bail!("{}", err.user_message()),
    };
    let visualization = match &result.visualization {
        Some(visualization) => Some(
            visualization
                .decode()
                .context("decoding visualization payload")?,
        ),
        None => None,
    };

    let summary = format!(
        "Anomalies detected: {}\nTotal pixels: {}\nAnomaly percentage: {}\nVisualization: {}\n",
        result.anomaly_count,
        result.total_pixels,
        result.percentage_label(),
        visualization
            .as_ref()
            .map(|png| format!("{} bytes PNG", png.len()))
            .unwrap_or_else(|| "none".into())
    );
    Ok(Report {
        summary,
        visualization,
    })
}
