use anyhow::Context;
use app::App;
use clap::Parser;
use hsadcore::config::SessionConfig;
use hsadcore::prelude::AnalyzeTransport;
use hsadcore::transport::HttpTransport;
use std::path::PathBuf;
use std::sync::Arc;

mod app;
mod gauge;
mod headless;

#[derive(Parser)]
#[command(author, version, about = "Hyperspectral anomaly detection client")]
struct Args {
    /// Load session settings from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    /// Service URL the first request is sent to
    #[arg(long)]
    endpoint: Option<String>,
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// Analyze this image without opening a window
    #[arg(long)]
    headless: Option<PathBuf>,
    /// Headless only: write the returned visualization PNG here
    #[arg(long)]
    save_visualization: Option<PathBuf>,
}

impl Args {
    fn session_config(&self) -> anyhow::Result<SessionConfig> {
        let mut config = match &self.config {
            Some(path) => SessionConfig::load(path)?,
            None => SessionConfig::default(),
        };
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = endpoint.clone();
        }
        if self.timeout_secs.is_some() {
            config.request_timeout_secs = self.timeout_secs;
        }
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = args.session_config()?;
    let transport: Arc<dyn AnalyzeTransport> =
        Arc::new(HttpTransport::new(&config).context("building HTTP client")?);

    if let Some(image) = args.headless {
        return headless::run(config, transport, image, args.save_visualization);
    }

    iced::application(
        move || App::boot(config.clone(), transport.clone()),
        App::update,
        App::view,
    )
    .title(app::title)
    .theme(app::theme)
    .run()
    .map_err(|err| anyhow::anyhow!("running the desktop UI: {}", err))
}
