use anyhow::Context;
use clap::Parser;
use log::info;
use service::routes;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::ServiceConfig;
use workflow::runner::Runner;

mod generator;
mod service;
mod workflow;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Scripted stand-in for the hyperspectral anomaly detection service"
)]
struct Args {
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    #[arg(long, default_value_t = 4000)]
    port: u16,
    /// Load the scene and scripted behaviour from YAML
    #[arg(long)]
    scenario: Option<PathBuf>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    rows: Option<u32>,
    #[arg(long)]
    cols: Option<u32>,
    #[arg(long)]
    anomalies: Option<usize>,
    /// Answer every upload with a 500 carrying this message
    #[arg(long)]
    fail_with: Option<String>,
}

impl Args {
    fn service_config(&self) -> anyhow::Result<ServiceConfig> {
        let mut config = match &self.scenario {
            Some(path) => ServiceConfig::load(path)?,
            None => ServiceConfig::default(),
        };
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(rows) = self.rows {
            config.rows = rows;
        }
        if let Some(cols) = self.cols {
            config.cols = cols;
        }
        if let Some(anomalies) = self.anomalies {
            config.anomalies = anomalies;
        }
        if self.fail_with.is_some() {
            config.fail_with = self.fail_with.clone();
        }
        Ok(config)
    }

    fn bind_address(&self) -> anyhow::Result<SocketAddr> {
        let ip: IpAddr = self
            .host
            .parse()
            .with_context(|| format!("parsing host address {}", self.host))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = args.service_config()?;
    config.total_pixels().context("validating scene size")?;
    let addr = args.bind_address()?;
    let runner = Arc::new(Runner::new(config));
    let scene = runner.config();
    info!(
        "scene {}x{} with {} anomalies (seed {})",
        scene.rows, scene.cols, scene.anomalies, scene.seed
    );

    let runtime = TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating runtime for the detection stand-in")?;
    runtime.block_on(async move {
        let shutdown = async {
            if signal::ctrl_c().await.is_ok() {
                info!("Ctrl+C received, shutting down");
            }
        };
        routes::serve(runner, addr, shutdown).await
    })
}
