//! s3-browser - REST facade over an S3-compatible object store.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use url::Url;

use s3_browser::api::{self, AppState};
use s3_browser::config::AppConfig;
use s3_browser::observability::{LogFormat, LogLevel};
use s3_browser::S3Client;

/// Browse and manage buckets on an S3-compatible store over HTTP.
///
/// Flags override the matching environment variables.
#[derive(Parser, Debug)]
#[command(name = "s3-browser")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Address to listen on
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Object store endpoint URL
    #[arg(long)]
    endpoint: Option<String>,

    /// Object store region
    #[arg(long)]
    region: Option<String>,

    /// Bucket used when a request names none
    #[arg(long)]
    bucket: Option<String>,

    /// Address buckets by path instead of by host
    #[arg(long)]
    path_style: Option<bool>,

    /// Log output format
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,

    /// Minimum log level when RUST_LOG is unset
    #[arg(long, value_enum)]
    log_level: Option<LogLevel>,
}

impl Cli {
    fn apply(self, config: &mut AppConfig) -> anyhow::Result<()> {
        if let Some(bind) = self.bind {
            config.server.bind = bind;
        }
        if let Some(endpoint) = self.endpoint {
            let url = Url::parse(&endpoint)
                .with_context(|| format!("invalid endpoint: {}", endpoint))?;
            config.s3.endpoint = Some(url);
        }
        if let Some(region) = self.region {
            config.s3.region = region;
        }
        if let Some(bucket) = self.bucket {
            config.default_bucket = Some(bucket);
        }
        if let Some(path_style) = self.path_style {
            config.s3.path_style = path_style;
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::from_env().context("failed to load configuration")?;
    cli.apply(&mut config)?;
    config.validate().context("invalid configuration")?;

    config
        .logging
        .clone()
        .init()
        .context("failed to initialize logging")?;

    info!(
        endpoint = ?config.s3.endpoint.as_ref().map(Url::as_str),
        region = %config.s3.region,
        default_bucket = ?config.default_bucket,
        "starting s3-browser"
    );

    let client = S3Client::builder()
        .config(config.s3.clone())
        .build()
        .context("failed to build object store client")?;

    let state = AppState::new(Arc::new(client))
        .with_default_bucket(config.default_bucket.clone())
        .with_head_concurrency(config.head_concurrency);
    let app = api::router(state, &config.server);

    let listener = tokio::net::TcpListener::bind(config.server.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind))?;
    api::serve(listener, app).await?;

    Ok(())
}
