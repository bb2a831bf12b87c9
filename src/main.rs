//! Dashboard server: saved sites, run launcher and live log stream.

use std::net::SocketAddr;
use std::path::PathBuf;

use autovote::{app, browser_launcher, AppState};
use autovote_runner::{BrowserOptions, LogBroadcast, SiteStore};
use clap::Parser;
use tracing::info;

#[derive(Parser)]
#[command(name = "autovote-dashboard")]
#[command(about = "Web dashboard for automated voting runs")]
#[command(version)]
struct Args {
    /// Address to bind the server to
    #[arg(long, env = "AUTOVOTE_BIND", default_value = "127.0.0.1")]
    bind: String,

    /// Port to listen on
    #[arg(long, env = "AUTOVOTE_PORT", default_value = "3000")]
    port: u16,

    /// Site configuration file
    #[arg(long, env = "AUTOVOTE_SITES", default_value = "sites.yaml")]
    sites: PathBuf,

    /// Directory with the dashboard's static files
    #[arg(long, env = "AUTOVOTE_PUBLIC_DIR", default_value = "public")]
    public_dir: PathBuf,

    /// Run browsers without a window
    #[arg(long)]
    headless: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("autovote=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let sites = SiteStore::open(&args.sites)?;
    info!(sites = %sites.path().display(), count = sites.list().len(), "loaded sites");

    let browser = BrowserOptions {
        headless: args.headless,
        ..Default::default()
    };
    let state = AppState::new(sites, LogBroadcast::default(), browser_launcher(browser));
    let router = app(state, Some(&args.public_dir));

    let addr: SocketAddr = format!("{}:{}", args.bind, args.port).parse()?;
    info!(addr = %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
