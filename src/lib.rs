//! # autovote
//!
//! Web dashboard for [`autovote_runner`]: manage saved sites, start runs and
//! follow their progress live.
//!
//! ```rust,no_run
//! use autovote::{app, browser_launcher, AppState};
//! use autovote_runner::{BrowserOptions, LogBroadcast, SiteStore};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let state = AppState::new(
//!     SiteStore::open("sites.yaml")?,
//!     LogBroadcast::default(),
//!     browser_launcher(BrowserOptions::default()),
//! );
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//! axum::serve(listener, app(state, None)).await?;
//! # Ok(())
//! # }
//! ```

mod routes;
mod sse;
mod state;

use std::path::Path;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::info;

pub use state::{browser_launcher, AppState, Launcher};

/// Build the full router: `/api/*` plus static files from `public_dir` when
/// that directory exists.
pub fn app(state: AppState, public_dir: Option<&Path>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut app = Router::new()
        .nest("/api", routes::api_router())
        .layer(cors)
        .with_state(state);

    match public_dir {
        Some(dir) if dir.exists() => {
            info!(public_dir = %dir.display(), "serving static files");
            app = app.fallback_service(ServeDir::new(dir).append_index_html_on_directories(true));
        }
        Some(dir) => info!(public_dir = %dir.display(), "public directory not found, API-only mode"),
        None => {}
    }

    app
}
