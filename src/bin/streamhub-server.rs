#![allow(clippy::result_large_err)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Extension, Multipart, Path, State};
use axum::http::{StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use clap::Parser;

use streamhub::auth::{self, RequestAuthenticator};
use streamhub::catalog::{FileVideoCatalog, VideoCatalog};
use streamhub::error::AccountError;
use streamhub::media::{MediaUploader, UploadedMedia};
use streamhub::model::IdentityView;
use streamhub::query::ViewerQueries;
use streamhub::session::{NewRegistration, SessionManager};
use streamhub::store::CredentialStore;
use streamhub::token::{TokenConfig, TokenService};

#[path = "streamhub_server/http_error.rs"]
mod http_error;
use self::http_error::*;
#[path = "streamhub_server/cookies.rs"]
mod cookies;
use self::cookies::*;
#[path = "streamhub_server/media_store.rs"]
mod media_store;
use self::media_store::*;
#[path = "streamhub_server/uploads.rs"]
mod uploads;
use self::uploads::*;
#[path = "streamhub_server/handlers_system.rs"]
mod handlers_system;
use self::handlers_system::*;
#[path = "streamhub_server/handlers_auth.rs"]
mod handlers_auth;
use self::handlers_auth::*;
#[path = "streamhub_server/handlers_account.rs"]
mod handlers_account;
use self::handlers_account::*;
#[path = "streamhub_server/handlers_channel.rs"]
mod handlers_channel;
use self::handlers_channel::*;
#[path = "streamhub_server/routes.rs"]
mod routes;
use self::routes::*;

#[derive(Clone)]
struct AppState {
    store: Arc<CredentialStore>,
    sessions: Arc<SessionManager>,
    authenticator: Arc<RequestAuthenticator>,
    queries: Arc<ViewerQueries>,
    media: Arc<dyn MediaUploader>,

    // Spool directory for uploaded parts before they reach the media store.
    tmp_dir: PathBuf,
}

#[derive(Parser)]
#[command(name = "streamhub-server")]
#[command(about = "Streamhub account service (development)", long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8787")]
    addr: SocketAddr,

    /// Write bound address to this file (dev/test convenience)
    #[arg(long)]
    addr_file: Option<PathBuf>,

    /// Data directory
    #[arg(long, default_value = "./streamhub-data")]
    data_dir: PathBuf,

    /// Access-token signing secret
    #[arg(long, default_value = "streamhub-dev-access")]
    access_token_secret: String,

    /// Refresh-token signing secret
    #[arg(long, default_value = "streamhub-dev-refresh")]
    refresh_token_secret: String,

    /// Access-token lifetime in seconds
    #[arg(long, default_value_t = 3600)]
    access_ttl_secs: i64,

    /// Refresh-token lifetime in seconds
    #[arg(long, default_value_t = 864_000)]
    refresh_ttl_secs: i64,
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();

    let store = Arc::new(CredentialStore::open(&args.data_dir).context("open credential store")?);
    let tokens = TokenService::new(&TokenConfig {
        access_secret: args.access_token_secret.clone(),
        refresh_secret: args.refresh_token_secret.clone(),
        access_ttl_secs: args.access_ttl_secs,
        refresh_ttl_secs: args.refresh_ttl_secs,
    });

    let catalog: Arc<dyn VideoCatalog> = Arc::new(
        FileVideoCatalog::open(&args.data_dir.join("videos.json")).context("open video catalog")?,
    );
    let media: Arc<dyn MediaUploader> =
        Arc::new(LocalMediaStore::new(args.data_dir.join("media")));

    let tmp_dir = args.data_dir.join("tmp");
    std::fs::create_dir_all(&tmp_dir)
        .with_context(|| format!("create tmp dir {}", tmp_dir.display()))?;

    let state = Arc::new(AppState {
        sessions: Arc::new(SessionManager::new(store.clone(), tokens.clone())),
        authenticator: Arc::new(RequestAuthenticator::new(store.clone(), tokens)),
        queries: Arc::new(ViewerQueries::new(store.clone(), catalog)),
        store,
        media,
        tmp_dir,
    });

    let app = Router::new()
        .route("/healthz", get(healthz))
        .nest("/api/v1", api_router(state.clone()))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(args.addr)
        .await
        .with_context(|| format!("bind {}", args.addr))?;

    let local_addr = listener.local_addr().context("read listener local addr")?;
    tracing::info!(%local_addr, "streamhub-server listening");

    if let Some(addr_file) = &args.addr_file {
        std::fs::write(addr_file, local_addr.to_string())
            .with_context(|| format!("write addr file {}", addr_file.display()))?;
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
