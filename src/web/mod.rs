// src/web/mod.rs

//! Web-serving collaborator.
//!
//! The dispatcher only needs three things from it: an application handle to
//! hand to sub-applications, the port it is bound to, and a way to start
//! serving. What the API actually serves is not this crate's concern; the
//! production host exposes a `/health` route so launches can be checked.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::errors::Result;
use crate::types::BoxFuture;

/// What sub-applications receive in `run(app, port)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppHandle {
    pub port: u16,
    pub base_url: String,
}

impl AppHandle {
    pub fn local(port: u16) -> Self {
        Self {
            port,
            base_url: format!("http://127.0.0.1:{port}"),
        }
    }
}

pub trait WebHost: Send + Sync {
    fn app(&self) -> AppHandle;

    fn port(&self) -> u16;

    /// Bind `port` and start serving in the background. Resolves once the
    /// listener is bound; the returned task runs until the process exits.
    fn run(&self, port: u16) -> BoxFuture<'_, Result<JoinHandle<()>>>;
}

/// Creates the web host the first time a batch step asks for it.
pub type WebHostFactory = Arc<dyn Fn(u16) -> Arc<dyn WebHost> + Send + Sync>;

/// Production host: an `axum` router.
#[derive(Debug, Clone)]
pub struct AxumWebHost {
    port: u16,
}

impl AxumWebHost {
    pub fn new(port: u16) -> Self {
        Self { port }
    }

    pub fn factory() -> WebHostFactory {
        Arc::new(|port| Arc::new(AxumWebHost::new(port)) as Arc<dyn WebHost>)
    }

    fn router() -> Router {
        Router::new().route("/health", get(health))
    }
}

impl WebHost for AxumWebHost {
    fn app(&self) -> AppHandle {
        AppHandle::local(self.port)
    }

    fn port(&self) -> u16 {
        self.port
    }

    fn run(&self, port: u16) -> BoxFuture<'_, Result<JoinHandle<()>>> {
        Box::pin(async move {
            let addr = format!("0.0.0.0:{port}");
            let listener = TcpListener::bind(&addr).await?;
            info!(%addr, "web api listening");

            Ok(tokio::spawn(async move {
                if let Err(err) = axum::serve(listener, Self::router()).await {
                    error!(error = %err, "web api stopped");
                }
            }))
        })
    }
}

async fn health() -> &'static str {
    "ok"
}
