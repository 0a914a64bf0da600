// src/lib.rs

pub mod build;
pub mod cli;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod launch;
pub mod logging;
pub mod prompt;
pub mod runtime;
pub mod types;
pub mod watch;
pub mod web;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{ResolvedOptions, load_or_default};
use crate::context::ContextBuilder;
use crate::dispatch::{DispatchOutcome, Dispatcher};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and option resolution
/// - the shared context with the production collaborators
/// - one dispatch
/// - Ctrl-C handling while a web API or job watcher is running
pub async fn run(args: CliArgs) -> Result<DispatchOutcome> {
    let cfg = load_or_default(args.config.as_deref(), args.app_root.as_deref())?;
    let opts = ResolvedOptions::resolve(&cfg, args.overrides())?;
    debug!(?opts, "resolved options");

    if !opts.no_logo && is_cwd(&opts.app_root) {
        print_banner();
    }

    let ctx = Arc::new(ContextBuilder::new(cfg).log_level(opts.log_level).build());
    let dispatcher = Dispatcher::new(Arc::clone(&ctx));

    let outcome = dispatcher.run(&opts).await;

    if outcome.is_resolved() && ctx.has_long_lived() {
        info!("running until Ctrl-C");
        tokio::signal::ctrl_c().await?;
        info!("shutting down");
    }

    Ok(outcome)
}

fn is_cwd(app_root: &Path) -> bool {
    let Ok(cwd) = std::env::current_dir() else {
        return false;
    };
    match (cwd.canonicalize(), app_root.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => cwd == app_root,
    }
}

fn print_banner() {
    eprintln!("quasar v{}", env!("CARGO_PKG_VERSION"));
}
