// src/main.rs

use quasar::dispatch::DispatchOutcome;
use quasar::{cli, logging, run};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    match run_main().await {
        Ok(DispatchOutcome::Resolved) => {}
        Ok(DispatchOutcome::Rejected(_)) => std::process::exit(1),
        Err(err) => {
            eprintln!("quasar error: {err:?}");
            std::process::exit(1);
        }
    }
}

async fn run_main() -> anyhow::Result<DispatchOutcome> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await
}
