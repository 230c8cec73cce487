// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! bamd: reads BAM events as JSON lines on stdin and acknowledges them on
//! stdout once they are durable.

use std::process::ExitCode;

use bam_daemon::{startup, Config, LifecycleError};
use tokio::io::BufReader;
use tracing::error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

fn init_logging(config: &Config) -> Result<WorkerGuard, LifecycleError> {
    std::fs::create_dir_all(&config.state_dir)?;
    let file_name = config.log_path.file_name().unwrap_or_else(|| "bamd.log".as_ref());
    let appender = tracing_appender::rolling::never(&config.state_dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(writer).with_ansi(false).init();
    Ok(guard)
}

async fn run() -> Result<(), LifecycleError> {
    let config = Config::load()?;
    let _guard = init_logging(&config)?;

    let mut daemon = match startup(&config).await {
        Ok(daemon) => daemon,
        Err(e) => {
            error!(error = %e, "startup failed");
            return Err(e);
        }
    };
    let shutdown = async {
        // Without a signal handler, end of input is the only way out
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };
    let result = daemon.run(BufReader::new(tokio::io::stdin()), tokio::io::stdout(), shutdown).await;
    daemon.shutdown().await?;
    result
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("bamd: {e}");
            ExitCode::FAILURE
        }
    }
}
