use std::io;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use clap::Parser;
use sheetsrv::args::ServerArgs;
use tokio::runtime::{Builder, Runtime};

fn main() -> Result<()> {
    // Values from a `.env` file are visible to the env backed args below. A
    // missing file is fine.
    let _ = dotenvy::dotenv();

    let args = ServerArgs::parse();
    logutil::configure_global_logger(
        logutil::level_from_verbosity(args.verbose),
        args.log_format.into(),
        io::stderr,
    );

    let config = args.into_config()?;
    let runtime = build_runtime()?;
    runtime.block_on(sheetsrv::run(config))
}

fn build_runtime() -> Result<Runtime> {
    let runtime = Builder::new_multi_thread()
        .thread_name_fn(|| {
            static ATOMIC_ID: AtomicU64 = AtomicU64::new(0);
            let id = ATOMIC_ID.fetch_add(1, Ordering::Relaxed);
            format!("sheetsrv-worker-{id}")
        })
        .enable_all()
        .build()?;

    Ok(runtime)
}
