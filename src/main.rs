use tracing::error;
use tracing::metadata::LevelFilter;
use tracing_subscriber::prelude::*;

fn main() {
    if let Err(err) = try_main() {
        error!("Exiting with an error...\n{err:?}");
        std::process::exit(1);
    }
}

fn try_main() -> anyhow::Result<()> {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact();

    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(LevelFilter::DEBUG.into())
        .with_env_var("WASTICKER_LOG")
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(filter)
        .init();

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(wasticker::run())
}
