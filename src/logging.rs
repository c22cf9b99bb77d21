use anyhow::Context as _;

/// Installs the stderr subscriber. `RUST_LOG` wins; otherwise `info`, or
/// `debug` with `-v`.
pub fn init(verbose: u8) -> anyhow::Result<()> {
    let fallback = if verbose == 0 { "info" } else { "debug" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(fallback))
        .context("build log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("initialize tracing subscriber: {err}"))?;

    Ok(())
}
