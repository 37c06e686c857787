use sieve_dns_domain::{CliOverrides, Config};
use tracing::info;

/// Load, override and validate configuration; any failure aborts startup.
pub fn load_config(path: Option<&str>, cli_overrides: CliOverrides) -> anyhow::Result<Config> {
    let config = Config::load(path, cli_overrides)?;
    config.validate()?;
    Ok(config)
}

/// Logged once the subscriber is installed, since loading happens before it.
pub fn log_config_summary(config: &Config) {
    info!(
        listen = %format!("{}:{}", config.server.bind_address, config.server.dns_port),
        upstream = %format!("{}:{}", config.upstream.address, config.upstream.port),
        timeout_ms = config.upstream.timeout_ms,
        blocked_entries = config.blocking.domains.len(),
        upstream_failure = config.server.upstream_failure.as_str(),
        "Configuration loaded"
    );
}
