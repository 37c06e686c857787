use clap::Parser;
use sieve_dns_domain::CliOverrides;
use sieve_dns_infrastructure::dns::DnsServerHandler;
use tokio_util::sync::CancellationToken;
use tracing::info;

mod bootstrap;
mod di;
mod server;

#[derive(Parser)]
#[command(name = "sieve-dns")]
#[command(version)]
#[command(about = "Sieve DNS - forwarding DNS proxy with a domain blacklist")]
struct Cli {
    /// Configuration file path (.toml, or a legacy conf.json)
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<String>,

    /// DNS server port
    #[arg(short = 'd', long)]
    dns_port: Option<u16>,

    /// Bind address
    #[arg(short = 'b', long)]
    bind: Option<String>,

    /// Upstream resolver, `ip` or `ip:port`
    #[arg(long, value_name = "ADDR")]
    upstream: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cli_overrides = CliOverrides {
        dns_port: cli.dns_port,
        bind_address: cli.bind,
        upstream: cli.upstream,
        log_level: cli.log_level,
    };

    let config = bootstrap::load_config(cli.config.as_deref(), cli_overrides)?;

    bootstrap::init_logging(&config);

    info!("Starting Sieve DNS v{}", env!("CARGO_PKG_VERSION"));

    let dns_services = di::DnsServices::new(&config).await?;
    let stats = dns_services.use_case.stats();
    let handler = DnsServerHandler::new(dns_services.use_case, config.server.upstream_failure);

    let shutdown = CancellationToken::new();
    bootstrap::spawn_shutdown_listener(shutdown.clone());

    server::start_dns_server(
        server::DnsServerSettings::from_config(&config)?,
        handler,
        shutdown,
    )
    .await?;

    let snapshot = stats.snapshot();
    info!(
        blocked = snapshot.blocked,
        forwarded = snapshot.forwarded,
        failed = snapshot.failed,
        "Server shutdown complete"
    );
    Ok(())
}
