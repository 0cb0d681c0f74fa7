use clap::Parser;

use vhttpd::config::{Args, Config};
use vhttpd::server::Server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let args = Args::parse();
    tracing::info!(
        port = args.port,
        listen = ?args.listen,
        vh_config = %args.vh_config.display(),
        docroot = %args.docroot.display(),
        "Server configs"
    );

    let cfg = Config::load(&args)?;
    for (host, root) in cfg.virtual_hosts.hosts() {
        tracing::info!(host, root = %root.display(), "Virtual host");
    }

    let server = Server::new(cfg.virtual_hosts);

    tokio::select! {
        res = server.run(&cfg.listen_addr) => {
            res?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
