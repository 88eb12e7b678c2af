//! jrpc-serve - JSON-RPC server for the bundled handler groups
//!
//! Usage:
//!   jrpc-serve                          - newline-delimited JSON on 127.0.0.1:7890
//!   jrpc-serve --listen 0.0.0.0:9000    - other TCP address
//!   jrpc-serve --stdio                  - Content-Length framing on stdin/stdout

use anyhow::{Context as _, Result};
use clap::Parser;
use jrpc::jsonrpc::framing::DEFAULT_MAX_FRAME_LEN;
use jrpc::jsonrpc::{
    CodePolicy, DispatchOptions, Framing, Invoker, ServeOptions, StdioServer, TcpServer,
};
use jrpc::services;
use log::{error, info};
use std::time::Duration;
use tokio::sync::oneshot;

/// jrpc-serve - serve JSON-RPC handler groups over TCP or stdio
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TCP address to listen on
    #[arg(long, default_value = "127.0.0.1:7890")]
    listen: String,

    /// Serve on stdin/stdout instead of TCP
    #[arg(long)]
    stdio: bool,

    /// Message framing: lines | content-length
    /// (defaults to lines for TCP, content-length for stdio)
    #[arg(long)]
    framing: Option<Framing>,

    /// Error codes for protocol faults: compat uses -32601 for every fault,
    /// distinct reports bad params (-32602) and bad handler shapes (-32603)
    #[arg(long, value_enum, default_value_t = CodePolicy::Compat)]
    code_policy: CodePolicy,

    /// Per-message deadline placed on the dispatch context
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Largest accepted message body in bytes
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_MAX_FRAME_LEN)]
    max_frame_bytes: usize,

    /// Log level filter (overrides RUST_LOG)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

impl Cli {
    fn dispatch_options(&self) -> DispatchOptions {
        DispatchOptions {
            code_policy: self.code_policy,
        }
    }

    fn serve_options(&self) -> ServeOptions {
        let default_framing = if self.stdio {
            Framing::ContentLength
        } else {
            Framing::Lines
        };
        ServeOptions {
            framing: self.framing.unwrap_or(default_framing),
            timeout: self.timeout_ms.map(Duration::from_millis),
            max_frame_len: self.max_frame_bytes,
        }
    }
}

fn init_logging(level: Option<&str>) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(level) = level {
        builder.parse_filters(level);
    }
    // stdioモードではstdoutをプロトコルに使うのでログはstderrへ
    builder.target(env_logger::Target::Stderr).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    let registry = services::default_registry().context("failed to register handler groups")?;
    info!("Registered {} method(s)", registry.len());
    for name in registry.list_names() {
        log::debug!("  {}", name);
    }

    let invoker = Invoker::with_options(registry, cli.dispatch_options());
    let serve_options = cli.serve_options();

    if cli.stdio {
        StdioServer::new(invoker, serve_options).run().await?;
        info!("Shutdown complete");
        return Ok(());
    }

    let server = TcpServer::bind(cli.listen.as_str(), invoker, serve_options)
        .await
        .with_context(|| format!("failed to listen on {}", cli.listen))?;
    info!(
        "Listening on {} ({:?} framing, {:?} codes)",
        server.local_addr()?,
        serve_options.framing,
        cli.dispatch_options().code_policy
    );

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                let _ = shutdown_tx.send(());
            }
            Err(e) => {
                error!("Failed to listen for Ctrl-C: {}", e);
                // 送信側を保持したまま待つ (dropするとサーバーが止まる)
                std::future::pending::<()>().await;
            }
        }
    });

    if let Err(e) = server.run_until(shutdown_rx).await {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    info!("Shutdown complete");
    Ok(())
}
