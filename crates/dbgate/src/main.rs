//! dbgate — turns a declarative API document into live HTTP endpoints,
//! each backed by one PostgreSQL stored function.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dbgate_compiler::compile_document;
use dbgate_lib::{create_pool, Gateway};
use dbgate_spec::Document;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dbgate", about = "OpenAPI-driven HTTP gateway for PostgreSQL", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load a document and serve its endpoints.
    Serve {
        /// Path to the API document (YAML).
        #[arg(short, long)]
        config: String,

        /// Listen address; defaults to 0.0.0.0 on the document's port.
        #[arg(long)]
        listen: Option<String>,

        /// Log level.
        #[arg(long, default_value = "info")]
        log_level: String,
    },

    /// Load, merge and compile a document without serving.
    ///
    /// Needs no database; exits non-zero on the first error.
    Check {
        /// Path to the API document (YAML).
        #[arg(short, long)]
        config: String,
    },

    /// Print the merged document as standards-clean OpenAPI 3.0 on stdout.
    Publish {
        /// Path to the API document (YAML).
        #[arg(short, long)]
        config: String,
    },
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run_serve(config: &str, listen: Option<String>) -> anyhow::Result<()> {
    let document = Document::load(config.as_ref())
        .with_context(|| format!("failed to load {config}"))?;

    let db = document
        .db
        .clone()
        .context("document has no db section")?;
    let pool = create_pool(&db).context("failed to configure connection pool")?;

    let port = document.webserver.as_ref().map_or(8080, |w| w.port);
    let gateway = Arc::new(Gateway::new(&document, pool)?);

    let addr: SocketAddr = listen
        .unwrap_or_else(|| format!("0.0.0.0:{port}"))
        .parse()
        .context("invalid listen address")?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(%addr, routes = gateway.route_count(), "listening");

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::error!(error = %e, "accept failed");
                continue;
            }
        };

        let gateway = Arc::clone(&gateway);
        let io = TokioIo::new(stream);

        tokio::spawn(async move {
            let service = service_fn(move |req| {
                let gateway = Arc::clone(&gateway);
                async move { Ok::<_, std::convert::Infallible>(gateway.handle(req).await) }
            });

            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                tracing::debug!(%peer, error = %e, "connection closed with error");
            }
        });
    }
}

fn run_check(config: &str) -> anyhow::Result<()> {
    let document = Document::load(config.as_ref())
        .with_context(|| format!("failed to load {config}"))?;
    let operations = compile_document(&document)?;
    for op in &operations {
        eprintln!("{} {} -> {}", op.verb.as_str(), op.path, op.sql);
    }
    eprintln!("ok: {} operation(s)", operations.len());
    Ok(())
}

fn run_publish(config: &str) -> anyhow::Result<()> {
    let document = Document::load(config.as_ref())
        .with_context(|| format!("failed to load {config}"))?;
    let yaml = serde_yaml::to_string(&document.publish())
        .context("failed to serialize published document")?;
    print!("{yaml}");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            config,
            listen,
            log_level,
        } => {
            init_tracing(&log_level);
            run_serve(&config, listen).await
        }
        Commands::Check { config } => run_check(&config),
        Commands::Publish { config } => run_publish(&config),
    }
}
