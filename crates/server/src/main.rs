//! Scribe Server
//!
//! Axum server that embeds the topic form and exposes the content pipeline,
//! plus a CLI for one-off runs.

mod api;
mod assets;
mod state;

use anyhow::Context;
use axum::{routing::get, Router};
use clap::{Parser, Subcommand};
use std::{net::SocketAddr, process::ExitCode, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use scribe_core::backends::build_backend;
use scribe_core::config::{ConfigOverrides, ResolvedConfig, ScribeConfig};
use scribe_core::models::BackendKind;
use scribe_core::pipeline::ContentPipeline;

use state::{AppState, SharedState};

#[derive(Parser, Clone)]
#[command(author, version, about = "Scribe - research, write, proofread and summarize a topic")]
struct Args {
    #[command(subcommand)]
    command: Option<CliCommand>,

    /// Backend family: gemini, gemini-chat, openai, gemini-compat, radkit
    #[arg(long, global = true)]
    backend: Option<BackendKind>,

    /// Model override
    #[arg(long, global = true)]
    model: Option<String>,

    /// Sampling temperature in [0, 1]
    #[arg(long, global = true)]
    temperature: Option<f32>,

    /// Per-call timeout in seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Endpoint override (provider host or compatible gateway)
    #[arg(long, global = true)]
    base_url: Option<String>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            backend: self.backend,
            model: self.model.clone(),
            temperature: self.temperature,
            timeout_secs: self.timeout_secs,
            base_url: self.base_url.clone(),
        }
    }
}

#[derive(Subcommand, Clone)]
enum CliCommand {
    /// Start the Scribe server (default)
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },
    /// Run the pipeline on a topic (CLI mode, no server)
    Run {
        /// The topic to write about
        topic: String,
    },
    /// List backend families and their credential variables
    Backends,
}

/// Build the pipeline for a resolved configuration
fn build_pipeline(resolved: &ResolvedConfig) -> anyhow::Result<ContentPipeline> {
    let backend = build_backend(resolved)?;
    Ok(ContentPipeline::new(backend, resolved.options.clone()))
}

fn print_backends(active: BackendKind) {
    for info in api::pipeline::backend_info(active) {
        let marker = if info.active { "*" } else { " " };
        println!(
            "{} {:<14} {:<38} {:<15} {}",
            marker, info.id, info.name, info.credential_var, info.default_model
        );
    }
}

async fn run_once(pipeline: &ContentPipeline, topic: &str) -> ExitCode {
    match pipeline.run(topic).await {
        Ok(bundle) => {
            for (label, text) in bundle.sections() {
                println!("## {}\n\n{}\n", label, text);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

fn app(state: SharedState) -> Router {
    Router::new()
        .nest("/api/v1", api::api_routes())
        .fallback(get(assets::serve_static))
        .with_state(state)
}

async fn run_server(state: SharedState, port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    tracing::info!(
        %addr,
        backend = %state.backend,
        model = %state.model,
        "Scribe server running"
    );

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = ScribeConfig::load().await?;
    config.merge(args.overrides());

    if matches!(args.command, Some(CliCommand::Backends)) {
        print_backends(config.backend);
        return Ok(ExitCode::SUCCESS);
    }

    // Nothing is built without a credential
    let resolved = config.resolve().context("Refusing to start")?;
    let pipeline = build_pipeline(&resolved)?;

    let port = match args.command {
        Some(CliCommand::Run { topic }) => return Ok(run_once(&pipeline, &topic).await),
        Some(CliCommand::Serve { port }) => port,
        _ => 8080,
    };

    let state = Arc::new(AppState::new(
        pipeline,
        resolved.backend,
        resolved.options.model.clone(),
    ));
    run_server(state, port).await?;
    Ok(ExitCode::SUCCESS)
}
