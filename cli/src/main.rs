//! CLI entrypoint for switchboard
//!
//! Wires the layers together with dependency injection and processes a
//! single request: config → gateway → breakers → governor → classifier →
//! orchestrator → pipeline.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, bail};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use switchboard_application::{
    Classifier, CircuitBreaker, ConcurrencyGovernor, ConversationStorePort, IntentCache,
    ProcessRequestUseCase, ToolOrchestrator,
};
use switchboard_infrastructure::{
    ConfigLoader, HttpModelGateway, InMemoryConversationStore, JsonlConversationStore,
    LocalToolExecutor, RemoteToolClient, ToolRegistry,
};

#[derive(Parser)]
#[command(name = "switchboard", version, about)]
struct Cli {
    /// The request to process
    question: Option<String>,

    /// Caller identity, used for admission caps and conversation history
    #[arg(long, default_value = "local")]
    caller: String,

    /// Explicit config file path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Ignore config files and use built-in defaults
    #[arg(long)]
    no_config: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only print the response text
    #[arg(short, long)]
    quiet: bool,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    // The appender guard must outlive all logging.
    let mut _log_guard = None;
    match &cli.log_file {
        Some(path) => {
            let directory = path.parent().filter(|p| !p.as_os_str().is_empty());
            let file_name = path
                .file_name()
                .context("--log-file must name a file")?;
            let appender = tracing_appender::rolling::never(
                directory.unwrap_or_else(|| std::path::Path::new(".")),
                file_name,
            );
            let (writer, guard) = tracing_appender::non_blocking(appender);
            _log_guard = Some(guard);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .init();
        }
    }

    let question = match cli.question {
        Some(q) => q,
        None => bail!("A request is required, e.g.: switchboard \"list the rust files here\""),
    };

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).map_err(|e| anyhow::anyhow!(e))?
    };
    let params = config.pipeline_params();
    let breaker_config = config.breaker_config();

    info!("Starting switchboard");

    // === Dependency Injection ===
    let gateway = Arc::new(HttpModelGateway::new(
        &config.model.endpoint,
        &config.model.name,
        Duration::from_secs(config.model.request_timeout_secs),
    )?);
    let model_breaker = Arc::new(CircuitBreaker::new("model", breaker_config.clone()));
    let cache = Arc::new(IntentCache::new(params.cache_ttl, params.cache_capacity));

    let classifier = Arc::new(Classifier::new(
        cache,
        gateway.clone(),
        model_breaker.clone(),
        &params,
    ));

    let mut local_tools = LocalToolExecutor::new()
        .with_command_timeout(Duration::from_secs(config.tools.command_timeout_secs));
    if let Some(dir) = &config.tools.working_dir {
        local_tools = local_tools.with_working_dir(dir);
    }
    let remote_tools = if config.tools.remote.is_empty() {
        None
    } else {
        Some(RemoteToolClient::new(
            &config.tools.remote,
            breaker_config,
            Duration::from_secs(config.model.request_timeout_secs),
        )?)
    };
    let registry = Arc::new(ToolRegistry::new(local_tools, remote_tools));

    let governor = Arc::new(ConcurrencyGovernor::new(
        params.global_capacity,
        params.per_caller_capacity,
    ));
    let store: Arc<dyn ConversationStorePort> = match &config.conversation.history_path {
        Some(path) => Arc::new(
            JsonlConversationStore::open(path, config.conversation.max_turns)
                .with_context(|| format!("cannot open conversation history at {path}"))?,
        ),
        None => Arc::new(InMemoryConversationStore::new(config.conversation.max_turns)),
    };

    let orchestrator = ToolOrchestrator::new(
        gateway,
        registry.clone(),
        model_breaker,
        params.clone(),
    );

    let cancellation = CancellationToken::new();
    let use_case = ProcessRequestUseCase::new(classifier, orchestrator, registry, governor, store)
        .with_cancellation(cancellation.clone());

    tokio::spawn({
        let cancellation = cancellation.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancellation.cancel();
            }
        }
    });

    let request =
        switchboard_domain::Request::new(request_id(), cli.caller.as_str(), question.as_str());
    let result = use_case.process(request).await?;

    if !cli.quiet {
        println!(
            "[{} | {} tool call(s){}]",
            result.intent,
            result.tool_calls_made,
            if result.degraded { " | degraded" } else { "" }
        );
    }
    println!("{}", result.text);

    Ok(())
}

/// Timestamp-based request id
fn request_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    format!("req-{millis}")
}
