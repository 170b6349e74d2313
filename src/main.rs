use scribe::{
    AppError, AppState, Result, ScribeConfig, TaskStatus, WorkflowEngine,
    api,
    cli::{Cli, Commands, output::Output},
    utils::toml_config::{LogFormat, ServerConfig},
};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// How often expired tasks, memories and sessions are swept.
const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    match dispatch(cli, &output).await {
        Ok(code) => code,
        Err(e) => {
            output.error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(cli: Cli, output: &Output) -> Result<ExitCode> {
    match cli.command {
        None | Some(Commands::Serve) => {
            let config = ScribeConfig::load_or_default(&cli.config)?;
            init_tracing(&config.server, if cli.verbose { Some("debug") } else { None });
            serve(config, output).await?;
            Ok(ExitCode::SUCCESS)
        }
        Some(ref command @ Commands::Run { .. }) => {
            let config = ScribeConfig::load_or_default(&cli.config)?;
            init_tracing(&config.server, Some(if cli.verbose { "debug" } else { "warn" }));

            let request = command
                .task_request()
                .ok_or_else(|| AppError::Internal("run command without a request".to_string()))?;
            run_once(config, request, output).await
        }
        Some(Commands::Config { full, validate }) => {
            show_config(&cli, full, validate, output)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// `RUST_LOG` wins; otherwise `level_override` or the configured level.
fn init_tracing(server: &ServerConfig, level_override: Option<&str>) {
    let level = level_override.unwrap_or(server.log_level.as_str());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    match server.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn serve(config: ScribeConfig, output: &Output) -> Result<()> {
    output.banner();

    let addr = config.server.addr();
    let grace = config.server.shutdown_grace();
    let engine = Arc::new(WorkflowEngine::from_config(config).await?);
    let app = api::routes::app(AppState::new(engine.clone()));

    let sweeper = {
        let engine = engine.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(MAINTENANCE_INTERVAL);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                engine.maintenance().await;
            }
        })
    };

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Configuration(format!("Failed to bind {}: {}", addr, e)))?;

    output.success(&format!("Listening on http://{}", addr));
    output.info(&format!("OpenAPI document at http://{}/api-docs/openapi.json", addr));
    tracing::info!(%addr, "Server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Internal(format!("Server error: {}", e)))?;

    sweeper.abort();
    let aborted = engine.shutdown(grace).await;
    if aborted > 0 {
        output.warning(&format!("Aborted {} unfinished task(s)", aborted));
    }
    output.success("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Could not install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining");
}

async fn run_once(
    config: ScribeConfig,
    request: scribe::TaskRequest,
    output: &Output,
) -> Result<ExitCode> {
    let grace = config.server.shutdown_grace();
    let engine = WorkflowEngine::from_config(config).await?;

    output.info(&format!("Running pipeline for \"{}\"", request.topic));
    let task = engine.run_to_completion(request).await?;
    engine.shutdown(grace).await;

    output.task_report(&task);
    output.newline();

    Ok(if task.status == TaskStatus::Completed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn show_config(cli: &Cli, full: bool, validate: bool, output: &Output) -> Result<()> {
    if validate {
        ScribeConfig::load(&cli.config)?;
        output.success(&format!("{} is valid", cli.config.display()));
        return Ok(());
    }

    let config = ScribeConfig::load_or_default(&cli.config)?;
    if full {
        println!("{}", config.to_toml()?);
        return Ok(());
    }

    output.header("Configuration");
    output.kv("file", &cli.config.display().to_string());
    output.kv("listen", &config.server.addr());
    output.kv("provider", &format!("{:?}", config.llm.provider).to_lowercase());
    output.kv("model", &config.llm.model);
    output.kv("memory ttl", &format!("{}s", config.memory.ttl_secs));
    output.kv(
        "task retention",
        &config
            .tasks
            .retention_secs
            .map(|s| format!("{}s", s))
            .unwrap_or_else(|| "unbounded".to_string()),
    );
    output.hint("Use --full to print the effective TOML");
    Ok(())
}
