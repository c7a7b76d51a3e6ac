use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig as _;

use nr_domain::config::{Config, ObservabilityConfig};
use nr_gateway::bootstrap;
use nr_gateway::cli::run::Feature;
use nr_gateway::cli::{Cli, Command, ConfigCommand};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let (config, config_path) = nr_gateway::cli::load_config(cli.config.as_deref())?;

    // `config` commands report on the file itself and need no logging.
    if let Command::Config(cmd) = &cli.command {
        let ok = match cmd {
            ConfigCommand::Validate => nr_gateway::cli::config::validate(&config, &config_path),
            ConfigCommand::Show => {
                nr_gateway::cli::config::show(&config)?;
                true
            }
        };
        if !ok {
            std::process::exit(1);
        }
        return Ok(());
    }

    let tracer_provider = init_tracing(&config.observability);
    let outcome = dispatch(cli.command, &config).await;

    // Flush and shut down the OTel tracer provider so pending spans
    // are exported before the process exits.
    if let Some(provider) = tracer_provider {
        if let Err(e) = provider.shutdown() {
            tracing::warn!(error = ?e, "OpenTelemetry tracer provider shutdown failed");
        }
    }

    if !outcome? {
        std::process::exit(1);
    }
    Ok(())
}

/// Run a profile command. `Ok(false)` means the command completed but
/// should exit non-zero.
async fn dispatch(command: Command, config: &Config) -> anyhow::Result<bool> {
    let profile = bootstrap::open_profile(config)?;
    let feature = match command {
        Command::Insights => Feature::Insights,
        Command::Followup { lead_id } => Feature::FollowUp { lead_id },
        Command::Summary => Feature::Summary,
        Command::Ask { query, model } => Feature::Ask { query, model },
        Command::Chat { model } => {
            nr_gateway::cli::chat::chat(config, &profile, model).await?;
            return Ok(true);
        }
        Command::Log(cmd) => {
            nr_gateway::cli::log::run(&profile, cmd).await?;
            return Ok(true);
        }
        Command::Config(_) => return Ok(true),
    };
    nr_gateway::cli::run::run(config, &profile, feature).await
}

/// Initialize stderr tracing for CLI commands.
///
/// `RUST_LOG` overrides `observability.log_filter` (default `warn`) so
/// diagnostic output does not pollute stdout. When `otlp_endpoint` is
/// configured, an OpenTelemetry layer exports every span via OTLP/gRPC.
/// The returned [`SdkTracerProvider`] handle must be shut down on exit to
/// flush pending spans.
///
/// [`SdkTracerProvider`]: opentelemetry_sdk::trace::SdkTracerProvider
fn init_tracing(
    obs: &ObservabilityConfig,
) -> Option<opentelemetry_sdk::trace::SdkTracerProvider> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&obs.log_filter));

    let (json_layer, compact_layer) = if obs.json_logs {
        (
            Some(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)),
            None,
        )
    } else {
        (
            None,
            Some(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr),
            ),
        )
    };

    let tracer_provider = obs
        .otlp_endpoint
        .as_deref()
        .and_then(|endpoint| build_tracer_provider(endpoint, obs));
    let otel_layer = tracer_provider
        .as_ref()
        .map(|provider| tracing_opentelemetry::layer().with_tracer(provider.tracer("neura")));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(compact_layer)
        .with(otel_layer)
        .init();

    tracer_provider
}

fn build_tracer_provider(
    endpoint: &str,
    obs: &ObservabilityConfig,
) -> Option<opentelemetry_sdk::trace::SdkTracerProvider> {
    let exporter = match opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
    {
        Ok(e) => e,
        Err(e) => {
            eprintln!(
                "WARNING: failed to create OTLP exporter for {endpoint}: {e}; \
                 continuing without OpenTelemetry"
            );
            return None;
        }
    };

    let resource = opentelemetry_sdk::Resource::builder()
        .with_service_name(obs.service_name.clone())
        .build();

    Some(
        opentelemetry_sdk::trace::SdkTracerProvider::builder()
            .with_batch_exporter(exporter)
            .with_sampler(opentelemetry_sdk::trace::Sampler::TraceIdRatioBased(
                obs.sample_rate,
            ))
            .with_resource(resource)
            .build(),
    )
}
