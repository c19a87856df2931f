//! `orderflow` entry point: HTTP services plus the fulfillment worker.

use api::{Backends, Config};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing. Spans get OpenTelemetry ids so the trace context
    //    travels with published events; nothing is exported.
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let (json_layer, text_layer) = if config.log_json {
        (Some(tracing_subscriber::fmt::layer().json()), None)
    } else {
        (None, Some(tracing_subscriber::fmt::layer()))
    };
    let tracer_provider = SdkTracerProvider::builder().build();
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_opentelemetry::layer().with_tracer(tracer_provider.tracer("orderflow")))
        .with(json_layer)
        .with(text_layer)
        .init();

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Open backends and seed stock
    let backends = Backends::from_config(&config)
        .await
        .expect("failed to open backends");
    backends
        .seed(&config.seed_stock)
        .await
        .expect("failed to seed stock");

    // 4. Build the application
    let state = api::create_state(&backends, &config);
    let app = api::create_app(state, metrics_handle);

    // 5. Serve and run the fulfillment worker until a signal arrives
    let saga = api::worker::http_saga(&config).expect("failed to build HTTP client");
    let addr = config.addr();
    tracing::info!(%addr, "starting orderflow server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    let result = api::server::run(
        listener,
        app,
        config,
        backends.log.clone(),
        saga,
        shutdown_signal(),
    )
    .await;

    if let Err(e) = tracer_provider.shutdown() {
        tracing::warn!(error = %e, "failed to shut down tracer provider");
    }

    match result {
        Ok(()) => tracing::info!("server shut down gracefully"),
        Err(e) => {
            tracing::error!(error = %e, "shutting down after worker failure");
            std::process::exit(1);
        }
    }
}
